//! HTTP route handlers.
//!
//! French route paths, grouped by concern:
//!
//! | Module      | Routes                                                  |
//! |-------------|---------------------------------------------------------|
//! | `home`      | `GET /`                                                 |
//! | `health`    | `GET /health`                                           |
//! | `catalog`   | `GET /catalogue/`, `GET /produit/{id}/`                 |
//! | `cart`      | `GET /panier/`, `POST /panier/ajouter|modifier|retirer|commander` |
//! | `orders`    | `GET /mes-commandes/`, `GET /commande/{id}/`            |
//! | `dashboard` | `GET /dashboard/` (staff)                               |
//! | `export`    | `GET /export-ventes/` (staff)                           |

pub mod cart;
pub mod catalog;
pub mod dashboard;
pub mod export;
pub mod health;
pub mod home;
pub mod orders;
