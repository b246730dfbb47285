//! Sales-ledger CSV export endpoint.
//!
//! Staff-only. One row per sale, newest first. The file is small enough
//! (one shop's ledger) to build in memory; nothing here streams.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use boutique_db::SaleExportRow;

use crate::auth::StaffUser;
use crate::error::ApiError;
use crate::AppState;

/// Column headers, in the order the back office expects them.
const CSV_HEADER: &str = "Date,Produit,Catégorie,Quantité,Prix unitaire,Montant total";

/// Quotes a CSV field when it contains the separator, quotes or newlines.
/// Inner quotes are doubled per RFC 4180.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(row: &SaleExportRow) -> String {
    format!(
        "{},{},{},{},{},{}",
        row.created_at.format("%d/%m/%Y %H:%M"),
        csv_field(&row.product_name),
        csv_field(&row.category_name),
        row.quantity,
        row.unit_price().decimal_string(),
        row.total().decimal_string(),
    )
}

/// GET /export-ventes/ returns the full sales ledger as a CSV attachment.
#[tracing::instrument(skip(state, staff), fields(user_id = %staff.0.id))]
pub async fn sales_csv(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
) -> Result<impl IntoResponse, ApiError> {
    let rows = state.db.sales().export_rows().await?;

    let mut csv = String::with_capacity(64 * (rows.len() + 1));
    csv.push_str(CSV_HEADER);
    csv.push('\n');
    for row in &rows {
        csv.push_str(&csv_row(row));
        csv.push('\n');
    }

    tracing::debug!(rows = rows.len(), "Exported sales ledger");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"ventes.csv\"",
            ),
        ],
        csv,
    ))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_csv_field_escaping() {
        assert_eq!(csv_field("Eau minérale"), "Eau minérale");
        assert_eq!(csv_field("Pain, complet"), "\"Pain, complet\"");
        assert_eq!(csv_field("Dit \"bio\""), "\"Dit \"\"bio\"\"\"");
        assert_eq!(csv_field("ligne\ncassée"), "\"ligne\ncassée\"");
    }

    #[test]
    fn test_csv_row_format() {
        let row = SaleExportRow {
            created_at: Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap(),
            product_name: "Eau minérale 1.5L".to_string(),
            category_name: "Boissons".to_string(),
            quantity: 2,
            unit_price_cents: 15000,
            total_cents: 30000,
        };

        assert_eq!(
            csv_row(&row),
            "15/03/2024 14:30,Eau minérale 1.5L,Boissons,2,150.00,300.00"
        );
    }
}
