//! Receipt output: write the rendered HTML under `<data_dir>/receipts/` and
//! hand it to the host browser, whose print dialog does the rest.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{PosError, PosResult};
use crate::models::Order;
use crate::receipt_renderer::{self, CopyKind, LayoutConfig};

#[derive(Debug, Clone)]
pub struct PrintedReceipt {
    pub copy: CopyKind,
    pub path: PathBuf,
    /// Plain text rendition, for terminals without a browser.
    pub text: String,
}

fn safe_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "order".to_string()
    } else {
        cleaned
    }
}

fn write_print_html_file(
    receipts_dir: &Path,
    entity_id: &str,
    copy: CopyKind,
    html: &str,
) -> PosResult<PathBuf> {
    fs::create_dir_all(receipts_dir)?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let copy_tag = match copy {
        CopyKind::Customer => "customer",
        CopyKind::Merchant => "merchant",
    };
    let filename = format!("receipt_{}_{copy_tag}_{timestamp}.html", safe_component(entity_id));
    let file_path = receipts_dir.join(filename);
    fs::write(&file_path, html)?;
    Ok(file_path)
}

/// Render each requested copy, write it to disk and optionally open it.
pub fn print_receipt<Tz>(
    order: &Order,
    copies: &[CopyKind],
    layout: &LayoutConfig,
    receipts_dir: &Path,
    printed_at: &DateTime<Tz>,
    open_in_browser: bool,
) -> PosResult<Vec<PrintedReceipt>>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if copies.is_empty() {
        return Err(PosError::validation("Choose at least one receipt copy"));
    }
    let entity_id = order.order_number.as_deref().unwrap_or(&order.id);
    let mut printed = Vec::with_capacity(copies.len());
    for &copy in copies {
        let doc = receipt_renderer::render(order, copy, layout, printed_at);
        let html = receipt_renderer::render_html(&doc, layout);
        let path = write_print_html_file(receipts_dir, entity_id, copy, &html)?;
        info!(order = %entity_id, copy = ?copy, path = %path.display(), "receipt file generated");
        if open_in_browser {
            open_file(&path);
        }
        printed.push(PrintedReceipt {
            copy,
            path,
            text: receipt_renderer::render_text(&doc, layout),
        });
    }
    Ok(printed)
}

/// Failure to launch a browser is logged, not fatal: the file is on disk.
fn open_file(path: &Path) {
    let target = path.to_string_lossy();
    if let Err(e) = webbrowser::open(&target) {
        warn!(path = %target, error = %e, "could not open receipt in browser");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    #[test]
    fn writes_one_file_per_copy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let order = Order::from_row(&json!({
            "id": "o-1",
            "order_number": "ORD-1 2",
            "payment_type": "cash",
            "total_amount": 300,
            "order_items": [{ "id": "f2", "name": "Coke", "price": 300, "quantity": 1 }],
            "created_at": "2024-05-01T09:30:15Z"
        }))
        .expect("order");
        let printed_at =
            DateTime::parse_from_rfc3339("2024-05-01T11:05:00+01:00").expect("printed at");
        let out = print_receipt(
            &order,
            &[CopyKind::Customer, CopyKind::Merchant],
            &LayoutConfig::default(),
            &dir.path().join("receipts"),
            &printed_at,
            false,
        )
        .expect("print");

        assert_eq!(out.len(), 2);
        for receipt in &out {
            assert!(receipt.path.exists());
            let name = receipt.path.file_name().and_then(|n| n.to_str()).expect("name");
            assert!(name.starts_with("receipt_ORD-1_2_"));
            let html = fs::read_to_string(&receipt.path).expect("read");
            assert!(html.contains("SALES RECEIPT"));
        }
        assert!(out[0].text.contains("CUSTOMER COPY"));
        assert!(out[1].text.contains("SHABAN COPY"));
    }

    #[test]
    fn no_copies_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let order = Order::from_row(&json!({ "id": "o-2" })).expect("order");
        let printed_at: DateTime<FixedOffset> =
            DateTime::parse_from_rfc3339("2024-05-01T11:05:00+01:00").expect("printed at");
        let err = print_receipt(&order, &[], &LayoutConfig::default(), dir.path(), &printed_at, false)
            .expect_err("no copies");
        assert!(err.is_validation());
    }
}
