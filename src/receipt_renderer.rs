use chrono::{DateTime, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::config::Branding;
use crate::models::{Order, OrderLine};
use crate::money;

/// Receipt width in characters (58 mm roll).
pub const RECEIPT_WIDTH: usize = 32;

const THIN_RULE: &str = "-----------------------------";
const THICK_RULE: &str = "=============================";
const ITEM_NAME_WIDTH: usize = 20;
const CASHIER_WIDTH: usize = 12;
const CUSTOMER_WIDTH: usize = 15;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CopyKind {
    #[default]
    Customer,
    Merchant,
}

impl CopyKind {
    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
            Some("merchant") | Some("restaurant") | Some("store") => Self::Merchant,
            _ => Self::Customer,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub width: usize,
    pub branding: Branding,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: RECEIPT_WIDTH,
            branding: Branding::default(),
        }
    }
}

impl LayoutConfig {
    fn merchant_label(&self) -> String {
        format!("{} COPY", self.branding.short_name)
    }

    fn money(&self, value: Decimal) -> String {
        money::format_currency(&self.branding.currency_symbol, value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptLine {
    Title(String),
    Center(String),
    Rule(&'static str),
    Pair { label: String, value: String },
    Item { name: String, quantity: u32, amount: String },
    Total { label: String, value: String },
}

/// Fully laid out receipt, independent of the output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptDoc {
    pub copy: CopyKind,
    pub lines: Vec<ReceiptLine>,
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn item_name(name: &str) -> String {
    if name.chars().count() > ITEM_NAME_WIDTH {
        format!("{}..", truncate(name, ITEM_NAME_WIDTH - 2))
    } else {
        name.to_string()
    }
}

/// `*ORD-1 2*` -> `*ORD_1.2*`
pub fn barcode(order_number: &str) -> String {
    let body: String = order_number
        .chars()
        .map(|c| match c {
            '-' => '_',
            ' ' => '.',
            other => other,
        })
        .collect();
    format!("*{body}*")
}

fn payment_status(payment_type: &str) -> &'static str {
    match payment_type {
        "cash" => "PAID",
        "transfer" => "TRANSFER",
        _ => "POS",
    }
}

/// Stored total when present and non-zero, otherwise the line subtotal.
pub fn display_total(order: &Order, subtotal: Decimal) -> Decimal {
    match order.total_amount {
        Some(total) if !total.is_zero() => total,
        _ => subtotal,
    }
}

fn pair(label: &str, value: impl Into<String>) -> ReceiptLine {
    ReceiptLine::Pair {
        label: label.to_string(),
        value: value.into(),
    }
}

/// Lay out `order` as a receipt. `printed_at` fixes both the time zone used
/// for the order's timestamps and the "Printed" line, so the output is
/// deterministic for fixed inputs.
pub fn render<Tz>(order: &Order, copy: CopyKind, cfg: &LayoutConfig, printed_at: &DateTime<Tz>) -> ReceiptDoc
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let tz = printed_at.timezone();
    let items: &[OrderLine] = &order.items;
    let subtotal = money::sum(items.iter().map(OrderLine::line_total));
    let total = display_total(order, subtotal);
    let created = order.created_at.map(|at| at.with_timezone(&tz));

    let mut lines = vec![ReceiptLine::Title(cfg.branding.restaurant_name.clone())];
    lines.extend(cfg.branding.address_lines.iter().cloned().map(ReceiptLine::Center));
    lines.push(ReceiptLine::Center(cfg.branding.phone.clone()));
    lines.push(ReceiptLine::Rule(THIN_RULE));
    lines.push(ReceiptLine::Title("SALES RECEIPT".to_string()));
    lines.push(ReceiptLine::Rule(THIN_RULE));
    lines.push(ReceiptLine::Center(match copy {
        CopyKind::Customer => "CUSTOMER COPY".to_string(),
        CopyKind::Merchant => cfg.merchant_label(),
    }));

    lines.push(pair(
        "RECEIPT #:",
        order.order_number.clone().unwrap_or_else(|| "N/A".to_string()),
    ));
    lines.push(pair(
        "DATE:",
        created
            .as_ref()
            .map(|at| at.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    ));
    lines.push(pair(
        "TIME:",
        created
            .as_ref()
            .map(|at| at.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string()),
    ));
    lines.push(pair(
        "CASHIER:",
        truncate(order.cashier_name.as_deref().unwrap_or("N/A"), CASHIER_WIDTH),
    ));
    if let Some(customer) = order.customer_name.as_deref() {
        lines.push(pair("CUSTOMER:", truncate(customer, CUSTOMER_WIDTH)));
    }
    if let Some(table) = order.table_number.as_deref() {
        lines.push(pair("TABLE:", table));
    }
    lines.push(ReceiptLine::Rule(THICK_RULE));

    lines.push(ReceiptLine::Title("ITEMS".to_string()));
    lines.push(ReceiptLine::Rule(THIN_RULE));
    for item in items {
        lines.push(ReceiptLine::Item {
            name: item_name(&item.name),
            quantity: item.quantity,
            amount: cfg.money(item.line_total()),
        });
    }
    lines.push(ReceiptLine::Rule(THICK_RULE));

    lines.push(ReceiptLine::Total {
        label: "SUBTOTAL:".to_string(),
        value: cfg.money(subtotal),
    });
    lines.push(ReceiptLine::Total {
        label: "TOTAL:".to_string(),
        value: cfg.money(total),
    });
    lines.push(ReceiptLine::Rule(THICK_RULE));

    let payment_type = order.payment_type.trim();
    let payment_label = if payment_type.is_empty() {
        "CASH".to_string()
    } else {
        payment_type.to_uppercase()
    };
    lines.push(pair(
        "PAYMENT:",
        format!("{payment_label} {}", payment_status(payment_type)),
    ));

    if let Some(number) = order.order_number.as_deref() {
        lines.push(ReceiptLine::Center(barcode(number)));
        lines.push(ReceiptLine::Center(number.to_string()));
    }
    lines.push(ReceiptLine::Rule(THICK_RULE));

    lines.push(ReceiptLine::Title("THANK YOU FOR YOUR PATRONAGE!".to_string()));
    match copy {
        CopyKind::Customer => {
            lines.push(ReceiptLine::Center("Please keep this receipt".to_string()));
            lines.push(ReceiptLine::Center("Goods sold are not returnable".to_string()));
        }
        CopyKind::Merchant => {
            lines.push(ReceiptLine::Center(cfg.merchant_label()));
            lines.push(ReceiptLine::Center("For restaurant records".to_string()));
        }
    }
    lines.push(ReceiptLine::Center("VAT Inclusive".to_string()));
    lines.push(ReceiptLine::Center(format!(
        "Printed: {}",
        printed_at.format("%d/%m/%y %H:%M")
    )));
    lines.push(ReceiptLine::Rule(THICK_RULE));
    lines.push(ReceiptLine::Center(
        match copy {
            CopyKind::Customer => "--- CUT HERE ---",
            CopyKind::Merchant => "--- END OF RECEIPT ---",
        }
        .to_string(),
    ));

    ReceiptDoc { copy, lines }
}

// ---------------------------------------------------------------------------
// Plain text
// ---------------------------------------------------------------------------

fn width_of(text: &str) -> usize {
    text.chars().count()
}

fn center(text: &str, width: usize) -> String {
    let len = width_of(text);
    if len >= width {
        return text.to_string();
    }
    let left = (width - len) / 2;
    format!("{}{}", " ".repeat(left), text)
}

/// Label flush left, value flush right; falls back to a single space when
/// the pair does not fit.
fn justify(left: &str, right: &str, width: usize) -> String {
    let used = width_of(left) + width_of(right);
    if used >= width {
        format!("{left} {right}")
    } else {
        format!("{left}{}{right}", " ".repeat(width - used))
    }
}

pub fn render_text(doc: &ReceiptDoc, cfg: &LayoutConfig) -> String {
    let width = cfg.width.max(16);
    let mut out = Vec::with_capacity(doc.lines.len());
    for line in &doc.lines {
        out.push(match line {
            ReceiptLine::Title(text) | ReceiptLine::Center(text) => center(text, width),
            ReceiptLine::Rule(rule) => center(rule, width),
            ReceiptLine::Pair { label, value } | ReceiptLine::Total { label, value } => {
                justify(label, value, width)
            }
            ReceiptLine::Item {
                name,
                quantity,
                amount,
            } => {
                let left = format!("{name:<w$} x{quantity}", w = ITEM_NAME_WIDTH);
                justify(left.trim_end(), amount, width)
            }
        });
    }
    let mut text = out.join("\n");
    text.push('\n');
    text
}

// ---------------------------------------------------------------------------
// HTML
// ---------------------------------------------------------------------------

fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn html_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<title>{}</title>
<style>
body {{ font-family: ui-monospace, SFMono-Regular, Menlo, monospace; margin: 0; padding: 12px; background: #fff; color: #111; }}
.receipt {{ width: 58mm; margin: 0 auto; font-size: 10px; }}
.line {{ display: flex; justify-content: space-between; gap: 8px; }}
.title {{ text-align: center; font-weight: bold; font-size: 12px; }}
.center {{ text-align: center; }}
.rule {{ text-align: center; overflow: hidden; white-space: nowrap; }}
.total {{ font-weight: bold; }}
@media print {{ body {{ padding: 0; }} }}
</style>
</head>
<body onload="window.print()">{}</body>
</html>"#,
        esc(title),
        body
    )
}

/// Printable HTML document with the same lines as [`render_text`].
pub fn render_html(doc: &ReceiptDoc, cfg: &LayoutConfig) -> String {
    let mut body = String::from("<div class=\"receipt\">");
    for line in &doc.lines {
        match line {
            ReceiptLine::Title(text) => {
                body.push_str(&format!("<div class=\"title\">{}</div>", esc(text)))
            }
            ReceiptLine::Center(text) => {
                body.push_str(&format!("<div class=\"center\">{}</div>", esc(text)))
            }
            ReceiptLine::Rule(rule) => body.push_str(&format!("<div class=\"rule\">{rule}</div>")),
            ReceiptLine::Pair { label, value } => body.push_str(&format!(
                "<div class=\"line\"><span>{}</span><span>{}</span></div>",
                esc(label),
                esc(value)
            )),
            ReceiptLine::Total { label, value } => body.push_str(&format!(
                "<div class=\"line total\"><span>{}</span><span>{}</span></div>",
                esc(label),
                esc(value)
            )),
            ReceiptLine::Item {
                name,
                quantity,
                amount,
            } => body.push_str(&format!(
                "<div class=\"line\"><span>{}</span><span>x{quantity}</span><span>{}</span></div>",
                esc(name),
                esc(amount)
            )),
        }
    }
    body.push_str("</div>");
    let title = match doc.copy {
        CopyKind::Customer => "CUSTOMER COPY".to_string(),
        CopyKind::Merchant => cfg.merchant_label(),
    };
    html_shell(&format!("{} - {title}", cfg.branding.restaurant_name), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    fn printed_at() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T11:05:00+01:00").expect("printed at")
    }

    fn order() -> Order {
        Order::from_row(&json!({
            "id": "o-1",
            "order_number": "ORD1714557600123",
            "cashier_id": "c-1",
            "payment_type": "transfer",
            "customer_name": "Abdullahi Mohammed Sani",
            "total_amount": 3300,
            "order_items": "[{\"id\":\"f1\",\"name\":\"Jollof Rice with Fried Plantain\",\"price\":1500,\"quantity\":2},{\"id\":\"f2\",\"name\":\"Coke\",\"price\":300,\"quantity\":1}]",
            "created_at": "2024-05-01T09:30:15Z",
            "cashier_name": "Musa Ibrahim Bello"
        }))
        .expect("order")
    }

    #[test]
    fn identical_inputs_render_identically() {
        let cfg = LayoutConfig::default();
        let a = render_text(&render(&order(), CopyKind::Customer, &cfg, &printed_at()), &cfg);
        let b = render_text(&render(&order(), CopyKind::Customer, &cfg, &printed_at()), &cfg);
        assert_eq!(a, b);
    }

    #[test]
    fn customer_copy_contents() {
        let cfg = LayoutConfig::default();
        let text = render_text(&render(&order(), CopyKind::Customer, &cfg, &printed_at()), &cfg);
        assert!(text.contains("SHABAN RESTAURANT"));
        assert!(text.contains("CUSTOMER COPY"));
        assert!(text.contains("01/05/2024"));
        assert!(text.contains("10:30:15"));
        // truncations
        assert!(text.contains("Musa Ibrahim"));
        assert!(!text.contains("Musa Ibrahim Bello"));
        assert!(text.contains("Abdullahi Moham"));
        assert!(text.contains("Jollof Rice with F.. x2"));
        assert!(text.contains("TRANSFER TRANSFER"));
        assert!(text.contains("*ORD1714557600123*"));
        assert!(text.contains("Goods sold are not returnable"));
        assert!(text.contains("Printed: 01/05/24 11:05"));
        assert!(text.trim_end().ends_with("--- CUT HERE ---"));
        assert!(!text.contains("TABLE:"));
    }

    #[test]
    fn merchant_copy_footer() {
        let cfg = LayoutConfig::default();
        let doc = render(&order(), CopyKind::Merchant, &cfg, &printed_at());
        let text = render_text(&doc, &cfg);
        assert!(text.contains("SHABAN COPY"));
        assert!(text.contains("For restaurant records"));
        assert!(text.trim_end().ends_with("--- END OF RECEIPT ---"));
        assert!(!text.contains("CUSTOMER COPY"));
    }

    #[test]
    fn zero_total_falls_back_to_subtotal() {
        let mut o = order();
        o.total_amount = Some(Decimal::ZERO);
        assert_eq!(display_total(&o, o.subtotal()), Decimal::from(3300));
        o.total_amount = None;
        assert_eq!(display_total(&o, o.subtotal()), Decimal::from(3300));
        o.total_amount = Some(Decimal::from(3000));
        assert_eq!(display_total(&o, o.subtotal()), Decimal::from(3000));
    }

    #[test]
    fn missing_fields_use_placeholders() {
        let bare = Order::from_row(&json!({ "id": "x", "order_items": "oops" })).expect("order");
        let cfg = LayoutConfig::default();
        let doc = render(&bare, CopyKind::Customer, &cfg, &printed_at());
        let text = render_text(&doc, &cfg);
        assert!(text.contains("RECEIPT #:"));
        assert!(text.contains("N/A"));
        assert!(text.contains("CASH POS"));
        assert!(!doc.lines.iter().any(|l| matches!(l, ReceiptLine::Item { .. })));
        assert!(!text.contains('*'));
    }

    #[test]
    fn barcode_substitutes_separators() {
        assert_eq!(barcode("ORD-12 34"), "*ORD_12.34*");
        assert_eq!(payment_status("cash"), "PAID");
        assert_eq!(payment_status("pos"), "POS");
        assert_eq!(payment_status("weird"), "POS");
    }

    #[test]
    fn html_escapes_and_keeps_lines() {
        let mut o = order();
        o.customer_name = Some("<b>Ada</b>".into());
        let cfg = LayoutConfig::default();
        let html = render_html(&render(&o, CopyKind::Customer, &cfg, &printed_at()), &cfg);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("&lt;b&gt;Ada&lt;/b"));
        assert!(html.contains("SALES RECEIPT"));
        assert!(html.contains("₦3300.00"));
    }

    #[test]
    fn copy_kind_parsing() {
        assert_eq!(CopyKind::from_value(Some("Merchant")), CopyKind::Merchant);
        assert_eq!(CopyKind::from_value(None), CopyKind::Customer);
    }
}
