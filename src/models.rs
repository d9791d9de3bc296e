//! Row types for the three data-service tables (`cashiers`, `foods`,
//! `orders`) plus the insert/update payloads sent back to it.
//!
//! Rows are decoded leniently: ids may be numbers or strings, amounts may be
//! numbers or numeric strings, and optional columns may be missing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{PosError, PosResult};
use crate::money;

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

/// First non-empty trimmed string (or stringified number) among `keys`.
pub(crate) fn value_str(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match v.get(*key) {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

pub(crate) fn value_bool(v: &Value, key: &str) -> Option<bool> {
    match v.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn value_timestamp(v: &Value, key: &str) -> Option<DateTime<Utc>> {
    let raw = v.get(key)?.as_str()?;
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn required_id(v: &Value, table: &str) -> PosResult<String> {
    value_str(v, &["id"]).ok_or_else(|| PosError::data_service(format!("{table} row without id")))
}

// ---------------------------------------------------------------------------
// Payment types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    Transfer,
    Pos,
}

impl PaymentType {
    pub const ALL: [PaymentType; 3] = [PaymentType::Cash, PaymentType::Transfer, PaymentType::Pos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Transfer => "transfer",
            Self::Pos => "pos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Transfer => "Transfer",
            Self::Pos => "POS",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentType {
    type Err = PosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "transfer" => Ok(Self::Transfer),
            "pos" => Ok(Self::Pos),
            other => Err(PosError::validation(format!(
                "Unknown payment type '{other}'. Expected cash, transfer or pos"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Cashiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashierType {
    Cash,
    TransferPos,
}

impl CashierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::TransferPos => "transfer_pos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::TransferPos => "Transfer/POS",
        }
    }

    /// Payment methods a session of this cashier type may use.
    pub fn allowed_payment_types(&self) -> &'static [PaymentType] {
        match self {
            Self::Cash => &[PaymentType::Cash],
            Self::TransferPos => &[PaymentType::Transfer, PaymentType::Pos],
        }
    }

    pub fn allows(&self, payment: PaymentType) -> bool {
        self.allowed_payment_types().contains(&payment)
    }

    pub fn default_payment_type(&self) -> PaymentType {
        self.allowed_payment_types()[0]
    }
}

impl fmt::Display for CashierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CashierType {
    type Err = PosError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "transfer_pos" | "transfer/pos" | "transfer-pos" => Ok(Self::TransferPos),
            other => Err(PosError::validation(format!(
                "Unknown cashier type '{other}'. Expected cash or transfer_pos"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cashier {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub cashier_type: CashierType,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Cashier {
    pub fn from_row(row: &Value) -> PosResult<Self> {
        let id = required_id(row, "cashiers")?;
        let name = value_str(row, &["name"]).unwrap_or_default();
        // Unrecognised types decode as cash.
        let cashier_type = match value_str(row, &["type"]) {
            Some(raw) => CashierType::from_str(&raw).unwrap_or_else(|e| {
                warn!(cashier_id = %id, error = %e, "unknown cashier type, treating as cash");
                CashierType::Cash
            }),
            None => CashierType::Cash,
        };
        Ok(Self {
            id,
            name,
            cashier_type,
            is_active: value_bool(row, "is_active").unwrap_or(true),
            created_at: value_timestamp(row, "created_at"),
        })
    }
}

/// Create/update payload for the `cashiers` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashierInput {
    pub name: String,
    #[serde(rename = "type")]
    pub cashier_type: CashierType,
    pub is_active: bool,
}

impl CashierInput {
    pub fn validate(&self) -> PosResult<()> {
        if self.name.trim().is_empty() {
            return Err(PosError::validation("Cashier name is required"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Foods
// ---------------------------------------------------------------------------

/// Menu categories offered by the food form. Free text is accepted as well.
pub const FOOD_CATEGORIES: &[&str] = &["Main Dish", "Appetizer", "Dessert", "Drink", "Side Dish"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Food {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: Option<String>,
    pub is_available: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Food {
    pub fn from_row(row: &Value) -> PosResult<Self> {
        Ok(Self {
            id: required_id(row, "foods")?,
            name: value_str(row, &["name"]).unwrap_or_default(),
            description: value_str(row, &["description"]),
            price: money::parse_amount(row.get("price")),
            category: value_str(row, &["category"]),
            is_available: value_bool(row, "is_available").unwrap_or(true),
            created_at: value_timestamp(row, "created_at"),
        })
    }

    /// Case-insensitive substring match on name or description.
    pub fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false)
    }
}

/// Highest price a food may be saved with.
pub const MAX_FOOD_PRICE: i64 = 1_000_000_000;

/// Create/update payload for the `foods` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub category: Option<String>,
    pub is_available: bool,
}

impl FoodInput {
    pub fn validate(&self) -> PosResult<()> {
        if self.name.trim().is_empty() {
            return Err(PosError::validation("Food name is required"));
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(PosError::validation("Price must not be negative"));
        }
        if self.price > Decimal::from(MAX_FOOD_PRICE) {
            return Err(PosError::validation(format!(
                "Price must not exceed {MAX_FOOD_PRICE}"
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// One line of the item snapshot captured when an order is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        money::line_total(self.price, self.quantity)
    }

    fn from_value(v: &Value) -> Self {
        let quantity = match v.get("quantity") {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(1),
            Some(Value::String(s)) => s.trim().parse::<u64>().unwrap_or(1),
            _ => 1,
        };
        Self {
            id: value_str(v, &["id"]).unwrap_or_default(),
            name: value_str(v, &["name"]).unwrap_or_else(|| "Item".to_string()),
            price: money::parse_amount(v.get("price")),
            quantity: u32::try_from(quantity).unwrap_or(u32::MAX),
        }
    }
}

/// Parse an `order_items` column. The service stores it as a JSON string,
/// but an already-decoded array is accepted too. Unparseable input yields no
/// lines.
pub fn parse_order_lines(raw: Option<&Value>) -> Vec<OrderLine> {
    let decoded;
    let array = match raw {
        Some(Value::Array(items)) => items,
        Some(Value::String(s)) => {
            decoded = serde_json::from_str::<Value>(s).unwrap_or(Value::Null);
            match decoded.as_array() {
                Some(items) => items,
                None => return Vec::new(),
            }
        }
        _ => return Vec::new(),
    };
    array
        .iter()
        .filter(|v| v.is_object())
        .map(OrderLine::from_value)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: String,
    pub order_number: Option<String>,
    pub cashier_id: String,
    /// Raw payment type as stored; see [`Order::payment`].
    pub payment_type: String,
    pub customer_name: Option<String>,
    pub table_number: Option<String>,
    /// Stored total. `None` when the column is missing or non-numeric.
    #[serde(with = "rust_decimal::serde::float_option")]
    pub total_amount: Option<Decimal>,
    pub items: Vec<OrderLine>,
    pub created_at: Option<DateTime<Utc>>,
    /// Display name, from the embedded `cashiers` join or set by the caller.
    pub cashier_name: Option<String>,
    pub cashier_type: Option<CashierType>,
}

impl Order {
    pub fn from_row(row: &Value) -> PosResult<Self> {
        let joined = row.get("cashiers").filter(|v| v.is_object());
        let total_amount = match row.get("total_amount") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => money::parse_amount_str(s),
            Some(v @ Value::Number(_)) => Some(money::parse_amount(Some(v))),
            Some(_) => None,
        };
        Ok(Self {
            id: required_id(row, "orders")?,
            order_number: value_str(row, &["order_number"]),
            cashier_id: value_str(row, &["cashier_id"]).unwrap_or_default(),
            payment_type: value_str(row, &["payment_type"]).unwrap_or_default(),
            customer_name: value_str(row, &["customer_name"]),
            table_number: value_str(row, &["table_number"]),
            total_amount,
            items: parse_order_lines(row.get("order_items")),
            created_at: value_timestamp(row, "created_at"),
            cashier_name: value_str(row, &["cashier_name"])
                .or_else(|| joined.and_then(|c| value_str(c, &["name"]))),
            cashier_type: joined
                .and_then(|c| value_str(c, &["type"]))
                .and_then(|t| CashierType::from_str(&t).ok()),
        })
    }

    /// Amount used by every aggregate: stored total or zero.
    pub fn amount(&self) -> Decimal {
        self.total_amount.unwrap_or_default()
    }

    /// Sum of the snapshot lines.
    pub fn subtotal(&self) -> Decimal {
        money::sum(self.items.iter().map(OrderLine::line_total))
    }

    pub fn payment(&self) -> Option<PaymentType> {
        PaymentType::from_str(&self.payment_type).ok()
    }
}

/// Insert payload for the `orders` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrder {
    pub order_number: String,
    pub cashier_id: String,
    pub payment_type: PaymentType,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub customer_name: Option<String>,
    /// JSON-serialized `Vec<OrderLine>` snapshot.
    pub order_items: String,
}
