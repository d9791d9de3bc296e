//! Data access facade over the hosted data service.
//!
//! [`DataStore`] is the generic query client: filter-select, insert, update
//! and delete over the three tables, returning JSON rows. [`PosData`] wraps
//! any `DataStore` and exposes the typed operations the pages use. Every
//! typed write returns an [`Invalidation`] naming the table whose cached page
//! snapshot is now stale; the page that owns the snapshot reloads it.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{PosError, PosResult};
use crate::models::{Cashier, CashierInput, Food, FoodInput, NewOrder, Order};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Cashiers,
    Foods,
    Orders,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cashiers => "cashiers",
            Self::Foods => "foods",
            Self::Orders => "orders",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(&'static str, Value),
    /// Inclusive lower bound on a timestamp column (RFC 3339).
    Gte(&'static str, String),
    /// Inclusive upper bound on a timestamp column (RFC 3339).
    Lte(&'static str, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    /// `(column, ascending)`
    pub order: Option<(&'static str, bool)>,
    pub limit: Option<usize>,
    /// Embed the cashier's `name` and `type` under a `cashiers` key (orders only).
    pub with_cashier: bool,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
            with_cashier: false,
        }
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column, value.into()));
        self
    }

    pub fn gte(mut self, column: &'static str, at: DateTime<Utc>) -> Self {
        self.filters.push(Filter::Gte(column, timestamp(at)));
        self
    }

    pub fn lte(mut self, column: &'static str, at: DateTime<Utc>) -> Self {
        self.filters.push(Filter::Lte(column, timestamp(at)));
        self
    }

    pub fn order_by(mut self, column: &'static str, ascending: bool) -> Self {
        self.order = Some((column, ascending));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn with_cashier(mut self) -> Self {
        self.with_cashier = true;
        self
    }
}

/// Millisecond-precision UTC timestamp used in range filters.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Generic row-level client for the hosted data service.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(&self, query: &Query) -> PosResult<Vec<Value>>;

    /// Insert one row and return it as stored (with id and timestamps).
    async fn insert(&self, table: Table, row: Value) -> PosResult<Value>;

    async fn update(&self, table: Table, id: &str, patch: Value) -> PosResult<()>;

    async fn delete(&self, table: Table, id: &str) -> PosResult<()>;
}

/// Marker returned by every write: the named table's snapshot is stale.
#[must_use = "reload the page snapshot for the invalidated table"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalidation {
    pub table: Table,
}

/// Filter for order reads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderQuery {
    pub cashier_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub with_cashier: bool,
    pub newest_first: bool,
    pub limit: Option<usize>,
}

/// Typed facade over a [`DataStore`].
#[derive(Clone)]
pub struct PosData {
    store: Arc<dyn DataStore>,
}

impl PosData {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    // -- cashiers ----------------------------------------------------------

    pub async fn all_cashiers(&self) -> PosResult<Vec<Cashier>> {
        let rows = self
            .store
            .select(&Query::table(Table::Cashiers).order_by("created_at", false))
            .await?;
        rows.iter().map(Cashier::from_row).collect()
    }

    pub async fn active_cashiers(&self) -> PosResult<Vec<Cashier>> {
        let rows = self
            .store
            .select(&Query::table(Table::Cashiers).eq("is_active", true))
            .await?;
        rows.iter().map(Cashier::from_row).collect()
    }

    pub async fn create_cashier(&self, input: &CashierInput) -> PosResult<Invalidation> {
        input.validate()?;
        self.store
            .insert(Table::Cashiers, to_row(input)?)
            .await?;
        Ok(Invalidation { table: Table::Cashiers })
    }

    pub async fn update_cashier(&self, id: &str, input: &CashierInput) -> PosResult<Invalidation> {
        input.validate()?;
        self.store
            .update(Table::Cashiers, id, to_row(input)?)
            .await?;
        Ok(Invalidation { table: Table::Cashiers })
    }

    pub async fn delete_cashier(&self, id: &str) -> PosResult<Invalidation> {
        self.store.delete(Table::Cashiers, id).await?;
        Ok(Invalidation { table: Table::Cashiers })
    }

    // -- foods -------------------------------------------------------------

    pub async fn all_foods(&self) -> PosResult<Vec<Food>> {
        let rows = self
            .store
            .select(&Query::table(Table::Foods).order_by("created_at", false))
            .await?;
        rows.iter().map(Food::from_row).collect()
    }

    /// Foods offered in order entry, alphabetical.
    pub async fn available_foods(&self) -> PosResult<Vec<Food>> {
        let rows = self
            .store
            .select(
                &Query::table(Table::Foods)
                    .eq("is_available", true)
                    .order_by("name", true),
            )
            .await?;
        rows.iter().map(Food::from_row).collect()
    }

    pub async fn create_food(&self, input: &FoodInput) -> PosResult<Invalidation> {
        input.validate()?;
        self.store.insert(Table::Foods, to_row(input)?).await?;
        Ok(Invalidation { table: Table::Foods })
    }

    pub async fn update_food(&self, id: &str, input: &FoodInput) -> PosResult<Invalidation> {
        input.validate()?;
        self.store.update(Table::Foods, id, to_row(input)?).await?;
        Ok(Invalidation { table: Table::Foods })
    }

    pub async fn set_food_availability(&self, id: &str, available: bool) -> PosResult<Invalidation> {
        self.store
            .update(
                Table::Foods,
                id,
                serde_json::json!({ "is_available": available }),
            )
            .await?;
        Ok(Invalidation { table: Table::Foods })
    }

    pub async fn delete_food(&self, id: &str) -> PosResult<Invalidation> {
        self.store.delete(Table::Foods, id).await?;
        Ok(Invalidation { table: Table::Foods })
    }

    // -- orders ------------------------------------------------------------

    pub async fn orders(&self, q: &OrderQuery) -> PosResult<Vec<Order>> {
        let mut query = Query::table(Table::Orders);
        if let Some(cashier_id) = &q.cashier_id {
            query = query.eq("cashier_id", cashier_id.clone());
        }
        if let Some(since) = q.since {
            query = query.gte("created_at", since);
        }
        if q.newest_first {
            query = query.order_by("created_at", false);
        }
        if let Some(limit) = q.limit {
            query = query.limit(limit);
        }
        if q.with_cashier {
            query = query.with_cashier();
        }
        let rows = self.store.select(&query).await?;
        debug!(table = "orders", rows = rows.len(), "orders fetched");
        rows.iter().map(Order::from_row).collect()
    }

    /// Persist a new order and return the stored row.
    pub async fn insert_order(&self, order: &NewOrder) -> PosResult<Order> {
        let stored = self.store.insert(Table::Orders, to_row(order)?).await?;
        Order::from_row(&stored)
    }

    /// Fetch a single order joined with its cashier's name.
    pub async fn order_with_cashier(&self, id: &str) -> PosResult<Order> {
        let rows = self
            .store
            .select(
                &Query::table(Table::Orders)
                    .eq("id", id.to_string())
                    .with_cashier()
                    .limit(1),
            )
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| PosError::NotFound(format!("Order {id}")))?;
        Order::from_row(row)
    }

    /// Look an order up by its printed number.
    pub async fn order_by_number(&self, order_number: &str) -> PosResult<Order> {
        let rows = self
            .store
            .select(
                &Query::table(Table::Orders)
                    .eq("order_number", order_number.to_string())
                    .with_cashier()
                    .limit(1),
            )
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| PosError::NotFound(format!("Order {order_number}")))?;
        Order::from_row(row)
    }
}

fn to_row<T: serde::Serialize>(value: &T) -> PosResult<Value> {
    serde_json::to_value(value).map_err(|e| PosError::validation(format!("encode row: {e}")))
}
