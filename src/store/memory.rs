//! In-process [`DataStore`] used by tests and dry runs.
//!
//! Evaluates the same filters, ordering and cashier join as the hosted
//! service. Inserted rows get a v4 uuid and a `created_at` stamp that is
//! strictly increasing, so "newest first" is deterministic.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use super::{timestamp, DataStore, Filter, Query, Table};
use crate::error::{PosError, PosResult};
use crate::models::value_str;

#[derive(Default)]
struct Tables {
    rows: HashMap<Table, Vec<Value>>,
    last_stamp: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    writes: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of insert/update/delete calls that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    /// Make every subsequent call fail like an unreachable service.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    /// Insert a row without counting it as a write. Returns the stored row.
    pub async fn seed(&self, table: Table, row: Value) -> Value {
        self.store_row(table, row).unwrap_or(Value::Null)
    }

    fn check_online(&self) -> PosResult<()> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(PosError::data_service(
                "Network error: unable to reach the data service",
            ));
        }
        Ok(())
    }

    fn lock(&self) -> PosResult<std::sync::MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|e| PosError::data_service(format!("memory store poisoned: {e}")))
    }

    fn store_row(&self, table: Table, row: Value) -> PosResult<Value> {
        let Value::Object(mut fields) = row else {
            return Err(PosError::validation("row must be a JSON object"));
        };
        let mut tables = self.lock()?;
        let now = Utc::now();
        let stamp = match tables.last_stamp {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        tables.last_stamp = Some(stamp);

        if !fields.contains_key("id") {
            fields.insert("id".into(), json!(uuid::Uuid::new_v4().to_string()));
        }
        if !fields.contains_key("created_at") {
            fields.insert("created_at".into(), json!(timestamp(stamp)));
        }
        let stored = Value::Object(fields);
        tables.rows.entry(table).or_default().push(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(&self, query: &Query) -> PosResult<Vec<Value>> {
        self.check_online()?;
        let tables = self.lock()?;
        let empty = Vec::new();
        let rows = tables.rows.get(&query.table).unwrap_or(&empty);

        let mut out: Vec<Value> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| matches_filter(row, f)))
            .cloned()
            .collect();

        if let Some((column, ascending)) = query.order {
            out.sort_by(|a, b| {
                let ord = compare_values(a.get(column), b.get(column));
                if ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        if let Some(limit) = query.limit {
            out.truncate(limit);
        }
        if query.with_cashier {
            let cashiers = tables.rows.get(&Table::Cashiers).unwrap_or(&empty);
            for row in &mut out {
                let joined = value_str(row, &["cashier_id"])
                    .and_then(|id| {
                        cashiers
                            .iter()
                            .find(|c| value_str(c, &["id"]).as_deref() == Some(id.as_str()))
                    })
                    .map(|c| {
                        json!({
                            "name": c.get("name").cloned().unwrap_or(Value::Null),
                            "type": c.get("type").cloned().unwrap_or(Value::Null),
                        })
                    })
                    .unwrap_or(Value::Null);
                if let Value::Object(fields) = row {
                    fields.insert("cashiers".into(), joined);
                }
            }
        }
        Ok(out)
    }

    async fn insert(&self, table: Table, row: Value) -> PosResult<Value> {
        self.check_online()?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        self.store_row(table, row)
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> PosResult<()> {
        self.check_online()?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        let Value::Object(patch) = patch else {
            return Err(PosError::validation("patch must be a JSON object"));
        };
        let mut tables = self.lock()?;
        if let Some(row) = tables
            .rows
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|r| row_id(r).as_deref() == Some(id)))
        {
            merge(row, patch);
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> PosResult<()> {
        self.check_online()?;
        self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        let mut tables = self.lock()?;
        if let Some(rows) = tables.rows.get_mut(&table) {
            rows.retain(|r| row_id(r).as_deref() != Some(id));
        }
        Ok(())
    }
}

fn row_id(row: &Value) -> Option<String> {
    value_str(row, &["id"])
}

fn merge(row: &mut Value, patch: Map<String, Value>) {
    if let Value::Object(fields) = row {
        for (k, v) in patch {
            fields.insert(k, v);
        }
    }
}

fn matches_filter(row: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq(column, expected) => match (row.get(*column), expected) {
            (Some(actual), expected) if actual == expected => true,
            // ids compare as text whether stored as numbers or strings
            (Some(Value::Number(n)), Value::String(s)) => n.to_string() == *s,
            (Some(Value::String(s)), Value::Number(n)) => n.to_string() == *s,
            _ => false,
        },
        Filter::Gte(column, bound) => compare_time(row, column, bound).is_some_and(|o| o.is_ge()),
        Filter::Lte(column, bound) => compare_time(row, column, bound).is_some_and(|o| o.is_le()),
    }
}

fn compare_time(row: &Value, column: &str, bound: &str) -> Option<Ordering> {
    let actual = DateTime::parse_from_rfc3339(row.get(column)?.as_str()?).ok()?;
    let bound = DateTime::parse_from_rfc3339(bound).ok()?;
    Some(actual.cmp(&bound))
}

/// Nulls and missing values sort last in ascending order.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
