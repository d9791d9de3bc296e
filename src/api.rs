//! REST client for the hosted data service (PostgREST / Supabase).
//!
//! Implements [`DataStore`] over `<url>/rest/v1/<table>` with the project's
//! anon key in the `apikey` and `Authorization: Bearer` headers. Also decodes
//! connection strings and runs the connectivity check behind `pos configure`.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{PosError, PosResult};
use crate::store::{DataStore, Filter, Query, Table};

/// Timeout used for the lightweight connectivity test.
const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Embedded join used when a query asks for the cashier's name.
const CASHIER_EMBED: &str = "*,cashiers:cashier_id(name,type)";

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise the data-service URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
/// - strip a trailing `/rest/v1` segment
pub fn normalize_service_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if url.is_empty() {
        return url;
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }
    if url.ends_with("/rest/v1") {
        url.truncate(url.len() - "/rest/v1".len());
    }
    while url.ends_with('/') {
        url.pop();
    }

    url
}

fn decode_connection_string_payload(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<Value>(trimmed).ok();
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.starts_with('{') {
        return serde_json::from_str::<Value>(&compact).ok();
    }
    if compact.len() < 20 {
        return None;
    }

    let base64 = compact.replace('-', "+").replace('_', "/");
    let padded = format!(
        "{}{}",
        base64,
        "=".repeat((4usize.wrapping_sub(base64.len() % 4)) % 4)
    );
    let decoded = BASE64_STANDARD.decode(padded).ok()?;
    serde_json::from_slice::<Value>(&decoded).ok()
}

/// Decode a connection string (`{"url":..,"key":..}` as JSON or base64 JSON)
/// into a normalised `(url, key)` pair.
pub fn parse_connection_string(raw: &str) -> Option<(String, String)> {
    let payload = decode_connection_string_payload(raw)?;
    let url = payload
        .get("url")
        .and_then(Value::as_str)
        .map(normalize_service_url)
        .filter(|s| !s.is_empty())?;
    let key = payload
        .get("key")
        .or_else(|| payload.get("anon_key"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())?;
    Some((url, key))
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> PosError {
    let msg = if err.is_connect() {
        format!("Cannot reach the data service at {url}")
    } else if err.is_timeout() {
        format!("Connection to {url} timed out")
    } else if err.is_builder() {
        format!("Invalid data service URL: {url}")
    } else {
        format!("Network error communicating with {url}: {err}")
    };
    PosError::DataService(msg)
}

/// Convert an HTTP status code into a user-friendly message.
fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "API key is invalid or expired".to_string(),
        403 => "Access to this table is not permitted".to_string(),
        404 => "Data service table not found".to_string(),
        s if s >= 500 => format!("Data service server error (HTTP {s})"),
        s => format!("Unexpected response from the data service (HTTP {s})"),
    }
}

/// Build an error from a non-success response body, keeping PostgREST's
/// `message`/`details` when present.
fn error_from_body(status: StatusCode, body_text: &str) -> PosError {
    let detail = if let Ok(json) = serde_json::from_str::<Value>(body_text) {
        let message = json
            .get("message")
            .or_else(|| json.get("error"))
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .unwrap_or_else(|| status_error(status));
        match json.get("details").and_then(Value::as_str) {
            Some(details) if !details.trim().is_empty() => {
                format!("{message} (HTTP {}): {details}", status.as_u16())
            }
            _ => format!("{message} (HTTP {})", status.as_u16()),
        }
    } else if !body_text.trim().is_empty() {
        format!(
            "{} (HTTP {}): {}",
            status_error(status),
            status.as_u16(),
            body_text.trim()
        )
    } else {
        format!("{} (HTTP {})", status_error(status), status.as_u16())
    };
    PosError::DataService(detail)
}

// ---------------------------------------------------------------------------
// Query encoding
// ---------------------------------------------------------------------------

/// Render a filter value the way PostgREST expects it after `eq.`.
fn filter_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Query-string pairs for a select.
pub fn query_params(query: &Query) -> Vec<(String, String)> {
    let select = if query.with_cashier { CASHIER_EMBED } else { "*" };
    let mut params = vec![("select".to_string(), select.to_string())];
    for filter in &query.filters {
        let (column, value) = match filter {
            Filter::Eq(c, v) => (c, format!("eq.{}", filter_value(v))),
            Filter::Gte(c, at) => (c, format!("gte.{at}")),
            Filter::Lte(c, at) => (c, format!("lte.{at}")),
        };
        params.push((column.to_string(), value));
    }
    if let Some((column, ascending)) = query.order {
        let dir = if ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{column}.{dir}")));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct SupabaseStore {
    base_url: String,
    anon_key: String,
    client: Client,
}

impl SupabaseStore {
    pub fn new(url: &str, anon_key: &str, timeout: Duration) -> PosResult<Self> {
        let base_url = normalize_service_url(url);
        if base_url.is_empty() {
            return Err(PosError::Config("data service URL is empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PosError::data_service(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url,
            anon_key: anon_key.trim().to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/rest/v1/<table>` with the given query pairs appended.
    pub fn table_url(&self, table: Table, params: &[(String, String)]) -> PosResult<Url> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, table.as_str()))
            .map_err(|e| PosError::Config(format!("Invalid data service URL: {e}")))?;
        if !params.is_empty() {
            let mut qp = url.query_pairs_mut();
            for (k, v) in params {
                qp.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> PosResult<Value> {
        debug!(%method, %url, "data service request");
        let mut req = self
            .client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation");
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| friendly_error(&self.base_url, &e))?;
        let status = resp.status();
        let body_text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let err = error_from_body(status, &body_text);
            warn!(status = status.as_u16(), error = %err, "data service request failed");
            return Err(err);
        }
        if body_text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body_text)
            .map_err(|e| PosError::data_service(format!("Invalid JSON from the data service: {e}")))
    }

    fn by_id(&self, table: Table, id: &str) -> PosResult<Url> {
        self.table_url(table, &[("id".to_string(), format!("eq.{id}"))])
    }
}

#[async_trait]
impl DataStore for SupabaseStore {
    async fn select(&self, query: &Query) -> PosResult<Vec<Value>> {
        let url = self.table_url(query.table, &query_params(query))?;
        match self.send(Method::GET, url, None).await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(PosError::data_service(format!(
                "Expected a row list from {}, got {}",
                query.table,
                type_name(&other)
            ))),
        }
    }

    async fn insert(&self, table: Table, row: Value) -> PosResult<Value> {
        let url = self.table_url(table, &[])?;
        let stored = match self.send(Method::POST, url, Some(&row)).await? {
            Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            Value::Object(map) => Value::Object(map),
            _ => {
                return Err(PosError::data_service(format!(
                    "Insert into {table} returned no row"
                )))
            }
        };
        info!(table = %table, "row inserted");
        Ok(stored)
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> PosResult<()> {
        let url = self.by_id(table, id)?;
        self.send(Method::PATCH, url, Some(&patch)).await?;
        info!(table = %table, id, "row updated");
        Ok(())
    }

    async fn delete(&self, table: Table, id: &str) -> PosResult<()> {
        let url = self.by_id(table, id)?;
        self.send(Method::DELETE, url, None).await?;
        info!(table = %table, id, "row deleted");
        Ok(())
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Connectivity test
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize)]
pub struct ConnectivityResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Probe the service with a one-row read of `cashiers`.
pub async fn test_connectivity(url: &str, anon_key: &str) -> ConnectivityResult {
    let store = match SupabaseStore::new(url, anon_key, CONNECTIVITY_TIMEOUT) {
        Ok(s) => s,
        Err(e) => {
            return ConnectivityResult {
                success: false,
                latency_ms: None,
                error: Some(e.to_string()),
            }
        }
    };

    let start = Instant::now();
    let result = store.select(&Query::table(Table::Cashiers).limit(1)).await;
    let latency = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => {
            info!(latency_ms = latency, "connectivity test passed");
            ConnectivityResult {
                success: true,
                latency_ms: Some(latency),
                error: None,
            }
        }
        Err(e) => ConnectivityResult {
            success: false,
            latency_ms: Some(latency),
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn normalizes_service_urls() {
        assert_eq!(
            normalize_service_url("abc.supabase.co/rest/v1/"),
            "https://abc.supabase.co"
        );
        assert_eq!(normalize_service_url("localhost:54321/"), "http://localhost:54321");
        assert_eq!(normalize_service_url("  "), "");
    }

    #[test]
    fn connection_string_accepts_json_and_base64() {
        let raw = r#"{"url":"https://abc.supabase.co","key":"anon-123"}"#;
        let expected = Some(("https://abc.supabase.co".to_string(), "anon-123".to_string()));
        assert_eq!(parse_connection_string(raw), expected);

        let encoded = BASE64_STANDARD.encode(raw);
        assert_eq!(parse_connection_string(&encoded), expected);

        assert_eq!(parse_connection_string("short"), None);
        assert_eq!(parse_connection_string(r#"{"url":"https://x.co"}"#), None);
    }

    #[test]
    fn select_params_follow_postgrest_syntax() {
        let since = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single().expect("date");
        let query = Query::table(Table::Orders)
            .eq("cashier_id", "c-1")
            .gte("created_at", since)
            .order_by("created_at", false)
            .limit(5)
            .with_cashier();
        let params = query_params(&query);
        assert_eq!(
            params,
            vec![
                ("select".to_string(), CASHIER_EMBED.to_string()),
                ("cashier_id".to_string(), "eq.c-1".to_string()),
                ("created_at".to_string(), "gte.2024-05-01T00:00:00.000Z".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );

        let bool_query = Query::table(Table::Foods).eq("is_available", true);
        assert_eq!(query_params(&bool_query)[1].1, "eq.true");
    }

    #[test]
    fn table_urls_are_encoded() {
        let store = SupabaseStore::new("abc.supabase.co", "k", Duration::from_secs(5))
            .expect("client");
        let url = store
            .table_url(
                Table::Orders,
                &[("order_number".to_string(), "eq.ORD 1".to_string())],
            )
            .expect("url");
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/rest/v1/orders?order_number=eq.ORD+1"
        );
    }

    #[test]
    fn error_bodies_keep_postgrest_detail() {
        let err = error_from_body(
            StatusCode::BAD_REQUEST,
            &json!({ "message": "invalid input syntax", "details": "column price" }).to_string(),
        );
        assert_eq!(
            err.to_string(),
            "invalid input syntax (HTTP 400): column price"
        );
        let err = error_from_body(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.to_string(), "API key is invalid or expired (HTTP 401)");
    }
}
