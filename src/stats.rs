//! Pure reducers over fetched order snapshots.
//!
//! Nothing in here talks to the data service. Pages fetch rows once, keep the
//! unfiltered snapshot, and recompute filters, pagination, breakdowns, CSV
//! exports, and dashboard tiles from it. Every amount is accumulated as a
//! `Decimal`; a missing or non-numeric stored total counts as zero.
//!
//! Functions that depend on "local time" take the time zone as a parameter so
//! callers pass `chrono::Local` and tests pass a fixed offset.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Display;

use crate::models::{Cashier, Order, PaymentType};
use crate::money;

pub const PAGE_SIZE: usize = 10;
pub const RECENT_ORDERS: usize = 5;
pub const LEADERBOARD_SIZE: usize = 4;

pub const CSV_HEADER: &str = "Order Number,Date,Cashier,Payment Type,Customer,Table,Total Amount";

// ---------------------------------------------------------------------------
// Local-day bounds
// ---------------------------------------------------------------------------

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime, earliest: bool) -> DateTime<Utc> {
    let local = tz.from_local_datetime(&naive);
    let resolved = if earliest {
        local.earliest()
    } else {
        local.latest()
    };
    resolved
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// 00:00:00.000 local time on `date`.
pub fn local_day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    resolve_local(tz, date.and_time(chrono::NaiveTime::MIN), true)
}

/// 23:59:59.999 local time on `date`.
pub fn local_day_end<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let end = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN));
    resolve_local(tz, end, false)
}

/// Start of the local day containing `now`.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, now: DateTime<Utc>) -> DateTime<Utc> {
    local_day_start(tz, now.with_timezone(tz).date_naive())
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub payment_type: Option<PaymentType>,
    pub cashier_id: Option<String>,
}

impl OrderFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches<Tz: TimeZone>(&self, order: &Order, tz: &Tz) -> bool {
        if let Some(start) = self.start_date {
            match order.created_at {
                Some(at) if at >= local_day_start(tz, start) => {}
                _ => return false,
            }
        }
        if let Some(end) = self.end_date {
            match order.created_at {
                Some(at) if at <= local_day_end(tz, end) => {}
                _ => return false,
            }
        }
        if let Some(payment) = self.payment_type {
            if order.payment() != Some(payment) {
                return false;
            }
        }
        if let Some(cashier_id) = &self.cashier_id {
            if &order.cashier_id != cashier_id {
                return false;
            }
        }
        true
    }

    /// Filter the full snapshot, keeping its order.
    pub fn apply<'a, Tz: TimeZone>(&self, orders: &'a [Order], tz: &Tz) -> Vec<&'a Order> {
        orders.iter().filter(|o| self.matches(o, tz)).collect()
    }
}

/// Why a filtered list is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    NoOrdersYet,
    NoMatches,
}

impl EmptyState {
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoOrdersYet => "No orders have been placed yet.",
            Self::NoMatches => "Try adjusting your filters to see more results.",
        }
    }
}

pub fn empty_state(snapshot_len: usize, filtered_len: usize) -> Option<EmptyState> {
    match (snapshot_len, filtered_len) {
        (_, n) if n > 0 => None,
        (0, _) => Some(EmptyState::NoOrdersYet),
        _ => Some(EmptyState::NoMatches),
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// 1-based page cursor of fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: usize,
    per_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(per_page: usize) -> Self {
        Self {
            page: 1,
            per_page: per_page.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.per_page)
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn next(&mut self, total: usize) {
        self.page = (self.page + 1).min(self.page_count(total).max(1));
    }

    pub fn prev(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    /// Jump to `page`, clamped into `1..=page_count`.
    pub fn go_to(&mut self, page: usize, total: usize) {
        self.page = page.clamp(1, self.page_count(total).max(1));
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.page - 1) * self.per_page;
        if start >= items.len() {
            return &[];
        }
        let end = (start + self.per_page).min(items.len());
        &items[start..end]
    }
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub count: usize,
    pub amount: Decimal,
}

impl Totals {
    pub fn of<'a, I>(orders: I) -> Self
    where
        I: IntoIterator<Item = &'a Order>,
    {
        orders.into_iter().fold(Self::default(), |mut acc, o| {
            acc.add(o);
            acc
        })
    }

    fn add(&mut self, order: &Order) {
        self.count += 1;
        self.amount = self.amount.saturating_add(order.amount());
    }
}

/// Overall and per-payment-type totals of a filtered set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaymentBreakdown {
    pub total: Totals,
    pub cash: Totals,
    pub transfer: Totals,
    pub pos: Totals,
}

impl PaymentBreakdown {
    pub fn of<'a, I>(orders: I) -> Self
    where
        I: IntoIterator<Item = &'a Order>,
    {
        let mut out = Self::default();
        for order in orders {
            out.total.add(order);
            match order.payment() {
                Some(PaymentType::Cash) => out.cash.add(order),
                Some(PaymentType::Transfer) => out.transfer.add(order),
                Some(PaymentType::Pos) => out.pos.add(order),
                None => {}
            }
        }
        out
    }

    pub fn for_type(&self, payment: PaymentType) -> Totals {
        match payment {
            PaymentType::Cash => self.cash,
            PaymentType::Transfer => self.transfer,
            PaymentType::Pos => self.pos,
        }
    }
}

/// My Orders tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CashierSummary {
    pub all_time: Totals,
    pub today: Totals,
}

impl CashierSummary {
    pub fn new(all: &[Order], today: &[Order]) -> Self {
        Self {
            all_time: Totals::of(all),
            today: Totals::of(today),
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_orders: usize,
    pub total_revenue: Decimal,
    pub active_cashiers: usize,
    pub available_foods: usize,
    pub today_orders: usize,
    pub today_revenue: Decimal,
}

impl DashboardStats {
    pub fn new(all: &[Order], today: &[Order], active_cashiers: usize, available_foods: usize) -> Self {
        let all_totals = Totals::of(all);
        let today_totals = Totals::of(today);
        Self {
            total_orders: all_totals.count,
            total_revenue: all_totals.amount,
            active_cashiers,
            available_foods,
            today_orders: today_totals.count,
            today_revenue: today_totals.amount,
        }
    }
}

/// The `n` newest orders. Orders without a timestamp sort last.
pub fn recent_orders(orders: &[Order], n: usize) -> Vec<Order> {
    let mut sorted: Vec<&Order> = orders.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sorted.into_iter().take(n).cloned().collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub cashier: Cashier,
    pub today: Totals,
}

/// Today's revenue per active cashier, highest first, top
/// [`LEADERBOARD_SIZE`]. Ties keep fetch order.
pub fn leaderboard(cashiers: &[Cashier], today: &[Order]) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = cashiers
        .iter()
        .map(|c| LeaderboardEntry {
            cashier: c.clone(),
            today: Totals::of(today.iter().filter(|o| o.cashier_id == c.id)),
        })
        .collect();
    entries.sort_by(|a, b| b.today.amount.cmp(&a.today.amount));
    entries.truncate(LEADERBOARD_SIZE);
    entries
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Quote a field when it contains a delimiter, quote, or line break.
pub fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

pub fn csv_row<Tz>(order: &Order, tz: &Tz, currency: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = order
        .created_at
        .map(|at| at.with_timezone(tz).format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default();
    let fields = [
        order.order_number.clone().unwrap_or_default(),
        date,
        order.cashier_name.clone().unwrap_or_default(),
        order.payment_type.to_uppercase(),
        order.customer_name.clone().unwrap_or_else(|| "N/A".to_string()),
        order.table_number.clone().unwrap_or_else(|| "N/A".to_string()),
        money::format_currency(currency, order.amount()),
    ];
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Header plus one line per order, `\n` separated.
pub fn export_csv<'a, I, Tz>(orders: I, tz: &Tz, currency: &str) -> String
where
    I: IntoIterator<Item = &'a Order>,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = vec![CSV_HEADER.to_string()];
    lines.extend(orders.into_iter().map(|o| csv_row(o, tz, currency)));
    lines.join("\n")
}

pub fn csv_file_name(date: NaiveDate) -> String {
    format!("orders-{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CashierType;
    use chrono::FixedOffset;
    use serde_json::json;

    /// West Africa Time, UTC+1.
    fn wat() -> FixedOffset {
        FixedOffset::east_opt(3600).expect("offset")
    }

    fn order(id: &str, cashier: &str, payment: &str, amount: serde_json::Value, at: &str) -> Order {
        Order::from_row(&json!({
            "id": id,
            "order_number": format!("ORD{id}"),
            "cashier_id": cashier,
            "payment_type": payment,
            "total_amount": amount,
            "created_at": at,
            "order_items": "[]",
            "cashiers": { "name": format!("Cashier {cashier}") }
        }))
        .expect("order")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn sample() -> Vec<Order> {
        vec![
            // 2024-05-01 23:30 local
            order("1", "c1", "cash", json!(1500), "2024-05-01T22:30:00Z"),
            // 2024-05-02 00:30 local
            order("2", "c2", "pos", json!("700.50"), "2024-05-01T23:30:00Z"),
            order("3", "c2", "transfer", json!(null), "2024-05-02T12:00:00Z"),
            order("4", "c1", "cash", json!(300), "2024-05-03T09:00:00Z"),
        ]
    }

    #[test]
    fn date_range_uses_local_day_bounds() {
        let orders = sample();
        let filter = OrderFilter {
            start_date: Some(date(2024, 5, 2)),
            end_date: Some(date(2024, 5, 2)),
            ..OrderFilter::default()
        };
        let ids: Vec<&str> = filter
            .apply(&orders, &wat())
            .iter()
            .map(|o| o.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "3"]);

        assert_eq!(
            local_day_end(&wat(), date(2024, 5, 2)).to_rfc3339(),
            "2024-05-02T22:59:59.999+00:00"
        );
    }

    #[test]
    fn empty_range_reports_no_matches() {
        let orders = sample();
        let filter = OrderFilter {
            start_date: Some(date(2023, 1, 1)),
            end_date: Some(date(2023, 1, 31)),
            ..OrderFilter::default()
        };
        let filtered = filter.apply(&orders, &wat());
        assert!(filtered.is_empty());
        assert_eq!(empty_state(orders.len(), filtered.len()), Some(EmptyState::NoMatches));
        assert_eq!(empty_state(0, 0), Some(EmptyState::NoOrdersYet));
        assert_eq!(empty_state(4, 1), None);
    }

    #[test]
    fn payment_and_cashier_filters_combine() {
        let orders = sample();
        let filter = OrderFilter {
            payment_type: Some(PaymentType::Cash),
            cashier_id: Some("c1".into()),
            ..OrderFilter::default()
        };
        assert_eq!(filter.apply(&orders, &wat()).len(), 2);
        assert!(!filter.is_empty());
        assert!(OrderFilter::default().is_empty());
    }

    #[test]
    fn totals_saturate_on_huge_amounts() {
        let at = "2024-05-01T10:00:00Z";
        let orders = vec![
            order("a", "c1", "cash", json!("79228162514264337593543950335"), at),
            order("b", "c1", "cash", json!("79228162514264337593543950335"), at),
        ];
        let totals = Totals::of(&orders);
        assert_eq!(totals.count, 2);
        assert_eq!(totals.amount, Decimal::MAX);
    }

    #[test]
    fn breakdown_counts_and_amounts() {
        let orders = sample();
        let b = PaymentBreakdown::of(&orders);
        assert_eq!(b.total.count, 4);
        assert_eq!(b.total.amount, Decimal::new(250050, 2));
        assert_eq!(b.cash, Totals { count: 2, amount: Decimal::from(1800) });
        assert_eq!(b.pos.amount, Decimal::new(70050, 2));
        // null total counts as zero but the order still counts
        assert_eq!(b.transfer, Totals { count: 1, amount: Decimal::ZERO });
        assert_eq!(b.for_type(PaymentType::Pos).count, 1);
    }

    #[test]
    fn pagination_clamps_and_resets() {
        let items: Vec<usize> = (0..23).collect();
        let mut p = Pagination::default();
        assert_eq!(p.page_count(items.len()), 3);
        assert_eq!(p.slice(&items), &items[0..10]);

        p.prev();
        assert_eq!(p.page(), 1);
        p.next(items.len());
        p.next(items.len());
        p.next(items.len());
        assert_eq!(p.page(), 3);
        assert_eq!(p.slice(&items), &items[20..23]);

        p.reset();
        assert_eq!(p.page(), 1);
        p.go_to(99, items.len());
        assert_eq!(p.page(), 3);
        p.go_to(2, 0);
        assert_eq!(p.page(), 1);
        assert!(Pagination::default().slice::<usize>(&[]).is_empty());
    }

    #[test]
    fn csv_export_formats_and_quotes() {
        let mut orders = sample();
        orders[0].customer_name = Some("Ada, \"VIP\"".into());
        orders[0].table_number = Some("4".into());
        let csv = export_csv(&orders[..2], &wat(), "₦");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "ORD1,01/05/2024 23:30,Cashier c1,CASH,\"Ada, \"\"VIP\"\"\",4,₦1500.00"
        );
        assert_eq!(lines[2], "ORD2,02/05/2024 00:30,Cashier c2,POS,N/A,N/A,₦700.50");
        assert_eq!(csv_file_name(date(2024, 5, 3)), "orders-2024-05-03.csv");
    }

    #[test]
    fn dashboard_and_leaderboard() {
        let orders = sample();
        let today = &orders[2..];
        let stats = DashboardStats::new(&orders, today, 3, 12);
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.today_orders, 2);
        assert_eq!(stats.today_revenue, Decimal::from(300));

        let cashier = |id: &str| Cashier {
            id: id.into(),
            name: id.to_uppercase(),
            cashier_type: CashierType::Cash,
            is_active: true,
            created_at: None,
        };
        let cashiers = vec![cashier("c0"), cashier("c2"), cashier("c1"), cashier("c3"), cashier("c4")];
        let board = leaderboard(&cashiers, &orders);
        let ids: Vec<&str> = board.iter().map(|e| e.cashier.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c0", "c3"]);
        assert_eq!(board[0].today.count, 2);

        let recent = recent_orders(&orders, RECENT_ORDERS);
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].id, "4");
    }

    #[test]
    fn local_midnight_follows_the_offset() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T23:30:00Z")
            .expect("parse")
            .with_timezone(&Utc);
        // 00:30 on May 2nd in UTC+1
        assert_eq!(
            local_midnight(&wat(), now).to_rfc3339(),
            "2024-05-01T23:00:00+00:00"
        );
    }
}
