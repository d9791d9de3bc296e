//! All orders (administrator): filters, pagination, breakdown, CSV export.
//!
//! The page fetches every order once, newest first, together with the
//! active cashiers for the cashier filter. Filtering and paging run over that
//! snapshot without another round trip.

use chrono::{NaiveDate, TimeZone};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{PosError, PosResult};
use crate::fetch::RequestTracker;
use crate::models::{Cashier, Order};
use crate::session::{self, Session};
use crate::stats::{self, EmptyState, OrderFilter, Pagination, PaymentBreakdown};
use crate::store::{OrderQuery, PosData};

pub struct OrdersPage<Tz: TimeZone> {
    data: PosData,
    tracker: RequestTracker,
    tz: Tz,
    orders: Vec<Order>,
    cashiers: Vec<Cashier>,
    filter: OrderFilter,
    /// Indices into `orders` that pass `filter`.
    filtered: Vec<usize>,
    pagination: Pagination,
}

impl<Tz> OrdersPage<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn open(data: PosData, session: Option<&Session>, tz: Tz) -> PosResult<Self> {
        session::require_admin(session)?;
        Ok(Self {
            data,
            tracker: RequestTracker::new("orders"),
            tz,
            orders: Vec::new(),
            cashiers: Vec::new(),
            filter: OrderFilter::default(),
            filtered: Vec::new(),
            pagination: Pagination::default(),
        })
    }

    pub async fn load(&mut self) -> PosResult<()> {
        let ticket = self.tracker.begin();
        let query = OrderQuery {
            with_cashier: true,
            newest_first: true,
            ..OrderQuery::default()
        };
        let data = self.data.clone();
        let fetch = async move {
            tokio::try_join!(data.orders(&query), data.active_cashiers())
        };
        if let Some((orders, cashiers)) = self.tracker.run(ticket, fetch).await? {
            debug!(orders = orders.len(), cashiers = cashiers.len(), "orders loaded");
            self.orders = orders;
            self.cashiers = cashiers;
            self.refilter();
            self.pagination.reset();
        }
        Ok(())
    }

    fn refilter(&mut self) {
        self.filtered = self
            .orders
            .iter()
            .enumerate()
            .filter(|(_, o)| self.filter.matches(o, &self.tz))
            .map(|(i, _)| i)
            .collect();
    }

    /// Cashiers offered by the cashier filter.
    pub fn cashiers(&self) -> &[Cashier] {
        &self.cashiers
    }

    pub fn filter(&self) -> &OrderFilter {
        &self.filter
    }

    /// Replace the filter and go back to page 1.
    pub fn set_filter(&mut self, filter: OrderFilter) {
        self.filter = filter;
        self.refilter();
        self.pagination.reset();
    }

    pub fn reset_filters(&mut self) {
        self.set_filter(OrderFilter::default());
    }

    pub fn total_orders(&self) -> usize {
        self.orders.len()
    }

    pub fn filtered(&self) -> Vec<&Order> {
        self.filtered.iter().map(|&i| &self.orders[i]).collect()
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// Rows on the current page.
    pub fn page_orders(&self) -> Vec<&Order> {
        self.pagination
            .slice(&self.filtered)
            .iter()
            .map(|&i| &self.orders[i])
            .collect()
    }

    pub fn page(&self) -> usize {
        self.pagination.page()
    }

    pub fn page_count(&self) -> usize {
        self.pagination.page_count(self.filtered.len())
    }

    pub fn next_page(&mut self) {
        self.pagination.next(self.filtered.len());
    }

    pub fn prev_page(&mut self) {
        self.pagination.prev();
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.pagination.go_to(page, self.filtered.len());
    }

    pub fn breakdown(&self) -> PaymentBreakdown {
        PaymentBreakdown::of(self.filtered.iter().map(|&i| &self.orders[i]))
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        stats::empty_state(self.orders.len(), self.filtered.len())
    }

    pub fn order(&self, id: &str) -> PosResult<&Order> {
        self.orders
            .iter()
            .find(|o| o.id == id || o.order_number.as_deref() == Some(id))
            .ok_or_else(|| PosError::NotFound(format!("Order {id}")))
    }

    /// CSV of the filtered orders.
    pub fn export_csv(&self, currency: &str) -> String {
        stats::export_csv(
            self.filtered.iter().map(|&i| &self.orders[i]),
            &self.tz,
            currency,
        )
    }

    /// Write the CSV export into `dir` as `orders-{date}.csv`.
    pub fn write_csv(&self, dir: &Path, date: NaiveDate, currency: &str) -> PosResult<PathBuf> {
        if self.filtered.is_empty() {
            return Err(PosError::validation("No orders to export"));
        }
        fs::create_dir_all(dir)?;
        let path = dir.join(stats::csv_file_name(date));
        fs::write(&path, self.export_csv(currency))?;
        info!(path = %path.display(), rows = self.filtered.len(), "orders exported");
        Ok(path)
    }

    pub fn leave(&self) {
        self.tracker.leave();
    }
}
