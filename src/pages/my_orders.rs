//! The logged-in cashier's own orders.

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;

use crate::error::{PosError, PosResult};
use crate::fetch::RequestTracker;
use crate::models::{Cashier, Order};
use crate::session::{self, Session};
use crate::stats::{self, CashierSummary};
use crate::store::{OrderQuery, PosData};

pub const NO_ORDERS_MESSAGE: &str =
    "You haven't processed any orders yet. Start by creating your first order!";

pub struct MyOrdersPage<Tz: TimeZone> {
    data: PosData,
    tracker: RequestTracker,
    tz: Tz,
    cashier: Cashier,
    orders: Vec<Order>,
    summary: CashierSummary,
}

impl<Tz: TimeZone> MyOrdersPage<Tz> {
    pub fn open(data: PosData, session: Option<&Session>, tz: Tz) -> PosResult<Self> {
        let cashier = session::require_cashier(session)?.clone();
        Ok(Self {
            data,
            tracker: RequestTracker::new("my-orders"),
            tz,
            cashier,
            orders: Vec::new(),
            summary: CashierSummary::default(),
        })
    }

    /// Fetch every order by this cashier plus today's, in parallel.
    pub async fn load(&mut self, now: DateTime<Utc>) -> PosResult<()> {
        let ticket = self.tracker.begin();
        let all = OrderQuery {
            cashier_id: Some(self.cashier.id.clone()),
            newest_first: true,
            ..OrderQuery::default()
        };
        let today = OrderQuery {
            cashier_id: Some(self.cashier.id.clone()),
            since: Some(stats::local_midnight(&self.tz, now)),
            ..OrderQuery::default()
        };
        let data = self.data.clone();
        let fetch = async move { tokio::try_join!(data.orders(&all), data.orders(&today)) };
        if let Some((all, today)) = self.tracker.run(ticket, fetch).await? {
            debug!(all = all.len(), today = today.len(), "cashier orders loaded");
            self.summary = CashierSummary::new(&all, &today);
            self.orders = all;
        }
        Ok(())
    }

    pub fn cashier(&self) -> &Cashier {
        &self.cashier
    }

    /// Newest first.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn summary(&self) -> CashierSummary {
        self.summary
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        self.orders.is_empty().then_some(NO_ORDERS_MESSAGE)
    }

    /// The order ready for the receipt, named after the session cashier.
    pub fn receipt_order(&self, id: &str) -> PosResult<Order> {
        let mut order = self
            .orders
            .iter()
            .find(|o| o.id == id || o.order_number.as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| PosError::NotFound(format!("Order {id}")))?;
        order.cashier_name = Some(self.cashier.name.clone());
        order.cashier_type = Some(self.cashier.cashier_type);
        Ok(order)
    }

    pub fn leave(&self) {
        self.tracker.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CashierType;
    use crate::store::memory::MemoryStore;
    use crate::store::Table;
    use chrono::FixedOffset;
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::sync::Arc;

    fn wat() -> FixedOffset {
        FixedOffset::east_opt(3600).expect("offset")
    }

    fn musa() -> Cashier {
        Cashier {
            id: "c-1".into(),
            name: "Musa".into(),
            cashier_type: CashierType::Cash,
            is_active: true,
            created_at: None,
        }
    }

    async fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for (id, cashier, amount, at) in [
            ("o-1", "c-1", "1500", "2024-05-01T09:00:00.000Z"),
            // 23:30 UTC on the 1st is already the 2nd in WAT
            ("o-2", "c-1", "300", "2024-05-01T23:30:00.000Z"),
            ("o-3", "c-1", "700.50", "2024-05-02T08:00:00.000Z"),
            ("o-4", "c-2", "9999", "2024-05-02T08:00:00.000Z"),
        ] {
            store
                .seed(
                    Table::Orders,
                    json!({
                        "id": id,
                        "order_number": format!("ORD-{id}"),
                        "cashier_id": cashier,
                        "payment_type": "cash",
                        "total_amount": amount,
                        "created_at": at,
                    }),
                )
                .await;
        }
        store
    }

    #[tokio::test]
    async fn summary_uses_the_local_day() {
        let data = PosData::new(store().await);
        let mut page =
            MyOrdersPage::open(data, Some(&Session::Cashier(musa())), wat()).expect("open");
        let now = DateTime::parse_from_rfc3339("2024-05-02T12:00:00Z")
            .expect("parse")
            .with_timezone(&Utc);
        page.load(now).await.expect("load");

        let ids: Vec<&str> = page.orders().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o-3", "o-2", "o-1"]);
        let summary = page.summary();
        assert_eq!(summary.all_time.count, 3);
        assert_eq!(summary.all_time.amount, Decimal::new(250050, 2));
        assert_eq!(summary.today.count, 2);
        assert_eq!(summary.today.amount, Decimal::new(100050, 2));
        assert_eq!(page.empty_message(), None);
    }

    #[tokio::test]
    async fn receipt_order_carries_the_cashier_name() {
        let data = PosData::new(store().await);
        let mut page =
            MyOrdersPage::open(data, Some(&Session::Cashier(musa())), wat()).expect("open");
        page.load(Utc::now()).await.expect("load");
        let order = page.receipt_order("o-1").expect("order");
        assert_eq!(order.cashier_name.as_deref(), Some("Musa"));
        // another cashier's orders are not in this snapshot
        assert!(matches!(page.receipt_order("o-4"), Err(PosError::NotFound(_))));
    }

    #[tokio::test]
    async fn first_shift_shows_the_empty_message() {
        let data = PosData::new(Arc::new(MemoryStore::new()));
        let mut page =
            MyOrdersPage::open(data, Some(&Session::Cashier(musa())), wat()).expect("open");
        page.load(Utc::now()).await.expect("load");
        assert_eq!(page.empty_message(), Some(NO_ORDERS_MESSAGE));
        assert_eq!(page.summary(), CashierSummary::default());
    }
}
