//! Order entry (cashier).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;

use crate::cart::{self, Cart};
use crate::checkout;
use crate::error::{PosError, PosResult};
use crate::fetch::RequestTracker;
use crate::models::{Cashier, Food, Order, PaymentType};
use crate::session::{self, Session};
use crate::store::PosData;

pub struct NewOrderPage {
    data: PosData,
    tracker: RequestTracker,
    cashier: Cashier,
    foods: Vec<Food>,
    cart: Cart,
    payment: PaymentType,
    customer_name: String,
}

impl NewOrderPage {
    pub fn open(data: PosData, session: Option<&Session>) -> PosResult<Self> {
        let cashier = session::require_cashier(session)?.clone();
        let payment = cashier.cashier_type.default_payment_type();
        Ok(Self {
            data,
            tracker: RequestTracker::new("new-order"),
            cashier,
            foods: Vec::new(),
            cart: Cart::new(),
            payment,
            customer_name: String::new(),
        })
    }

    pub fn cashier(&self) -> &Cashier {
        &self.cashier
    }

    /// Load the available menu, alphabetical.
    pub async fn load(&mut self) -> PosResult<()> {
        let ticket = self.tracker.begin();
        if let Some(foods) = self.tracker.run(ticket, self.data.available_foods()).await? {
            debug!(count = foods.len(), "menu loaded");
            self.foods = foods;
        }
        Ok(())
    }

    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    pub fn search(&self, term: &str) -> Vec<&Food> {
        cart::search(&self.foods, term)
    }

    pub fn quick_add(&self) -> &[Food] {
        cart::quick_add(&self.foods)
    }

    /// Add one of the menu item `food_id` to the cart.
    pub fn add(&mut self, food_id: &str) -> PosResult<()> {
        let food = self
            .foods
            .iter()
            .find(|f| f.id == food_id)
            .ok_or_else(|| PosError::NotFound(format!("Food {food_id}")))?;
        self.cart.add_item(food);
        Ok(())
    }

    pub fn set_quantity(&mut self, food_id: &str, quantity: i64) {
        self.cart.set_quantity(food_id, quantity);
    }

    pub fn remove(&mut self, food_id: &str) {
        self.cart.remove_item(food_id);
    }

    pub fn clear(&mut self) {
        self.cart.clear();
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn total(&self) -> Decimal {
        self.cart.total()
    }

    pub fn payment(&self) -> PaymentType {
        self.payment
    }

    /// Payment methods offered to this cashier.
    pub fn payment_options(&self) -> &'static [PaymentType] {
        self.cashier.cashier_type.allowed_payment_types()
    }

    pub fn set_payment(&mut self, payment: PaymentType) -> PosResult<()> {
        if !self.cashier.cashier_type.allows(payment) {
            return Err(PosError::validation(format!(
                "{} cashiers cannot take {} payments",
                self.cashier.cashier_type.label(),
                payment.label()
            )));
        }
        self.payment = payment;
        Ok(())
    }

    pub fn set_customer_name(&mut self, name: impl Into<String>) {
        self.customer_name = name.into();
    }

    /// Persist the cart. On success the form resets and the stored order
    /// is returned for the receipt; on failure the cart is kept.
    pub async fn submit(&mut self, submitted_at: DateTime<Utc>) -> PosResult<Order> {
        let order = checkout::submit(
            &self.data,
            &mut self.cart,
            &self.cashier,
            Some(&self.customer_name),
            self.payment,
            submitted_at,
        )
        .await?;
        self.customer_name.clear();
        self.payment = self.cashier.cashier_type.default_payment_type();
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
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    async fn page(kind: CashierType) -> (Arc<MemoryStore>, NewOrderPage) {
        let store = Arc::new(MemoryStore::new());
        let row = store
            .seed(
                Table::Cashiers,
                json!({ "name": "Musa", "type": kind.as_str(), "is_active": true }),
            )
            .await;
        for (id, name, price, available) in [
            ("f-1", "Jollof Rice", 1500, true),
            ("f-2", "Coke", 300, true),
            ("f-3", "Suya", 2000, false),
        ] {
            store
                .seed(
                    Table::Foods,
                    json!({ "id": id, "name": name, "price": price, "is_available": available }),
                )
                .await;
        }
        let cashier = Cashier::from_row(&row).expect("cashier");
        let data = PosData::new(store.clone());
        let mut page = NewOrderPage::open(data, Some(&Session::Cashier(cashier))).expect("open");
        page.load().await.expect("load");
        (store, page)
    }

    #[tokio::test]
    async fn administrators_are_sent_to_cashier_mode() {
        let data = PosData::new(Arc::new(MemoryStore::new()));
        let err = NewOrderPage::open(data, Some(&Session::Administrator))
            .err()
            .expect("forbidden");
        assert_eq!(err.to_string(), "Please switch to cashier mode first");
    }

    #[tokio::test]
    async fn menu_shows_available_foods_only() {
        let (_, page) = page(CashierType::Cash).await;
        let names: Vec<&str> = page.foods().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Coke", "Jollof Rice"]);
        assert_eq!(page.search("jol").len(), 1);
        assert!(page.search("suya").is_empty());
    }

    #[tokio::test]
    async fn cart_flow_and_submit() {
        let (store, mut page) = page(CashierType::TransferPos).await;
        assert_eq!(page.payment(), PaymentType::Transfer);

        page.add("f-1").expect("add");
        page.add("f-2").expect("add");
        page.add("f-2").expect("add");
        assert!(matches!(page.add("f-3"), Err(PosError::NotFound(_))));
        page.set_quantity("f-1", 2);
        assert_eq!(page.total(), Decimal::from(3600));

        assert!(page.set_payment(PaymentType::Cash).is_err());
        page.set_payment(PaymentType::Pos).expect("pos");
        page.set_customer_name("Aisha");

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single().expect("time");
        let order = page.submit(at).await.expect("submit");
        assert_eq!(order.payment(), Some(PaymentType::Pos));
        assert_eq!(order.customer_name.as_deref(), Some("Aisha"));
        assert_eq!(order.cashier_name.as_deref(), Some("Musa"));
        assert_eq!(order.amount(), Decimal::from(3600));
        assert_eq!(store.write_count(), 1);

        assert!(page.cart().is_empty());
        assert_eq!(page.payment(), PaymentType::Transfer);
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_any_write() {
        let (store, mut page) = page(CashierType::Cash).await;
        let err = page.submit(Utc::now()).await.expect_err("empty cart");
        assert_eq!(err.to_string(), "Please add items to create order");
        assert_eq!(store.write_count(), 0);
    }
}
