//! Order submission.
//!
//! Validation happens before any call to the data service: an empty cart or
//! a payment method the cashier may not take is rejected with the cart left
//! untouched. A successful submit persists a snapshot of the cart, re-reads
//! the stored row with the cashier join, and clears the cart.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::cart::Cart;
use crate::error::{PosError, PosResult};
use crate::models::{Cashier, NewOrder, Order, PaymentType};
use crate::store::PosData;

/// `ORD` followed by the submission time in Unix milliseconds.
pub fn order_number(submitted_at: DateTime<Utc>) -> String {
    format!("ORD{}", submitted_at.timestamp_millis())
}

/// Check a submission without touching the data service.
pub fn validate(cart: &Cart, cashier: &Cashier, payment: PaymentType) -> PosResult<()> {
    if cart.is_empty() {
        return Err(PosError::validation("Please add items to create order"));
    }
    if !cashier.cashier_type.allows(payment) {
        let allowed: Vec<&str> = cashier
            .cashier_type
            .allowed_payment_types()
            .iter()
            .map(PaymentType::label)
            .collect();
        return Err(PosError::validation(format!(
            "{} cashiers can only take {} payments",
            cashier.cashier_type.label(),
            allowed.join(" or ")
        )));
    }
    Ok(())
}

/// Build the insert payload for the current cart.
pub fn build_order(
    cart: &Cart,
    cashier: &Cashier,
    customer_name: Option<&str>,
    payment: PaymentType,
    submitted_at: DateTime<Utc>,
) -> PosResult<NewOrder> {
    validate(cart, cashier, payment)?;
    let customer_name = customer_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(NewOrder {
        order_number: order_number(submitted_at),
        cashier_id: cashier.id.clone(),
        payment_type: payment,
        total_amount: cart.total(),
        customer_name,
        order_items: serde_json::to_string(&cart.snapshot())?,
    })
}

/// Persist the cart as an order for `cashier` and return the stored order
/// ready for the receipt.
pub async fn submit(
    data: &PosData,
    cart: &mut Cart,
    cashier: &Cashier,
    customer_name: Option<&str>,
    payment: PaymentType,
    submitted_at: DateTime<Utc>,
) -> PosResult<Order> {
    let new_order = build_order(cart, cashier, customer_name, payment, submitted_at)?;

    let inserted = data.insert_order(&new_order).await?;
    let mut order = match data.order_with_cashier(&inserted.id).await {
        Ok(order) => order,
        Err(e) => {
            // the row is stored; fall back to what the insert returned
            warn!(order_id = %inserted.id, error = %e, "re-fetch after insert failed");
            inserted
        }
    };
    if order.cashier_name.is_none() {
        order.cashier_name = Some(cashier.name.clone());
    }

    cart.clear();
    info!(
        order_number = %new_order.order_number,
        cashier = %cashier.name,
        payment = %payment,
        total = %new_order.total_amount,
        "order created"
    );
    Ok(order)
}
