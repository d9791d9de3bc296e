use chrono::{Local, Utc};

use crate::cart;
use crate::cli::{MyOrdersArgs, NewOrderArgs, OrdersArgs};
use crate::error::{PosError, PosResult};
use crate::models::{Cashier, Food, Order, PaymentType};
use crate::money;
use crate::pages::my_orders::MyOrdersPage;
use crate::pages::new_order::NewOrderPage;
use crate::pages::orders::OrdersPage;
use crate::stats::{OrderFilter, PaymentBreakdown};

use super::print::print_order;
use super::{fit, AppContext};

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

fn local_time(order: &Order, pattern: &str) -> String {
    order
        .created_at
        .map(|at| at.with_timezone(&Local).format(pattern).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn order_row(order: &Order, currency: &str) -> String {
    format!(
        "{:<18} {:<16} {:<14} {:<9} {:<16} {:>12}",
        order.order_number.as_deref().unwrap_or("N/A"),
        local_time(order, "%d/%m/%Y %H:%M"),
        fit(order.cashier_name.as_deref().unwrap_or("-"), 14),
        order.payment_type.to_uppercase(),
        fit(order.customer_name.as_deref().unwrap_or("Walk-in"), 16),
        money::format_currency(currency, order.amount()),
    )
}

fn print_order_details(order: &Order, currency: &str) {
    println!("Order:    {}", order.order_number.as_deref().unwrap_or("N/A"));
    println!("Date:     {}", local_time(order, "%d/%m/%Y %H:%M:%S"));
    println!("Cashier:  {}", order.cashier_name.as_deref().unwrap_or("-"));
    println!("Payment:  {}", order.payment_type);
    println!("Customer: {}", order.customer_name.as_deref().unwrap_or("Walk-in"));
    if let Some(table) = &order.table_number {
        println!("Table:    {table}");
    }
    println!("Items:");
    for line in &order.items {
        println!(
            "  {:<24} x{:<4} {:>12}",
            fit(&line.name, 24),
            line.quantity,
            money::format_currency(currency, line.line_total())
        );
    }
    println!("Total:    {}", money::format_currency(currency, order.amount()));
}

fn print_breakdown(breakdown: &PaymentBreakdown, currency: &str) {
    println!(
        "Total: {} orders, {}",
        breakdown.total.count,
        money::format_currency(currency, breakdown.total.amount)
    );
    for payment in PaymentType::ALL {
        let totals = breakdown.for_type(payment);
        println!(
            "  {:<9} {:>4} orders  {}",
            payment.label(),
            totals.count,
            money::format_currency(currency, totals.amount)
        );
    }
}

// ---------------------------------------------------------------------------
// Argument resolution
// ---------------------------------------------------------------------------

/// Split `NAME[:QTY]`. A suffix that is not a number belongs to the name.
fn parse_item_spec(raw: &str) -> PosResult<(String, i64)> {
    let raw = raw.trim();
    if let Some((term, qty)) = raw.rsplit_once(':') {
        if let Ok(qty) = qty.trim().parse::<i64>() {
            if qty < 1 {
                return Err(PosError::validation(format!(
                    "Quantity for '{}' must be at least 1",
                    term.trim()
                )));
            }
            return Ok((term.trim().to_string(), qty));
        }
    }
    Ok((raw.to_string(), 1))
}

/// Resolve a food by id, exact name, or a single search match.
fn resolve_food<'a>(foods: &'a [Food], term: &str) -> PosResult<&'a Food> {
    if let Some(food) = foods
        .iter()
        .find(|f| f.id == term || f.name.eq_ignore_ascii_case(term))
    {
        return Ok(food);
    }
    match cart::search(foods, term).as_slice() {
        [] => Err(PosError::NotFound(format!("Food '{term}'"))),
        [food] => Ok(*food),
        several => {
            let names: Vec<&str> = several.iter().map(|f| f.name.as_str()).collect();
            Err(PosError::validation(format!(
                "'{term}' matches several foods: {}",
                names.join(", ")
            )))
        }
    }
}

fn resolve_cashier(cashiers: &[Cashier], term: &str) -> PosResult<String> {
    cashiers
        .iter()
        .find(|c| c.id == term || c.name.eq_ignore_ascii_case(term))
        .map(|c| c.id.clone())
        .ok_or_else(|| PosError::NotFound(format!("Cashier '{term}'")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn new_order(ctx: &AppContext, args: NewOrderArgs) -> PosResult<()> {
    let session = ctx.session()?;
    let mut page = NewOrderPage::open(ctx.data()?, session.as_ref())?;
    page.load().await?;
    let currency = ctx.currency();

    if let Some(term) = &args.search {
        let matches = page.search(term);
        if matches.is_empty() {
            println!("No foods match '{term}'");
        }
        for food in matches {
            println!("{:<24} {:>12}", fit(&food.name, 24), money::format_currency(currency, food.price));
        }
        return Ok(());
    }

    if args.items.is_empty() {
        println!("Quick add:");
        for food in page.quick_add() {
            println!("  {:<24} {:>12}", fit(&food.name, 24), money::format_currency(currency, food.price));
        }
    }
    for raw in &args.items {
        let (term, qty) = parse_item_spec(raw)?;
        let id = resolve_food(page.foods(), &term)?.id.clone();
        page.add(&id)?;
        let quantity = i64::from(page.cart().quantity_of(&id)) + qty - 1;
        page.set_quantity(&id, quantity);
    }
    if let Some(payment) = args.payment {
        page.set_payment(payment.into())?;
    }
    if let Some(customer) = &args.customer {
        page.set_customer_name(customer.as_str());
    }

    for item in page.cart().items() {
        println!(
            "  {:<24} x{:<4} {:>12}",
            fit(&item.food.name, 24),
            item.quantity,
            money::format_currency(currency, item.line_total())
        );
    }

    let order = page.submit(Utc::now()).await?;
    println!(
        "Order {} created: {} ({})",
        order.order_number.as_deref().unwrap_or(&order.id),
        money::format_currency(currency, order.amount()),
        order.payment_type.to_uppercase()
    );
    if args.print {
        print_order(ctx, &order, &args.print_args)?;
    }
    Ok(())
}

pub async fn all_orders(ctx: &AppContext, args: OrdersArgs) -> PosResult<()> {
    let session = ctx.session()?;
    let mut page = OrdersPage::open(ctx.data()?, session.as_ref(), Local)?;
    page.load().await?;
    let currency = ctx.currency();

    if let Some(id) = &args.show {
        print_order_details(page.order(id)?, currency);
        return Ok(());
    }

    let cashier_id = match &args.cashier {
        Some(term) => Some(resolve_cashier(page.cashiers(), term)?),
        None => None,
    };
    page.set_filter(OrderFilter {
        start_date: args.from,
        end_date: args.to,
        payment_type: args.payment.map(PaymentType::from),
        cashier_id,
    });
    page.go_to_page(args.page);

    print_breakdown(&page.breakdown(), currency);
    if let Some(empty) = page.empty_state() {
        println!("{}", empty.message());
        return Ok(());
    }
    for order in page.page_orders() {
        println!("{}", order_row(order, currency));
    }
    println!("Page {} of {}", page.page(), page.page_count());

    if args.export {
        let path = page.write_csv(
            &ctx.config.exports_dir(),
            Local::now().date_naive(),
            currency,
        )?;
        println!("Exported {} orders to {}", page.filtered_len(), path.display());
    }
    Ok(())
}

pub async fn my_orders(ctx: &AppContext, args: MyOrdersArgs) -> PosResult<()> {
    let session = ctx.session()?;
    let mut page = MyOrdersPage::open(ctx.data()?, session.as_ref(), Local)?;
    page.load(Utc::now()).await?;
    let currency = ctx.currency();

    if let Some(id) = &args.receipt {
        let order = page.receipt_order(id)?;
        return print_order(ctx, &order, &args.print_args);
    }

    let summary = page.summary();
    println!(
        "Today: {} orders, {}   All time: {} orders, {}",
        summary.today.count,
        money::format_currency(currency, summary.today.amount),
        summary.all_time.count,
        money::format_currency(currency, summary.all_time.amount),
    );
    if let Some(message) = page.empty_message() {
        println!("{message}");
    }
    for order in page.orders() {
        println!("{}", order_row(order, currency));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn food(id: &str, name: &str) -> Food {
        Food {
            id: id.into(),
            name: name.into(),
            description: None,
            price: Decimal::from(500),
            category: None,
            is_available: true,
            created_at: None,
        }
    }

    #[test]
    fn item_specs() {
        assert_eq!(parse_item_spec("Jollof Rice:2").expect("spec"), ("Jollof Rice".into(), 2));
        assert_eq!(parse_item_spec(" Coke ").expect("spec"), ("Coke".into(), 1));
        // a non-numeric suffix is part of the name
        assert_eq!(parse_item_spec("Menu: Special").expect("spec"), ("Menu: Special".into(), 1));
        assert!(parse_item_spec("Coke:0").expect_err("zero").is_validation());
    }

    #[test]
    fn food_resolution() {
        let foods = vec![
            food("f-1", "Jollof Rice"),
            food("f-2", "Fried Rice"),
            food("f-3", "Coke"),
        ];
        assert_eq!(resolve_food(&foods, "coke").expect("name").id, "f-3");
        assert_eq!(resolve_food(&foods, "f-1").expect("id").id, "f-1");
        assert_eq!(resolve_food(&foods, "jol").expect("search").id, "f-1");
        assert!(resolve_food(&foods, "rice").expect_err("ambiguous").is_validation());
        assert!(matches!(resolve_food(&foods, "suya"), Err(PosError::NotFound(_))));
    }

    #[test]
    fn cashier_resolution() {
        let cashiers = vec![Cashier {
            id: "c-1".into(),
            name: "Musa".into(),
            cashier_type: crate::models::CashierType::Cash,
            is_active: true,
            created_at: None,
        }];
        assert_eq!(resolve_cashier(&cashiers, "MUSA").expect("name"), "c-1");
        assert!(resolve_cashier(&cashiers, "Aisha").is_err());
    }
}
