use chrono::{Local, Utc};

use crate::error::PosResult;
use crate::money;
use crate::pages::dashboard::DashboardPage;

use super::{fit, AppContext};

pub async fn dashboard(ctx: &AppContext) -> PosResult<()> {
    let session = ctx.session()?;
    let mut page = DashboardPage::open(ctx.data()?, session.as_ref(), Local)?;
    page.load(Utc::now()).await?;
    let view = page.view();
    let currency = ctx.currency();
    let stats = &view.stats;

    println!(
        "Total orders     {:>8}   ({} today)",
        stats.total_orders, stats.today_orders
    );
    println!(
        "Total revenue    {currency}{:>8}   ({currency}{} today)",
        money::whole(stats.total_revenue),
        money::whole(stats.today_revenue)
    );
    println!("Active cashiers  {:>8}", stats.active_cashiers);
    println!("Available foods  {:>8}", stats.available_foods);

    println!();
    println!("Recent orders");
    if view.recent.is_empty() {
        println!("  No orders today");
    }
    for order in &view.recent {
        println!(
            "  {:<18} {:<14} {:>12}",
            order.order_number.as_deref().unwrap_or("N/A"),
            fit(order.cashier_name.as_deref().unwrap_or("-"), 14),
            money::format_currency(currency, order.amount())
        );
    }

    println!();
    println!("Cashier performance (today)");
    if view.leaderboard.is_empty() {
        println!("  No cashiers");
    }
    for entry in &view.leaderboard {
        println!(
            "  {:<20} {currency}{:>10}  {} orders",
            fit(&entry.cashier.name, 20),
            money::whole(entry.today.amount),
            entry.today.count
        );
    }
    Ok(())
}
