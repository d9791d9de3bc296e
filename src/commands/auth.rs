use crate::error::PosResult;
use crate::pages::{self, login};

use super::{prompt_line, AppContext};

pub async fn login(ctx: &AppContext, input: Option<String>) -> PosResult<()> {
    let input = match input {
        Some(value) => value,
        None => prompt_line("Password or cashier name: ")?,
    };
    let data = ctx.data()?;
    let session = login::login(&data, &ctx.sessions(), &input).await?;
    if session.is_admin() {
        println!("Admin login successful");
    } else {
        println!("Welcome {}!", session.display_name());
    }
    println!("Start with: {}", pages::landing_page(&session).label());
    Ok(())
}

pub fn logout(ctx: &AppContext) -> PosResult<()> {
    login::logout(&ctx.sessions())?;
    println!("Logged out successfully");
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> PosResult<()> {
    let Some(session) = ctx.session()? else {
        println!("Not logged in. Run `pos login`.");
        return Ok(());
    };
    match session.cashier() {
        Some(cashier) => println!(
            "{} ({} cashier)",
            cashier.name,
            cashier.cashier_type.label()
        ),
        None => println!("Administrator"),
    }
    let pages: Vec<&str> = pages::nav_items(&session)
        .iter()
        .map(|p| p.label())
        .collect();
    println!("Pages: {}", pages.join(", "));
    Ok(())
}
