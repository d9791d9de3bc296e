use crate::cli::{FoodFields, FoodsCommand};
use crate::error::PosResult;
use crate::models::Food;
use crate::money;
use crate::pages::foods::{FoodForm, FoodsPage};

use super::{cancelled, confirm, fit, AppContext};

fn form_from(fields: FoodFields) -> FoodForm {
    FoodForm {
        name: fields.name,
        description: fields.description.unwrap_or_default(),
        price: fields.price,
        category: fields.category.unwrap_or_default(),
    }
}

fn food_row(food: &Food, currency: &str) -> String {
    format!(
        "{:<36}  {:<24} {:<12} {:>12}  {}",
        food.id,
        fit(&food.name, 24),
        fit(food.category.as_deref().unwrap_or("-"), 12),
        money::format_currency(currency, food.price),
        if food.is_available { "available" } else { "unavailable" },
    )
}

fn print_foods(page: &FoodsPage, currency: &str) {
    if page.foods().is_empty() {
        println!("No foods yet. Add one with `pos foods add`.");
        return;
    }
    for food in page.foods() {
        println!("{}", food_row(food, currency));
    }
}

pub async fn run(ctx: &AppContext, cmd: FoodsCommand) -> PosResult<()> {
    let session = ctx.session()?;
    let mut page = FoodsPage::open(ctx.data()?, session.as_ref())?;
    page.load().await?;

    match cmd {
        FoodsCommand::List => print_foods(&page, ctx.currency()),
        FoodsCommand::Add(fields) => {
            page.save(None, &form_from(fields)).await?;
            println!("Food added successfully");
        }
        FoodsCommand::Edit { id, fields } => {
            page.find(&id)?;
            page.save(Some(&id), &form_from(fields)).await?;
            println!("Food updated successfully");
        }
        FoodsCommand::Toggle { id } => {
            let available = page.toggle_availability(&id).await?;
            println!(
                "Food marked as {}",
                if available { "available" } else { "unavailable" }
            );
        }
        FoodsCommand::Delete { id, yes } => {
            let name = page.find(&id)?.name.clone();
            if !confirm(&format!("Are you sure you want to delete {name}?"), yes)? {
                return Err(cancelled());
            }
            page.delete(&id).await?;
            println!("Food deleted successfully");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn row_shows_price_and_availability() {
        let food = Food {
            id: "f-1".into(),
            name: "Jollof Rice".into(),
            description: None,
            price: Decimal::from(1500),
            category: Some("Main Dish".into()),
            is_available: false,
            created_at: None,
        };
        let row = food_row(&food, "₦");
        assert!(row.contains("Jollof Rice"));
        assert!(row.contains("₦1500.00"));
        assert!(row.ends_with("unavailable"));
    }

    #[test]
    fn blank_optional_fields_become_empty_strings() {
        let form = form_from(FoodFields {
            name: "Coke".into(),
            price: "300".into(),
            description: None,
            category: None,
        });
        let input = form.to_input().expect("valid");
        assert_eq!(input.category, None);
        assert_eq!(input.price, Decimal::from(300));
    }
}
