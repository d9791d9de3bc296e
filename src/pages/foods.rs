//! Menu management (administrator).

use tracing::{debug, info};

use crate::error::{PosError, PosResult};
use crate::fetch::RequestTracker;
use crate::models::{Food, FoodInput};
use crate::money;
use crate::session::{self, Session};
use crate::store::{Invalidation, PosData};

/// Raw values from the add/edit form.
#[derive(Debug, Clone, Default)]
pub struct FoodForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub category: String,
}

impl FoodForm {
    /// Saved foods are always available; availability has its own toggle.
    pub fn to_input(&self) -> PosResult<FoodInput> {
        let price = money::parse_amount_str(&self.price)
            .ok_or_else(|| PosError::validation("Enter a valid price"))?;
        let input = FoodInput {
            name: self.name.trim().to_string(),
            description: non_empty(&self.description),
            price,
            category: non_empty(&self.category),
            is_available: true,
        };
        input.validate()?;
        Ok(input)
    }
}

fn non_empty(raw: &str) -> Option<String> {
    Some(raw.trim().to_string()).filter(|s| !s.is_empty())
}

pub struct FoodsPage {
    data: PosData,
    tracker: RequestTracker,
    foods: Vec<Food>,
}

impl FoodsPage {
    pub fn open(data: PosData, session: Option<&Session>) -> PosResult<Self> {
        session::require_admin(session)?;
        Ok(Self {
            data,
            tracker: RequestTracker::new("foods"),
            foods: Vec::new(),
        })
    }

    /// Newest first.
    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    pub fn find(&self, id: &str) -> PosResult<&Food> {
        self.foods
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| PosError::NotFound(format!("Food {id}")))
    }

    pub async fn load(&mut self) -> PosResult<()> {
        let ticket = self.tracker.begin();
        if let Some(foods) = self.tracker.run(ticket, self.data.all_foods()).await? {
            debug!(count = foods.len(), "foods loaded");
            self.foods = foods;
        }
        Ok(())
    }

    async fn reload(&mut self, invalidation: Invalidation) -> PosResult<()> {
        debug!(table = %invalidation.table, "snapshot invalidated");
        self.load().await
    }

    /// Create (`id` = None) or update a food from the form.
    pub async fn save(&mut self, id: Option<&str>, form: &FoodForm) -> PosResult<()> {
        let input = form.to_input()?;
        let invalidation = match id {
            Some(id) => {
                let inv = self.data.update_food(id, &input).await?;
                info!(food = %input.name, "Food updated successfully");
                inv
            }
            None => {
                let inv = self.data.create_food(&input).await?;
                info!(food = %input.name, "Food added successfully");
                inv
            }
        };
        self.reload(invalidation).await
    }

    /// Flip availability and return the new state.
    pub async fn toggle_availability(&mut self, id: &str) -> PosResult<bool> {
        let available = !self.find(id)?.is_available;
        let invalidation = self.data.set_food_availability(id, available).await?;
        info!(
            food_id = id,
            "Food marked as {}",
            if available { "available" } else { "unavailable" }
        );
        self.reload(invalidation).await?;
        Ok(available)
    }

    pub async fn delete(&mut self, id: &str) -> PosResult<()> {
        let invalidation = self.data.delete_food(id).await?;
        info!(food_id = id, "Food deleted successfully");
        self.reload(invalidation).await
    }

    pub fn leave(&self) {
        self.tracker.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cashier, CashierType};
    use crate::store::memory::MemoryStore;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn form(name: &str, price: &str) -> FoodForm {
        FoodForm {
            name: name.into(),
            price: price.into(),
            category: "Drink".into(),
            ..FoodForm::default()
        }
    }

    #[test]
    fn form_parsing() {
        let input = form(" Coke ", "300.50").to_input().expect("valid");
        assert_eq!(input.name, "Coke");
        assert_eq!(input.price, Decimal::new(30050, 2));
        assert_eq!(input.description, None);
        assert!(input.is_available);

        assert!(form("Coke", "abc").to_input().expect_err("bad price").is_validation());
        assert!(form("", "100").to_input().expect_err("no name").is_validation());
        assert!(form("Coke", "-1").to_input().expect_err("negative").is_validation());
        assert!(form("Coke", "79228162514264337593543950335")
            .to_input()
            .expect_err("too expensive")
            .is_validation());
        assert!(form("Coke", "1000000000").to_input().is_ok());
    }

    #[test]
    fn cashiers_cannot_open_the_menu_editor() {
        let data = PosData::new(Arc::new(MemoryStore::new()));
        let cashier = Session::Cashier(Cashier {
            id: "c-1".into(),
            name: "Musa".into(),
            cashier_type: CashierType::Cash,
            is_active: true,
            created_at: None,
        });
        assert!(matches!(
            FoodsPage::open(data.clone(), Some(&cashier)),
            Err(PosError::Forbidden(_))
        ));
        assert!(FoodsPage::open(data, Some(&Session::Administrator)).is_ok());
    }

    #[tokio::test]
    async fn mutations_reload_the_snapshot() {
        let data = PosData::new(Arc::new(MemoryStore::new()));
        let mut page = FoodsPage::open(data.clone(), Some(&Session::Administrator)).expect("open");
        page.load().await.expect("load");
        assert!(page.foods().is_empty());

        page.save(None, &form("Jollof Rice", "1500")).await.expect("create");
        page.save(None, &form("Coke", "300")).await.expect("create");
        assert_eq!(page.foods().len(), 2);
        assert_eq!(page.foods()[0].name, "Coke");

        let coke_id = page.foods()[0].id.clone();
        assert!(!page.toggle_availability(&coke_id).await.expect("toggle"));
        assert!(!page.find(&coke_id).expect("coke").is_available);
        assert_eq!(data.available_foods().await.expect("available").len(), 1);

        page.save(Some(&coke_id), &form("Coca-Cola", "350")).await.expect("edit");
        let edited = page.find(&coke_id).expect("coke");
        assert_eq!(edited.name, "Coca-Cola");
        // saving re-enables the food
        assert!(edited.is_available);

        page.delete(&coke_id).await.expect("delete");
        assert_eq!(page.foods().len(), 1);
        assert!(matches!(page.find(&coke_id), Err(PosError::NotFound(_))));
    }
}
