//! Order-entry cart.
//!
//! One entry per food id, quantity always at least 1. Totals are computed
//! with decimal arithmetic so the result does not depend on the order items
//! were added.

use rust_decimal::Decimal;

use crate::models::{Food, OrderLine};
use crate::money;

/// Matches shown in the search dropdown.
pub const SEARCH_LIMIT: usize = 8;
/// Foods shown in the quick-add list when nothing is searched.
pub const QUICK_ADD_LIMIT: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub food: Food,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        money::line_total(self.food.price, self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn quantity_of(&self, food_id: &str) -> u32 {
        self.items
            .iter()
            .find(|i| i.food.id == food_id)
            .map(|i| i.quantity)
            .unwrap_or(0)
    }

    /// Increment the entry for `food`, inserting it with quantity 1 if absent.
    pub fn add_item(&mut self, food: &Food) {
        match self.items.iter_mut().find(|i| i.food.id == food.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(1),
            None => self.items.push(CartItem {
                food: food.clone(),
                quantity: 1,
            }),
        }
    }

    /// Overwrite the quantity. Anything below 1 removes the entry.
    pub fn set_quantity(&mut self, food_id: &str, quantity: i64) {
        if quantity < 1 {
            self.remove_item(food_id);
            return;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(item) = self.items.iter_mut().find(|i| i.food.id == food_id) {
            item.quantity = quantity;
        }
    }

    pub fn remove_item(&mut self, food_id: &str) {
        self.items.retain(|i| i.food.id != food_id);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn total(&self) -> Decimal {
        money::sum(self.items.iter().map(CartItem::line_total))
    }

    /// Point-in-time copy of the cart as stored with the order.
    pub fn snapshot(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .map(|i| OrderLine {
                id: i.food.id.clone(),
                name: i.food.name.clone(),
                price: i.food.price,
                quantity: i.quantity,
            })
            .collect()
    }
}

/// Dropdown matches for `term` among `foods` (already filtered to available).
/// An empty term yields nothing.
pub fn search<'a>(foods: &'a [Food], term: &str) -> Vec<&'a Food> {
    if term.trim().is_empty() {
        return Vec::new();
    }
    foods
        .iter()
        .filter(|f| f.matches(term))
        .take(SEARCH_LIMIT)
        .collect()
}

pub fn quick_add(foods: &[Food]) -> &[Food] {
    &foods[..foods.len().min(QUICK_ADD_LIMIT)]
}
