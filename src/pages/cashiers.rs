//! Cashier management (administrator).

use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{PosError, PosResult};
use crate::fetch::RequestTracker;
use crate::models::{Cashier, CashierInput, CashierType};
use crate::session::{self, Session};
use crate::store::{Invalidation, PosData};

#[derive(Debug, Clone)]
pub struct CashierForm {
    pub name: String,
    pub cashier_type: String,
    pub is_active: bool,
}

impl Default for CashierForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            cashier_type: CashierType::Cash.as_str().to_string(),
            is_active: true,
        }
    }
}

impl CashierForm {
    pub fn to_input(&self) -> PosResult<CashierInput> {
        let input = CashierInput {
            name: self.name.trim().to_string(),
            cashier_type: CashierType::from_str(&self.cashier_type)?,
            is_active: self.is_active,
        };
        input.validate()?;
        Ok(input)
    }
}

pub struct CashiersPage {
    data: PosData,
    tracker: RequestTracker,
    cashiers: Vec<Cashier>,
}

impl CashiersPage {
    pub fn open(data: PosData, session: Option<&Session>) -> PosResult<Self> {
        session::require_admin(session)?;
        Ok(Self {
            data,
            tracker: RequestTracker::new("cashiers"),
            cashiers: Vec::new(),
        })
    }

    pub fn cashiers(&self) -> &[Cashier] {
        &self.cashiers
    }

    pub fn find(&self, id: &str) -> PosResult<&Cashier> {
        self.cashiers
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| PosError::NotFound(format!("Cashier {id}")))
    }

    pub async fn load(&mut self) -> PosResult<()> {
        let ticket = self.tracker.begin();
        if let Some(cashiers) = self.tracker.run(ticket, self.data.all_cashiers()).await? {
            self.cashiers = cashiers;
        }
        Ok(())
    }

    async fn reload(&mut self, invalidation: Invalidation) -> PosResult<()> {
        debug!(table = %invalidation.table, "snapshot invalidated");
        self.load().await
    }

    pub async fn save(&mut self, id: Option<&str>, form: &CashierForm) -> PosResult<()> {
        let input = form.to_input()?;
        let invalidation = match id {
            Some(id) => {
                let inv = self.data.update_cashier(id, &input).await?;
                info!(cashier = %input.name, "Cashier updated successfully");
                inv
            }
            None => {
                let inv = self.data.create_cashier(&input).await?;
                info!(cashier = %input.name, "Cashier added successfully");
                inv
            }
        };
        self.reload(invalidation).await
    }

    pub async fn delete(&mut self, id: &str) -> PosResult<()> {
        let invalidation = self.data.delete_cashier(id).await?;
        info!(cashier_id = id, "Cashier deleted successfully");
        self.reload(invalidation).await
    }

    pub fn leave(&self) {
        self.tracker.leave();
    }
}
