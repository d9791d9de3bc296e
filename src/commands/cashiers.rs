use crate::cli::{CashierFields, CashiersCommand};
use crate::error::PosResult;
use crate::models::CashierType;
use crate::pages::cashiers::{CashierForm, CashiersPage};

use super::{cancelled, confirm, fit, AppContext};

fn form_from(fields: CashierFields) -> CashierForm {
    CashierForm {
        name: fields.name,
        cashier_type: CashierType::from(fields.kind).as_str().to_string(),
        is_active: !fields.inactive,
    }
}

pub async fn run(ctx: &AppContext, cmd: CashiersCommand) -> PosResult<()> {
    let session = ctx.session()?;
    let mut page = CashiersPage::open(ctx.data()?, session.as_ref())?;
    page.load().await?;

    match cmd {
        CashiersCommand::List => {
            if page.cashiers().is_empty() {
                println!("No cashiers yet. Add one with `pos cashiers add`.");
            }
            for c in page.cashiers() {
                println!(
                    "{:<36}  {:<20} {:<13} {}",
                    c.id,
                    fit(&c.name, 20),
                    c.cashier_type.label(),
                    if c.is_active { "active" } else { "inactive" },
                );
            }
        }
        CashiersCommand::Add(fields) => {
            page.save(None, &form_from(fields)).await?;
            println!("Cashier added successfully");
        }
        CashiersCommand::Edit { id, fields } => {
            page.find(&id)?;
            page.save(Some(&id), &form_from(fields)).await?;
            println!("Cashier updated successfully");
        }
        CashiersCommand::Delete { id, yes } => {
            let name = page.find(&id)?.name.clone();
            if !confirm(&format!("Are you sure you want to delete {name}?"), yes)? {
                return Err(cancelled());
            }
            page.delete(&id).await?;
            println!("Cashier deleted successfully");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CashierKind;

    #[test]
    fn inactive_flag_maps_to_the_form() {
        let form = form_from(CashierFields {
            name: "Aisha".into(),
            kind: CashierKind::TransferPos,
            inactive: true,
        });
        let input = form.to_input().expect("valid");
        assert_eq!(input.cashier_type, CashierType::TransferPos);
        assert!(!input.is_active);
    }
}
