use chrono::Local;

use crate::cli::{PrintArgs, ReceiptArgs};
use crate::error::PosResult;
use crate::models::Order;
use crate::print;
use crate::session;

use super::AppContext;

/// Render, store and (unless disabled) open the requested copies.
pub(crate) fn print_order(ctx: &AppContext, order: &Order, args: &PrintArgs) -> PosResult<()> {
    let printed = print::print_receipt(
        order,
        &args.copy.kinds(),
        &ctx.layout(),
        &ctx.config.receipts_dir(),
        &Local::now(),
        !args.no_browser,
    )?;
    for receipt in printed {
        if args.no_browser {
            println!("{}", receipt.text);
        }
        println!("Receipt saved to {}", receipt.path.display());
    }
    Ok(())
}

pub async fn receipt(ctx: &AppContext, args: ReceiptArgs) -> PosResult<()> {
    let session = ctx.session()?;
    session::require_session(session.as_ref())?;
    let order = ctx.data()?.order_by_number(args.order_number.trim()).await?;
    print_order(ctx, &order, &args.print_args)
}
