use crate::diagnostics;
use crate::error::PosResult;

use super::AppContext;

pub fn status(ctx: &AppContext) -> PosResult<()> {
    let session = ctx.session()?;
    let health = diagnostics::get_system_health(&ctx.db, &ctx.config, session.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&health)?);
    Ok(())
}

pub fn about() -> PosResult<()> {
    println!("{}", serde_json::to_string_pretty(&diagnostics::get_about_info())?);
    Ok(())
}
