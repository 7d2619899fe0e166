use anyhow::Result;

use super::ensure_authorized;
use crate::context::Context;
use crate::render::Render;

pub async fn run(ctx: &Context) -> Result<()> {
    ensure_authorized(ctx).await?;

    let schedule = ctx.sync.schedule().as_ref().clone();
    let report = ctx.sync.reschedule_all(schedule).await?;
    println!("{}", report.render());

    Ok(())
}
