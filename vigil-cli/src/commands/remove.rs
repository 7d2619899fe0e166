use anyhow::Result;
use owo_colors::OwoColorize;

use super::apply_and_report;
use crate::context::Context;
use crate::render::Render;

pub async fn run(ctx: &Context, id: &str) -> Result<()> {
    let schedule = ctx.sync.schedule();
    let rule = schedule.find(id)?;

    let updated = schedule.without(rule.id)?;
    println!("{} {}", "Removed".red(), rule.render());

    apply_and_report(ctx, updated).await
}
