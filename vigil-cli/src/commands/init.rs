use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use vigil_core::preset::SchedulePreset;

use super::apply_and_report;
use crate::context::Context;

pub async fn run(ctx: &Context, preset: &str, owner: Option<String>, force: bool) -> Result<()> {
    let preset: SchedulePreset = preset.parse()?;

    if !ctx.sync.schedule().is_empty() && !force {
        bail!("A schedule already exists. Use --force to replace it.");
    }

    let schedule = preset.schedule(ctx.owner_name(owner))?;
    println!(
        "Creating {} schedule with {} rules",
        preset.title().bold(),
        schedule.rules().len()
    );

    apply_and_report(ctx, schedule).await
}
