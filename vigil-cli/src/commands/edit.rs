use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use vigil_core::{TimeOfDay, Weekday};

use super::apply_and_report;
use crate::context::Context;
use crate::render::Render;

pub async fn run(
    ctx: &Context,
    id: &str,
    at: Option<String>,
    weekday: Option<String>,
    label: Option<String>,
) -> Result<()> {
    if at.is_none() && weekday.is_none() && label.is_none() {
        bail!("Nothing to change. Pass --at, --weekday or --label.");
    }

    let schedule = ctx.sync.schedule();
    let mut rule = schedule.find(id)?.clone();

    if let Some(at) = at {
        rule = rule.with_time(at.parse::<TimeOfDay>()?);
    }
    if let Some(weekday) = weekday {
        rule = rule.with_weekday(weekday.parse::<Weekday>()?);
    }
    if let Some(label) = label {
        rule = rule.with_label(Some(label));
    }

    let updated = schedule.replacing(rule.clone())?;
    println!("{} {}", "Updated".yellow(), rule.render());

    apply_and_report(ctx, updated).await
}
