use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use vigil_core::next_occurrence_of;

use crate::context::Context;
use crate::render::{Render, format_countdown};

pub fn run(ctx: &Context) -> Result<()> {
    let schedule = ctx.sync.schedule();

    if schedule.is_empty() {
        println!("{}", "No rules yet. Run `vigil init` or `vigil add`.".dimmed());
        return Ok(());
    }

    if !schedule.owner_name.is_empty() {
        println!("{}", schedule.owner_name.bold());
    }

    let now = Utc::now();
    for rule in schedule.rules() {
        let next = match next_occurrence_of(rule, now, &ctx.tz) {
            Some(instant) => format!(
                "next {} {}",
                instant.with_timezone(&ctx.tz).format("%a %b %-d %H:%M"),
                format_countdown(instant - now)
            ),
            None => "no upcoming occurrence".to_string(),
        };
        println!("{} {}", rule.render(), next.dimmed());
    }

    Ok(())
}
