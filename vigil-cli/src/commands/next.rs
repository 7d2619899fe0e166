use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use vigil_core::snapshot::NextServiceSnapshot;
use vigil_core::upcoming;

use crate::KindFilter;
use crate::context::Context;
use crate::render::render_occurrence;

pub fn run(ctx: &Context, kind: Option<KindFilter>, count: usize, json: bool) -> Result<()> {
    let now = Utc::now();
    let schedule = ctx.sync.schedule();
    let enabled = |rule: &vigil_core::RecurrenceRule| kind.is_none_or(|k| k.matches(&rule.kind));

    if json {
        let next = ctx.sync.current_next_where(now, enabled);
        let snapshot = NextServiceSnapshot::new(now, next);
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let occurrences = upcoming(schedule.rules(), enabled, now, &ctx.tz, count);
    if occurrences.is_empty() {
        println!("{}", "No upcoming service".dimmed());
        return Ok(());
    }

    for occurrence in &occurrences {
        println!("{}", render_occurrence(occurrence, &ctx.tz, now));
    }

    Ok(())
}
