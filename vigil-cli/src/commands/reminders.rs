use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use vigil_core::reminder::rule_id_from_identifier;

use crate::context::Context;
use crate::render::{Render, format_countdown, next_fire};

pub async fn run(ctx: &Context) -> Result<()> {
    let status = ctx.sync.authorization_status().await?;
    println!("{}", status.render());

    let pending = ctx.gateway.pending().await?;
    if pending.is_empty() {
        println!("{}", "No pending reminders".dimmed());
        return Ok(());
    }

    let now = Utc::now();
    let schedule = ctx.sync.schedule();
    for request in &pending {
        let fire = next_fire(&request.trigger, &ctx.tz, now)
            .map(|instant| format_countdown(instant - now))
            .unwrap_or_default();
        println!("   {} {}", request.render(), fire.dimmed());
        println!("     {}", request.body);

        let owned = rule_id_from_identifier(&request.identifier).and_then(|id| schedule.get(id));
        if owned.is_none() {
            println!("     {}", "No matching rule; run `vigil sync` to remove it".yellow());
        }
    }

    Ok(())
}
