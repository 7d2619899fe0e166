use anyhow::Result;
use owo_colors::OwoColorize;
use vigil_core::{RecurrenceRule, TimeOfDay, Weekday};

use super::apply_and_report;
use crate::AddRule;
use crate::context::Context;
use crate::render::Render;

pub async fn run(ctx: &Context, rule: AddRule) -> Result<()> {
    let rule = match rule {
        AddRule::Weekly { weekday, at, label } => {
            let weekday: Weekday = weekday.parse()?;
            let time: TimeOfDay = at.parse()?;
            RecurrenceRule::weekly(weekday, time, label.as_deref())
        }
        AddRule::Daily { at, label } => {
            let time: TimeOfDay = at.parse()?;
            RecurrenceRule::daily(time, label.as_deref())
        }
    };

    let schedule = ctx.sync.schedule().with_rule(rule.clone())?;
    println!("{} {}", "Added".green(), rule.render());

    apply_and_report(ctx, schedule).await
}
