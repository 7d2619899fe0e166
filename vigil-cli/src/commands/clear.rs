use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::OwoColorize;

use crate::context::Context;
use crate::render::Render;

pub async fn run(ctx: &Context, yes: bool) -> Result<()> {
    let count = ctx.sync.schedule().rules().len();

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete the schedule and its {count} rules?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Nothing changed".dimmed());
            return Ok(());
        }
    }

    let report = ctx.sync.clear().await?;
    println!("{}", report.render());
    println!("{}", "Schedule cleared".green());

    Ok(())
}
