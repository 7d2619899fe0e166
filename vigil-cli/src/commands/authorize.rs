use anyhow::Result;
use owo_colors::OwoColorize;
use vigil_core::reminder::AuthorizationStatus;

use crate::context::Context;
use crate::render::Render;

pub async fn run(ctx: &Context) -> Result<()> {
    let granted = ctx.sync.request_authorization().await?;
    println!("{}", ctx.sync.authorization_status().await?.render());

    if granted && !ctx.sync.schedule().is_empty() {
        let schedule = ctx.sync.schedule().as_ref().clone();
        let report = ctx.sync.reschedule_all(schedule).await?;
        println!("{}", report.render());
    } else if ctx.sync.authorization_status().await? == AuthorizationStatus::Denied {
        println!(
            "{}",
            "Edit the reminders file to re-enable delivery; see `vigil config` for its path."
                .dimmed()
        );
    }

    Ok(())
}
