pub mod add;
pub mod authorize;
pub mod clear;
pub mod config;
pub mod edit;
pub mod init;
pub mod list;
pub mod next;
pub mod presets;
pub mod reminders;
pub mod remove;
pub mod sync;

use anyhow::Result;
use owo_colors::OwoColorize;
use vigil_core::Schedule;
use vigil_core::reminder::AuthorizationStatus;
use vigil_core::sync::FailureReason;

use crate::context::Context;
use crate::render::Render;

/// Ask once for permission if it was never decided. Denial is not an error:
/// the sync still runs and reports every rule as failed.
pub async fn ensure_authorized(ctx: &Context) -> Result<()> {
    if ctx.sync.authorization_status().await? == AuthorizationStatus::NotDetermined {
        ctx.sync.request_authorization().await?;
    }
    Ok(())
}

/// Persist `schedule`, reschedule its reminders and print the outcome.
pub async fn apply_and_report(ctx: &Context, schedule: Schedule) -> Result<()> {
    ensure_authorized(ctx).await?;
    let report = ctx.sync.apply(schedule).await?;
    println!("{}", report.render());

    if report
        .failed()
        .any(|(_, reason)| *reason == FailureReason::PermissionDenied)
    {
        println!(
            "{}",
            "Run `vigil authorize` after enabling reminders to deliver them.".dimmed()
        );
    }
    Ok(())
}
