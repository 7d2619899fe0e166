//! Terminal rendering for vigil-core types.
//!
//! Extension traits and helpers that add colored output with owo_colors.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use vigil_core::reminder::{AuthorizationStatus, ReminderRequest, ReminderTrigger};
use vigil_core::sync::{FailureReason, RuleStatus, SyncReport};
use vigil_core::{Occurrence, RecurrenceKind, RecurrenceRule};

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for AuthorizationStatus {
    fn render(&self) -> String {
        match self {
            AuthorizationStatus::Authorized => "Reminders are enabled".green().to_string(),
            AuthorizationStatus::Denied => "Reminders are disabled".red().to_string(),
            AuthorizationStatus::NotDetermined => {
                "Reminders pending approval".yellow().to_string()
            }
        }
    }
}

impl Render for RecurrenceRule {
    fn render(&self) -> String {
        let id = self.id.to_string();
        let short = &id[..8];
        format!("{} {} {}", short.dimmed(), self.title().bold(), self.kind)
    }
}

impl Render for FailureReason {
    fn render(&self) -> String {
        match self {
            FailureReason::PermissionDenied => "permission denied".to_string(),
            FailureReason::TransportError(msg) => msg.clone(),
        }
    }
}

impl Render for ReminderTrigger {
    fn render(&self) -> String {
        match RecurrenceKind::try_from(self) {
            Ok(kind) => kind.to_string(),
            Err(e) => format!("invalid trigger ({e})"),
        }
    }
}

impl Render for ReminderRequest {
    fn render(&self) -> String {
        format!("{} {}", self.title.bold(), self.trigger.render().dimmed())
    }
}

impl Render for SyncReport {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        for outcome in &self.outcomes {
            let rule = &outcome.identifier;
            match &outcome.status {
                RuleStatus::Succeeded => lines.push(format!("   {} {}", "✓".green(), rule)),
                RuleStatus::Failed { reason } => lines.push(format!(
                    "   {} {} {}",
                    "✗".red(),
                    rule,
                    reason.render().red()
                )),
            }
        }

        for stale in &self.removed_stale {
            lines.push(format!("   {} {}", "-".red(), stale.dimmed()));
        }

        let scheduled = self.succeeded().count();
        let failed = self.failed().count();
        let mut summary = format!(
            "Scheduled {} {}",
            scheduled,
            pluralize("reminder", scheduled)
        );
        if failed > 0 {
            summary.push_str(&format!(", {} failed", failed).red().to_string());
        }
        if !self.removed_stale.is_empty() {
            summary.push_str(&format!(", removed {} stale", self.removed_stale.len()));
        }
        lines.push(summary);

        lines.join("\n")
    }
}

/// One line for an upcoming occurrence, in local time with a countdown.
pub fn render_occurrence(occurrence: &Occurrence, tz: &Tz, now: DateTime<Utc>) -> String {
    let local = occurrence.instant.with_timezone(tz);
    format!(
        "{} {} {}",
        local.format("%a %b %-d %H:%M").to_string().bold(),
        occurrence.title,
        format_countdown(occurrence.instant - now).dimmed()
    )
}

/// Next fire time for a pending reminder's trigger, if it is well-formed.
pub fn next_fire(trigger: &ReminderTrigger, tz: &Tz, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let kind = RecurrenceKind::try_from(trigger).ok()?;
    let probe = RecurrenceRule::new(kind, None);
    vigil_core::next_occurrence_of(&probe, now, tz)
}

/// "in 2d 3h", "in 45m", "in 30s"
pub fn format_countdown(delta: Duration) -> String {
    let secs = delta.num_seconds().max(0);
    let (days, hours, minutes) = (secs / 86_400, (secs % 86_400) / 3600, (secs % 3600) / 60);

    if days > 0 {
        format!("in {}d {}h", days, hours)
    } else if hours > 0 {
        format!("in {}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("in {}m", minutes)
    } else {
        format!("in {}s", secs)
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
