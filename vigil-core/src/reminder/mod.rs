//! Reminder gateway: the boundary to whatever actually delivers notifications.
//!
//! The synchronizer only ever talks to a [`ReminderGateway`]. Two
//! implementations ship with the crate:
//! - [`MemoryReminderGateway`] for tests and ephemeral use
//! - [`FileReminderGateway`], which keeps pending reminders in a JSON file

mod file;
mod memory;

pub use file::FileReminderGateway;
pub use memory::{GatewayCall, MemoryReminderGateway};

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::REMINDER_NAMESPACE;
use crate::error::{GatewayError, InvalidRule};
use crate::rule::{RecurrenceKind, TimeOfDay, Weekday};

/// Whether the user has allowed reminders to be delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    #[default]
    NotDetermined,
    Authorized,
    Denied,
}

/// Repeating trigger handed to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "repeat", rename_all = "snake_case")]
pub enum ReminderTrigger {
    Weekly {
        weekday: Weekday,
        hour: u32,
        minute: u32,
        second: u32,
    },
    Daily {
        hour: u32,
        minute: u32,
        second: u32,
    },
}

impl From<&RecurrenceKind> for ReminderTrigger {
    fn from(kind: &RecurrenceKind) -> Self {
        match *kind {
            RecurrenceKind::Weekly { weekday, time } => ReminderTrigger::Weekly {
                weekday,
                hour: time.hour(),
                minute: time.minute(),
                second: time.second(),
            },
            RecurrenceKind::Daily { time } => ReminderTrigger::Daily {
                hour: time.hour(),
                minute: time.minute(),
                second: time.second(),
            },
        }
    }
}

impl TryFrom<&ReminderTrigger> for RecurrenceKind {
    type Error = InvalidRule;

    fn try_from(trigger: &ReminderTrigger) -> Result<Self, Self::Error> {
        match *trigger {
            ReminderTrigger::Weekly {
                weekday,
                hour,
                minute,
                second,
            } => Ok(RecurrenceKind::Weekly {
                weekday,
                time: TimeOfDay::new(hour, minute, second)?,
            }),
            ReminderTrigger::Daily {
                hour,
                minute,
                second,
            } => Ok(RecurrenceKind::Daily {
                time: TimeOfDay::new(hour, minute, second)?,
            }),
        }
    }
}

/// A reminder to register with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRequest {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub trigger: ReminderTrigger,
}

/// Identifier of the reminder owned by a rule. Depends on the rule id only,
/// so editing a rule's time or label maps to the same reminder.
pub fn reminder_identifier(rule_id: Uuid) -> String {
    format!("{REMINDER_NAMESPACE}{rule_id}")
}

/// Inverse of [`reminder_identifier`].
pub fn rule_id_from_identifier(identifier: &str) -> Option<Uuid> {
    identifier
        .strip_prefix(REMINDER_NAMESPACE)
        .and_then(|rest| Uuid::parse_str(rest).ok())
}

/// Platform notification subsystem, as seen by the synchronizer.
///
/// Timeouts and cancellation are the caller's concern; implementations just
/// report success or failure.
#[async_trait]
pub trait ReminderGateway: Send + Sync {
    /// Ask for permission to deliver reminders. `Ok(false)` means denied.
    async fn request_authorization(&self) -> Result<bool, GatewayError>;

    async fn authorization_status(&self) -> Result<AuthorizationStatus, GatewayError>;

    /// Identifiers of pending reminders that start with `prefix`.
    async fn list_known_identifiers(&self, prefix: &str) -> Result<BTreeSet<String>, GatewayError>;

    /// Remove pending reminders. Unknown identifiers are ignored.
    async fn remove(&self, identifiers: &BTreeSet<String>) -> Result<(), GatewayError>;

    /// Register a repeating reminder, replacing any with the same identifier.
    async fn add(&self, request: ReminderRequest) -> Result<(), GatewayError>;
}
