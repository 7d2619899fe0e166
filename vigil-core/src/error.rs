//! Error types for vigil.

use thiserror::Error;
use uuid::Uuid;

/// Reasons a recurrence rule can be rejected at construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidRule {
    #[error("Hour {0} is out of range (0-23)")]
    HourOutOfRange(u32),

    #[error("Minute {0} is out of range (0-59)")]
    MinuteOutOfRange(u32),

    #[error("Second {0} is out of range (0-59)")]
    SecondOutOfRange(u32),

    #[error("Weekday {0} is out of range (1-7, Sunday = 1)")]
    WeekdayOutOfRange(u32),

    #[error("Weekly rule is missing a weekday")]
    MissingWeekday,

    #[error("Daily rule must not carry a weekday")]
    UnexpectedWeekday,

    #[error("Unrecognized time of day '{0}'. Expected HH:MM or HH:MM:SS")]
    UnparsableTime(String),

    #[error("Unrecognized weekday '{0}'")]
    UnparsableWeekday(String),
}

/// Errors that can occur in vigil operations.
#[derive(Error, Debug)]
pub enum VigilError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid rule: {0}")]
    InvalidRule(#[from] InvalidRule),

    #[error("Rule {0} appears more than once in the schedule")]
    DuplicateRule(Uuid),

    #[error("No rule matches '{0}'")]
    RuleNotFound(String),

    #[error("'{0}' matches more than one rule")]
    AmbiguousRule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for vigil operations.
pub type VigilResult<T> = Result<T, VigilError>;

/// Failures reported by a reminder gateway.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Reminder permission denied")]
    PermissionDenied,

    #[error("Reminder transport error: {0}")]
    Transport(String),
}

/// Failures that stop a whole reschedule, as opposed to a single rule.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Could not list scheduled reminders: {0}")]
    ListKnown(GatewayError),

    #[error("Could not remove stale reminders: {0}")]
    RemoveStale(GatewayError),

    #[error("Could not persist schedule: {0}")]
    Store(#[from] VigilError),
}
