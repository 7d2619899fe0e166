//! Core of vigil: recurring service resolution and reminder synchronization.
//!
//! - [`rule`] and [`schedule`] describe the recurring services
//! - [`resolver`] computes upcoming occurrences, purely
//! - [`reminder`] and [`store`] are the boundaries to notification delivery and persistence
//! - [`sync`] keeps reminders consistent with the schedule

pub mod config;
pub mod constants;
pub mod error;
pub mod preset;
pub mod reminder;
pub mod resolver;
pub mod rule;
pub mod schedule;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use error::{GatewayError, InvalidRule, SyncError, VigilError, VigilResult};
pub use resolver::{Occurrence, next_occurrence_of, resolve_next, upcoming};
pub use rule::{RecurrenceKind, RecurrenceRule, TimeOfDay, Weekday};
pub use schedule::Schedule;
pub use sync::{ReminderSynchronizer, SyncReport};
