//! Schedule persistence.
//!
//! Loading never fails hard: a missing, empty or undecodable schedule all
//! come back as `None`, and callers start over from an empty schedule.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::{VigilError, VigilResult};
use crate::schedule::Schedule;

pub trait ScheduleStore: Send + Sync {
    fn load(&self) -> Option<Schedule>;

    /// Durable before the next `load` from the same process.
    fn save(&self, schedule: &Schedule) -> VigilResult<()>;

    fn clear(&self) -> VigilResult<()>;
}

/// Stores the schedule as pretty-printed JSON at `path`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScheduleStore for JsonFileStore {
    fn load(&self) -> Option<Schedule> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not read schedule");
                return None;
            }
        };

        if contents.trim().is_empty() {
            return None;
        }

        match serde_json::from_str(&contents) {
            Ok(schedule) => Some(schedule),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring schedule that failed to decode"
                );
                None
            }
        }
    }

    fn save(&self, schedule: &Schedule) -> VigilResult<()> {
        let json = serde_json::to_string_pretty(schedule)
            .map_err(|e| VigilError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), rules = schedule.rules().len(), "Saved schedule");
        Ok(())
    }

    fn clear(&self) -> VigilResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps the schedule in memory only.
#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    schedule: Mutex<Option<Schedule>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedule(schedule: Schedule) -> Self {
        MemoryScheduleStore {
            schedule: Mutex::new(Some(schedule)),
        }
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn load(&self) -> Option<Schedule> {
        self.schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, schedule: &Schedule) -> VigilResult<()> {
        *self.schedule.lock().unwrap_or_else(PoisonError::into_inner) = Some(schedule.clone());
        Ok(())
    }

    fn clear(&self) -> VigilResult<()> {
        *self.schedule.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
