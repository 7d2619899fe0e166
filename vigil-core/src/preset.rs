//! Ready-made schedules to start from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{VigilError, VigilResult};
use crate::rule::{RecurrenceRule, TimeOfDay, Weekday};
use crate::schedule::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePreset {
    Parish,
    Monastery,
    Commuter,
}

impl SchedulePreset {
    pub const ALL: [SchedulePreset; 3] = [
        SchedulePreset::Parish,
        SchedulePreset::Monastery,
        SchedulePreset::Commuter,
    ];

    /// Lowercase name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            SchedulePreset::Parish => "parish",
            SchedulePreset::Monastery => "monastery",
            SchedulePreset::Commuter => "commuter",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SchedulePreset::Parish => "Parish",
            SchedulePreset::Monastery => "Monastery",
            SchedulePreset::Commuter => "Commuter",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SchedulePreset::Parish => {
                "Great for traditional parish schedules with a mid-morning Mass."
            }
            SchedulePreset::Monastery => {
                "Earlier bells, suited to the rhythm of a monastic community."
            }
            SchedulePreset::Commuter => "Evening-focused schedule for those who work during the day.",
        }
    }

    /// Fresh rules (new ids) for this preset, weekly services first.
    pub fn rules(self) -> VigilResult<Vec<RecurrenceRule>> {
        let weekly = |day, h, m, label| -> VigilResult<RecurrenceRule> {
            Ok(RecurrenceRule::weekly(day, TimeOfDay::hm(h, m)?, Some(label)))
        };
        let angelus = |h, m| -> VigilResult<RecurrenceRule> {
            Ok(RecurrenceRule::daily(TimeOfDay::hm(h, m)?, Some("Angelus")))
        };

        let rules = match self {
            SchedulePreset::Parish => vec![
                weekly(Weekday::Sunday, 9, 0, "Sunday Mass")?,
                weekly(Weekday::Saturday, 17, 0, "Vigil Mass")?,
                angelus(12, 0)?,
            ],
            SchedulePreset::Monastery => vec![
                weekly(Weekday::Monday, 6, 30, "Morning Office")?,
                weekly(Weekday::Wednesday, 6, 30, "Community Mass")?,
                weekly(Weekday::Friday, 6, 30, "First Friday")?,
                angelus(6, 0)?,
            ],
            SchedulePreset::Commuter => vec![
                weekly(Weekday::Tuesday, 19, 0, "Weeknight Mass")?,
                weekly(Weekday::Sunday, 18, 0, "Evening Service")?,
                angelus(18, 0)?,
            ],
        };

        Ok(rules)
    }

    pub fn schedule(self, owner_name: impl Into<String>) -> VigilResult<Schedule> {
        Schedule::new(owner_name, self.rules()?)
    }
}

impl fmt::Display for SchedulePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for SchedulePreset {
    type Err = VigilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|p| p.name()).collect();
                VigilError::Config(format!(
                    "Unknown preset '{}'. Available: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}
