//! The full set of recurring services for one owner.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VigilError, VigilResult};
use crate::rule::RecurrenceRule;

/// An owner's rule list. Rule ids are unique within a schedule.
///
/// Schedules are replaced wholesale: the `with_*` helpers return a new value
/// rather than mutating in place, so readers holding a snapshot never observe
/// a half-edited rule list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawSchedule")]
pub struct Schedule {
    pub owner_name: String,
    rules: Vec<RecurrenceRule>,
}

impl Schedule {
    pub fn new(owner_name: impl Into<String>, rules: Vec<RecurrenceRule>) -> VigilResult<Self> {
        ensure_unique(&rules)?;
        Ok(Schedule {
            owner_name: owner_name.into(),
            rules,
        })
    }

    pub fn empty() -> Self {
        Schedule {
            owner_name: String::new(),
            rules: Vec::new(),
        }
    }

    pub fn rules(&self) -> &[RecurrenceRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&RecurrenceRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Look up a rule by a (case-insensitive) prefix of its id.
    pub fn find(&self, prefix: &str) -> VigilResult<&RecurrenceRule> {
        let needle = prefix.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(VigilError::RuleNotFound(prefix.to_string()));
        }

        let mut matches = self
            .rules
            .iter()
            .filter(|r| r.id.to_string().starts_with(&needle));

        match (matches.next(), matches.next()) {
            (Some(rule), None) => Ok(rule),
            (Some(_), Some(_)) => Err(VigilError::AmbiguousRule(prefix.to_string())),
            (None, _) => Err(VigilError::RuleNotFound(prefix.to_string())),
        }
    }

    pub fn with_rules(&self, rules: Vec<RecurrenceRule>) -> VigilResult<Self> {
        Schedule::new(self.owner_name.clone(), rules)
    }

    pub fn with_rule(&self, rule: RecurrenceRule) -> VigilResult<Self> {
        let mut rules = self.rules.clone();
        rules.push(rule);
        self.with_rules(rules)
    }

    /// Swap in an edited rule, keeping its position.
    pub fn replacing(&self, rule: RecurrenceRule) -> VigilResult<Self> {
        if self.get(rule.id).is_none() {
            return Err(VigilError::RuleNotFound(rule.id.to_string()));
        }

        let rules = self
            .rules
            .iter()
            .map(|r| if r.id == rule.id { rule.clone() } else { r.clone() })
            .collect();
        self.with_rules(rules)
    }

    pub fn without(&self, id: Uuid) -> VigilResult<Self> {
        if self.get(id).is_none() {
            return Err(VigilError::RuleNotFound(id.to_string()));
        }

        let rules = self.rules.iter().filter(|r| r.id != id).cloned().collect();
        self.with_rules(rules)
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::empty()
    }
}

fn ensure_unique(rules: &[RecurrenceRule]) -> VigilResult<()> {
    let mut seen = HashSet::with_capacity(rules.len());
    for rule in rules {
        if !seen.insert(rule.id) {
            return Err(VigilError::DuplicateRule(rule.id));
        }
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchedule {
    #[serde(default)]
    owner_name: String,
    #[serde(default)]
    rules: Vec<RecurrenceRule>,
}

impl TryFrom<RawSchedule> for Schedule {
    type Error = VigilError;

    fn try_from(raw: RawSchedule) -> Result<Self, Self::Error> {
        Schedule::new(raw.owner_name, raw.rules)
    }
}
