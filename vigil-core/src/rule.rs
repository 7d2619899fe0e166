//! Recurrence rules: the repeating points in time a schedule is made of.
//!
//! Every value in this module is validated when it is built. A [`TimeOfDay`]
//! or [`Weekday`] that exists is in range, so a [`RecurrenceRule`] can never
//! be partially specified by the time the resolver or synchronizer sees it.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InvalidRule;

/// Day of the week, numbered 1-7 starting from Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Weekday {
    Sunday = 1,
    Monday = 2,
    Tuesday = 3,
    Wednesday = 4,
    Thursday = 5,
    Friday = 6,
    Saturday = 7,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn from_number(n: u32) -> Result<Self, InvalidRule> {
        match n {
            1..=7 => Ok(Self::ALL[(n - 1) as usize]),
            _ => Err(InvalidRule::WeekdayOutOfRange(n)),
        }
    }

    pub fn number(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sunday",
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }

    pub fn to_chrono(self) -> chrono::Weekday {
        match self {
            Weekday::Sunday => chrono::Weekday::Sun,
            Weekday::Monday => chrono::Weekday::Mon,
            Weekday::Tuesday => chrono::Weekday::Tue,
            Weekday::Wednesday => chrono::Weekday::Wed,
            Weekday::Thursday => chrono::Weekday::Thu,
            Weekday::Friday => chrono::Weekday::Fri,
            Weekday::Saturday => chrono::Weekday::Sat,
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        Self::ALL[day.num_days_from_sunday() as usize]
    }
}

impl TryFrom<u32> for Weekday {
    type Error = InvalidRule;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Self::from_number(n)
    }
}

impl From<Weekday> for u32 {
    fn from(day: Weekday) -> Self {
        day.number()
    }
}

impl FromStr for Weekday {
    type Err = InvalidRule;

    /// Accepts full names, three-letter abbreviations, or the 1-7 number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u32>() {
            return Self::from_number(n);
        }

        let lower = trimmed.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|day| {
                let name = day.name().to_ascii_lowercase();
                name == lower || (lower.len() >= 3 && name.starts_with(&lower))
            })
            .ok_or_else(|| InvalidRule::UnparsableWeekday(s.to_string()))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A wall-clock time of day with whole-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
    second: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32, second: u32) -> Result<Self, InvalidRule> {
        if hour > 23 {
            return Err(InvalidRule::HourOutOfRange(hour));
        }
        if minute > 59 {
            return Err(InvalidRule::MinuteOutOfRange(minute));
        }
        if second > 59 {
            return Err(InvalidRule::SecondOutOfRange(second));
        }
        Ok(TimeOfDay {
            hour,
            minute,
            second,
        })
    }

    pub fn hm(hour: u32, minute: u32) -> Result<Self, InvalidRule> {
        Self::new(hour, minute, 0)
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn second(&self) -> u32 {
        self.second
    }

    pub fn to_naive(self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, self.second)
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidRule;

    /// Parses `HH:MM` or `HH:MM:SS`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unparsable = || InvalidRule::UnparsableTime(s.to_string());

        let parts = s
            .trim()
            .split(':')
            .map(|p| p.parse::<u32>().map_err(|_| unparsable()))
            .collect::<Result<Vec<_>, _>>()?;

        match parts.as_slice() {
            [h, m] => Self::new(*h, *m, 0),
            [h, m, sec] => Self::new(*h, *m, *sec),
            _ => Err(unparsable()),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.second == 0 {
            write!(f, "{:02}:{:02}", self.hour, self.minute)
        } else {
            write!(f, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
        }
    }
}

/// How a rule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecurrenceKind {
    /// Once a week on `weekday` at `time`.
    Weekly { weekday: Weekday, time: TimeOfDay },
    /// Every day at `time`.
    Daily { time: TimeOfDay },
}

impl RecurrenceKind {
    pub fn time(&self) -> TimeOfDay {
        match self {
            RecurrenceKind::Weekly { time, .. } | RecurrenceKind::Daily { time } => *time,
        }
    }

    /// Merge precedence when two rules land on the same instant: weekly first.
    pub(crate) fn precedence(&self) -> u8 {
        match self {
            RecurrenceKind::Weekly { .. } => 0,
            RecurrenceKind::Daily { .. } => 1,
        }
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurrenceKind::Weekly { weekday, time } => write!(f, "every {} at {}", weekday, time),
            RecurrenceKind::Daily { time } => write!(f, "daily at {}", time),
        }
    }
}

/// A single repeating service in a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct RecurrenceRule {
    pub id: Uuid,
    pub kind: RecurrenceKind,
    pub label: Option<String>,
}

impl RecurrenceRule {
    pub fn new(kind: RecurrenceKind, label: Option<String>) -> Self {
        RecurrenceRule {
            id: Uuid::new_v4(),
            kind,
            label,
        }
    }

    pub fn weekly(weekday: Weekday, time: TimeOfDay, label: Option<&str>) -> Self {
        Self::new(
            RecurrenceKind::Weekly { weekday, time },
            label.map(str::to_string),
        )
    }

    pub fn daily(time: TimeOfDay, label: Option<&str>) -> Self {
        Self::new(RecurrenceKind::Daily { time }, label.map(str::to_string))
    }

    /// Display title: the label if set, otherwise a name derived from the kind.
    pub fn title(&self) -> String {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => match self.kind {
                RecurrenceKind::Weekly { weekday, .. } => format!("{} Service", weekday.name()),
                RecurrenceKind::Daily { .. } => "Daily Prayer".to_string(),
            },
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_time(mut self, time: TimeOfDay) -> Self {
        self.kind = match self.kind {
            RecurrenceKind::Weekly { weekday, .. } => RecurrenceKind::Weekly { weekday, time },
            RecurrenceKind::Daily { .. } => RecurrenceKind::Daily { time },
        };
        self
    }

    /// Moves the rule to `weekday`, turning a daily rule into a weekly one.
    pub fn with_weekday(mut self, weekday: Weekday) -> Self {
        self.kind = RecurrenceKind::Weekly {
            weekday,
            time: self.kind.time(),
        };
        self
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label.filter(|l| !l.trim().is_empty());
        self
    }
}

// Flat persisted shape: `weekday` is present iff `kind` is "weekly".
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    Weekly,
    Daily,
}

#[derive(Serialize, Deserialize)]
struct RawRule {
    id: Uuid,
    kind: RawKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weekday: Option<u32>,
    hour: u32,
    minute: u32,
    #[serde(default)]
    second: u32,
    #[serde(default)]
    label: Option<String>,
}

impl TryFrom<RawRule> for RecurrenceRule {
    type Error = InvalidRule;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let time = TimeOfDay::new(raw.hour, raw.minute, raw.second)?;
        let kind = match (raw.kind, raw.weekday) {
            (RawKind::Weekly, Some(n)) => RecurrenceKind::Weekly {
                weekday: Weekday::from_number(n)?,
                time,
            },
            (RawKind::Weekly, None) => return Err(InvalidRule::MissingWeekday),
            (RawKind::Daily, Some(_)) => return Err(InvalidRule::UnexpectedWeekday),
            (RawKind::Daily, None) => RecurrenceKind::Daily { time },
        };

        Ok(RecurrenceRule {
            id: raw.id,
            kind,
            label: raw.label,
        })
    }
}

impl From<RecurrenceRule> for RawRule {
    fn from(rule: RecurrenceRule) -> Self {
        let time = rule.kind.time();
        let (kind, weekday) = match rule.kind {
            RecurrenceKind::Weekly { weekday, .. } => (RawKind::Weekly, Some(weekday.number())),
            RecurrenceKind::Daily { .. } => (RawKind::Daily, None),
        };

        RawRule {
            id: rule.id,
            kind,
            weekday,
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            label: rule.label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day_rejects_out_of_range() {
        assert_eq!(TimeOfDay::new(24, 0, 0), Err(InvalidRule::HourOutOfRange(24)));
        assert_eq!(TimeOfDay::new(9, 60, 0), Err(InvalidRule::MinuteOutOfRange(60)));
        assert_eq!(TimeOfDay::new(9, 0, 60), Err(InvalidRule::SecondOutOfRange(60)));
        assert!(TimeOfDay::new(23, 59, 59).is_ok());
    }

    #[test]
    fn test_weekday_numbering_starts_on_sunday() {
        assert_eq!(Weekday::from_number(1), Ok(Weekday::Sunday));
        assert_eq!(Weekday::from_number(7), Ok(Weekday::Saturday));
        assert_eq!(Weekday::from_number(0), Err(InvalidRule::WeekdayOutOfRange(0)));
        assert_eq!(Weekday::from_number(8), Err(InvalidRule::WeekdayOutOfRange(8)));
        assert_eq!(Weekday::from(chrono::Weekday::Sun), Weekday::Sunday);
        assert_eq!(Weekday::Saturday.to_chrono(), chrono::Weekday::Sat);
    }

    #[test]
    fn test_parse_weekday_and_time() {
        assert_eq!("sunday".parse::<Weekday>(), Ok(Weekday::Sunday));
        assert_eq!("Wed".parse::<Weekday>(), Ok(Weekday::Wednesday));
        assert_eq!("6".parse::<Weekday>(), Ok(Weekday::Friday));
        assert!("su".parse::<Weekday>().is_err());

        assert_eq!("09:30".parse::<TimeOfDay>(), TimeOfDay::new(9, 30, 0));
        assert_eq!("18:00:15".parse::<TimeOfDay>(), TimeOfDay::new(18, 0, 15));
        assert!("9".parse::<TimeOfDay>().is_err());
        assert_eq!(
            "25:00".parse::<TimeOfDay>(),
            Err(InvalidRule::HourOutOfRange(25))
        );
    }

    #[test]
    fn test_title_falls_back_to_weekday_name() {
        let time = TimeOfDay::hm(9, 0).unwrap();
        let labelled = RecurrenceRule::weekly(Weekday::Sunday, time, Some("Sunday Mass"));
        let unlabelled = RecurrenceRule::weekly(Weekday::Tuesday, time, None);
        let blank = RecurrenceRule::weekly(Weekday::Friday, time, Some("  "));
        let daily = RecurrenceRule::daily(time, None);

        assert_eq!(labelled.title(), "Sunday Mass");
        assert_eq!(unlabelled.title(), "Tuesday Service");
        assert_eq!(blank.title(), "Friday Service");
        assert_eq!(daily.title(), "Daily Prayer");
    }

    #[test]
    fn test_edits_keep_rule_id() {
        let rule = RecurrenceRule::daily(TimeOfDay::hm(12, 0).unwrap(), Some("Angelus"));
        let id = rule.id;

        let edited = rule
            .with_time(TimeOfDay::hm(18, 0).unwrap())
            .with_weekday(Weekday::Monday)
            .with_label(None);

        assert_eq!(edited.id, id);
        assert_eq!(
            edited.kind,
            RecurrenceKind::Weekly {
                weekday: Weekday::Monday,
                time: TimeOfDay::hm(18, 0).unwrap()
            }
        );
        assert_eq!(edited.label, None);
    }

    #[test]
    fn test_persisted_shape() {
        let rule = RecurrenceRule::weekly(
            Weekday::Sunday,
            TimeOfDay::new(9, 0, 0).unwrap(),
            Some("Sunday Mass"),
        );
        let json = serde_json::to_value(&rule).unwrap();

        assert_eq!(json["kind"], "weekly");
        assert_eq!(json["weekday"], 1);
        assert_eq!(json["hour"], 9);
        assert_eq!(json["second"], 0);
        assert_eq!(json["label"], "Sunday Mass");

        let daily = RecurrenceRule::daily(TimeOfDay::hm(12, 0).unwrap(), None);
        let json = serde_json::to_value(&daily).unwrap();
        assert_eq!(json["kind"], "daily");
        assert!(json.get("weekday").is_none());
        assert!(json["label"].is_null());
    }

    #[test]
    fn test_deserialize_validates_ranges() {
        let id = Uuid::new_v4();

        let bad_hour = format!(
            r#"{{"id":"{id}","kind":"daily","hour":24,"minute":0,"second":0,"label":null}}"#
        );
        assert!(serde_json::from_str::<RecurrenceRule>(&bad_hour).is_err());

        let missing_weekday = format!(
            r#"{{"id":"{id}","kind":"weekly","hour":9,"minute":0,"second":0,"label":null}}"#
        );
        assert!(serde_json::from_str::<RecurrenceRule>(&missing_weekday).is_err());

        let daily_with_weekday = format!(
            r#"{{"id":"{id}","kind":"daily","weekday":2,"hour":9,"minute":0,"second":0,"label":null}}"#
        );
        assert!(serde_json::from_str::<RecurrenceRule>(&daily_with_weekday).is_err());

        let ok = format!(
            r#"{{"id":"{id}","kind":"weekly","weekday":7,"hour":17,"minute":0,"second":0,"label":"Vigil Mass"}}"#
        );
        let rule: RecurrenceRule = serde_json::from_str(&ok).unwrap();
        assert_eq!(rule.id, id);
        assert_eq!(
            rule.kind,
            RecurrenceKind::Weekly {
                weekday: Weekday::Saturday,
                time: TimeOfDay::hm(17, 0).unwrap()
            }
        );
    }
}
