//! What a glanceable consumer (widget, status line) needs to render the next
//! service, plus when it should ask again.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::constants::FALLBACK_REFRESH_SECS;
use crate::resolver::Occurrence;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextServiceSnapshot {
    pub generated_at: DateTime<Utc>,
    pub next: Option<Occurrence>,
    pub refresh_at: DateTime<Utc>,
}

impl NextServiceSnapshot {
    /// Refresh when the next service starts, or after a fixed interval when
    /// nothing is scheduled.
    pub fn new(generated_at: DateTime<Utc>, next: Option<Occurrence>) -> Self {
        let refresh_at = match &next {
            Some(occurrence) => occurrence.instant,
            None => generated_at + Duration::seconds(FALLBACK_REFRESH_SECS),
        };

        NextServiceSnapshot {
            generated_at,
            next,
            refresh_at,
        }
    }

    pub fn headline(&self) -> &str {
        self.next
            .as_ref()
            .map_or("No upcoming service", |o| o.title.as_str())
    }

    /// Time left until the next service, if there is one.
    pub fn countdown(&self) -> Option<Duration> {
        self.next.as_ref().map(|o| o.instant - self.generated_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_refresh_at_next_service() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 23, 0, 0).unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();
        let snapshot = NextServiceSnapshot::new(
            now,
            Some(Occurrence {
                rule_id: Uuid::new_v4(),
                instant,
                title: "Sunday Mass".into(),
            }),
        );

        assert_eq!(snapshot.refresh_at, instant);
        assert_eq!(snapshot.headline(), "Sunday Mass");
        assert_eq!(snapshot.countdown(), Some(Duration::hours(10)));
    }

    #[test]
    fn test_refresh_hourly_when_empty() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 23, 0, 0).unwrap();
        let snapshot = NextServiceSnapshot::new(now, None);

        assert_eq!(snapshot.refresh_at, now + Duration::hours(1));
        assert_eq!(snapshot.headline(), "No upcoming service");
        assert_eq!(snapshot.countdown(), None);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["next"].is_null());
        assert!(json.get("refreshAt").is_some());
    }
}
