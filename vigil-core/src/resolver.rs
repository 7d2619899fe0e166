//! Next-occurrence resolution for recurrence rules.
//!
//! Everything here is a pure function of `(rules, enabled, after, tz)`: no I/O,
//! no shared state. Callers on different threads can resolve the same schedule
//! snapshot concurrently.
//!
//! Local-time anomalies follow two rules:
//! - a local time that does not exist on a date (spring-forward gap) makes
//!   that date ineligible; the search moves on to the next candidate date.
//! - a local time that happens twice (fall-back overlap) only matches at its
//!   first, earlier instant.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::MAX_CANDIDATES;
use crate::rule::{RecurrenceKind, RecurrenceRule};

/// One concrete upcoming instant of a rule. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub rule_id: Uuid,
    pub instant: DateTime<Utc>,
    pub title: String,
}

/// Earliest instant strictly after `after` matching `rule` in `tz`.
///
/// An occurrence exactly at `after` is never returned, so a service that has
/// just started is not reported as still upcoming.
pub fn next_occurrence_of<Z: TimeZone>(
    rule: &RecurrenceRule,
    after: DateTime<Utc>,
    tz: &Z,
) -> Option<DateTime<Utc>> {
    let time = rule.kind.time().to_naive()?;
    let start = after.with_timezone(tz).date_naive();

    let (first, step) = match rule.kind {
        RecurrenceKind::Weekly { weekday, .. } => {
            let target = weekday.to_chrono().num_days_from_sunday();
            let current = start.weekday().num_days_from_sunday();
            let offset = (7 + target - current) % 7;
            (start.checked_add_days(Days::new(u64::from(offset)))?, 7)
        }
        RecurrenceKind::Daily { .. } => (start, 1),
    };

    candidate_dates(first, step)
        .filter_map(|date| first_instant(tz, date.and_time(time)))
        .find(|instant| *instant > after)
}

/// The soonest occurrence across every enabled rule.
///
/// Ties on the same instant go to weekly rules before daily ones, then to the
/// lower rule id. Neither depends on the order `rules` are given in.
pub fn resolve_next<'a, Z, F>(
    rules: impl IntoIterator<Item = &'a RecurrenceRule>,
    enabled: F,
    after: DateTime<Utc>,
    tz: &Z,
) -> Option<Occurrence>
where
    Z: TimeZone,
    F: Fn(&RecurrenceRule) -> bool,
{
    rules
        .into_iter()
        .filter(|rule| enabled(rule))
        .filter_map(|rule| {
            let instant = next_occurrence_of(rule, after, tz)?;
            Some((rule, instant))
        })
        .min_by(|a, b| merge_order(a, b))
        .map(|(rule, instant)| occurrence(rule, instant))
}

/// The next `limit` occurrences across every enabled rule, in merge order.
pub fn upcoming<'a, Z, F>(
    rules: impl IntoIterator<Item = &'a RecurrenceRule>,
    enabled: F,
    after: DateTime<Utc>,
    tz: &Z,
    limit: usize,
) -> Vec<Occurrence>
where
    Z: TimeZone,
    F: Fn(&RecurrenceRule) -> bool,
{
    let mut heads: Vec<(&RecurrenceRule, DateTime<Utc>)> = rules
        .into_iter()
        .filter(|rule| enabled(rule))
        .filter_map(|rule| Some((rule, next_occurrence_of(rule, after, tz)?)))
        .collect();

    let mut result = Vec::new();

    while result.len() < limit {
        let Some(idx) = (0..heads.len()).min_by(|&a, &b| merge_order(&heads[a], &heads[b])) else {
            break;
        };

        let (rule, instant) = heads[idx];
        result.push(occurrence(rule, instant));

        match next_occurrence_of(rule, instant, tz) {
            Some(next) => heads[idx].1 = next,
            None => {
                heads.swap_remove(idx);
            }
        }
    }

    result
}

fn occurrence(rule: &RecurrenceRule, instant: DateTime<Utc>) -> Occurrence {
    Occurrence {
        rule_id: rule.id,
        instant,
        title: rule.title(),
    }
}

fn merge_order(
    (a_rule, a_instant): &(&RecurrenceRule, DateTime<Utc>),
    (b_rule, b_instant): &(&RecurrenceRule, DateTime<Utc>),
) -> Ordering {
    a_instant
        .cmp(b_instant)
        .then_with(|| a_rule.kind.precedence().cmp(&b_rule.kind.precedence()))
        .then_with(|| a_rule.id.cmp(&b_rule.id))
}

fn candidate_dates(first: NaiveDate, step: u32) -> impl Iterator<Item = NaiveDate> {
    (0..MAX_CANDIDATES)
        .map_while(move |i| first.checked_add_days(Days::new(u64::from(i * step))))
}

/// Map a local wall-clock time to UTC, skipping gaps and taking the earlier
/// instant of an overlap.
fn first_instant<Z: TimeZone>(tz: &Z, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(a, b) => Some(a.with_timezone(&Utc).min(b.with_timezone(&Utc))),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{TimeOfDay, Weekday};
    use chrono::Duration;
    use chrono_tz::America::New_York;
    use chrono_tz::Europe::London;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn weekly(day: Weekday, h: u32, m: u32) -> RecurrenceRule {
        RecurrenceRule::weekly(day, TimeOfDay::hm(h, m).unwrap(), None)
    }

    fn daily(h: u32, m: u32) -> RecurrenceRule {
        RecurrenceRule::daily(TimeOfDay::hm(h, m).unwrap(), None)
    }

    fn all(_: &RecurrenceRule) -> bool {
        true
    }

    #[test]
    fn test_weekly_from_saturday_night() {
        let rule = weekly(Weekday::Sunday, 9, 0);
        // 2026-10-17 is a Saturday
        let after = utc(2026, 10, 17, 23, 0, 0);

        let next = next_occurrence_of(&rule, after, &Utc).unwrap();
        assert_eq!(next, utc(2026, 10, 18, 9, 0, 0));
        assert!(next - after < Duration::days(2));
    }

    #[test]
    fn test_weekly_at_exact_instant_moves_a_week() {
        let rule = weekly(Weekday::Sunday, 9, 0);
        let after = utc(2026, 10, 18, 9, 0, 0);

        let next = next_occurrence_of(&rule, after, &Utc).unwrap();
        assert_eq!(next, utc(2026, 10, 25, 9, 0, 0));
    }

    #[test]
    fn test_weekly_later_same_day() {
        let rule = weekly(Weekday::Sunday, 18, 0);
        let after = utc(2026, 10, 18, 9, 0, 0);

        assert_eq!(
            next_occurrence_of(&rule, after, &Utc),
            Some(utc(2026, 10, 18, 18, 0, 0))
        );
    }

    #[test]
    fn test_seconds_participate_in_matching() {
        let rule = RecurrenceRule::daily(TimeOfDay::new(12, 0, 30).unwrap(), None);
        let after = utc(2026, 10, 18, 12, 0, 0);

        assert_eq!(
            next_occurrence_of(&rule, after, &Utc),
            Some(utc(2026, 10, 18, 12, 0, 30))
        );
    }

    #[test]
    fn test_strictly_advances() {
        let rules = [
            weekly(Weekday::Sunday, 9, 0),
            weekly(Weekday::Wednesday, 0, 0),
            daily(0, 0),
            daily(23, 59),
        ];
        let mut after = utc(2026, 1, 1, 0, 0, 0);

        // Walk a year in uneven strides, including exact-hit instants.
        while after < utc(2027, 1, 1, 0, 0, 0) {
            for rule in &rules {
                let next = next_occurrence_of(rule, after, &New_York).unwrap();
                assert!(next > after, "{rule:?} returned {next} for {after}");
                assert!(next_occurrence_of(rule, next, &New_York).unwrap() > next);
            }
            after += Duration::minutes(7 * 60 + 13);
        }
    }

    #[test]
    fn test_daily_rules_pick_soonest() {
        let rules = vec![daily(6, 0), daily(12, 0), daily(18, 0)];
        let after = utc(2026, 10, 18, 7, 0, 0);

        let next = resolve_next(&rules, all, after, &Utc).unwrap();
        assert_eq!(next.instant, utc(2026, 10, 18, 12, 0, 0));
        assert_eq!(next.rule_id, rules[1].id);
        assert_eq!(next.title, "Daily Prayer");

        assert_eq!(resolve_next(&rules, |_| false, after, &Utc), None);
    }

    #[test]
    fn test_enabled_predicate_filters_rules() {
        let rules = vec![daily(6, 0), daily(12, 0), daily(18, 0)];
        let after = utc(2026, 10, 18, 7, 0, 0);
        let noon = rules[1].id;

        let next = resolve_next(&rules, |r| r.id != noon, after, &Utc).unwrap();
        assert_eq!(next.instant, utc(2026, 10, 18, 18, 0, 0));
    }

    #[test]
    fn test_empty_rule_set_has_no_next() {
        let rules: Vec<RecurrenceRule> = Vec::new();
        assert_eq!(resolve_next(&rules, all, utc(2026, 10, 18, 7, 0, 0), &Utc), None);
    }

    #[test]
    fn test_tie_prefers_weekly_then_lower_id() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);

        let daily_low = daily(9, 0).with_id(low);
        let weekly_high = weekly(Weekday::Sunday, 9, 0).with_id(high);
        let after = utc(2026, 10, 18, 8, 0, 0);

        let next = resolve_next([&daily_low, &weekly_high], all, after, &Utc).unwrap();
        assert_eq!(next.rule_id, high, "weekly wins over daily at the same instant");

        let a = daily(9, 0).with_id(high);
        let b = daily(9, 0).with_id(low);
        let next = resolve_next([&a, &b], all, after, &Utc).unwrap();
        assert_eq!(next.rule_id, low);
    }

    #[test]
    fn test_order_independent() {
        let mut rules = vec![
            weekly(Weekday::Sunday, 9, 0),
            weekly(Weekday::Saturday, 17, 0),
            daily(12, 0),
            daily(9, 0),
            weekly(Weekday::Sunday, 9, 0),
        ];
        let after = utc(2026, 10, 17, 18, 0, 0);
        let expected = resolve_next(&rules, all, after, &New_York);

        for _ in 0..rules.len() {
            rules.rotate_left(1);
            assert_eq!(resolve_next(&rules, all, after, &New_York), expected);
            rules.reverse();
            assert_eq!(resolve_next(&rules, all, after, &New_York), expected);
        }
    }

    #[test]
    fn test_spring_forward_gap_skips_date() {
        // 2026-03-08 02:30 does not exist in New York (02:00 -> 03:00).
        let after = New_York
            .with_ymd_and_hms(2026, 3, 7, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc);

        let sunday = weekly(Weekday::Sunday, 2, 30);
        let expected_weekly = New_York
            .with_ymd_and_hms(2026, 3, 15, 2, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(next_occurrence_of(&sunday, after, &New_York), Some(expected_weekly));

        let every_day = daily(2, 30);
        let expected_daily = New_York
            .with_ymd_and_hms(2026, 3, 9, 2, 30, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(next_occurrence_of(&every_day, after, &New_York), Some(expected_daily));
    }

    #[test]
    fn test_gap_in_london() {
        // 2026-03-29 01:30 does not exist in London (01:00 -> 02:00).
        let rule = daily(1, 30);
        let after = utc(2026, 3, 28, 12, 0, 0);

        let next = next_occurrence_of(&rule, after, &London).unwrap();
        // 2026-03-30 01:30 BST
        assert_eq!(next, utc(2026, 3, 30, 0, 30, 0));
    }

    #[test]
    fn test_fall_back_takes_first_instance() {
        // 2026-11-01 01:30 happens at 05:30Z (EDT) and again at 06:30Z (EST).
        let rule = daily(1, 30);
        let after = utc(2026, 10, 31, 16, 0, 0);

        assert_eq!(
            next_occurrence_of(&rule, after, &New_York),
            Some(utc(2026, 11, 1, 5, 30, 0))
        );

        // Between the two instances the repeat does not count; next is the following day.
        let between = utc(2026, 11, 1, 5, 45, 0);
        assert_eq!(
            next_occurrence_of(&rule, between, &New_York),
            Some(utc(2026, 11, 2, 6, 30, 0))
        );
    }

    #[test]
    fn test_upcoming_merges_in_order() {
        let mass = weekly(Weekday::Sunday, 9, 0);
        let angelus = daily(12, 0);
        let rules = vec![angelus.clone(), mass.clone()];
        let after = utc(2026, 10, 17, 13, 0, 0);

        let agenda = upcoming(&rules, all, after, &Utc, 4);
        let got: Vec<_> = agenda.iter().map(|o| (o.rule_id, o.instant)).collect();

        assert_eq!(
            got,
            vec![
                (mass.id, utc(2026, 10, 18, 9, 0, 0)),
                (angelus.id, utc(2026, 10, 18, 12, 0, 0)),
                (angelus.id, utc(2026, 10, 19, 12, 0, 0)),
                (angelus.id, utc(2026, 10, 20, 12, 0, 0)),
            ]
        );

        assert!(upcoming(&rules, |_| false, after, &Utc, 4).is_empty());
        assert!(upcoming(&rules, all, after, &Utc, 0).is_empty());
    }

    #[test]
    fn test_upcoming_huge_limit_without_rules() {
        let rules: Vec<RecurrenceRule> = Vec::new();
        let after = utc(2026, 10, 17, 13, 0, 0);

        assert!(upcoming(&rules, all, after, &Utc, usize::MAX).is_empty());

        let disabled = vec![daily(12, 0)];
        assert!(upcoming(&disabled, |_| false, after, &Utc, usize::MAX).is_empty());
    }
}
