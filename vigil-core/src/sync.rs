//! Keeps the reminder gateway in step with the current schedule.
//!
//! Every reschedule performs the same full pass, keyed by rule id only:
//! 1. list the identifiers the gateway holds under [`REMINDER_NAMESPACE`]
//! 2. remove those that no longer belong to a rule (stale)
//! 3. for each rule, remove its identifier and add it back with the current
//!    trigger, title and body
//!
//! Running the pass twice against an unchanged schedule leaves the gateway as
//! one pass did. A pass interrupted halfway is repaired by the next one.
//!
//! Passes never overlap. A call that arrives while another pass is running
//! waits for it; once the lock frees, the first waiter runs a single pass with
//! the latest schedule, and any other waiter already covered by that pass
//! returns its report instead of running again.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use uuid::Uuid;

use crate::constants::REMINDER_NAMESPACE;
use crate::error::{GatewayError, SyncError};
use crate::reminder::{
    AuthorizationStatus, ReminderGateway, ReminderRequest, ReminderTrigger, reminder_identifier,
};
use crate::resolver::{Occurrence, resolve_next};
use crate::rule::RecurrenceRule;
use crate::schedule::Schedule;
use crate::snapshot::NextServiceSnapshot;
use crate::store::ScheduleStore;

/// Why a single rule could not be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    PermissionDenied,
    TransportError(String),
}

impl From<GatewayError> for FailureReason {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::PermissionDenied => FailureReason::PermissionDenied,
            GatewayError::Transport(msg) => FailureReason::TransportError(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleStatus {
    Succeeded,
    Failed { reason: FailureReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub rule_id: Uuid,
    pub identifier: String,
    pub status: RuleStatus,
}

/// Result of one reschedule pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Identifiers removed because no rule owns them any more.
    pub removed_stale: Vec<String>,
    /// One entry per rule, in schedule order.
    pub outcomes: Vec<RuleOutcome>,
}

impl SyncReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == RuleStatus::Succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = (&RuleOutcome, &FailureReason)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            RuleStatus::Failed { reason } => Some((o, reason)),
            RuleStatus::Succeeded => None,
        })
    }

    pub fn is_clean(&self) -> bool {
        self.failed().next().is_none()
    }
}

#[derive(Debug)]
struct Published {
    generation: u64,
    schedule: Arc<Schedule>,
}

#[derive(Debug, Default)]
struct Flight {
    synced_generation: u64,
    synced_schedule: Option<Arc<Schedule>>,
    last_report: Option<SyncReport>,
}

/// What a reschedule does to the store before its pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Persist {
    Keep,
    Save,
    /// Remove the stored schedule, unless a newer one has been published.
    Clear,
}

pub struct ReminderSynchronizer {
    gateway: Arc<dyn ReminderGateway>,
    store: Arc<dyn ScheduleStore>,
    tz: Tz,
    latest: watch::Sender<Published>,
    flight: Mutex<Flight>,
}

impl ReminderSynchronizer {
    /// Starts from whatever `store` holds, or an empty schedule.
    pub fn new(gateway: Arc<dyn ReminderGateway>, store: Arc<dyn ScheduleStore>, tz: Tz) -> Self {
        let schedule = store.load().unwrap_or_default();
        let (latest, _) = watch::channel(Published {
            generation: 0,
            schedule: Arc::new(schedule),
        });

        ReminderSynchronizer {
            gateway,
            store,
            tz,
            latest,
            flight: Mutex::new(Flight::default()),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// The schedule currently held, as an immutable snapshot.
    pub fn schedule(&self) -> Arc<Schedule> {
        Arc::clone(&self.latest.borrow().schedule)
    }

    pub async fn request_authorization(&self) -> Result<bool, GatewayError> {
        self.gateway.request_authorization().await
    }

    pub async fn authorization_status(&self) -> Result<AuthorizationStatus, GatewayError> {
        self.gateway.authorization_status().await
    }

    /// Next service across every rule of the held schedule.
    pub fn current_next(&self, now: DateTime<Utc>) -> Option<Occurrence> {
        self.current_next_where(now, |_| true)
    }

    pub fn current_next_where(
        &self,
        now: DateTime<Utc>,
        enabled: impl Fn(&RecurrenceRule) -> bool,
    ) -> Option<Occurrence> {
        let schedule = self.schedule();
        resolve_next(schedule.rules(), enabled, now, &self.tz)
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> NextServiceSnapshot {
        NextServiceSnapshot::new(now, self.current_next(now))
    }

    /// Persist `schedule`, then reschedule reminders for it.
    ///
    /// The store is written under the same lock as the pass, with the schedule
    /// the pass actually syncs, so concurrent applies leave the store and the
    /// gateway agreeing on one schedule.
    pub async fn apply(&self, schedule: Schedule) -> Result<SyncReport, SyncError> {
        self.reschedule(schedule, Persist::Save).await
    }

    /// Forget the persisted schedule and remove every reminder vigil owns.
    pub async fn clear(&self) -> Result<SyncReport, SyncError> {
        self.reschedule(Schedule::empty(), Persist::Clear).await
    }

    /// Reschedule reminders for `schedule` without touching the store.
    pub async fn reschedule_all(&self, schedule: Schedule) -> Result<SyncReport, SyncError> {
        self.reschedule(schedule, Persist::Keep).await
    }

    async fn reschedule(&self, schedule: Schedule, persist: Persist) -> Result<SyncReport, SyncError> {
        let requested = self.publish(schedule);
        let mut flight = self.flight.lock().await;

        if flight.synced_generation >= requested {
            if let (Some(report), Some(synced)) = (&flight.last_report, &flight.synced_schedule) {
                tracing::debug!(
                    requested,
                    synced = flight.synced_generation,
                    "Reschedule already covered by a later pass"
                );
                self.persist(synced, persist)?;
                return Ok(report.clone());
            }
        }

        let (generation, schedule) = {
            let latest = self.latest.borrow();
            (latest.generation, Arc::clone(&latest.schedule))
        };

        if generation > requested {
            tracing::debug!(requested, generation, "Coalescing reschedule onto latest schedule");
        }

        self.persist(&schedule, persist)?;
        let report = self.run_pass(&schedule).await?;
        flight.synced_generation = generation;
        flight.synced_schedule = Some(schedule);
        flight.last_report = Some(report.clone());
        Ok(report)
    }

    fn persist(&self, schedule: &Schedule, persist: Persist) -> Result<(), SyncError> {
        match persist {
            Persist::Keep => {}
            Persist::Clear if schedule.is_empty() => self.store.clear()?,
            Persist::Save | Persist::Clear => self.store.save(schedule)?,
        }
        Ok(())
    }

    fn publish(&self, schedule: Schedule) -> u64 {
        let mut generation = 0;
        self.latest.send_modify(|latest| {
            latest.generation += 1;
            latest.schedule = Arc::new(schedule);
            generation = latest.generation;
        });
        generation
    }

    async fn run_pass(&self, schedule: &Schedule) -> Result<SyncReport, SyncError> {
        let targets: BTreeSet<String> = schedule
            .rules()
            .iter()
            .map(|rule| reminder_identifier(rule.id))
            .collect();

        let known = self
            .gateway
            .list_known_identifiers(REMINDER_NAMESPACE)
            .await
            .map_err(SyncError::ListKnown)?;

        let stale: BTreeSet<String> = known.difference(&targets).cloned().collect();
        if !stale.is_empty() {
            tracing::debug!(count = stale.len(), "Removing stale reminders");
            self.gateway
                .remove(&stale)
                .await
                .map_err(SyncError::RemoveStale)?;
        }

        let mut outcomes = Vec::with_capacity(schedule.rules().len());
        for rule in schedule.rules() {
            let request = reminder_request(rule, &schedule.owner_name);
            let identifier = request.identifier.clone();

            let status = match self.replace(request).await {
                Ok(()) => RuleStatus::Succeeded,
                Err(e) => {
                    tracing::warn!(rule = %rule.id, error = %e, "Could not schedule reminder");
                    RuleStatus::Failed { reason: e.into() }
                }
            };

            outcomes.push(RuleOutcome {
                rule_id: rule.id,
                identifier,
                status,
            });
        }

        let report = SyncReport {
            removed_stale: stale.into_iter().collect(),
            outcomes,
        };

        tracing::info!(
            owner = %schedule.owner_name,
            scheduled = report.succeeded().count(),
            failed = report.failed().count(),
            removed = report.removed_stale.len(),
            "Reminders rescheduled"
        );

        Ok(report)
    }

    async fn replace(&self, request: ReminderRequest) -> Result<(), GatewayError> {
        let single = BTreeSet::from([request.identifier.clone()]);
        self.gateway.remove(&single).await?;
        tracing::debug!(identifier = %request.identifier, "Adding reminder");
        self.gateway.add(request).await
    }
}

fn reminder_request(rule: &RecurrenceRule, owner_name: &str) -> ReminderRequest {
    let title = rule.title();
    let body = if owner_name.trim().is_empty() {
        format!("It's time for {title}.")
    } else {
        format!("{owner_name}: it's time for {title}.")
    };

    ReminderRequest {
        identifier: reminder_identifier(rule.id),
        title,
        body,
        trigger: ReminderTrigger::from(&rule.kind),
    }
}
