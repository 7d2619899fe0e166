//! In-memory reminder gateway.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{AuthorizationStatus, ReminderGateway, ReminderRequest};
use crate::error::GatewayError;

/// A gateway call, as recorded by [`MemoryReminderGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    List,
    Remove(Vec<String>),
    Add(String),
}

#[derive(Debug, Default)]
struct MemoryState {
    status: AuthorizationStatus,
    grant_on_request: bool,
    pending: BTreeMap<String, ReminderRequest>,
    calls: Vec<GatewayCall>,
    failing_adds: HashSet<String>,
    fail_listing: bool,
}

/// Gateway that keeps pending reminders in a shared map.
///
/// Clones share state, so a test can hand one clone to the synchronizer and
/// inspect the other. Adds can be made to fail per identifier, and slowed
/// down to widen race windows.
#[derive(Debug, Clone, Default)]
pub struct MemoryReminderGateway {
    state: Arc<Mutex<MemoryState>>,
    add_delay: Option<Duration>,
}

impl MemoryReminderGateway {
    /// A gateway whose user grants permission when asked.
    pub fn new() -> Self {
        Self::with_decision(true)
    }

    /// A gateway whose user answers `grant` when asked.
    pub fn with_decision(grant: bool) -> Self {
        MemoryReminderGateway {
            state: Arc::new(Mutex::new(MemoryState {
                grant_on_request: grant,
                ..MemoryState::default()
            })),
            add_delay: None,
        }
    }

    /// A gateway that has already been authorized.
    pub fn authorized() -> Self {
        MemoryReminderGateway {
            state: Arc::new(Mutex::new(MemoryState {
                status: AuthorizationStatus::Authorized,
                grant_on_request: true,
                ..MemoryState::default()
            })),
            add_delay: None,
        }
    }

    pub fn with_add_delay(mut self, delay: Duration) -> Self {
        self.add_delay = Some(delay);
        self
    }

    pub async fn fail_adds_for(&self, identifier: &str) {
        self.state.lock().await.failing_adds.insert(identifier.to_string());
    }

    pub async fn set_fail_listing(&self, fail: bool) {
        self.state.lock().await.fail_listing = fail;
    }

    /// Place a reminder directly, bypassing permission checks.
    pub async fn insert(&self, request: ReminderRequest) {
        self.state
            .lock()
            .await
            .pending
            .insert(request.identifier.clone(), request);
    }

    pub async fn pending(&self) -> BTreeMap<String, ReminderRequest> {
        self.state.lock().await.pending.clone()
    }

    pub async fn calls(&self) -> Vec<GatewayCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }
}

#[async_trait]
impl ReminderGateway for MemoryReminderGateway {
    async fn request_authorization(&self) -> Result<bool, GatewayError> {
        let mut state = self.state.lock().await;
        if state.status == AuthorizationStatus::NotDetermined {
            state.status = if state.grant_on_request {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            };
        }
        Ok(state.status == AuthorizationStatus::Authorized)
    }

    async fn authorization_status(&self) -> Result<AuthorizationStatus, GatewayError> {
        Ok(self.state.lock().await.status)
    }

    async fn list_known_identifiers(&self, prefix: &str) -> Result<BTreeSet<String>, GatewayError> {
        let mut state = self.state.lock().await;
        state.calls.push(GatewayCall::List);

        if state.fail_listing {
            return Err(GatewayError::Transport("listing unavailable".into()));
        }

        Ok(state
            .pending
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn remove(&self, identifiers: &BTreeSet<String>) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        state
            .calls
            .push(GatewayCall::Remove(identifiers.iter().cloned().collect()));

        for id in identifiers {
            state.pending.remove(id);
        }
        Ok(())
    }

    async fn add(&self, request: ReminderRequest) -> Result<(), GatewayError> {
        if let Some(delay) = self.add_delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        state.calls.push(GatewayCall::Add(request.identifier.clone()));

        if state.status != AuthorizationStatus::Authorized {
            return Err(GatewayError::PermissionDenied);
        }
        if state.failing_adds.contains(&request.identifier) {
            return Err(GatewayError::Transport(format!(
                "rejected {}",
                request.identifier
            )));
        }

        state.pending.insert(request.identifier.clone(), request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::ReminderTrigger;
    use crate::rule::Weekday;

    fn request(identifier: &str) -> ReminderRequest {
        ReminderRequest {
            identifier: identifier.to_string(),
            title: "Sunday Mass".into(),
            body: "It's time for Sunday Mass.".into(),
            trigger: ReminderTrigger::Weekly {
                weekday: Weekday::Sunday,
                hour: 9,
                minute: 0,
                second: 0,
            },
        }
    }

    #[tokio::test]
    async fn test_authorization_decision_sticks() {
        let gateway = MemoryReminderGateway::with_decision(false);
        assert_eq!(
            gateway.authorization_status().await.unwrap(),
            AuthorizationStatus::NotDetermined
        );
        assert!(!gateway.request_authorization().await.unwrap());
        assert_eq!(
            gateway.authorization_status().await.unwrap(),
            AuthorizationStatus::Denied
        );
        assert!(!gateway.request_authorization().await.unwrap());
    }

    #[tokio::test]
    async fn test_add_requires_authorization() {
        let gateway = MemoryReminderGateway::new();
        assert_eq!(
            gateway.add(request("vigil.rule.a")).await,
            Err(GatewayError::PermissionDenied)
        );

        gateway.request_authorization().await.unwrap();
        gateway.add(request("vigil.rule.a")).await.unwrap();
        assert_eq!(gateway.pending().await.len(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_prefix() {
        let gateway = MemoryReminderGateway::authorized();
        gateway.add(request("vigil.rule.a")).await.unwrap();
        gateway.insert(request("other.app.b")).await;

        let known = gateway.list_known_identifiers("vigil.rule.").await.unwrap();
        assert_eq!(known.into_iter().collect::<Vec<_>>(), vec!["vigil.rule.a"]);
    }

    #[tokio::test]
    async fn test_add_replaces_same_identifier() {
        let gateway = MemoryReminderGateway::authorized();
        gateway.add(request("vigil.rule.a")).await.unwrap();

        let mut edited = request("vigil.rule.a");
        edited.title = "Vigil Mass".into();
        gateway.add(edited.clone()).await.unwrap();

        let pending = gateway.pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending["vigil.rule.a"], edited);
    }
}
