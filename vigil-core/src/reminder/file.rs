//! Reminder gateway backed by a JSON file in the data directory.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{AuthorizationStatus, ReminderGateway, ReminderRequest};
use crate::error::GatewayError;

type Approver = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct GatewayFile {
    #[serde(default)]
    authorization: AuthorizationStatus,
    #[serde(default)]
    reminders: BTreeMap<String, ReminderRequest>,
}

/// Gateway that persists the authorization decision and pending reminders to
/// a single JSON file. Reads and writes are serialized through one lock, and
/// writes go through a temp file plus rename.
pub struct FileReminderGateway {
    path: PathBuf,
    approver: Approver,
    lock: Mutex<()>,
}

impl FileReminderGateway {
    /// `approver` is consulted by `request_authorization` while no decision
    /// has been recorded yet. It may block (an interactive prompt); it runs on
    /// the blocking thread pool.
    pub fn new(path: impl Into<PathBuf>, approver: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        FileReminderGateway {
            path: path.into(),
            approver: Arc::new(approver),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every pending reminder, in identifier order.
    pub async fn pending(&self) -> Result<Vec<ReminderRequest>, GatewayError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.reminders.into_values().collect())
    }

    async fn read(&self) -> Result<GatewayFile, GatewayError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(GatewayFile::default()),
            Err(e) => return Err(transport(&self.path, e)),
        };

        if contents.trim().is_empty() {
            return Ok(GatewayFile::default());
        }

        serde_json::from_str(&contents).map_err(|e| transport(&self.path, e))
    }

    async fn write(&self, file: &GatewayFile) -> Result<(), GatewayError> {
        let json = serde_json::to_string_pretty(file).map_err(|e| transport(&self.path, e))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| transport(parent, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| transport(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| transport(&self.path, e))
    }
}

fn transport(path: &Path, err: impl std::fmt::Display) -> GatewayError {
    GatewayError::Transport(format!("{}: {}", path.display(), err))
}

#[async_trait]
impl ReminderGateway for FileReminderGateway {
    async fn request_authorization(&self) -> Result<bool, GatewayError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;

        if file.authorization == AuthorizationStatus::NotDetermined {
            let approver = Arc::clone(&self.approver);
            let granted = tokio::task::spawn_blocking(move || (*approver)())
                .await
                .map_err(|e| transport(&self.path, e))?;
            file.authorization = if granted {
                AuthorizationStatus::Authorized
            } else {
                AuthorizationStatus::Denied
            };
            self.write(&file).await?;
        }

        Ok(file.authorization == AuthorizationStatus::Authorized)
    }

    async fn authorization_status(&self) -> Result<AuthorizationStatus, GatewayError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.authorization)
    }

    async fn list_known_identifiers(&self, prefix: &str) -> Result<BTreeSet<String>, GatewayError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read()
            .await?
            .reminders
            .into_keys()
            .filter(|id| id.starts_with(prefix))
            .collect())
    }

    async fn remove(&self, identifiers: &BTreeSet<String>) -> Result<(), GatewayError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;

        let before = file.reminders.len();
        file.reminders.retain(|id, _| !identifiers.contains(id));

        if file.reminders.len() != before {
            self.write(&file).await?;
        }
        Ok(())
    }

    async fn add(&self, request: ReminderRequest) -> Result<(), GatewayError> {
        let _guard = self.lock.lock().await;
        let mut file = self.read().await?;

        if file.authorization != AuthorizationStatus::Authorized {
            return Err(GatewayError::PermissionDenied);
        }

        file.reminders.insert(request.identifier.clone(), request);
        self.write(&file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminder::ReminderTrigger;

    fn request(identifier: &str) -> ReminderRequest {
        ReminderRequest {
            identifier: identifier.to_string(),
            title: "Angelus".into(),
            body: "It's time for Angelus.".into(),
            trigger: ReminderTrigger::Daily {
                hour: 12,
                minute: 0,
                second: 0,
            },
        }
    }

    #[tokio::test]
    async fn test_denied_gateway_rejects_adds() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileReminderGateway::new(dir.path().join("reminders.json"), || false);

        assert!(!gateway.request_authorization().await.unwrap());
        assert_eq!(
            gateway.add(request("vigil.rule.a")).await,
            Err(GatewayError::PermissionDenied)
        );
    }

    #[tokio::test]
    async fn test_state_survives_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("reminders.json");

        let gateway = FileReminderGateway::new(&path, || true);
        assert!(gateway.request_authorization().await.unwrap());
        gateway.add(request("vigil.rule.a")).await.unwrap();
        gateway.add(request("vigil.rule.b")).await.unwrap();

        // The approver is not consulted again once a decision is stored.
        let reopened = FileReminderGateway::new(&path, || false);
        assert!(reopened.request_authorization().await.unwrap());
        assert_eq!(
            reopened.authorization_status().await.unwrap(),
            AuthorizationStatus::Authorized
        );

        let known = reopened.list_known_identifiers("vigil.rule.").await.unwrap();
        assert_eq!(known.len(), 2);

        reopened
            .remove(&BTreeSet::from(["vigil.rule.a".to_string()]))
            .await
            .unwrap();
        let pending = reopened.pending().await.unwrap();
        assert_eq!(pending, vec![request("vigil.rule.b")]);
    }

    #[tokio::test]
    async fn test_blocking_approver_leaves_runtime_free() {
        let dir = tempfile::tempdir().unwrap();
        let asked = Arc::new(tokio::sync::Notify::new());
        let (answer, decision) = std::sync::mpsc::channel::<()>();
        let decision = std::sync::Mutex::new(decision);

        let prompt_shown = Arc::clone(&asked);
        let gateway = FileReminderGateway::new(dir.path().join("reminders.json"), move || {
            prompt_shown.notify_one();
            decision
                .lock()
                .unwrap()
                .recv_timeout(std::time::Duration::from_secs(5))
                .is_ok()
        });

        // The answer comes from a task on the same single-threaded runtime,
        // after the approver has started waiting for it.
        let respond = async move {
            asked.notified().await;
            answer.send(()).unwrap();
        };
        let (granted, ()) = tokio::join!(gateway.request_authorization(), respond);

        assert!(granted.unwrap());
        assert_eq!(
            gateway.authorization_status().await.unwrap(),
            AuthorizationStatus::Authorized
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminders.json");
        std::fs::write(&path, "{ not json").unwrap();

        let gateway = FileReminderGateway::new(&path, || true);
        assert!(matches!(
            gateway.list_known_identifiers("vigil.rule.").await,
            Err(GatewayError::Transport(_))
        ));
    }
}
