use std::sync::Arc;

use anyhow::Result;
use chrono_tz::Tz;
use dialoguer::Confirm;
use vigil_core::config::VigilConfig;
use vigil_core::reminder::FileReminderGateway;
use vigil_core::store::JsonFileStore;
use vigil_core::sync::ReminderSynchronizer;

/// Everything a command needs, wired from the config file.
pub struct Context {
    pub config: VigilConfig,
    pub tz: Tz,
    pub gateway: Arc<FileReminderGateway>,
    pub sync: ReminderSynchronizer,
}

impl Context {
    pub fn new(config: VigilConfig) -> Result<Self> {
        let tz = config.timezone()?;
        let store = Arc::new(JsonFileStore::new(config.schedule_path()?));
        let gateway = Arc::new(FileReminderGateway::new(
            config.reminders_path()?,
            ask_permission,
        ));
        let sync = ReminderSynchronizer::new(gateway.clone(), store, tz);
        tracing::debug!(timezone = %tz, reminders = %gateway.path().display(), "Context ready");

        Ok(Context {
            config,
            tz,
            gateway,
            sync,
        })
    }

    pub fn owner_name(&self, explicit: Option<String>) -> String {
        explicit
            .or_else(|| self.config.owner_name.clone())
            .unwrap_or_default()
    }
}

fn ask_permission() -> bool {
    Confirm::new()
        .with_prompt("Allow vigil to deliver service reminders?")
        .default(true)
        .interact()
        .unwrap_or(false)
}
