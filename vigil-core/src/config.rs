//! Global vigil configuration.

use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::constants::{REMINDERS_FILE, SCHEDULE_FILE};
use crate::error::{VigilError, VigilResult};

static DEFAULT_LOG_LEVEL: &str = "warn";

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Configuration at ~/.config/vigil/config.toml
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct VigilConfig {
    /// Where the schedule and pending reminders live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// IANA time zone for resolving services. Defaults to the system zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Owner name used when a schedule is created without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

impl VigilConfig {
    pub fn config_path() -> VigilResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| VigilError::Config("Could not determine config directory".into()))?
            .join("vigil");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, creating a commented-out default first if missing.
    pub fn load() -> VigilResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> VigilResult<Self> {
        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .build()
            .map_err(|e| VigilError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| VigilError::Config(e.to_string()))
    }

    pub fn data_path(&self) -> VigilResult<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(PathBuf::from(
                shellexpand::tilde(&dir.to_string_lossy()).into_owned(),
            )),
            None => Ok(dirs::data_dir()
                .ok_or_else(|| VigilError::Config("Could not determine data directory".into()))?
                .join("vigil")),
        }
    }

    pub fn schedule_path(&self) -> VigilResult<PathBuf> {
        Ok(self.data_path()?.join(SCHEDULE_FILE))
    }

    pub fn reminders_path(&self) -> VigilResult<PathBuf> {
        Ok(self.data_path()?.join(REMINDERS_FILE))
    }

    /// The configured zone, else the system zone, else UTC.
    pub fn timezone(&self) -> VigilResult<Tz> {
        if let Some(name) = &self.timezone {
            return name
                .parse::<Tz>()
                .map_err(|e| VigilError::Config(format!("Invalid timezone '{name}': {e}")));
        }

        let zone = iana_time_zone::get_timezone()
            .ok()
            .and_then(|name| name.parse::<Tz>().ok())
            .unwrap_or_else(|| {
                tracing::debug!("Could not determine system timezone, using UTC");
                Tz::UTC
            });
        Ok(zone)
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> VigilResult<()> {
        let contents = format!(
            "\
# vigil configuration

# Where the schedule and pending reminders are stored:
# data_dir = \"~/.local/share/vigil\"

# Time zone used to resolve service times (defaults to the system zone):
# timezone = \"America/New_York\"

# Log level (error, warn, info, debug, trace):
# log_level = \"{}\"

# Name shown in reminders when a schedule is created:
# owner_name = \"St. Anne Parish\"
",
            DEFAULT_LOG_LEVEL
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                VigilError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| VigilError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
