use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;
use shared::{
    domain::ViewId,
    error::ShellError,
    notice::{default_alert_script, AlertScriptEntry},
};

use crate::{notifications::DEFAULT_NOTICE_TIMEOUT, router::DEFAULT_TRANSITION};

pub const DEFAULT_CONFIG_FILE: &str = "kiosk.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub default_view: String,
    pub data_dir: Option<PathBuf>,
    pub key_prefix: String,
    pub notice_timeout_ms: u64,
    pub transition_ms: u64,
    pub alert_action_label: String,
    pub alert_action_target: String,
    pub alerts: Vec<AlertScriptEntry>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            default_view: ViewId::Map.as_str().to_string(),
            data_dir: None,
            key_prefix: String::new(),
            notice_timeout_ms: DEFAULT_NOTICE_TIMEOUT.as_millis() as u64,
            transition_ms: DEFAULT_TRANSITION.as_millis() as u64,
            alert_action_label: "Ver".to_string(),
            alert_action_target: ViewId::Alerts.as_str().to_string(),
            alerts: default_alert_script(),
        }
    }
}

impl ShellConfig {
    pub fn default_view(&self) -> Result<ViewId, ShellError> {
        self.default_view.parse()
    }

    pub fn alert_action_target(&self) -> Result<ViewId, ShellError> {
        self.alert_action_target.parse()
    }

    pub fn notice_timeout(&self) -> Duration {
        Duration::from_millis(self.notice_timeout_ms)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ShellError> {
        if let Some(v) = lookup("APP__DEFAULT_VIEW") {
            self.default_view = v;
        }
        if let Some(v) = lookup("APP__DATA_DIR") {
            self.data_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("APP__KEY_PREFIX") {
            self.key_prefix = v;
        }
        if let Some(v) = lookup("APP__NOTICE_TIMEOUT_MS") {
            self.notice_timeout_ms = parse_millis("APP__NOTICE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("APP__TRANSITION_MS") {
            self.transition_ms = parse_millis("APP__TRANSITION_MS", &v)?;
        }
        Ok(())
    }
}

fn parse_millis(name: &str, raw: &str) -> Result<u64, ShellError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|err| ShellError::Config(format!("{name}='{raw}': {err}")))
}

/// Reads `path` if given (must exist), otherwise `kiosk.toml` in the working
/// directory when present, then layers environment overrides on top.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ShellConfig> {
    let mut config = match path {
        Some(path) => parse_config_file(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            parse_config_file(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => ShellConfig::default(),
    };
    config.apply_env_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}

pub fn parse_config_file(path: &Path) -> anyhow::Result<ShellConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config '{}'", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config '{}'", path.display()))
}

pub fn resolve_settings_path(config: &ShellConfig) -> anyhow::Result<PathBuf> {
    let root = match &config.data_dir {
        Some(dir) => dir.clone(),
        None => dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("unable to resolve local app data dir"))?
            .join("tuzobus"),
    };
    Ok(root.join("settings.json"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
