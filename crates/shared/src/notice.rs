use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{AlertId, NoticeId, Severity, ViewId},
    error::ShellError,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertScriptEntry {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub delay_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AlertScriptEntry", into = "AlertScriptEntry")]
pub struct AlertEvent {
    id: AlertId,
    title: String,
    message: String,
    severity: Severity,
    delay_ms: u64,
}

impl AlertEvent {
    pub fn new(
        id: i64,
        title: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        delay_ms: i64,
    ) -> Result<Self, ShellError> {
        let delay_ms =
            u64::try_from(delay_ms).map_err(|_| ShellError::NegativeDelay { id, delay_ms })?;
        Ok(Self {
            id: AlertId(id),
            title: title.into(),
            message: message.into(),
            severity,
            delay_ms,
        })
    }

    pub fn id(&self) -> AlertId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl TryFrom<AlertScriptEntry> for AlertEvent {
    type Error = ShellError;

    fn try_from(entry: AlertScriptEntry) -> Result<Self, Self::Error> {
        AlertEvent::new(
            entry.id,
            entry.title,
            entry.message,
            entry.severity,
            entry.delay_ms,
        )
    }
}

impl From<AlertEvent> for AlertScriptEntry {
    fn from(event: AlertEvent) -> Self {
        Self {
            id: event.id.0,
            title: event.title,
            message: event.message,
            severity: event.severity,
            delay_ms: i64::try_from(event.delay_ms).unwrap_or(i64::MAX),
        }
    }
}

pub fn default_alert_script() -> Vec<AlertScriptEntry> {
    vec![
        AlertScriptEntry {
            id: 1,
            title: "L1 - Retraso menor".to_string(),
            message: "2 min de retraso en Línea 1".to_string(),
            severity: Severity::Warning,
            delay_ms: 5_000,
        },
        AlertScriptEntry {
            id: 2,
            title: "Zona Dorada".to_string(),
            message: "Tu bus llega en 3 minutos".to_string(),
            severity: Severity::Info,
            delay_ms: 15_000,
        },
        AlertScriptEntry {
            id: 3,
            title: "Servicio restaurado".to_string(),
            message: "L4 operando normalmente".to_string(),
            severity: Severity::Success,
            delay_ms: 25_000,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
    pub target: ViewId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "alert_id", rename_all = "snake_case")]
pub enum NoticeSource {
    Alert(AlertId),
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: NoticeId,
    pub source: NoticeSource,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<NotificationAction>,
}

impl NotificationRecord {
    pub fn alert_id(&self) -> Option<AlertId> {
        match self.source {
            NoticeSource::Alert(id) => Some(id),
            NoticeSource::User => None,
        }
    }
}
