use std::{collections::HashSet, time::Duration};

use chrono::{DateTime, Local};
use serde::Serialize;
use shared::{
    domain::{AlertId, NoticeId, Severity, Theme, ViewId},
    notice::NotificationRecord,
};
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_NOTICE_TIMEOUT: Duration = Duration::from_secs(4);

pub trait NotificationSink {
    fn show(&mut self, record: NotificationRecord);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoticeStyle {
    pub background: &'static str,
    pub foreground: &'static str,
    pub border: &'static str,
}

impl NoticeStyle {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                background: "--tuzobus-dark-wine",
                foreground: "white",
                border: "--tuzobus-gold",
            },
            Theme::Light => Self {
                background: "--tuzobus-light-gold",
                foreground: "--tuzobus-wine",
                border: "--tuzobus-wine",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedNotice {
    pub id: NoticeId,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub timestamp: String,
    pub action_label: Option<String>,
    pub style: NoticeStyle,
}

#[derive(Debug, Clone)]
pub struct ActiveNotice {
    pub record: NotificationRecord,
    pub expires_at: Instant,
}

pub struct NotificationQueue {
    active: Vec<ActiveNotice>,
    delivered_alerts: HashSet<AlertId>,
    timeout: Duration,
}

impl NotificationQueue {
    pub fn new(timeout: Duration) -> Self {
        Self {
            active: Vec::new(),
            delivered_alerts: HashSet::new(),
            timeout,
        }
    }

    /// Stacks `record`, newest last. An alert id already shown this session is
    /// dropped even if its earlier notice is gone.
    pub fn show_at(&mut self, record: NotificationRecord, now: Instant) -> bool {
        if let Some(alert_id) = record.alert_id() {
            if !self.delivered_alerts.insert(alert_id) {
                debug!(%alert_id, "alert already delivered this session; ignoring");
                return false;
            }
        }

        debug!(notice_id = %record.id, severity = %record.severity, "showing notice");
        self.active.push(ActiveNotice {
            record,
            expires_at: now + self.timeout,
        });
        true
    }

    pub fn dismiss(&mut self, id: NoticeId) -> bool {
        let before = self.active.len();
        self.active.retain(|notice| notice.record.id != id);
        before != self.active.len()
    }

    pub fn activate(&mut self, id: NoticeId) -> Option<ViewId> {
        let index = self.active.iter().position(|n| n.record.id == id)?;
        let notice = self.active.remove(index);
        notice.record.action.map(|action| action.target)
    }

    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.active.len();
        self.active.retain(|notice| notice.expires_at > now);
        before - self.active.len()
    }

    pub fn active(&self) -> &[ActiveNotice] {
        &self.active
    }

    pub fn render(&self, theme: Theme) -> Vec<RenderedNotice> {
        let style = NoticeStyle::for_theme(theme);
        self.active
            .iter()
            .map(|notice| {
                let record = &notice.record;
                RenderedNotice {
                    id: record.id,
                    severity: record.severity,
                    title: record.title.clone(),
                    message: record.message.clone(),
                    timestamp: format_timestamp(&record.created_at),
                    action_label: record.action.as_ref().map(|a| a.label.clone()),
                    style,
                }
            })
            .collect()
    }
}

impl NotificationSink for NotificationQueue {
    fn show(&mut self, record: NotificationRecord) {
        self.show_at(record, Instant::now());
    }
}

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

#[cfg(test)]
#[path = "tests/notifications_tests.rs"]
mod tests;
