use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use crossbeam_channel::{bounded, Receiver, TrySendError};
use shared::{
    domain::{NoticeId, Preferences, Severity, ViewId},
    error::ShellError,
    notice::{AlertEvent, NoticeSource, NotificationAction, NotificationRecord},
};
use storage::{KeyValueStore, PreferenceKeys, PreferenceStore, PresentationAttributes};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    config::ShellConfig,
    notifications::{NotificationQueue, NotificationSink, RenderedNotice},
    router::{ContentFrame, TransitionEvent, ViewRouter},
    scheduler::{AlertScheduler, CancellationHandle},
};

pub const BRAND: &str = "TUZOBUS";
pub const SUBTITLE: &str = "Sistema de Transporte • Pachuca, Hidalgo";
const LIVE_LABEL: &str = "En vivo";
const ACTIVE_LINES_LABEL: &str = "7 líneas activas";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewContent {
    TransitMap,
    RouteSearch,
    DepartureBoard,
    ServiceAlerts,
}

impl From<ViewId> for ViewContent {
    fn from(view: ViewId) -> Self {
        match view {
            ViewId::Map => ViewContent::TransitMap,
            ViewId::Search => ViewContent::RouteSearch,
            ViewId::Departures => ViewContent::DepartureBoard,
            ViewId::Alerts => ViewContent::ServiceAlerts,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleIcon {
    Accessibility,
    Sun,
    Moon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleControl {
    pub aria_label: &'static str,
    pub icon: ToggleIcon,
    pub pressed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderChrome {
    pub brand: &'static str,
    pub subtitle: &'static str,
    pub live_label: &'static str,
    pub active_lines_label: &'static str,
    pub contrast_toggle: ToggleControl,
    pub theme_toggle: ToggleControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavItem {
    pub view: ViewId,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentSlot {
    pub content: ViewContent,
    pub frame: ContentFrame,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShellFrame {
    pub presentation: PresentationAttributes,
    pub header: HeaderChrome,
    pub navigation: Vec<NavItem>,
    pub content: ContentSlot,
    pub notices: Vec<RenderedNotice>,
}

pub struct Shell {
    preferences: PreferenceStore,
    router: ViewRouter,
    notices: NotificationQueue,
    scheduler: AlertScheduler,
    alert_session: Option<CancellationHandle>,
    alert_rx: Receiver<AlertEvent>,
    alert_action: NotificationAction,
    next_notice_id: u64,
}

impl Shell {
    /// Loads and applies preferences, then arms the alert session. Must run
    /// inside a tokio runtime.
    pub fn boot(config: &ShellConfig, backend: Box<dyn KeyValueStore>) -> Result<Self, ShellError> {
        let initial_view = config.default_view()?;
        let alert_action = NotificationAction {
            label: config.alert_action_label.clone(),
            target: config.alert_action_target()?,
        };
        let scheduler = AlertScheduler::from_script(config.alerts.clone())?;

        let mut preferences =
            PreferenceStore::new(backend, PreferenceKeys::with_prefix(&config.key_prefix));
        let loaded = preferences.load();
        preferences.apply(loaded);

        // Each alert fires once, so the channel can never fill.
        let (alert_tx, alert_rx) = bounded(scheduler.events().len().max(1));
        let alert_session = scheduler.start(move |event| {
            match alert_tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    warn!(alert_id = %event.id(), "alert intake full; dropping alert");
                }
                Err(TrySendError::Disconnected(_)) => {
                    debug!("shell gone; alert discarded");
                }
            }
        })?;

        info!(
            view = %initial_view,
            theme = loaded.theme.as_stored(),
            contrast = loaded.contrast.as_stored(),
            alerts = scheduler.events().len(),
            "shell booted"
        );

        Ok(Self {
            preferences,
            router: ViewRouter::new(initial_view, config.transition(), Instant::now()),
            notices: NotificationQueue::new(config.notice_timeout()),
            scheduler,
            alert_session: Some(alert_session),
            alert_rx,
            alert_action,
            next_notice_id: 1,
        })
    }

    pub fn process_events(&mut self) -> usize {
        let now = Instant::now();
        let mut shown = 0;
        while let Ok(event) = self.alert_rx.try_recv() {
            let record = NotificationRecord {
                id: self.allocate_notice_id(),
                source: NoticeSource::Alert(event.id()),
                severity: event.severity(),
                title: event.title().to_string(),
                message: event.message().to_string(),
                created_at: Local::now(),
                action: Some(self.alert_action.clone()),
            };
            if self.notices.show_at(record, now) {
                shown += 1;
            }
        }

        let expired = self.notices.expire(now);
        if expired > 0 {
            debug!(expired, "notices timed out");
        }
        self.router.poll(now);
        shown
    }

    pub fn notify(
        &mut self,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
        action: Option<NotificationAction>,
    ) -> NoticeId {
        let id = self.allocate_notice_id();
        let record = NotificationRecord {
            id,
            source: NoticeSource::User,
            severity,
            title: title.into(),
            message: message.into(),
            created_at: Local::now(),
            action,
        };
        self.notices.show(record);
        id
    }

    pub fn navigate(&mut self, view: ViewId) -> bool {
        self.router.switch_to(view, Instant::now())
    }

    pub fn activate_notice(&mut self, id: NoticeId) -> Option<ViewId> {
        let target = self.notices.activate(id)?;
        self.navigate(target);
        Some(target)
    }

    pub fn dismiss_notice(&mut self, id: NoticeId) -> bool {
        self.notices.dismiss(id)
    }

    pub fn set_theme(&mut self, dark: bool) -> Result<()> {
        self.preferences.set_theme(dark)
    }

    pub fn set_contrast(&mut self, high: bool) -> Result<()> {
        self.preferences.set_contrast(high)
    }

    pub fn toggle_theme(&mut self) -> Result<()> {
        let dark = !self.preferences.preferences().theme.is_dark();
        self.set_theme(dark)
    }

    pub fn toggle_contrast(&mut self) -> Result<()> {
        let high = !self.preferences.preferences().contrast.is_high();
        self.set_contrast(high)
    }

    pub fn current_view(&self) -> ViewId {
        self.router.current()
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences.preferences()
    }

    pub fn presentation(&self) -> PresentationAttributes {
        self.preferences.presentation()
    }

    pub fn notices(&self) -> &NotificationQueue {
        &self.notices
    }

    pub fn scheduler(&self) -> &AlertScheduler {
        &self.scheduler
    }

    pub fn drain_transitions(&mut self) -> Vec<TransitionEvent> {
        self.router.drain_events()
    }

    pub fn alerts_pending(&self) -> bool {
        self.alert_session
            .as_ref()
            .is_some_and(|session| !session.is_finished())
    }

    pub fn render(&self) -> ShellFrame {
        let now = Instant::now();
        let preferences = self.preferences.preferences();
        let dark = preferences.theme.is_dark();
        let high_contrast = preferences.contrast.is_high();
        let current = self.router.current();
        let frame = self.router.frame(now);

        ShellFrame {
            presentation: self.preferences.presentation(),
            header: HeaderChrome {
                brand: BRAND,
                subtitle: SUBTITLE,
                live_label: LIVE_LABEL,
                active_lines_label: ACTIVE_LINES_LABEL,
                contrast_toggle: ToggleControl {
                    aria_label: if high_contrast {
                        "Desactivar alto contraste"
                    } else {
                        "Activar alto contraste"
                    },
                    icon: ToggleIcon::Accessibility,
                    pressed: high_contrast,
                },
                theme_toggle: ToggleControl {
                    aria_label: if dark {
                        "Cambiar a modo claro"
                    } else {
                        "Cambiar a modo oscuro"
                    },
                    icon: if dark { ToggleIcon::Sun } else { ToggleIcon::Moon },
                    pressed: dark,
                },
            },
            navigation: ViewId::ALL
                .into_iter()
                .map(|view| NavItem {
                    view,
                    label: view.label(),
                    active: view == current,
                })
                .collect(),
            content: ContentSlot {
                content: ViewContent::from(frame.view),
                frame,
            },
            notices: self.notices.render(preferences.theme),
        }
    }

    /// Ends the session's alert timers. Dropping the shell does the same.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.alert_session.take() {
            session.cancel();
        }
    }

    pub fn next_notice_expiry(&self) -> Option<Duration> {
        let now = Instant::now();
        self.notices
            .active()
            .iter()
            .map(|notice| notice.expires_at.saturating_duration_since(now))
            .min()
    }

    fn allocate_notice_id(&mut self) -> NoticeId {
        let id = NoticeId(self.next_notice_id);
        self.next_notice_id += 1;
        id
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
