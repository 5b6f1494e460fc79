use std::{
    collections::HashSet,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use shared::{
    error::ShellError,
    notice::{AlertEvent, AlertScriptEntry},
};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, info, warn};

/// Owns the fixed alert set, ordered by delay then id.
pub struct AlertScheduler {
    events: Arc<[AlertEvent]>,
    running: Arc<AtomicBool>,
}

impl AlertScheduler {
    pub fn new(mut events: Vec<AlertEvent>) -> Result<Self, ShellError> {
        let mut seen = HashSet::with_capacity(events.len());
        for event in &events {
            if !seen.insert(event.id()) {
                return Err(ShellError::DuplicateAlertId(event.id().0));
            }
        }
        events.sort_by_key(|event| (event.delay_ms(), event.id()));

        Ok(Self {
            events: events.into(),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn from_script(entries: Vec<AlertScriptEntry>) -> Result<Self, ShellError> {
        let events = entries
            .into_iter()
            .map(AlertEvent::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(events)
    }

    pub fn events(&self) -> &[AlertEvent] {
        &self.events
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Arms one timer per distinct deadline, relative to now. Alerts sharing a
    /// deadline go out in id order from the same timer. A delivery that
    /// panics is logged and skipped; no other alert is affected.
    pub fn start<F>(&self, on_event: F) -> Result<CancellationHandle, ShellError>
    where
        F: FnMut(AlertEvent) + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| ShellError::RuntimeUnavailable)?;
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(ShellError::SchedulerAlreadyRunning);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        let origin = Instant::now();
        let on_event = Arc::new(Mutex::new(on_event));

        let tasks = self
            .events
            .chunk_by(|a, b| a.delay_ms() == b.delay_ms())
            .map(|batch| {
                let batch = batch.to_vec();
                let deadline = origin + batch[0].delay();
                let cancelled = Arc::clone(&cancelled);
                let on_event = Arc::clone(&on_event);
                runtime.spawn(async move {
                    sleep_until(deadline).await;
                    for event in batch {
                        if cancelled.load(Ordering::Acquire) {
                            return;
                        }
                        deliver(&*on_event, event);
                    }
                })
            })
            .collect();

        info!(alerts = self.events.len(), "alert schedule armed");
        Ok(CancellationHandle {
            cancelled,
            running: Arc::clone(&self.running),
            tasks,
        })
    }
}

fn deliver<F>(on_event: &Mutex<F>, event: AlertEvent)
where
    F: FnMut(AlertEvent),
{
    let alert_id = event.id();
    debug!(%alert_id, severity = %event.severity(), "alert timer elapsed");
    let mut on_event = on_event.lock().unwrap_or_else(PoisonError::into_inner);
    if panic::catch_unwind(AssertUnwindSafe(|| (*on_event)(event))).is_err() {
        warn!(%alert_id, "alert delivery panicked; skipping");
    }
}

/// Releases the armed timers. Cancelling is idempotent and also happens on
/// drop.
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        for task in &self.tasks {
            task.abort();
        }
        self.running.store(false, Ordering::Release);
        info!("alert schedule cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(JoinHandle::is_finished)
    }
}

impl Drop for CancellationHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
