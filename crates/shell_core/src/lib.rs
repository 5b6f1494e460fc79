pub mod config;
pub mod notifications;
pub mod router;
pub mod scheduler;
pub mod shell;

pub use config::{load_config, resolve_settings_path, ShellConfig};
pub use notifications::{NotificationQueue, NotificationSink, RenderedNotice};
pub use router::{ContentFrame, TransitionEvent, TransitionPhase, ViewRouter};
pub use scheduler::{AlertScheduler, CancellationHandle};
pub use shell::{Shell, ShellFrame, ViewContent};
