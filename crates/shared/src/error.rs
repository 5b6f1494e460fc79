use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    #[error("unknown view '{0}'")]
    UnknownView(String),
    #[error("alert {id} has negative delay {delay_ms}ms")]
    NegativeDelay { id: i64, delay_ms: i64 },
    #[error("alert id {0} is defined more than once")]
    DuplicateAlertId(i64),
    #[error("alert scheduler already running; cancel the previous session first")]
    SchedulerAlreadyRunning,
    #[error("no async runtime available to arm alert timers")]
    RuntimeUnavailable,
    #[error("invalid configuration: {0}")]
    Config(String),
}
