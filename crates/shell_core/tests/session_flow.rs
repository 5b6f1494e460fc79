use std::time::Duration;

use shared::domain::{Severity, Theme, ViewId};
use shell_core::{Shell, ShellConfig};
use storage::SettingsFile;

async fn advance_ms(ms: u64) {
    tokio::time::advance(Duration::from_millis(ms)).await;
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn scripted_session_delivers_each_alert_once_and_persists_theme() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = ShellConfig {
        data_dir: Some(temp.path().to_path_buf()),
        notice_timeout_ms: 60_000,
        ..ShellConfig::default()
    };
    let settings_path = shell_core::resolve_settings_path(&config).expect("settings path");

    let mut shell = Shell::boot(
        &config,
        Box::new(SettingsFile::open(&settings_path).expect("settings file")),
    )
    .expect("boot");
    assert_eq!(shell.current_view(), ViewId::Map);

    advance_ms(4_999).await;
    assert_eq!(shell.process_events(), 0);
    advance_ms(1).await;
    assert_eq!(shell.process_events(), 1);
    advance_ms(10_000).await;
    assert_eq!(shell.process_events(), 1);
    advance_ms(10_000).await;
    assert_eq!(shell.process_events(), 1);
    advance_ms(30_000).await;
    assert_eq!(shell.process_events(), 0);

    let severities: Vec<Severity> = shell.render().notices.iter().map(|n| n.severity).collect();
    assert_eq!(
        severities,
        vec![Severity::Warning, Severity::Info, Severity::Success]
    );

    let first = shell.render().notices[0].id;
    assert_eq!(shell.activate_notice(first), Some(ViewId::Alerts));
    shell.set_theme(true).expect("persist theme");
    drop(shell);

    let reopened = Shell::boot(
        &config,
        Box::new(SettingsFile::open(&settings_path).expect("settings file")),
    )
    .expect("second boot");
    assert_eq!(reopened.preferences().theme, Theme::Dark);
    assert_eq!(reopened.current_view(), ViewId::Map);
}
