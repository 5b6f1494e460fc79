use std::{collections::HashSet, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::{NoticeId, ViewId};
use shell_core::{load_config, resolve_settings_path, RenderedNotice, Shell, ShellFrame};
use storage::SettingsFile;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const IDLE_POLL: Duration = Duration::from_millis(250);
const MIN_POLL: Duration = Duration::from_millis(10);

#[derive(Parser, Debug)]
#[command(about = "Tuzobus transit display shell")]
struct Args {
    /// TOML config file; defaults to ./kiosk.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// View to open after boot (map, search, departures, alerts).
    #[arg(long)]
    view: Option<String>,
    #[arg(long)]
    toggle_theme: bool,
    #[arg(long)]
    toggle_contrast: bool,
    #[arg(long)]
    follow_alerts: bool,
    #[arg(long)]
    json: bool,
    #[arg(long, default_value_t = 30)]
    run_for_secs: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = &args.data_dir {
        config.data_dir = Some(dir.clone());
    }
    let settings_path = resolve_settings_path(&config)?;
    let settings = SettingsFile::open(&settings_path)
        .with_context(|| format!("failed to open settings at '{}'", settings_path.display()))?;

    let mut shell = Shell::boot(&config, Box::new(settings))?;

    if let Some(view) = &args.view {
        let view: ViewId = view.parse()?;
        shell.navigate(view);
    }
    if args.toggle_theme {
        if let Err(err) = shell.toggle_theme() {
            warn!("theme change not persisted: {err:#}");
        }
    }
    if args.toggle_contrast {
        if let Err(err) = shell.toggle_contrast() {
            warn!("contrast change not persisted: {err:#}");
        }
    }
    print_chrome(&shell.render());

    let run_for = sleep(Duration::from_secs(args.run_for_secs));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(run_for, ctrl_c);

    let mut printed: HashSet<NoticeId> = HashSet::new();
    let mut visible: HashSet<NoticeId> = HashSet::new();
    loop {
        let wait = shell
            .next_notice_expiry()
            .map_or(IDLE_POLL, |until| until.clamp(MIN_POLL, IDLE_POLL));
        tokio::select! {
            _ = sleep(wait) => {}
            _ = &mut run_for => break,
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
        }

        shell.process_events();
        let before = shell.current_view();
        let notices = shell.render().notices;
        for notice in &notices {
            if !printed.insert(notice.id) {
                continue;
            }
            print_notice(notice, args.json)?;
            if args.follow_alerts && notice.action_label.is_some() {
                shell.activate_notice(notice.id);
            }
        }

        // Sleep above is bounded by the next expiry, so timeouts show up promptly.
        let still_visible: HashSet<NoticeId> =
            shell.render().notices.iter().map(|n| n.id).collect();
        for gone in visible.difference(&still_visible) {
            debug!(notice_id = %gone, "notice closed");
        }
        visible = still_visible;

        if shell.current_view() != before {
            println!("view: {} -> {}", before, shell.current_view());
        }
    }

    shell.shutdown();
    Ok(())
}

fn print_chrome(frame: &ShellFrame) {
    let header = &frame.header;
    println!("{} | {}", header.brand, header.subtitle);
    println!("{} · {}", header.live_label, header.active_lines_label);
    println!(
        "[{}] [{}]  classes: {:?}",
        header.contrast_toggle.aria_label,
        header.theme_toggle.aria_label,
        frame.presentation.class_list()
    );
    let nav: Vec<String> = frame
        .navigation
        .iter()
        .map(|item| {
            if item.active {
                format!("*{}*", item.label)
            } else {
                item.label.to_string()
            }
        })
        .collect();
    println!("{}", nav.join("  "));
}

fn print_notice(notice: &RenderedNotice, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(notice)?);
        return Ok(());
    }

    let action = notice
        .action_label
        .as_deref()
        .map(|label| format!(" [{label}]"))
        .unwrap_or_default();
    println!(
        "[{}] {} {}: {}{}",
        notice.timestamp,
        notice.severity.as_str().to_uppercase(),
        notice.title,
        notice.message,
        action
    );
    Ok(())
}
