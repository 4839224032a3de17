use std::time::{Duration, Instant};

use anyhow::Result;

use quire_app::App;
use quire_config::Config;
use quire_core::{Notice, TabState};
use quire_document::FsDocumentIo;
use quire_logger::LogLevel;
use quire_tab::Tab;

/// Sleep between pumps while documents are loading.
const PUMP_INTERVAL: Duration = Duration::from_millis(10);

fn main() -> Result<()> {
    // A broken config falls back to defaults; the error is logged once the logger runs
    let loaded = Config::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    let min_level = config
        .logging
        .min_level
        .parse::<LogLevel>()
        .unwrap_or(LogLevel::Info);
    let log_path = config.log_file_path().ok();
    if let Err(err) = quire_logger::init(log_path, config.logging.max_entries, min_level) {
        eprintln!("Error: failed to initialize logger: {}", err);
    }
    if let Err(err) = loaded {
        log::warn!("Using default config: {:#}", err);
    }

    let io = Box::new(FsDocumentIo::new(config.editor.create_backup_copy));
    let mut app = App::init(config, io)?;
    let window = app.create_window(0);

    let files: Vec<String> = std::env::args().skip(1).collect();
    if files.is_empty() {
        if let Some(window) = app.window_mut(window) {
            window.create_tab(true);
        }
    }
    if let Err(err) = app.open_command_line(window, &files) {
        eprintln!("Error: {:#}", err);
    }

    app.pump(Instant::now());
    while app.is_loading() {
        std::thread::sleep(PUMP_INTERVAL);
        app.pump(Instant::now());
    }

    if let Some(window) = app.window(window) {
        for tab in window.tabs() {
            println!("{}", summarize(tab));
        }
    }

    app.shutdown()
}

/// One status line per tab.
fn summarize(tab: &Tab) -> String {
    let document = tab.document();
    let detail = match tab.notice() {
        Some(Notice::LoadingError { message, .. }) if tab.state() == TabState::LoadingError => {
            message.clone()
        }
        Some(Notice::LoadingError { .. }) => "loaded with replacement characters".to_string(),
        Some(Notice::FileAlreadyOpen { .. }) => "already open".to_string(),
        _ => format!(
            "{} lines, {}",
            document.text().lines().count(),
            document.encoding()
        ),
    };
    format!("{} [{}]: {}", tab.name(), tab.state(), detail)
}
