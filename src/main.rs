mod cli;
mod config;
mod print;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};

use callscope_logs::{InternalLogEntry, LogProcessor, LogStore, load_log_file};
use callscope_tui::{
    Action, AppState, ErrorPopup, Event, EventHandler, HelpOverlay, KeyBindings, KeyContext,
    LogViewerScreen, Tui,
};
use cli::Args;
use config::Settings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_file.as_deref())?;

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let settings = Settings::from_args(&args)?;

    if args.print {
        let Some(path) = &args.file else {
            bail!("--print needs a FILE to read");
        };
        return print::run(path, &settings).await;
    }

    run_app(args.file, settings).await
}

/// Results of background loads
enum InternalAction {
    Loaded {
        generation: u64,
        source: String,
        records: Vec<InternalLogEntry>,
    },
    LoadFailed {
        generation: u64,
        error: String,
    },
}

async fn run_app(file: Option<PathBuf>, settings: Settings) -> Result<()> {
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<InternalAction>();

    let store = LogStore::new();
    let mut state = AppState::new(settings.view, settings.show_timestamps);

    if let Some(path) = &file {
        start_load(&store, path.clone(), internal_tx.clone());
    }

    let mut tui = Tui::new()?;
    let mut events = EventHandler::new(Duration::from_millis(100));
    let keybindings = KeyBindings::new();
    let mut tick: usize = 0;

    render(&mut tui, &mut state, &store, tick)?;
    state.render_dirty = false;

    loop {
        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = if state.ui_state.error_message.is_some() {
                            // Error popup is modal: any key but quit dismisses it
                            match keybindings.get_action(KeyContext::LogViewer, &key) {
                                Some(Action::Quit) => Some(Action::Quit),
                                _ => Some(Action::DismissError),
                            }
                        } else if state.ui_state.search_active {
                            keybindings.get_filter_input_action(&key)
                        } else {
                            keybindings.get_action(KeyContext::LogViewer, &key)
                        };

                        if let Some(action) = action {
                            handle_action(&mut state, &store, file.as_deref(), &internal_tx, action);
                        }
                    }
                    Event::Tick => {
                        // Animate the loading indicator
                        if store.is_loading() {
                            tick = tick.wrapping_add(1);
                            state.render_dirty = true;
                        }
                    }
                    Event::Resize(_, _) => {
                        handle_action(&mut state, &store, file.as_deref(), &internal_tx, Action::Render);
                    }
                    Event::Error(e) => {
                        handle_action(&mut state, &store, file.as_deref(), &internal_tx, Action::ShowError(e));
                    }
                }
            }

            // Handle finished loads
            Some(internal) = internal_rx.recv() => {
                apply_load_result(&mut state, &store, internal);
            }
        }

        if state.should_quit {
            break;
        }

        if state.render_dirty {
            render(&mut tui, &mut state, &store, tick)?;
            state.render_dirty = false;
        }
    }

    events.shutdown();
    tui.restore()?;

    Ok(())
}

/// Install a finished load, or report its failure, unless a newer load started
fn apply_load_result(state: &mut AppState, store: &LogStore, internal: InternalAction) {
    match internal {
        InternalAction::Loaded {
            generation,
            source,
            records,
        } => {
            if store.finish_load(generation, source, records) {
                state.reset_for_new_file();
            }
        }
        InternalAction::LoadFailed { generation, error } => {
            if store.abandon_load(generation) {
                state.show_error(error);
            }
        }
    }
    state.render_dirty = true;
}

/// Load and process a file in the background; the newest load wins
fn start_load(store: &LogStore, path: PathBuf, internal_tx: mpsc::UnboundedSender<InternalAction>) {
    let generation = store.begin_load();
    info!(generation, path = %path.display(), "loading call log");

    tokio::spawn(async move {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let action = match load_log_file(&path).await {
            Ok(entries) => {
                let records = LogProcessor::new().process_logs(entries).complete().await;
                debug!(generation, records = records.len(), "load finished");
                InternalAction::Loaded {
                    generation,
                    source,
                    records,
                }
            }
            Err(e) => InternalAction::LoadFailed {
                generation,
                error: format!("Failed to load {}: {:#}", path.display(), anyhow::Error::from(e)),
            },
        };

        let _ = internal_tx.send(action);
    });
}

fn handle_action(
    state: &mut AppState,
    store: &LogStore,
    file: Option<&Path>,
    internal_tx: &mpsc::UnboundedSender<InternalAction>,
    action: Action,
) {
    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::ToggleHelp => {
            state.toggle_help();
        }
        Action::CloseOverlay => {
            if state.ui_state.help_visible {
                state.toggle_help();
            } else if state.ui_state.error_message.is_some() {
                state.dismiss_error();
            }
        }
        Action::SelectUp(n) => {
            state.select_up(n);
        }
        Action::SelectDown(n) => {
            state.select_down(n);
        }
        Action::SelectTop => {
            state.select_top();
        }
        Action::SelectBottom => {
            state.select_bottom();
        }
        Action::PageUp => {
            state.page_up();
        }
        Action::PageDown => {
            state.page_down();
        }
        Action::ToggleExpand => {
            state.toggle_expand(store);
        }
        Action::ToggleLevel(level) => {
            state.toggle_level(&level);
        }
        Action::ToggleSortOrder => {
            state.toggle_sort_order();
        }
        Action::ToggleTimestamps => {
            state.toggle_timestamps();
        }
        Action::ToggleStats => {
            state.toggle_stats();
        }
        Action::OpenSearch => {
            state.start_search();
        }
        Action::CloseSearch => {
            state.cancel_search();
        }
        Action::SearchInput(c) => {
            state.search_input_char(c);
        }
        Action::SearchBackspace => {
            state.search_input_backspace();
        }
        Action::SearchClear => {
            state.search_input_clear();
        }
        Action::ApplyFilter => {
            state.apply_filter();
        }
        Action::ClearFilter => {
            state.clear_filter();
        }
        Action::ToggleCaseSensitive => {
            state.toggle_case_sensitive();
        }
        Action::Reload => match file {
            Some(path) => start_load(store, path.to_path_buf(), internal_tx.clone()),
            None => state.show_error("No file to reload".to_string()),
        },
        Action::ShowError(msg) => {
            state.show_error(msg);
        }
        Action::DismissError => {
            state.dismiss_error();
        }
        Action::Render => {}
    }

    state.render_dirty = true;
}

fn render(tui: &mut Tui, state: &mut AppState, store: &LogStore, tick: usize) -> Result<()> {
    tui.draw(|frame| {
        LogViewerScreen::render(frame, state, store, tick);

        // Render help overlay if visible
        if state.ui_state.help_visible {
            HelpOverlay::render(frame);
        }

        if let Some(message) = &state.ui_state.error_message {
            ErrorPopup::render(frame, message);
        }
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscope_logs::{LogEntry, LogLevel, ViewFilter};

    fn loaded(generation: u64, source: &str) -> InternalAction {
        InternalAction::Loaded {
            generation,
            source: source.to_string(),
            records: vec![InternalLogEntry::new(
                "k".to_string(),
                LogEntry::new(LogLevel::Log, "10:00", Vec::new()),
            )],
        }
    }

    fn failed(generation: u64) -> InternalAction {
        InternalAction::LoadFailed {
            generation,
            error: "Failed to load".to_string(),
        }
    }

    #[test]
    fn test_failure_of_stale_load_is_not_shown() {
        let store = LogStore::new();
        let mut state = AppState::new(ViewFilter::default(), true);
        let first = store.begin_load();
        let second = store.begin_load();

        apply_load_result(&mut state, &store, failed(first));
        assert!(state.ui_state.error_message.is_none());
        assert!(store.is_loading());

        apply_load_result(&mut state, &store, loaded(second, "new.json"));
        assert_eq!(store.source().as_deref(), Some("new.json"));
        assert!(!store.is_loading());
    }

    #[test]
    fn test_failure_of_latest_load_is_shown() {
        let store = LogStore::new();
        let mut state = AppState::new(ViewFilter::default(), true);
        let generation = store.begin_load();

        apply_load_result(&mut state, &store, failed(generation));
        assert_eq!(state.ui_state.error_message.as_deref(), Some("Failed to load"));
        assert!(!store.is_loading());
    }

    #[test]
    fn test_stale_records_are_dropped() {
        let store = LogStore::new();
        let mut state = AppState::new(ViewFilter::default(), true);
        let first = store.begin_load();
        let second = store.begin_load();

        apply_load_result(&mut state, &store, loaded(second, "new.json"));
        apply_load_result(&mut state, &store, loaded(first, "old.json"));
        assert_eq!(store.source().as_deref(), Some("new.json"));
    }
}
