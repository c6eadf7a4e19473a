mod app;
mod backend;
mod cli;
mod config;
mod console;
mod detail;
mod error;
mod fetcher;
mod input;
mod model;
mod namespaces;
mod registry;
mod run_poller;
mod session;
mod task;
#[cfg(test)]
mod testutil;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppCommand};
use backend::HttpBackend;
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use console::{Console, ConsoleEvent};
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use error::compact_error;
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let settings = load_settings(&args)?;
    info!(
        source = settings.source.as_deref().unwrap_or("defaults"),
        api = %settings.api_url,
        observe = %settings.observe_url,
        "configuration loaded"
    );

    let backend = HttpBackend::new(
        &settings.api_url,
        &settings.observe_url,
        settings.request_timeout,
    )?;
    let (mut console, events) = Console::new(Arc::new(backend), settings.console());
    console.preselect(args.cluster.clone(), args.namespace.clone());

    let mut app = App::new();
    run(&mut app, &mut console, events, &settings).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    // The terminal owns stdout; logs go to a file or nowhere.
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }

    Ok(())
}

fn load_settings(args: &CliArgs) -> Result<Settings> {
    Settings::load(args).context("failed to load configuration")
}

async fn run(
    app: &mut App,
    console: &mut Console,
    events: UnboundedReceiver<ConsoleEvent>,
    settings: &Settings,
) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    console.start();
    let run_result = run_loop(&mut terminal, app, console, events, settings).await;
    console.shutdown();
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    console: &mut Console,
    mut events: UnboundedReceiver<ConsoleEvent>,
    settings: &Settings,
) -> Result<()> {
    let mut reader = EventStream::new();
    let mut ticker = interval_at(
        tokio::time::Instant::now() + settings.refresh,
        settings.refresh,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        terminal
            .draw(|frame| ui::render(frame, app, console))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action, console);
                            execute_app_command(app, console, command);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        let error = anyhow::Error::new(error).context("terminal event error");
                        app.set_status(compact_error(&error));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            maybe_event = events.recv() => {
                match maybe_event {
                    Some(event) => {
                        console.apply(event);
                        app.clamp_selection(console);
                    }
                    None => break,
                }
            }
            _ = ticker.tick() => {
                console.auto_refresh();
            }
        }
    }

    Ok(())
}

fn execute_app_command(app: &mut App, console: &mut Console, command: AppCommand) {
    match command {
        AppCommand::None => {}
        AppCommand::SelectTab(tab) => console.select_tab(tab),
        AppCommand::SelectCluster(cluster) => {
            app.set_status(format!("Cluster {cluster}"));
            console.select_cluster(Some(cluster));
        }
        AppCommand::SelectNamespace(namespace) => {
            app.set_status(format!("Namespace {namespace}"));
            console.select_namespace(Some(namespace));
        }
        AppCommand::OpenDetail(pod) => console.open_pod_detail(&pod),
        AppCommand::CloseDetail => console.close_pod_detail(),
        AppCommand::ShowEventsForPod(pod) => {
            app.set_status(format!("Events for pod {pod}"));
            console.show_events_for_pod(&pod);
        }
        AppCommand::SetEventPod(pod) => console.set_event_pod(pod),
        AppCommand::CycleEventType => console.cycle_event_type(),
        AppCommand::ToggleMonitorFilter => {
            console.toggle_monitor_filter();
            app.set_status(format!(
                "Monitor filter: {}",
                console.selection().monitor_filter.label()
            ));
        }
        AppCommand::SetAlertNamespace(namespace) => console.set_alert_namespace(namespace),
        AppCommand::SubmitQuery(query) => console.submit_query(&query, None),
        AppCommand::Refresh => {
            app.set_status("Refreshing");
            console.refresh_active_tab();
            if let Some(cluster) = console.selection().cluster {
                console.refresh_namespaces_for(&cluster);
            }
        }
        AppCommand::RefreshClusters => {
            app.set_status("Refreshing clusters");
            console.refresh_clusters();
        }
        AppCommand::TriggerRun => {
            app.set_status("Triggering run");
            console.trigger_run(None);
        }
        AppCommand::PollRun => console.poll_run_once(),
    }
}

#[cfg(test)]
mod tests {
    use super::load_settings;
    use crate::cli::CliArgs;
    use clap::Parser;

    #[test]
    fn unreadable_config_is_returned_as_an_error_chain() {
        let missing = std::env::temp_dir()
            .join(format!("fleetwatch-missing-{}", std::process::id()))
            .join("config.yaml");
        let args = CliArgs::parse_from([
            "fleetwatch",
            "--config",
            missing.to_str().unwrap(),
        ]);

        let error = load_settings(&args).unwrap_err();
        let chain: Vec<String> = error.chain().map(ToString::to_string).collect();
        assert_eq!(chain[0], "failed to load configuration");
        assert!(chain[1].starts_with("failed to read config"));
    }
}
