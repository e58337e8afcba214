use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::task::LocalSet;
use tracing::{info, warn};

#[cfg(feature = "native-hotkeys")]
use modext::hotkeys::GlobalHotkeyBridge;
#[cfg(not(feature = "native-hotkeys"))]
use modext::hotkeys::RecordingHookBridge;

use modext::chord::Chord;
use modext::config::{self, Settings};
use modext::controller::{Controller, ControllerEvent};
use modext::logging;
use modext::stdin_commands::{self, ExternalCommand, Routed};
use modext::target::SimulatedTarget;
use modext::window::SimulatedWindow;

#[derive(Parser, Debug)]
#[command(name = "modext")]
#[command(about = "Feature toggles and global hotkeys for Sky.exe, driven by stdin JSONL commands", long_about = None)]
#[command(version)]
#[command(
    after_help = "Examples:\n  echo '{\"type\": \"attach\"}' | modext\n  modext --settings ./settings.json --log-dir ./logs\n"
)]
struct Cli {
    /// Settings file (defaults to <config dir>/modext/settings.json)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Directory for the JSONL log file (defaults to <data dir>/modext/logs)
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Start with the simulated game process not running
    #[arg(long)]
    no_game: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.log_dir.as_deref());

    let settings_path = resolve_settings_path(cli.settings);
    let settings = settings_path
        .as_deref()
        .map(config::load_settings_or_default)
        .unwrap_or_default();
    info!(
        category = "CONFIG",
        path = ?settings_path,
        bindings = settings.feature_hotkeys.len(),
        "Settings loaded"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to build the async runtime")?;
    let local = LocalSet::new();
    local.block_on(&runtime, run(settings, settings_path, !cli.no_game))
}

/// Explicit path wins; otherwise the platform default, migrating a legacy file first.
fn resolve_settings_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    match config::settings_path() {
        Ok(path) => {
            if let Some(legacy) = config::legacy_settings_path() {
                config::migrate_legacy_settings(&path, &legacy);
            }
            Some(path)
        }
        Err(e) => {
            warn!(category = "CONFIG", error = %e, "Settings will not be persisted");
            None
        }
    }
}

async fn run(settings: Settings, settings_path: Option<PathBuf>, game_running: bool) -> Result<()> {
    let target = SimulatedTarget::new();
    target.set_running(game_running);
    let window = SimulatedWindow::new();

    let (cmd_tx, cmd_rx) = async_channel::bounded(100);
    let (hook_tx, hook_rx) = async_channel::bounded(64);
    let (pointer_tx, pointer_rx) = async_channel::bounded(64);

    #[cfg(feature = "native-hotkeys")]
    let hooks =
        GlobalHotkeyBridge::new(hook_tx.clone()).context("Failed to start global hotkeys")?;
    #[cfg(not(feature = "native-hotkeys"))]
    let hooks = RecordingHookBridge::new(hook_tx.clone());

    let controller = Controller::new(
        target.clone(),
        target,
        hooks,
        window,
        settings,
        settings_path,
    );

    let stdin_rx = stdin_commands::start_stdin_listener();
    tokio::task::spawn_local(forward_stdin(stdin_rx, cmd_tx, hook_tx, pointer_tx));

    controller.run(cmd_rx, hook_rx, pointer_rx).await;
    Ok(())
}

/// Route stdin commands onto the controller's channels until stdin closes.
async fn forward_stdin(
    stdin_rx: async_channel::Receiver<ExternalCommand>,
    cmd_tx: async_channel::Sender<ControllerEvent>,
    hook_tx: async_channel::Sender<String>,
    pointer_tx: async_channel::Sender<Chord>,
) {
    while let Ok(cmd) = stdin_rx.recv().await {
        let sent = match cmd.route() {
            Some(Routed::Command(event)) => cmd_tx.send(event).await.is_ok(),
            Some(Routed::Hook(id)) => hook_tx.send(id).await.is_ok(),
            Some(Routed::Pointer(chord)) => pointer_tx.send(chord).await.is_ok(),
            None => {
                logging::log("STDIN", "Command has no controller event, skipped");
                true
            }
        };
        if !sent {
            break;
        }
    }
    logging::log("STDIN", "Stdin closed, stopping controller");
}
