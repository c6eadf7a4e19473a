use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "fleetwatch",
    version,
    about = "A terminal console for watching pods, events and alerts across clusters."
)]
pub struct CliArgs {
    /// Control API base URL (run trigger and status)
    #[arg(long, env = "FLEETWATCH_API_URL")]
    pub api_url: Option<String>,

    /// Observe API base URL (clusters, pods, events, metrics)
    #[arg(long, env = "FLEETWATCH_OBSERVE_URL")]
    pub observe_url: Option<String>,

    /// Auto-refresh interval of the active view in milliseconds
    #[arg(long)]
    pub refresh_ms: Option<u64>,

    /// Seconds between session status checks
    #[arg(long)]
    pub session_interval_secs: Option<u64>,

    /// Configuration file (defaults to FLEETWATCH_CONFIG or the usual locations)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Start on a specific cluster
    #[arg(short, long)]
    pub cluster: Option<String>,

    /// Start in a specific namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// tracing filter (for example: info,fleetwatch=debug)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
