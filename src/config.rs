use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::console::ConsoleSettings;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_OBSERVE_URL: &str = "http://localhost:8001";

/// Effective settings after layering file, environment and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub source: Option<String>,
    pub api_url: String,
    pub observe_url: String,
    pub session_interval: Duration,
    pub refresh: Duration,
    pub run_poll_interval: Duration,
    pub run_poll_max_ticks: u32,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    observe_url: Option<String>,
    #[serde(default, alias = "session_interval")]
    session_interval_secs: Option<u64>,
    #[serde(default)]
    refresh_ms: Option<u64>,
    #[serde(default, alias = "run_poll_interval")]
    run_poll_interval_secs: Option<u64>,
    #[serde(default)]
    run_poll_max_ticks: Option<u32>,
    #[serde(default, alias = "timeout_secs")]
    request_timeout_secs: Option<u64>,
}

impl Settings {
    /// Loads the config file (if any) and applies command-line overrides.
    /// URL environment variables arrive through `CliArgs`.
    pub fn load(args: &CliArgs) -> Result<Self> {
        let path = match &args.config {
            Some(path) => Some(path.clone()),
            None => discover_config_path(),
        };
        let file = match &path {
            Some(path) => read_config(path)?,
            None => ConfigFile::default(),
        };
        Ok(Self::resolve(
            file,
            args,
            path.map(|path| path.display().to_string()),
        ))
    }

    fn resolve(file: ConfigFile, args: &CliArgs, source: Option<String>) -> Self {
        Self {
            source,
            api_url: args
                .api_url
                .clone()
                .or(file.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            observe_url: args
                .observe_url
                .clone()
                .or(file.observe_url)
                .unwrap_or_else(|| DEFAULT_OBSERVE_URL.to_string()),
            session_interval: Duration::from_secs(
                args.session_interval_secs
                    .or(file.session_interval_secs)
                    .unwrap_or(5)
                    .max(1),
            ),
            refresh: Duration::from_millis(args.refresh_ms.or(file.refresh_ms).unwrap_or(15_000).max(250)),
            run_poll_interval: Duration::from_secs(file.run_poll_interval_secs.unwrap_or(2).max(1)),
            run_poll_max_ticks: file.run_poll_max_ticks.unwrap_or(30).max(1),
            request_timeout: Duration::from_secs(file.request_timeout_secs.unwrap_or(15).max(1)),
        }
    }

    pub fn console(&self) -> ConsoleSettings {
        ConsoleSettings {
            session_interval: self.session_interval,
            run_poll_interval: self.run_poll_interval,
            run_poll_max_ticks: self.run_poll_max_ticks,
        }
    }
}

fn read_config(path: &Path) -> Result<ConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    if raw.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("FLEETWATCH_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("fleetwatch.yaml"),
        PathBuf::from("fleetwatch.yml"),
        PathBuf::from(".fleetwatch.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let candidate = PathBuf::from(home).join(".config/fleetwatch/config.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{ConfigFile, Settings, read_config};
    use crate::cli::CliArgs;
    use clap::Parser;
    use std::time::Duration;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["fleetwatch"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let mut cli = args(&[]);
        cli.api_url = None;
        cli.observe_url = None;
        let settings = Settings::resolve(ConfigFile::default(), &cli, None);

        assert_eq!(settings.api_url, "http://localhost:8000");
        assert_eq!(settings.observe_url, "http://localhost:8001");
        assert_eq!(settings.session_interval, Duration::from_secs(5));
        assert_eq!(settings.refresh, Duration::from_millis(15_000));
        assert_eq!(settings.run_poll_interval, Duration::from_secs(2));
        assert_eq!(settings.run_poll_max_ticks, 30);
        assert_eq!(settings.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn flags_override_file_values() {
        let file: ConfigFile = serde_yaml::from_str(
            "observe_url: http://observe.internal:9000\nrefresh_ms: 5000\nrun_poll_max_ticks: 10\n",
        )
        .unwrap();
        let mut cli = args(&["--refresh-ms", "2000"]);
        cli.api_url = None;
        cli.observe_url = None;
        let settings = Settings::resolve(file, &cli, Some("fleetwatch.yaml".to_string()));

        assert_eq!(settings.observe_url, "http://observe.internal:9000");
        assert_eq!(settings.refresh, Duration::from_millis(2000));
        assert_eq!(settings.run_poll_max_ticks, 10);
        assert_eq!(settings.console().run_poll_max_ticks, 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = std::env::temp_dir().join(format!("fleetwatch-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yaml");
        std::fs::write(&path, "observe_uri: http://typo\n").unwrap();

        let error = read_config(&path).unwrap_err();
        assert!(format!("{error:#}").contains("failed to parse config"));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
