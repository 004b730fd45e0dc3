//! Tracing setup for the `jobtrawl` binary and its integration tests.
//!
//! Every run writes to a daily rolling file. The `logging` section of the
//! configuration ([`LogSettings`]) decides where that file lives, whether
//! events are mirrored to stderr and whether they are encoded as text or JSON.

use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, anyhow};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Overrides the log directory when the configuration leaves it unset.
pub const LOG_DIR_ENV: &str = "JOBTRAWL_LOG_DIR";

type Sink = Box<dyn Layer<Registry> + Send + Sync>;

struct Installed {
    file: PathBuf,
    _guard: WorkerGuard,
}

static INSTALLED: OnceLock<Installed> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// The `logging` section of a run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Directory for the rolling file; `~` is expanded.
    pub dir: Option<PathBuf>,
    /// Mirror events to stderr.
    pub stderr: bool,
    pub format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            stderr: true,
            format: LogFormat::Text,
            filter: "info".into(),
        }
    }
}

impl LogSettings {
    /// Directory the rolling file goes to: the configured one, then
    /// `$JOBTRAWL_LOG_DIR`, then `<data dir>/jobtrawl/logs`.
    pub fn resolved_dir(&self) -> PathBuf {
        let configured = self
            .dir
            .as_ref()
            .map(|d| d.to_string_lossy().into_owned())
            .or_else(|| std::env::var(LOG_DIR_ENV).ok().filter(|v| !v.is_empty()));

        match configured {
            Some(dir) => PathBuf::from(shellexpand::tilde(&dir).into_owned()),
            None => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("jobtrawl")
                .join("logs"),
        }
    }
}

/// Install the global subscriber and return today's log file.
///
/// `file_stem` names the file (`<stem>.log.<date>`). Only the first call
/// installs anything; later calls return the file chosen by the first.
pub fn init_logging(file_stem: &str, settings: &LogSettings) -> anyhow::Result<PathBuf> {
    if let Some(installed) = INSTALLED.get() {
        return Ok(installed.file.clone());
    }

    let dir = settings.resolved_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory: {}", dir.display()))?;

    let file_name = format!("{file_stem}.log");
    let file = dir.join(format!("{file_name}.{}", Local::now().format("%Y-%m-%d")));
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, file_name));

    let mut sinks = vec![sink(writer, settings.format, false)];
    if settings.stderr {
        sinks.push(sink(std::io::stderr, settings.format, true));
    }
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter));

    tracing_subscriber::registry()
        .with(sinks)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow!("tracing setup failed: {e}"))?;

    let installed = INSTALLED.get_or_init(|| Installed { file, _guard: guard });
    Ok(installed.file.clone())
}

fn sink<W>(writer: W, format: LogFormat, terminal: bool) -> Sink
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer);
    match format {
        LogFormat::Text => layer.with_ansi(terminal).boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn configured_dir_beats_environment() {
        temp_env::with_var(LOG_DIR_ENV, Some("/from/env"), || {
            let settings = LogSettings {
                dir: Some("/var/log/jobtrawl".into()),
                ..LogSettings::default()
            };
            assert_eq!(settings.resolved_dir(), PathBuf::from("/var/log/jobtrawl"));
        });
    }

    #[test]
    #[serial]
    fn environment_dir_is_used_when_unset() {
        temp_env::with_var(LOG_DIR_ENV, Some("/from/env"), || {
            assert_eq!(LogSettings::default().resolved_dir(), PathBuf::from("/from/env"));
        });
    }

    #[test]
    #[serial]
    fn tilde_expands_to_home() {
        temp_env::with_vars([("HOME", Some("/home/trawler")), (LOG_DIR_ENV, None)], || {
            let settings = LogSettings {
                dir: Some("~/logs".into()),
                ..LogSettings::default()
            };
            assert_eq!(settings.resolved_dir(), PathBuf::from("/home/trawler/logs"));
        });
    }

    #[test]
    #[serial]
    fn fallback_lives_under_the_data_dir() {
        temp_env::with_var_unset(LOG_DIR_ENV, || {
            let dir = LogSettings::default().resolved_dir();
            assert!(dir.ends_with("jobtrawl/logs"));
        });
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: LogSettings = serde_json::from_str(r#"{"format":"json"}"#).unwrap();
        assert_eq!(settings.format, LogFormat::Json);
        assert!(settings.stderr);
        assert_eq!(settings.filter, "info");
    }
}
