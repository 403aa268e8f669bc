//! Subscriber setup for the bridge
//!
//! Everything in the crate emits `tracing` events. Nothing is printed until a
//! subscriber exists: `JNI_OnLoad` installs one from [`BridgeConfig`], and a
//! host that already owns the global dispatcher keeps it.
//!
//! On Android the default sink is logcat, since a loaded library's stdout and
//! stderr go nowhere. Other targets default to stderr.

use once_cell::sync::OnceCell;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::{parse_level, BridgeConfig};

/// Logcat tag, also the rolling file prefix
pub const LOG_TAG: &str = "netwatcher";

/// Set once by the first install attempt; holds the non-blocking worker guard
/// when the sink has one
static LOGGER: OnceCell<Option<WorkerGuard>> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// Where events end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// Daily-rolling files `<directory>/<prefix>.YYYY-MM-DD`
    File { directory: String, prefix: String },
    /// Android system log under `tag`
    #[cfg(target_os = "android")]
    Logcat { tag: String },
}

impl LogOutput {
    /// Logcat on Android, stderr elsewhere
    pub fn platform_default() -> Self {
        #[cfg(target_os = "android")]
        {
            LogOutput::Logcat {
                tag: LOG_TAG.to_string(),
            }
        }
        #[cfg(not(target_os = "android"))]
        {
            LogOutput::Stderr
        }
    }

    fn is_terminal_stream(&self) -> bool {
        matches!(self, LogOutput::Stdout | LogOutput::Stderr)
    }
}

/// Resolved logging settings, built from `[logging]` plus the environment
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Emit span open/close events
    pub span_events: bool,
    /// Comma-separated `EnvFilter` directives added on top of `level`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            output: LogOutput::platform_default(),
            span_events: false,
            filter: None,
        }
    }
}

impl LogConfig {
    /// Apply `NETWATCHER_LOG_LEVEL`, `NETWATCHER_LOG_JSON` and
    /// `NETWATCHER_LOG_FILE` over the current values
    pub fn apply_env(mut self) -> Self {
        if let Some(level) = std::env::var("NETWATCHER_LOG_LEVEL")
            .ok()
            .and_then(|level| parse_level(&level).ok())
        {
            self.level = level;
        }
        if std::env::var_os("NETWATCHER_LOG_JSON").is_some() {
            self.format = LogFormat::Json;
        }
        if let Ok(directory) = std::env::var("NETWATCHER_LOG_FILE") {
            self.output = LogOutput::File {
                directory,
                prefix: LOG_TAG.to_string(),
            };
        }
        self
    }
}

/// Install from a bridge config's `[logging]` section, then the environment
pub fn init_with_bridge_config(config: &BridgeConfig) -> bool {
    init_logging(config.logging.to_log_config().apply_env())
}

/// Install the global subscriber
///
/// True only for the call that installed it. Repeat calls, and hosts that
/// already have a global subscriber, get false.
pub fn init_logging(config: LogConfig) -> bool {
    let mut installed = false;
    LOGGER.get_or_init(|| {
        let sink = open_sink(&config.output);
        let layer = build_layer(sink.writer, sink.ansi, &config);
        installed = tracing_subscriber::registry().with(layer).try_init().is_ok();
        if let Some(err) = sink.fallback_reason {
            tracing::warn!("log file unavailable, using stderr: {}", err);
        }
        sink.guard
    });
    installed
}

struct Sink {
    writer: BoxMakeWriter,
    guard: Option<WorkerGuard>,
    ansi: bool,
    fallback_reason: Option<String>,
}

impl Sink {
    fn non_blocking<W>(inner: W, ansi: bool) -> Self
    where
        W: std::io::Write + Send + 'static,
    {
        let (writer, guard) = tracing_appender::non_blocking(inner);
        Self {
            writer: BoxMakeWriter::new(writer),
            guard: Some(guard),
            ansi,
            fallback_reason: None,
        }
    }
}

fn open_sink(output: &LogOutput) -> Sink {
    let ansi = output.is_terminal_stream();
    match output {
        LogOutput::Stdout => Sink::non_blocking(std::io::stdout(), ansi),
        LogOutput::Stderr => Sink::non_blocking(std::io::stderr(), ansi),
        LogOutput::File { directory, prefix } => match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(prefix)
            .build(directory)
        {
            Ok(appender) => Sink::non_blocking(appender, ansi),
            Err(err) => Sink {
                fallback_reason: Some(err.to_string()),
                ..Sink::non_blocking(std::io::stderr(), true)
            },
        },
        #[cfg(target_os = "android")]
        LogOutput::Logcat { tag } => Sink {
            writer: BoxMakeWriter::new(paranoid_android::AndroidLogMakeWriter::new(tag.clone())),
            guard: None,
            ansi,
            fallback_reason: None,
        },
    }
}

fn build_layer(
    writer: BoxMakeWriter,
    ansi: bool,
    config: &LogConfig,
) -> Box<dyn Layer<Registry> + Send + Sync> {
    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let filter = build_filter(config);
    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_span_events(span_events);

    match config.format {
        LogFormat::Pretty => base.pretty().with_filter(filter).boxed(),
        LogFormat::Compact => base
            .compact()
            .with_thread_ids(cfg!(debug_assertions))
            .with_filter(filter)
            .boxed(),
        LogFormat::Json => base.json().with_filter(filter).boxed(),
    }
}

/// `RUST_LOG`, then `level`, then each extra directive; malformed ones are dropped
fn build_filter(config: &LogConfig) -> EnvFilter {
    let base = EnvFilter::from_default_env().add_directive(config.level.into());
    config
        .filter
        .iter()
        .flat_map(|directives| directives.split(','))
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .filter_map(|d| d.parse().ok())
        .fold(base, EnvFilter::add_directive)
}
