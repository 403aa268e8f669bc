use serde::Deserialize;
use std::fs;
use std::path::Path;

use tracing::Level;

use crate::logging::{LogConfig, LogFormat, LogOutput, LOG_TAG};
use crate::Error;

/// Environment variable naming a TOML config file
pub const CONFIG_ENV: &str = "NETWATCHER_CONFIG";

/// Java class constructed by the Android change notifier
pub const DEFAULT_SUPPORT_CLASS: &str =
    "net/octet_stream/netwatcher/netwatcher_android/NetwatcherAndroidSupport";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub android: AndroidConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: FormatSetting,

    /// "stdout", "stderr", "logcat" or a directory for daily-rolling files
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub span_events: bool,

    /// Extra filter directives, e.g. "netwatcher_android=trace"
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatSetting {
    Pretty,
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AndroidConfig {
    /// JNI class path of the Java support class
    #[serde(default = "default_support_class")]
    pub support_class: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: FormatSetting::default(),
            output: default_output(),
            span_events: false,
            filter: None,
        }
    }
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            support_class: default_support_class(),
        }
    }
}

fn default_level() -> String { "info".to_string() }
fn default_output() -> String {
    let output = if cfg!(target_os = "android") { "logcat" } else { "stderr" };
    output.to_string()
}
fn default_support_class() -> String { DEFAULT_SUPPORT_CLASS.to_string() }

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `NETWATCHER_CONFIG` if set, defaults otherwise
    ///
    /// A file that cannot be read or parsed is reported and replaced by the
    /// defaults; callers at the JNI boundary have nowhere to send the error.
    pub fn from_env() -> Self {
        let Ok(path) = std::env::var(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::load(Path::new(&path)) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path, "ignoring config file: {}", err);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), Error> {
        parse_level(&self.logging.level)?;
        if self.android.support_class.is_empty() {
            return Err(Error::Config("android.support_class must not be empty".into()));
        }
        if self.android.support_class.contains('.') {
            return Err(Error::Config(format!(
                "android.support_class must use '/' separators: {}",
                self.android.support_class
            )));
        }
        Ok(())
    }
}

impl LoggingConfig {
    /// Convert to the runtime logging configuration
    ///
    /// "logcat" means stderr off Android.
    pub fn to_log_config(&self) -> LogConfig {
        let output = match self.output.as_str() {
            "stdout" => LogOutput::Stdout,
            "stderr" | "" => LogOutput::Stderr,
            "logcat" => logcat_output(),
            directory => LogOutput::File {
                directory: directory.to_string(),
                prefix: LOG_TAG.to_string(),
            },
        };
        let format = match self.format {
            FormatSetting::Pretty => LogFormat::Pretty,
            FormatSetting::Compact => LogFormat::Compact,
            FormatSetting::Json => LogFormat::Json,
        };

        LogConfig {
            level: parse_level(&self.level).unwrap_or(Level::INFO),
            format,
            output,
            span_events: self.span_events,
            filter: self.filter.clone(),
        }
    }
}

#[cfg(target_os = "android")]
fn logcat_output() -> LogOutput {
    LogOutput::Logcat {
        tag: LOG_TAG.to_string(),
    }
}

#[cfg(not(target_os = "android"))]
fn logcat_output() -> LogOutput {
    LogOutput::Stderr
}

pub(crate) fn parse_level(level: &str) -> Result<Level, Error> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(Error::Config(format!("unknown log level '{}'", other))),
    }
}
