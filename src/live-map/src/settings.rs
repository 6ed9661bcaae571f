use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;
use snafu::{OptionExt, ResultExt};
use strum::{AsRefStr, Display, EnumString};
use tracing::Level;

use crate::error::{
    Result,
    error::{ConfigSnafu, InvalidEnvironmentSnafu, MissingEnvironmentSnafu},
};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub log_level: LogLevel,
    pub environment: Environment,
    pub snapshot_url: String,
    /// Without a push url the map is kept up to date by polling alone.
    pub push_url: Option<String>,
    pub api_token: Option<String>,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub animation: AnimationSettings,
    #[serde(default)]
    pub filter: FilterSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, EnumString, AsRefStr, Display)]
pub enum Environment {
    Production,
    Development,
    Local,
    Test,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Zero settles a viewport change as soon as it is reported.
    #[serde(with = "humantime_serde")]
    pub bounds_quiet_period: Duration,
    #[serde(with = "humantime_serde")]
    pub push_reconnect_delay: Duration,
    pub persistent_failure_threshold: u32,
    pub permission_backoff_max_polls: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnimationSettings {
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub steps: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterSettings {
    #[serde(default)]
    pub vessel_types: Vec<String>,
    #[serde(default)]
    pub statuses: Vec<String>,
    pub flag_country: Option<String>,
    pub cargo_type: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self> {
        let value = std::env::var("APP_ENVIRONMENT").context(MissingEnvironmentSnafu)?;
        let environment: Environment = value
            .parse()
            .ok()
            .context(InvalidEnvironmentSnafu { value })?;

        Config::builder()
            .add_source(
                File::with_name(&format!("config/{}", environment.as_ref().to_lowercase()))
                    .required(true),
            )
            .add_source(config::Environment::with_prefix("LIVE_MAP").separator("__"))
            .set_override("environment", environment.as_ref())
            .context(ConfigSnafu)?
            .build()
            .context(ConfigSnafu)?
            .try_deserialize()
            .context(ConfigSnafu)
    }

    pub fn init_tracer(&self) {
        tracing_subscriber::fmt()
            .with_max_level(Level::from(self.log_level))
            .with_target(true)
            .init();
    }
}

impl From<LogLevel> for Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            bounds_quiet_period: Duration::ZERO,
            push_reconnect_delay: Duration::from_secs(5),
            persistent_failure_threshold: 3,
            permission_backoff_max_polls: 8,
        }
    }
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(1000),
            steps: 20,
        }
    }
}
