//! Server configuration.
//!
//! Defaults mirror the classic deployment (2 s polls, 15 s diagnostics); every
//! value can be overridden through `BANKD_*` environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use bankd_protocol::codec::DEFAULT_MAX_MESSAGE_LEN;

pub const DEFAULT_PORT: u16 = 9000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the listener binds.
    pub addr: SocketAddr,
    /// Bounded wait of the accept loop and of every worker read.
    pub poll_interval: Duration,
    /// Period of the diagnostic ledger report.
    pub diagnostic_interval: Duration,
    /// Pause between the shutdown notice and the final `quit`.
    pub notice_delay: Duration,
    /// How long in-flight workers may run after the listener stops.
    pub shutdown_grace: Duration,
    pub max_message_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            poll_interval: Duration::from_secs(2),
            diagnostic_interval: Duration::from_secs(15),
            notice_delay: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(5),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with `BANKD_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each `BANKD_*` key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("BANKD_ADDR") {
            cfg.addr = parse("BANKD_ADDR", &v)?;
        }
        if let Some(v) = lookup("BANKD_POLL_INTERVAL_MS") {
            cfg.poll_interval = millis("BANKD_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("BANKD_DIAGNOSTIC_INTERVAL_MS") {
            cfg.diagnostic_interval = millis("BANKD_DIAGNOSTIC_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("BANKD_NOTICE_DELAY_MS") {
            cfg.notice_delay = Duration::from_millis(parse("BANKD_NOTICE_DELAY_MS", &v)?);
        }
        if let Some(v) = lookup("BANKD_SHUTDOWN_GRACE_MS") {
            cfg.shutdown_grace = Duration::from_millis(parse("BANKD_SHUTDOWN_GRACE_MS", &v)?);
        }
        if let Some(v) = lookup("BANKD_MAX_MESSAGE_LEN") {
            cfg.max_message_len = parse("BANKD_MAX_MESSAGE_LEN", &v)?;
            if cfg.max_message_len == 0 {
                return Err(invalid("BANKD_MAX_MESSAGE_LEN", &v, "must be at least 1"));
            }
        }

        Ok(cfg)
    }

    /// Replace the listen port, keeping the bind address.
    pub fn with_port(mut self, port: u16) -> Self {
        self.addr.set_port(port);
        self
    }
}

fn parse<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, value, e.to_string()))
}

/// Intervals drive polling timers and must be non-zero.
fn millis(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let ms: u64 = parse(key, value)?;
    if ms == 0 {
        return Err(invalid(key, value, "must be greater than zero"));
    }
    Ok(Duration::from_millis(ms))
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}
