//! Process-wide configuration, validated once at startup.

use std::fmt;
use std::time::Duration;

use crate::error::{PingfluxError, Result};

/// Maximum number of hosts probed by one process.
pub const MAX_HOSTS: usize = 20;

pub const DEFAULT_COUNT: u16 = 1;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(20);

/// Upper bound for the per-probe timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(60 * 60);
/// Upper bound for the round interval.
pub const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Address family policy applied when resolving hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IpVersion {
    #[default]
    V4,
    V6,
    Any,
}

impl IpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            IpVersion::V4 => "v4",
            IpVersion::V6 => "v6",
            IpVersion::Any => "any",
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialization used for exported records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    /// Influx line protocol.
    #[default]
    Line,
    /// One JSON object per round.
    #[cfg(feature = "json")]
    Json,
}

/// Immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub hosts: Vec<String>,
    pub count: u16,
    pub timeout: Duration,
    pub interval: Duration,
    pub ip_version: IpVersion,
    pub format: RecordFormat,
}

impl Config {
    /// Build a validated configuration.
    ///
    /// Rejects an empty host list, more than [`MAX_HOSTS`] hosts, a zero
    /// probe count, and durations that are zero or above [`MAX_TIMEOUT`] /
    /// [`MAX_INTERVAL`].
    pub fn new(
        hosts: Vec<String>,
        count: u16,
        timeout: Duration,
        interval: Duration,
        ip_version: IpVersion,
    ) -> Result<Self> {
        if hosts.is_empty() {
            return Err(PingfluxError::Config("no hosts specified".into()));
        }
        if hosts.len() > MAX_HOSTS {
            return Err(PingfluxError::Config(format!(
                "{} hosts given, the limit is {MAX_HOSTS}",
                hosts.len()
            )));
        }
        if let Some(blank) = hosts.iter().position(|h| h.trim().is_empty()) {
            return Err(PingfluxError::Config(format!(
                "host #{} is empty",
                blank + 1
            )));
        }
        if count == 0 {
            return Err(PingfluxError::Config("count must be at least 1".into()));
        }
        if timeout.is_zero() {
            return Err(PingfluxError::Config("timeout must be greater than zero".into()));
        }
        if interval.is_zero() {
            return Err(PingfluxError::Config("interval must be greater than zero".into()));
        }
        if timeout > MAX_TIMEOUT {
            return Err(PingfluxError::Config(format!(
                "timeout must be at most {}",
                humantime::format_duration(MAX_TIMEOUT)
            )));
        }
        if interval > MAX_INTERVAL {
            return Err(PingfluxError::Config(format!(
                "interval must be at most {}",
                humantime::format_duration(MAX_INTERVAL)
            )));
        }
        Ok(Self {
            hosts,
            count,
            timeout,
            interval,
            ip_version,
            format: RecordFormat::default(),
        })
    }

    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = format;
        self
    }
}
