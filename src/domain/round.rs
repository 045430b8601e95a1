use chrono::{DateTime, Utc};
use std::net::IpAddr;
use std::time::Duration;

/// Outcome of a single echo request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EchoOutcome {
    /// Reply received after the given round trip.
    Reply(Duration),
    /// No reply within the per-probe timeout.
    Lost,
}

impl EchoOutcome {
    pub fn latency(&self) -> Option<Duration> {
        match self {
            EchoOutcome::Reply(rtt) => Some(*rtt),
            EchoOutcome::Lost => None,
        }
    }
}

/// What the echo capability reports for one burst of echoes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EchoReport {
    pub sent: u32,
    pub received: u32,
    /// Per-echo outcomes, ordered by sequence number.
    pub outcomes: Vec<EchoOutcome>,
}

/// Raw result of one round against one host.
#[derive(Clone, Debug)]
pub struct ProbeRound {
    pub host: String,
    pub ip: IpAddr,
    pub timeout: Duration,
    pub sent: u32,
    pub received: u32,
    pub outcomes: Vec<EchoOutcome>,
}

impl ProbeRound {
    /// Observed latencies in probe order, lost echoes skipped.
    pub fn latencies(&self) -> impl Iterator<Item = Duration> + '_ {
        self.outcomes.iter().filter_map(EchoOutcome::latency)
    }
}

/// Aggregated statistics for one round.
///
/// Latency fields are `None` when no reply was received; a zero value is
/// always a real measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundStatistics {
    pub host: String,
    pub ip: IpAddr,
    pub sent: u32,
    pub received: u32,
    /// Fraction of sent probes without reply, in `[0, 1]`.
    pub loss: f64,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
    pub avg: Option<Duration>,
    pub median: Option<Duration>,
    pub mdev: Option<Duration>,
    pub error: Option<String>,
    pub utc: DateTime<Utc>,
}
