//! pingflux library: recurring multi-host ICMP probing with InfluxDB export.

pub mod adapters;
pub mod config;
pub mod domain;
mod error;
pub mod fmt;
pub mod services;
pub mod stats;

pub use adapters::icmp::{EchoCapability, IcmpPinger};
pub use adapters::resolver::{Lookup, SystemLookup, resolve_ip};
pub use adapters::sink::{InfluxSink, Sink, StdoutSink};
pub use config::{Config, IpVersion, MAX_HOSTS, RecordFormat};
pub use domain::round::{EchoOutcome, EchoReport, ProbeRound, RoundStatistics};
pub use error::{PingfluxError, Result};
pub use services::export::Exporter;
pub use services::probe::probe;
pub use services::round::{RoundContext, run_round};
pub use services::scheduler::{Scheduler, SchedulerState};
pub use stats::aggregate;
