use std::net::IpAddr;
use std::time::Duration;
use tracing::instrument;

use crate::adapters::icmp::EchoCapability;
use crate::domain::round::ProbeRound;
use crate::error::{PingfluxError, Result};

/// Send `count` echoes to `ip` and collect the outcomes into a [`ProbeRound`].
///
/// Per-echo timeouts are part of the round. An error means the capability
/// could not run at all, or reported counts it could not have produced.
#[instrument(skip(echo, timeout), fields(timeout_ms = timeout.as_millis() as u64))]
pub async fn probe(
    echo: &dyn EchoCapability,
    host: &str,
    ip: IpAddr,
    count: u16,
    timeout: Duration,
) -> Result<ProbeRound> {
    let report = echo.send(ip, count, timeout).await?;

    if report.sent > u32::from(count) || report.received > report.sent {
        return Err(PingfluxError::Probe(format!(
            "inconsistent echo report for {}: sent={} received={} count={}",
            ip, report.sent, report.received, count
        )));
    }
    let replies = report
        .outcomes
        .iter()
        .filter(|o| o.latency().is_some())
        .count();
    if replies != report.received as usize {
        return Err(PingfluxError::Probe(format!(
            "echo report for {} lists {} replies but received={}",
            ip, replies, report.received
        )));
    }

    tracing::debug!(sent = report.sent, received = report.received, "echo burst done");

    Ok(ProbeRound {
        host: host.to_string(),
        ip,
        timeout,
        sent: report.sent,
        received: report.received,
        outcomes: report.outcomes,
    })
}
