//! ICMP echo capability.
//!
//! Raw sockets are opened once on [`EchoCapability::start`] and shared by every
//! round; each round gets its own random echo identifier so concurrent rounds
//! never match each other's replies.

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence, SurgeError};
use tokio::sync::RwLock;

use crate::domain::round::{EchoOutcome, EchoReport};
use crate::error::{PingfluxError, Result};

const PAYLOAD: [u8; 56] = [0; 56];

/// Mechanism that transmits echo requests and collects replies.
///
/// Implementations must tolerate concurrent `send` calls for different
/// addresses.
#[async_trait]
pub trait EchoCapability: Send + Sync {
    /// Acquire the underlying resources. Failure is fatal for the process.
    async fn start(&self) -> Result<()>;

    /// Release the underlying resources.
    async fn stop(&self);

    /// Send `count` echoes to `ip`, waiting up to `timeout` for each reply.
    async fn send(&self, ip: IpAddr, count: u16, timeout: Duration) -> Result<EchoReport>;
}

/// Map the result of one echo to its outcome.
///
/// Timeouts and per-packet IO errors (host or network unreachable) are lost
/// echoes; anything else means the capability itself misbehaved.
fn outcome_of(reply: std::result::Result<Duration, SurgeError>) -> Result<EchoOutcome> {
    match reply {
        Ok(rtt) => Ok(EchoOutcome::Reply(rtt)),
        Err(SurgeError::Timeout { .. }) | Err(SurgeError::IOError(_)) => Ok(EchoOutcome::Lost),
        Err(e) => Err(e.into()),
    }
}

#[derive(Clone)]
struct Sockets {
    v4: Client,
    v6: Option<Client>,
}

/// ICMP echo capability backed by `surge-ping`.
#[derive(Default)]
pub struct IcmpPinger {
    sockets: RwLock<Option<Sockets>>,
}

impl IcmpPinger {
    pub fn new() -> Self {
        Self::default()
    }

    async fn client_for(&self, ip: IpAddr) -> Result<Client> {
        let guard = self.sockets.read().await;
        let sockets = guard
            .as_ref()
            .ok_or_else(|| PingfluxError::Probe("echo capability not started".into()))?;
        match ip {
            IpAddr::V4(_) => Ok(sockets.v4.clone()),
            IpAddr::V6(_) => sockets
                .v6
                .clone()
                .ok_or_else(|| PingfluxError::Probe("ICMPv6 socket unavailable".into())),
        }
    }
}

#[async_trait]
impl EchoCapability for IcmpPinger {
    async fn start(&self) -> Result<()> {
        let v4 = Client::new(&Config::default())
            .map_err(|e| PingfluxError::Probe(format!("cannot open ICMPv4 socket: {}", e)))?;
        let v6 = match Client::new(&Config::builder().kind(ICMP::V6).build()) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "ICMPv6 socket unavailable, IPv6 hosts will fail");
                None
            }
        };
        *self.sockets.write().await = Some(Sockets { v4, v6 });
        tracing::debug!("echo capability started");
        Ok(())
    }

    async fn stop(&self) {
        if self.sockets.write().await.take().is_some() {
            tracing::debug!("echo capability stopped");
        }
    }

    async fn send(&self, ip: IpAddr, count: u16, timeout: Duration) -> Result<EchoReport> {
        let client = self.client_for(ip).await?;
        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(timeout);

        let mut report = EchoReport {
            outcomes: Vec::with_capacity(usize::from(count)),
            ..EchoReport::default()
        };
        for seq in 0..count {
            let reply = pinger.ping(PingSequence(seq), &PAYLOAD).await;
            let outcome = outcome_of(reply.map(|(_, rtt)| rtt))?;
            report.sent += 1;
            if matches!(outcome, EchoOutcome::Reply(_)) {
                report.received += 1;
            }
            report.outcomes.push(outcome);
        }
        Ok(report)
    }
}
