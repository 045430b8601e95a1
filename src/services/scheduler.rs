//! Periodic launcher of per-host rounds.
//!
//! `Idle -> Armed -> (tick -> fire)* -> Stopped`. Rounds are spawned and never
//! joined; a host whose previous round is still running is skipped for the
//! tick so at most one round per host is in flight.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::error::Result;
use crate::services::round::{RoundContext, run_round};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Armed,
    Stopped,
}

/// Clears a host's in-flight flag when the round task ends, even on panic.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Scheduler {
    ctx: Arc<RoundContext>,
    in_flight: Vec<Arc<AtomicBool>>,
    ticks: AtomicU64,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(ctx: RoundContext) -> Self {
        let in_flight = ctx
            .config
            .hosts
            .iter()
            .map(|_| Arc::new(AtomicBool::new(false)))
            .collect();
        Self {
            ctx: Arc::new(ctx),
            in_flight,
            ticks: AtomicU64::new(0),
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Number of ticks fired so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Start the echo capability and fire rounds every interval until
    /// `shutdown` completes.
    ///
    /// The first tick comes one interval after start. On shutdown the echo
    /// capability is released; rounds still in flight are abandoned.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if let Err(e) = self.ctx.echo.start().await {
            self.state = SchedulerState::Stopped;
            return Err(e);
        }
        self.state = SchedulerState::Armed;

        let period = self.ctx.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            hosts = self.ctx.config.hosts.len(),
            interval = ?period,
            "scheduler armed"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.fire();
                }
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
            }
        }

        self.ctx.echo.stop().await;
        self.state = SchedulerState::Stopped;
        Ok(())
    }

    /// Launch one round per idle host. Returns how many rounds were spawned.
    pub fn fire(&self) -> usize {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        let mut launched = 0;

        for (host, flag) in self.ctx.config.hosts.iter().zip(&self.in_flight) {
            if flag.swap(true, Ordering::AcqRel) {
                tracing::warn!(host = %host, tick, "previous round still running, skipping");
                continue;
            }
            let guard = InFlight(Arc::clone(flag));
            let ctx = Arc::clone(&self.ctx);
            let host = host.clone();
            tokio::spawn(async move {
                let _guard = guard;
                if let Err(e) = run_round(&ctx, &host).await {
                    tracing::warn!(host = %host, kind = e.kind(), error = %e, "round skipped");
                }
            });
            launched += 1;
        }

        tracing::debug!(tick, launched, "tick fired");
        launched
    }
}
