use std::sync::Arc;
use tracing::instrument;

use crate::adapters::icmp::EchoCapability;
use crate::adapters::resolver::{self, Lookup};
use crate::config::Config;
use crate::domain::round::RoundStatistics;
use crate::error::Result;
use crate::fmt;
use crate::services::export::Exporter;
use crate::services::probe::probe;
use crate::stats::aggregate;

/// Collaborators shared by every round.
pub struct RoundContext {
    pub config: Arc<Config>,
    pub lookup: Arc<dyn Lookup>,
    pub echo: Arc<dyn EchoCapability>,
    pub exporter: Exporter,
}

/// Run one round for `host`: resolve, probe, aggregate, export.
///
/// Resolution and probe failures are returned so the caller can log them.
/// A sink failure is logged here and the round still counts as done.
#[instrument(skip(ctx))]
pub async fn run_round(ctx: &RoundContext, host: &str) -> Result<RoundStatistics> {
    let cfg = &ctx.config;
    let ip = resolver::resolve_ip(ctx.lookup.as_ref(), host, cfg.ip_version).await?;
    let round = probe(ctx.echo.as_ref(), host, ip, cfg.count, cfg.timeout).await?;
    let stats = aggregate(&round);

    tracing::info!(ip = %ip, "{}", fmt::text::render_summary(&stats));

    if let Err(e) = ctx.exporter.export(&stats).await {
        tracing::error!(host = %host, kind = e.kind(), error = %e, "failed to export round");
    }
    Ok(stats)
}
