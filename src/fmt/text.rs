use std::time::Duration;

use crate::domain::round::RoundStatistics;

fn show(d: Option<Duration>) -> String {
    match d {
        Some(d) => format!("{:?}", d),
        None => "-".to_string(),
    }
}

/// One-line human summary of a round, used for the per-round log line.
pub fn render_summary(s: &RoundStatistics) -> String {
    format!(
        "{} sent={} received={} loss={:.1}% avg={} min={} max={} median={} mdev={}",
        s.host,
        s.sent,
        s.received,
        s.loss * 100.0,
        show(s.avg),
        show(s.min),
        show(s.max),
        show(s.median),
        show(s.mdev),
    )
}
