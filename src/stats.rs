use chrono::Utc;
use std::time::Duration;

use crate::domain::round::{ProbeRound, RoundStatistics};

/// Error indicator attached to rounds where every probe was lost.
pub const ALL_LOST: &str = "100% packet loss";

/// Reduce a probe round into loss and latency statistics.
///
/// Never fails: a round without replies yields a loss of 1.0 and no latency
/// values.
pub fn aggregate(round: &ProbeRound) -> RoundStatistics {
    let mut samples: Vec<Duration> = round.latencies().collect();
    let received = round.received;

    let loss = if round.sent == 0 {
        1.0
    } else {
        f64::from(round.sent - received.min(round.sent)) / f64::from(round.sent)
    };

    let (min, max, avg, median, mdev) = if received == 0 || samples.is_empty() {
        (None, None, None, None, None)
    } else {
        let mut min = round.timeout;
        let mut max = Duration::ZERO;
        let mut total = Duration::ZERO;
        for &rtt in &samples {
            total += rtt;
            min = min.min(rtt);
            max = max.max(rtt);
        }
        let avg = total / samples.len() as u32;

        samples.sort_unstable();
        let median = samples[(samples.len() - 1) / 2];

        let avg_ns = avg.as_nanos() as f64;
        let dev_ns = samples
            .iter()
            .map(|s| (s.as_nanos() as f64 - avg_ns).abs())
            .sum::<f64>()
            / samples.len() as f64;
        let mdev = Duration::from_nanos(dev_ns.round() as u64);

        (Some(min), Some(max), Some(avg), Some(median), Some(mdev))
    };

    RoundStatistics {
        host: round.host.clone(),
        ip: round.ip,
        sent: round.sent,
        received,
        loss,
        min,
        max,
        avg,
        median,
        mdev,
        error: (received == 0).then(|| ALL_LOST.to_string()),
        utc: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::round::EchoOutcome;
    use std::net::{IpAddr, Ipv4Addr};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn round(outcomes: Vec<EchoOutcome>) -> ProbeRound {
        let received = outcomes.iter().filter(|o| o.latency().is_some()).count() as u32;
        ProbeRound {
            host: "example.com".into(),
            ip: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            timeout: Duration::from_secs(1),
            sent: outcomes.len() as u32,
            received,
            outcomes,
        }
    }

    #[test]
    fn all_lost_yields_full_loss_and_no_latency() {
        let stats = aggregate(&round(vec![EchoOutcome::Lost; 4]));
        assert_eq!(stats.loss, 1.0);
        assert_eq!(stats.received, 0);
        assert!(stats.avg.is_none());
        assert!(stats.min.is_none());
        assert!(stats.max.is_none());
        assert!(stats.median.is_none());
        assert!(stats.mdev.is_none());
        assert_eq!(stats.error.as_deref(), Some(ALL_LOST));
    }

    #[test]
    fn all_received_yields_zero_loss() {
        let stats = aggregate(&round(vec![
            EchoOutcome::Reply(ms(10)),
            EchoOutcome::Reply(ms(30)),
            EchoOutcome::Reply(ms(20)),
        ]));
        assert_eq!(stats.loss, 0.0);
        assert_eq!(stats.min, Some(ms(10)));
        assert_eq!(stats.max, Some(ms(30)));
        assert_eq!(stats.avg, Some(ms(20)));
        assert_eq!(stats.median, Some(ms(20)));
        assert!(stats.error.is_none());
    }

    #[test]
    fn partial_loss_fraction() {
        let stats = aggregate(&round(vec![
            EchoOutcome::Reply(ms(40)),
            EchoOutcome::Lost,
            EchoOutcome::Reply(ms(60)),
            EchoOutcome::Lost,
        ]));
        assert_eq!(stats.sent, 4);
        assert_eq!(stats.received, 2);
        assert!((stats.loss - 0.5).abs() < f64::EPSILON);
        assert_eq!(stats.avg, Some(ms(50)));
    }

    #[test]
    fn median_takes_lower_middle_on_even_count() {
        let stats = aggregate(&round(vec![
            EchoOutcome::Reply(ms(40)),
            EchoOutcome::Reply(ms(10)),
            EchoOutcome::Reply(ms(30)),
            EchoOutcome::Reply(ms(20)),
        ]));
        assert_eq!(stats.median, Some(ms(20)));
    }

    #[test]
    fn mdev_is_mean_absolute_deviation() {
        // avg 20ms, deviations 10, 0, 10 -> mean 6.666..ms
        let stats = aggregate(&round(vec![
            EchoOutcome::Reply(ms(10)),
            EchoOutcome::Reply(ms(20)),
            EchoOutcome::Reply(ms(30)),
        ]));
        let mdev = stats.mdev.unwrap();
        assert_eq!(mdev.as_nanos(), 6_666_667);
    }

    #[test]
    fn min_avg_max_are_ordered() {
        let stats = aggregate(&round(vec![
            EchoOutcome::Reply(ms(3)),
            EchoOutcome::Lost,
            EchoOutcome::Reply(ms(900)),
            EchoOutcome::Reply(ms(47)),
        ]));
        let (min, avg, max) = (stats.min.unwrap(), stats.avg.unwrap(), stats.max.unwrap());
        assert!(min <= avg && avg <= max);
        assert!(max <= Duration::from_secs(1));
        assert!((0.0..=1.0).contains(&stats.loss));
    }

    #[test]
    fn average_uses_observed_samples() {
        let mut r = round(vec![EchoOutcome::Reply(ms(10)), EchoOutcome::Lost]);
        r.received = 2;
        let stats = aggregate(&r);
        assert_eq!(stats.avg, Some(ms(10)));
        assert!(stats.min.unwrap() <= stats.avg.unwrap());
    }

    #[test]
    fn zero_sent_is_total_loss() {
        let stats = aggregate(&round(vec![]));
        assert_eq!(stats.loss, 1.0);
        assert!(stats.avg.is_none());
    }
}
