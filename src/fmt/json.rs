use serde::Serialize;
use std::time::Duration;

use crate::domain::round::RoundStatistics;
use crate::error::PingfluxError;

#[derive(Serialize)]
pub struct JsonStats<'a> {
    pub host: &'a str,
    pub ip: String,
    pub ip_version: &'static str,
    pub sent: u32,
    pub received: u32,
    pub loss: f64,
    pub min_ns: Option<u64>,
    pub max_ns: Option<u64>,
    pub avg_ns: Option<u64>,
    pub median_ns: Option<u64>,
    pub mdev_ns: Option<u64>,
    pub error: Option<&'a str>,
    pub utc: String,
}

fn nanos(d: Option<Duration>) -> Option<u64> {
    d.map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
}

/// Serialize round statistics into a single-line JSON object.
pub fn stats_to_json(stats: &RoundStatistics) -> Result<String, PingfluxError> {
    let json = JsonStats {
        host: &stats.host,
        ip: stats.ip.to_string(),
        ip_version: if stats.ip.is_ipv6() { "v6" } else { "v4" },
        sent: stats.sent,
        received: stats.received,
        loss: stats.loss,
        min_ns: nanos(stats.min),
        max_ns: nanos(stats.max),
        avg_ns: nanos(stats.avg),
        median_ns: nanos(stats.median),
        mdev_ns: nanos(stats.mdev),
        error: stats.error.as_deref(),
        utc: stats.utc.to_rfc3339(),
    };
    serde_json::to_string(&json).map_err(|e| PingfluxError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::net::{IpAddr, Ipv6Addr};

    #[test]
    fn absent_latencies_serialize_as_null() {
        let stats = RoundStatistics {
            host: "six.example".into(),
            ip: IpAddr::V6(Ipv6Addr::LOCALHOST),
            sent: 3,
            received: 0,
            loss: 1.0,
            min: None,
            max: None,
            avg: None,
            median: None,
            mdev: None,
            error: Some("100% packet loss".into()),
            utc: Utc::now(),
        };
        let text = stats_to_json(&stats).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["host"], "six.example");
        assert_eq!(value["ip_version"], "v6");
        assert_eq!(value["loss"], 1.0);
        assert!(value["avg_ns"].is_null());
        assert_eq!(value["error"], "100% packet loss");
    }
}
