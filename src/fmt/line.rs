//! Influx line protocol records.
//!
//! `rtt,host=<host>,stats_received=<n>,stats_sent=<n> avg=<ns>`
//!
//! Rounds without any reply carry `loss=1` instead of `avg`, so a missing
//! average is never written as zero.

use crate::domain::round::RoundStatistics;

pub const MEASUREMENT: &str = "rtt";

/// Decoded view of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    pub measurement: String,
    pub host: String,
    pub received: u32,
    pub sent: u32,
    pub avg_ns: Option<u64>,
    pub loss: Option<f64>,
}

fn escape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | ' ' | '=' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn unescape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split on `sep` occurrences that are not escaped with a backslash.
fn split_unescaped(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == sep {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Render the statistics of one round as a line protocol record.
pub fn to_line(stats: &RoundStatistics) -> String {
    let fields = match stats.avg {
        Some(avg) => format!("avg={}", avg.as_nanos()),
        None => "loss=1".to_string(),
    };
    format!(
        "{},host={},stats_received={},stats_sent={} {}",
        MEASUREMENT,
        escape_tag(&stats.host),
        stats.received,
        stats.sent,
        fields
    )
}

/// Parse a record produced by [`to_line`]. Returns `None` on malformed input.
pub fn parse_line(line: &str) -> Option<LineRecord> {
    let sections = split_unescaped(line.trim_end(), ' ');
    let [series, fields] = sections.as_slice() else {
        return None;
    };

    let mut tags = split_unescaped(series, ',').into_iter();
    let measurement = unescape_tag(tags.next()?);
    let (mut host, mut received, mut sent) = (None, None, None);
    for tag in tags {
        let kv = split_unescaped(tag, '=');
        let [key, value] = kv.as_slice() else {
            return None;
        };
        match *key {
            "host" => host = Some(unescape_tag(value)),
            "stats_received" => received = value.parse().ok(),
            "stats_sent" => sent = value.parse().ok(),
            _ => {}
        }
    }

    let (mut avg_ns, mut loss) = (None, None);
    for field in fields.split(',') {
        let (key, value) = field.split_once('=')?;
        match key {
            "avg" => avg_ns = Some(value.trim_end_matches('i').parse().ok()?),
            "loss" => loss = Some(value.parse().ok()?),
            _ => {}
        }
    }
    if avg_ns.is_none() && loss.is_none() {
        return None;
    }

    Some(LineRecord {
        measurement,
        host: host?,
        received: received?,
        sent: sent?,
        avg_ns,
        loss,
    })
}
