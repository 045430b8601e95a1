use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::io::Write;
use std::time::Duration;

use crate::error::{PingfluxError, Result};

pub const DEFAULT_URL: &str = "http://127.0.0.1:8086";
pub const DEFAULT_BUCKET: &str = "icmp/autogen";

/// Destination for formatted records, one record per call.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn write(&self, record: &str) -> Result<()>;
}

/// InfluxDB HTTP write endpoint (`/api/v2/write`).
#[derive(Debug, Clone)]
pub struct InfluxSink {
    client: Client,
    endpoint: Url,
    org: String,
    bucket: String,
}

impl InfluxSink {
    pub fn new(url: &str, org: &str, bucket: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(url)
            .map_err(|e| PingfluxError::Config(format!("invalid sink url '{}': {}", url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(PingfluxError::Config(format!(
                "sink url must be http or https, got '{}'",
                base.scheme()
            )));
        }
        let endpoint = Url::parse(&format!(
            "{}/api/v2/write",
            base.as_str().trim_end_matches('/')
        ))
        .map_err(|e| PingfluxError::Config(e.to_string()))?;
        if bucket.trim().is_empty() {
            return Err(PingfluxError::Config("bucket must not be empty".into()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PingfluxError::Config(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            org: org.to_string(),
            bucket: bucket.to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Sink for InfluxSink {
    async fn write(&self, record: &str) -> Result<()> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .query(&[
                ("org", self.org.as_str()),
                ("bucket", self.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(record.to_string())
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(PingfluxError::Write(format!(
            "sink answered {}: {}",
            status,
            body.trim()
        )))
    }
}

/// Writes each record as one line on standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

#[async_trait]
impl Sink for StdoutSink {
    async fn write(&self, record: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", record).map_err(|e| PingfluxError::Write(e.to_string()))?;
        out.flush().map_err(|e| PingfluxError::Write(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn rejects_bad_urls() {
        let t = Duration::from_secs(1);
        assert!(matches!(
            InfluxSink::new("not a url", "", DEFAULT_BUCKET, t),
            Err(PingfluxError::Config(_))
        ));
        assert!(matches!(
            InfluxSink::new("udp://127.0.0.1:8089", "", DEFAULT_BUCKET, t),
            Err(PingfluxError::Config(_))
        ));
        assert!(matches!(
            InfluxSink::new(DEFAULT_URL, "", " ", t),
            Err(PingfluxError::Config(_))
        ));
    }

    #[test]
    fn builds_write_endpoint() {
        let sink =
            InfluxSink::new("http://influx.local:8086/", "", DEFAULT_BUCKET, Duration::from_secs(1))
                .unwrap();
        assert_eq!(sink.endpoint().as_str(), "http://influx.local:8086/api/v2/write");
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..head_end]
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= head_end + 4 + length
    }

    /// Minimal HTTP responder: captures one request and answers with `status_line`.
    async fn serve_once(status_line: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                raw.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&raw) {
                    break;
                }
            }
            let response = format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            stream.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).into_owned()
        });
        (url, handle)
    }

    #[tokio::test]
    async fn posts_record_to_write_endpoint() {
        let (url, server) = serve_once("HTTP/1.1 204 No Content").await;
        let sink = InfluxSink::new(&url, "", DEFAULT_BUCKET, Duration::from_secs(5)).unwrap();
        let record = "rtt,host=example.com,stats_received=1,stats_sent=1 avg=50000000";

        sink.write(record).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /api/v2/write?"));
        assert!(request.contains("bucket=icmp%2Fautogen"));
        assert!(request.contains("precision=ns"));
        assert!(request.ends_with(record));
    }

    #[tokio::test]
    async fn rejected_record_is_write_error() {
        let (url, server) = serve_once("HTTP/1.1 400 Bad Request").await;
        let sink = InfluxSink::new(&url, "", DEFAULT_BUCKET, Duration::from_secs(5)).unwrap();

        let err = sink
            .write("rtt,host=a,stats_received=1,stats_sent=1 avg=1")
            .await
            .unwrap_err();
        assert!(matches!(err, PingfluxError::Write(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_sink_is_write_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let sink = InfluxSink::new(&url, "", DEFAULT_BUCKET, Duration::from_secs(2)).unwrap();

        let err = sink.write("rtt,host=a avg=1").await.unwrap_err();
        assert!(matches!(err, PingfluxError::Write(_)));
    }
}
