use std::sync::Arc;

use crate::adapters::sink::Sink;
use crate::config::RecordFormat;
use crate::domain::round::RoundStatistics;
use crate::error::Result;
use crate::fmt;

/// Formats round statistics and hands them to the sink.
#[derive(Clone)]
pub struct Exporter {
    sink: Arc<dyn Sink>,
    format: RecordFormat,
}

impl Exporter {
    pub fn new(sink: Arc<dyn Sink>, format: RecordFormat) -> Self {
        Self { sink, format }
    }

    pub fn render(&self, stats: &RoundStatistics) -> Result<String> {
        match self.format {
            RecordFormat::Line => Ok(fmt::line::to_line(stats)),
            #[cfg(feature = "json")]
            RecordFormat::Json => fmt::json::stats_to_json(stats),
        }
    }

    /// Write one record and wait for the sink to acknowledge it.
    pub async fn export(&self, stats: &RoundStatistics) -> Result<()> {
        let record = self.render(stats)?;
        self.sink.write(&record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PingfluxError;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl Sink for Recorder {
        async fn write(&self, record: &str) -> Result<()> {
            self.0.lock().unwrap().push(record.to_string());
            Ok(())
        }
    }

    struct Refusing;

    #[async_trait]
    impl Sink for Refusing {
        async fn write(&self, _record: &str) -> Result<()> {
            Err(PingfluxError::Write("database unavailable".into()))
        }
    }

    fn sample() -> RoundStatistics {
        let avg = Some(Duration::from_millis(50));
        RoundStatistics {
            host: "example.com".into(),
            ip: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
            sent: 1,
            received: 1,
            loss: 0.0,
            min: avg,
            max: avg,
            avg,
            median: avg,
            mdev: Some(Duration::ZERO),
            error: None,
            utc: Utc::now(),
        }
    }

    #[tokio::test]
    async fn writes_line_record() {
        let sink = Arc::new(Recorder::default());
        let exporter = Exporter::new(sink.clone(), RecordFormat::Line);
        exporter.export(&sample()).await.unwrap();
        assert_eq!(
            *sink.0.lock().unwrap(),
            vec!["rtt,host=example.com,stats_received=1,stats_sent=1 avg=50000000".to_string()]
        );
    }

    #[cfg(feature = "json")]
    #[tokio::test]
    async fn writes_json_record() {
        let sink = Arc::new(Recorder::default());
        let exporter = Exporter::new(sink.clone(), RecordFormat::Json);
        exporter.export(&sample()).await.unwrap();
        let records = sink.0.lock().unwrap();
        assert!(records[0].contains("\"avg_ns\":50000000"));
    }

    #[tokio::test]
    async fn surfaces_sink_failure() {
        let exporter = Exporter::new(Arc::new(Refusing), RecordFormat::Line);
        let err = exporter.export(&sample()).await.unwrap_err();
        assert!(matches!(err, PingfluxError::Write(_)));
    }
}
