use clap::{Parser, ValueEnum};
use console::{Term, style};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use pingflux::adapters::sink::{DEFAULT_BUCKET, DEFAULT_URL};
use pingflux::{
    Config, Exporter, IcmpPinger, InfluxSink, IpVersion, PingfluxError, RecordFormat,
    RoundContext, Scheduler, Sink, StdoutSink, SystemLookup,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IpVersionArg {
    V4,
    V6,
    Any,
}

impl From<IpVersionArg> for IpVersion {
    fn from(v: IpVersionArg) -> Self {
        match v {
            IpVersionArg::V4 => IpVersion::V4,
            IpVersionArg::V6 => IpVersion::V6,
            IpVersionArg::Any => IpVersion::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SinkKind {
    Influx,
    Stdout,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Line,
    #[cfg(feature = "json")]
    Json,
}

impl From<FormatArg> for RecordFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Line => RecordFormat::Line,
            #[cfg(feature = "json")]
            FormatArg::Json => RecordFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pingflux")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Recurring ICMP latency and loss prober exporting to InfluxDB")]
#[command(long_about = Some(
    "Ping up to 20 hosts on a fixed interval and write one record per host and round.\n\
     \n\
     Examples:\n\
       pingflux 8.8.8.8 example.com\n\
       pingflux --count 4 --interval 10s --ipversion any example.com\n\
       pingflux --sink stdout --format json 1.1.1.1"
))]
struct Args {
    /// Hosts to probe (1 to 20 names or literal addresses)
    #[arg(value_name = "HOST")]
    hosts: Vec<String>,

    /// Number of pings sent to each host per round
    #[arg(short = 'c', long, default_value_t = 1, env = "PINGFLUX_COUNT")]
    count: u16,

    /// Time to wait for each reply before the ping counts as lost
    #[arg(short = 't', long, default_value = "1s", value_parser = humantime::parse_duration, env = "PINGFLUX_TIMEOUT")]
    timeout: Duration,

    /// Time between rounds
    #[arg(short = 'i', long, default_value = "20s", value_parser = humantime::parse_duration, env = "PINGFLUX_INTERVAL")]
    interval: Duration,

    /// Address family used when resolving hosts
    #[arg(long = "ipversion", default_value = "v4", value_enum, env = "PINGFLUX_IPVERSION")]
    ip_version: IpVersionArg,

    /// Where records are written
    #[arg(long, default_value = "influx", value_enum, env = "PINGFLUX_SINK")]
    sink: SinkKind,

    /// InfluxDB base URL
    #[arg(long, default_value = DEFAULT_URL, env = "PINGFLUX_URL")]
    url: String,

    /// InfluxDB organization
    #[arg(long, default_value = "", env = "PINGFLUX_ORG")]
    org: String,

    /// InfluxDB bucket (database/retention-policy for 1.x servers)
    #[arg(long, default_value = DEFAULT_BUCKET, env = "PINGFLUX_BUCKET")]
    bucket: String,

    /// Record format
    #[arg(short = 'f', long, default_value = "line", value_enum, env = "PINGFLUX_FORMAT")]
    format: FormatArg,

    /// Enable debug logging
    #[arg(short = 'v', long, env = "PINGFLUX_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    let term = Term::stderr();
    let exit_code = match run(args).await {
        Ok(()) => 0,
        Err(e) => handle_error(&term, e),
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(args: Args) -> Result<(), PingfluxError> {
    let config = Config::new(
        args.hosts,
        args.count,
        args.timeout,
        args.interval,
        args.ip_version.into(),
    )?
    .with_format(args.format.into());

    let sink: Arc<dyn Sink> = match args.sink {
        SinkKind::Influx => Arc::new(InfluxSink::new(
            &args.url,
            &args.org,
            &args.bucket,
            config.interval,
        )?),
        SinkKind::Stdout => Arc::new(StdoutSink),
    };

    let exporter = Exporter::new(sink, config.format);
    let mut scheduler = Scheduler::new(RoundContext {
        config: Arc::new(config),
        lookup: Arc::new(SystemLookup),
        echo: Arc::new(IcmpPinger::new()),
        exporter,
    });

    scheduler.run(shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn handle_error(term: &Term, err: PingfluxError) -> i32 {
    term.write_line(&style(format!("Error: {}", err)).red().bold().to_string())
        .ok();
    match err {
        PingfluxError::Config(_) => 2,
        PingfluxError::Probe(_) => 3,
        _ => 1,
    }
}
