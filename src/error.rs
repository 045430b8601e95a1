use thiserror::Error;

/// Top-level error type for pingflux.
#[derive(Error, Debug)]
pub enum PingfluxError {
    /// Invalid command line or configuration input.
    #[error("config: {0}")]
    Config(String),
    /// Host could not be resolved to an address matching the policy.
    #[error("no address: {0}")]
    NoAddress(String),
    /// The echo capability could not run.
    #[error("probe: {0}")]
    Probe(String),
    /// The sink rejected a record.
    #[error("write: {0}")]
    Write(String),
    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PingfluxError {
    /// Short label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            PingfluxError::Config(_) => "config",
            PingfluxError::NoAddress(_) => "no_address",
            PingfluxError::Probe(_) => "probe",
            PingfluxError::Write(_) => "write",
            PingfluxError::Io(_) => "io",
        }
    }
}

impl From<reqwest::Error> for PingfluxError {
    fn from(err: reqwest::Error) -> Self {
        PingfluxError::Write(err.to_string())
    }
}

impl From<surge_ping::SurgeError> for PingfluxError {
    fn from(err: surge_ping::SurgeError) -> Self {
        PingfluxError::Probe(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PingfluxError>;
