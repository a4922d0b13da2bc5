use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    InvalidConfig(#[from] config::ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("batch file: {0}")]
    Batch(#[from] csv::Error),
    #[error("malformed batch file, line {line}: {source}")]
    BatchRow {
        line: usize,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    // input validation, reported before any scheduling happens
    #[error("process {id} has negative arrival time {arrival}")]
    NegativeArrival { id: usize, arrival: i64 },
    #[error("process {id} has non-positive burst {burst}")]
    NonPositiveBurst { id: usize, burst: i64 },
    #[error("round-robin quantum must be positive, got {0}")]
    NonPositiveQuantum(u64),
    #[error("process id {0} appears more than once")]
    DuplicateId(usize),
    #[error("process {id} has no priority, required by the priority policy")]
    MissingPriority { id: usize },
    #[error("batch does not fit the time range: arrivals plus bursts exceed {}", u64::MAX)]
    TimeOverflow,

    /// A process was read before the simulation finished it
    #[error("incomplete simulation: process {id} has no {what}")]
    IncompleteSimulation { id: usize, what: &'static str },

    #[error(transparent)]
    Others(#[from] anyhow::Error),
}

/// A type alias that forces the usage of the custom error type.
pub type Result<T> = std::result::Result<T, Error>;

impl From<tracing::subscriber::SetGlobalDefaultError> for Error {
    fn from(err: tracing::subscriber::SetGlobalDefaultError) -> Self {
        Self::Others(anyhow::Error::from(err))
    }
}

impl From<tracing_subscriber::util::TryInitError> for Error {
    fn from(err: tracing_subscriber::util::TryInitError) -> Self {
        Self::Others(anyhow::Error::from(err))
    }
}

impl From<tracing_subscriber::reload::Error> for Error {
    fn from(err: tracing_subscriber::reload::Error) -> Self {
        Self::Others(anyhow::Error::from(err))
    }
}
