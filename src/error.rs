use std::fmt;

/// Custom error types for sortie analysis
#[derive(Debug)]
pub enum AnalysisError {
    /// I/O errors
    Io(std::io::Error),
    /// CSV reading errors
    Csv(csv::Error),
    /// Referenced channel absent from the telemetry table
    ChannelNotFound(String),
    /// A detection rule's search condition was never satisfied
    PhaseNotFound(String),
    /// Malformed filter clause
    Query(String),
    /// A metric requires a phase event or sample count that is unavailable
    InsufficientData(String),
    /// Malformed input data (bad timestamps, inconsistent rows)
    Parse(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::Io(err) => write!(f, "I/O error: {}", err),
            AnalysisError::Csv(err) => write!(f, "CSV error: {}", err),
            AnalysisError::ChannelNotFound(name) => write!(f, "Channel not found: {}", name),
            AnalysisError::PhaseNotFound(msg) => write!(f, "Phase not found: {}", msg),
            AnalysisError::Query(msg) => write!(f, "Invalid query: {}", msg),
            AnalysisError::InsufficientData(msg) => write!(f, "Insufficient data: {}", msg),
            AnalysisError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::Io(err) => Some(err),
            AnalysisError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(err: std::io::Error) -> Self {
        AnalysisError::Io(err)
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(err: csv::Error) -> Self {
        AnalysisError::Csv(err)
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
