use std::fmt;

use stl_core::StlError;

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Toml(toml::de::Error),
    /// Malformed input file content, with location.
    Input(String),
    Core(StlError),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "I/O error: {e}"),
            ReportError::Csv(e) => write!(f, "CSV error: {e}"),
            ReportError::Toml(e) => write!(f, "config error: {e}"),
            ReportError::Input(msg) => write!(f, "invalid input: {msg}"),
            ReportError::Core(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ReportError {}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Io(e)
    }
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Csv(e)
    }
}

impl From<toml::de::Error> for ReportError {
    fn from(e: toml::de::Error) -> Self {
        ReportError::Toml(e)
    }
}

impl From<StlError> for ReportError {
    fn from(e: StlError) -> Self {
        ReportError::Core(e)
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
