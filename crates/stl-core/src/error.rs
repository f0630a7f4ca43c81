use std::fmt;

/// Failure of a core computation. Every variant is fatal: no partial output
/// is produced alongside an error.
#[derive(Debug, Clone, PartialEq)]
pub enum StlError {
    /// Parameter or generator argument outside its allowed range.
    Config(String),
    /// A sequence that must contain at least one sample was empty.
    EmptyInput,
    /// Two positionally matched sequences differ in length.
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// t-values disagree at a position of two positionally matched sequences.
    IndexMismatch { row: usize, raw_t: f64, trace_t: f64 },
    /// Unsupported comparison mode or unparsable naive rule.
    InvalidRule(String),
}

impl fmt::Display for StlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StlError::Config(msg) => write!(f, "configuration error: {msg}"),
            StlError::EmptyInput => write!(f, "empty input: at least one sample is required"),
            StlError::LengthMismatch {
                what,
                expected,
                found,
            } => write!(f, "row mismatch in {what}: expected {expected} rows, found {found}"),
            StlError::IndexMismatch {
                row,
                raw_t,
                trace_t,
            } => write!(f, "t mismatch at row {row}: raw t={raw_t} trace t={trace_t}"),
            StlError::InvalidRule(msg) => write!(f, "invalid naive rule: {msg}"),
        }
    }
}

impl std::error::Error for StlError {}

pub type Result<T> = std::result::Result<T, StlError>;
