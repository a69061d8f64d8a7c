use std::fmt;

/// Errors that abort parsing outright, as opposed to recoverable frame
/// corruption which is tracked per-session via `corrupted_frame_count`
/// and `warnings` instead.
#[derive(Debug)]
pub enum ParseError {
    EmptyInput,
    NoValidHeader,
    InvalidHeaderField(String),
    Io(std::io::Error),
    Utf8(std::str::Utf8Error),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyInput => write!(f, "input buffer is empty"),
            ParseError::NoValidHeader => write!(f, "no blackbox log headers found in data"),
            ParseError::InvalidHeaderField(s) => write!(f, "invalid header field: {s}"),
            ParseError::Io(e) => write!(f, "io error: {e}"),
            ParseError::Utf8(e) => write!(f, "utf8 error: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Io(e) => Some(e),
            ParseError::Utf8(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::Io(e)
    }
}

impl From<std::str::Utf8Error> for ParseError {
    fn from(e: std::str::Utf8Error) -> Self {
        ParseError::Utf8(e)
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
