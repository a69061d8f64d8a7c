mod decoder;
mod event;
mod frame;
mod header;
mod predictor;
mod session;
mod stream;

pub use session::{find_session_boundaries, parse_session, strip_flash_headers};

use crate::types::{ParseResult, Progress};
use crate::ParseError;

/// Parses a complete BBL byte buffer, which may contain a flash-dump
/// prelude and/or multiple concatenated logging sessions.
pub fn parse_bytes(
    data: &[u8],
    verbose: bool,
    mut on_progress: Option<&mut dyn FnMut(Progress)>,
    should_cancel: Option<&dyn Fn() -> bool>,
) -> Result<ParseResult, ParseError> {
    if data.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let stripped = strip_flash_headers(data);
    let boundaries = find_session_boundaries(&stripped);
    if boundaries.is_empty() {
        return Err(ParseError::NoValidHeader);
    }

    let mut sessions = Vec::new();
    for (i, &start) in boundaries.iter().enumerate() {
        if let Some(cancel) = should_cancel {
            if cancel() {
                break;
            }
        }
        let end = boundaries.get(i + 1).copied().unwrap_or(stripped.len());
        let session_bytes = &stripped[start..end];
        if let Some(session) = session::parse_session(
            session_bytes,
            i,
            verbose,
            on_progress.as_deref_mut(),
            should_cancel,
        ) {
            sessions.push(session);
        } else if verbose {
            eprintln!("[bbl_decoder] session {i} produced no frames, skipping");
        }
    }

    let success = !sessions.is_empty();
    let error = if success {
        None
    } else {
        Some("no parseable flight data found".to_string())
    };

    Ok(ParseResult {
        sessions,
        file_size: data.len(),
        parse_time_ms: 0.0,
        success,
        error,
    })
}
