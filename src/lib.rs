//! Betaflight blackbox log (BBL) decoder.
//!
//! Parses a raw BBL byte buffer — optionally prefixed with an MSP
//! flash-dump prelude, and potentially containing several concatenated
//! logging sessions — into a [`ParseResult`] of [`Session`]s, each
//! carrying typed flight-data time series (gyro, setpoint, PID terms,
//! motor outputs, debug channels).
//!
//! This crate decodes; it does not analyze. FFT/step-response analysis,
//! UI, and mass-storage download are left to callers.

mod error;
mod parser;
pub mod types;

pub use error::{ParseError, Result};
pub use types::{
    Encoding, FieldDefinition, FlightData, FrameFieldList, LogHeader, ParseResult, Predictor,
    Progress, Session, TimeSeries,
};

use std::path::Path;
use std::time::Instant;

/// Parses an in-memory BBL buffer.
///
/// `verbose` gates diagnostic `eprintln!` tracing of header parsing and
/// corruption recovery. `on_progress` and `should_cancel`, when
/// provided, are invoked at roughly 16 KiB/5000-frame boundaries inside
/// the frame loop; neither is required for correctness.
pub fn parse_bytes(
    data: &[u8],
    verbose: bool,
    on_progress: Option<&mut dyn FnMut(Progress)>,
    should_cancel: Option<&dyn Fn() -> bool>,
) -> Result<ParseResult> {
    let started = Instant::now();
    let mut result = parser::parse_bytes(data, verbose, on_progress, should_cancel)?;
    result.parse_time_ms = started.elapsed().as_secs_f64() * 1000.0;
    Ok(result)
}

/// Reads and parses a BBL file from disk.
pub fn parse_file(path: &Path, verbose: bool) -> Result<ParseResult> {
    let data = std::fs::read(path)?;
    parse_bytes(&data, verbose, None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_a_fatal_error() {
        let err = parse_bytes(&[], false, None, None).unwrap_err();
        assert!(matches!(err, ParseError::EmptyInput));
    }

    #[test]
    fn buffer_without_any_header_marker_is_a_fatal_error() {
        let data = b"not a blackbox log".to_vec();
        let err = parse_bytes(&data, false, None, None).unwrap_err();
        assert!(matches!(err, ParseError::NoValidHeader));
    }

    fn minimal_session() -> Vec<u8> {
        let mut data = b"H Product:Blackbox flight data recorder\n\
H Data version:2\n\
H looptime:1000\n\
H I interval:1\n\
H P interval:1/1\n\
H Field I name:loopIteration,time,gyroADC[0]\n\
H Field I signed:0,0,1\n\
H Field I predictor:0,0,0\n\
H Field I encoding:1,1,0\n"
            .to_vec();
        data.extend_from_slice(&[b'I', 0, 0, 20]);
        data
    }

    #[test]
    fn parses_a_single_minimal_session() {
        let data = minimal_session();
        let result = parse_bytes(&data, false, None, None).unwrap();
        assert!(result.success);
        assert_eq!(result.sessions.len(), 1);
        assert_eq!(result.sessions[0].flight_data.frame_count, 1);
    }

    #[test]
    fn parses_two_concatenated_sessions() {
        let mut data = minimal_session();
        data.extend_from_slice(&minimal_session());
        let result = parse_bytes(&data, false, None, None).unwrap();
        assert!(result.success);
        assert_eq!(result.sessions.len(), 2);
        assert_eq!(result.sessions[1].flight_data.frame_count, 1);
    }

    #[test]
    fn progress_callback_is_invoked_for_large_input() {
        let mut data = b"H Product:Blackbox flight data recorder\n\
H Data version:2\n\
H looptime:1000\n\
H I interval:1\n\
H P interval:1/1\n\
H Field I name:loopIteration,time,gyroADC[0]\n\
H Field I signed:0,0,1\n\
H Field I predictor:0,0,0\n\
H Field I encoding:1,1,0\n"
            .to_vec();
        for i in 0..6000 {
            data.push(b'I');
            data.push(0);
            data.push(0);
            data.push(((i % 10) * 2) as u8);
        }
        let mut calls = 0;
        {
            let mut cb = |_p: Progress| calls += 1;
            let result = parse_bytes(&data, false, Some(&mut cb), None).unwrap();
            assert!(result.success);
        }
        assert!(calls > 0);
    }
}
