use super::header::LogHeader;

/// A single named channel: parallel time/value arrays of equal length.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSeries {
    pub time_s: Vec<f64>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn zeroed(frame_count: usize) -> Self {
        TimeSeries {
            time_s: vec![0.0; frame_count],
            values: vec![0.0; frame_count],
        }
    }
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlightData {
    pub gyro: [TimeSeries; 3],
    pub setpoint: [TimeSeries; 4],
    pub pid_p: [TimeSeries; 3],
    pub pid_i: [TimeSeries; 3],
    pub pid_d: [TimeSeries; 3],
    pub pid_f: [TimeSeries; 3],
    pub motor: [TimeSeries; 4],
    pub debug: Vec<TimeSeries>,
    pub sample_rate_hz: f64,
    pub duration_s: f64,
    pub frame_count: usize,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Session {
    pub index: usize,
    pub header: LogHeader,
    pub flight_data: FlightData,
    pub corrupted_frame_count: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseResult {
    pub sessions: Vec<Session>,
    pub file_size: usize,
    pub parse_time_ms: f64,
    pub success: bool,
    pub error: Option<String>,
}

/// Progress notification emitted roughly every 16 KiB consumed or 5000
/// frames decoded, whichever comes first. Purely informational.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub bytes_processed: usize,
    pub total_bytes: usize,
    pub percent: f64,
    pub current_session: usize,
}
