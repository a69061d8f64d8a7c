use super::event::{parse_event, EventOutcome};
use super::frame::FrameParser;
use super::header::parse_headers_from_text;
use super::stream::StreamReader;
use crate::types::{FlightData, LogHeader, Progress, Session, TimeSeries};

const SESSION_MARKER: &[u8] = b"H Product:";

const MAX_FRAME_LENGTH: usize = 256;
const MAX_ITERATION_JUMP: i64 = 500;
const MAX_TIME_JUMP_US: i64 = 500_000;
const MAX_I_FRAME_ITER_BACKWARD: i64 = 5;
const MAX_I_FRAME_TIME_BACKWARD_US: i64 = 5_000;

const PROGRESS_BYTE_INTERVAL: usize = 16 * 1024;
const PROGRESS_FRAME_INTERVAL: usize = 5000;

/// Strips a possible MSP flash-dump prelude ahead of the first `H`
/// header byte, trying the 7-byte-header hypothesis (with a compressed
/// flag byte) before the 6-byte one, and passing the buffer through
/// unchanged if it already starts with `H`.
pub fn strip_flash_headers(buf: &[u8]) -> Vec<u8> {
    if buf.is_empty() || buf[0] == b'H' {
        return buf.to_vec();
    }

    if let Some(payload) = try_strip_with_record_header(buf, 7) {
        return payload;
    }
    if let Some(payload) = try_strip_with_record_header(buf, 6) {
        return payload;
    }
    buf.to_vec()
}

fn try_strip_with_record_header(buf: &[u8], header_len: usize) -> Option<Vec<u8>> {
    if buf.len() <= header_len {
        return None;
    }
    let size = u16::from_le_bytes([buf[4], buf[5]]) as usize;
    if size == 0 || size >= 4096 {
        return None;
    }
    if buf[header_len] != b'H' {
        return None;
    }

    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos + header_len < buf.len() {
        let record_size = u16::from_le_bytes([buf[pos + 4], buf[pos + 5]]) as usize;
        if record_size == 0 || record_size >= 4096 {
            out.extend_from_slice(&buf[pos..]);
            break;
        }
        let payload_start = pos + header_len;
        let payload_end = (payload_start + record_size).min(buf.len());
        out.extend_from_slice(&buf[payload_start..payload_end]);
        if payload_end >= buf.len() {
            break;
        }
        pos = payload_end;
    }
    Some(out)
}

/// Scans for the literal session-start marker, returning one boundary
/// offset per occurrence in ascending order.
pub fn find_session_boundaries(buf: &[u8]) -> Vec<usize> {
    let mut positions = Vec::new();
    if buf.len() < SESSION_MARKER.len() {
        return positions;
    }
    for i in 0..=(buf.len() - SESSION_MARKER.len()) {
        if &buf[i..i + SESSION_MARKER.len()] == SESSION_MARKER {
            positions.push(i);
        }
    }
    positions
}

struct FrameRecord {
    loop_iteration: i64,
    time_us: i64,
    values: Vec<i32>,
}

/// Parses a single session's bytes (header text through end of its
/// binary frame stream) into a [`Session`], or `None` if no usable
/// I-frame schema or frame data was found.
#[allow(clippy::too_many_arguments)]
pub fn parse_session(
    data: &[u8],
    index: usize,
    verbose: bool,
    mut on_progress: Option<&mut dyn FnMut(Progress)>,
    should_cancel: Option<&dyn Fn() -> bool>,
) -> Option<Session> {
    let header_end = find_header_end(data);
    let header_text = std::str::from_utf8(&data[0..header_end]).ok()?;
    let header = parse_headers_from_text(header_text, verbose);

    if header.i_fields.is_empty() {
        return None;
    }

    let loop_iter_idx = header.i_fields.index_of("loopIteration");
    let time_idx = header.i_fields.index_of("time");
    let p_to_i: Vec<Option<usize>> = header
        .p_fields
        .fields
        .iter()
        .map(|f| header.i_fields.index_of(&f.name))
        .collect();

    let frame_parser = FrameParser::new(&header);
    let mut reader = StreamReader::new(&data[header_end..]);

    let mut prev: Option<Vec<i32>> = None;
    let mut prev2: Option<Vec<i32>> = None;
    let mut last_iter: i64 = 0;
    let mut last_time: i64 = 0;
    let mut have_history = false;

    let mut i_frames: Vec<FrameRecord> = Vec::new();
    let mut p_frames: Vec<FrameRecord> = Vec::new();
    let mut corrupted_frame_count = 0usize;
    let mut warnings: Vec<String> = Vec::new();

    let mut bytes_since_progress = 0usize;
    let mut frames_since_progress = 0usize;
    let mut ended_by_log_end = false;

    loop {
        if reader.eof() {
            break;
        }
        if let Some(cancel) = should_cancel {
            if cancel() {
                warnings.push("cancelled before end of session".to_string());
                break;
            }
        }

        let frame_start = reader.offset();
        let marker = reader.read_byte();

        match marker {
            0x49 => {
                // 'I'
                let values = frame_parser.parse_i_frame(&mut reader, &header);
                let size = reader.offset() - frame_start;
                if size > MAX_FRAME_LENGTH {
                    corrupted_frame_count += 1;
                    prev = None;
                    prev2 = None;
                    have_history = false;
                    reader.set_offset(frame_start + 1);
                } else {
                    let iter = loop_iter_idx.map(|i| values[i] as i64).unwrap_or(0);
                    let time = time_idx.map(|i| values[i] as i64).unwrap_or(0);
                    if have_history && !i_frame_temporally_valid(iter, time, last_iter, last_time) {
                        corrupted_frame_count += 1;
                        prev = None;
                        prev2 = None;
                        have_history = false;
                    } else {
                        last_iter = iter;
                        last_time = time;
                        have_history = true;
                        prev = Some(values.clone());
                        prev2 = Some(values.clone());
                        i_frames.push(FrameRecord {
                            loop_iteration: iter,
                            time_us: time,
                            values,
                        });
                    }
                }
            }
            0x50 => {
                // 'P'
                if let Some(prev_vals) = prev.clone() {
                    let values =
                        frame_parser.parse_p_frame(&mut reader, &prev_vals, prev2.as_deref(), &header);
                    let size = reader.offset() - frame_start;
                    if size > MAX_FRAME_LENGTH {
                        corrupted_frame_count += 1;
                        prev = None;
                        prev2 = None;
                        have_history = false;
                        reader.set_offset(frame_start + 1);
                    } else {
                        let iter = loop_iter_idx
                            .and_then(|_| p_to_i.iter().position(|x| *x == loop_iter_idx))
                            .map(|pi| values[pi] as i64)
                            .unwrap_or(last_iter);
                        let time = time_idx
                            .and_then(|_| p_to_i.iter().position(|x| *x == time_idx))
                            .map(|pi| values[pi] as i64)
                            .unwrap_or(last_time);

                        if !p_frame_temporally_valid(iter, time, last_iter, last_time) {
                            corrupted_frame_count += 1;
                            prev = None;
                            prev2 = None;
                            have_history = false;
                        } else {
                            last_iter = iter;
                            last_time = time;
                            prev2 = prev.clone();
                            prev = Some(values.clone());
                            let canonical = project_p_to_i(&values, &p_to_i, header.i_fields.len());
                            p_frames.push(FrameRecord {
                                loop_iteration: iter,
                                time_us: time,
                                values: canonical,
                            });
                        }
                    }
                } else {
                    // No valid history: still consume bytes to stay
                    // aligned, using zeroed dummy context, but discard
                    // the result.
                    let dummy = vec![0i32; header.p_fields.len()];
                    frame_parser.parse_p_frame(&mut reader, &dummy, None, &header);
                    prev = None;
                    prev2 = None;
                }
            }
            0x53 => {
                // 'S'
                frame_parser.parse_s_frame(&mut reader);
            }
            0x45 => {
                // 'E'
                match parse_event(&mut reader) {
                    EventOutcome::EndOfLog => {
                        ended_by_log_end = true;
                    }
                    EventOutcome::Continue => {}
                }
            }
            0x47 | 0x48 => {
                // 'G' / 'H' (GPS): not parsed by this core.
                prev = None;
                prev2 = None;
                have_history = false;
            }
            -1 => break,
            _ => {
                // Unknown marker byte: tolerate, do not count as
                // corruption.
                prev = None;
                prev2 = None;
                have_history = false;
            }
        }

        if ended_by_log_end {
            break;
        }

        frames_since_progress += 1;
        bytes_since_progress = reader.offset() - frame_start + bytes_since_progress;
        if bytes_since_progress >= PROGRESS_BYTE_INTERVAL || frames_since_progress >= PROGRESS_FRAME_INTERVAL {
            if let Some(cb) = on_progress.as_deref_mut() {
                cb(Progress {
                    bytes_processed: reader.offset(),
                    total_bytes: data.len() - header_end,
                    percent: 100.0 * reader.offset() as f64 / (data.len() - header_end).max(1) as f64,
                    current_session: index,
                });
            }
            bytes_since_progress = 0;
            frames_since_progress = 0;
        }
    }

    if i_frames.is_empty() {
        return None;
    }

    let flight_data = build_flight_data(&header, &i_frames, &p_frames);
    warnings.extend(quality_warnings(&flight_data));

    Some(Session {
        index,
        header,
        flight_data,
        corrupted_frame_count,
        warnings,
    })
}

fn find_header_end(data: &[u8]) -> usize {
    for i in 1..data.len() {
        if data[i - 1] == b'\n' && data[i] != b'H' {
            return i;
        }
    }
    data.len()
}

fn i_frame_temporally_valid(iter: i64, time: i64, last_iter: i64, last_time: i64) -> bool {
    if iter >= last_iter + MAX_ITERATION_JUMP {
        return false;
    }
    if iter < last_iter - MAX_I_FRAME_ITER_BACKWARD {
        return false;
    }
    if time >= last_time + MAX_TIME_JUMP_US {
        return false;
    }
    if time < last_time - MAX_I_FRAME_TIME_BACKWARD_US {
        return false;
    }
    true
}

fn p_frame_temporally_valid(iter: i64, time: i64, last_iter: i64, last_time: i64) -> bool {
    if iter < last_iter || iter >= last_iter + MAX_ITERATION_JUMP {
        return false;
    }
    if time < last_time || time >= last_time + MAX_TIME_JUMP_US {
        return false;
    }
    true
}

fn project_p_to_i(values: &[i32], p_to_i: &[Option<usize>], canonical_len: usize) -> Vec<i32> {
    let mut out = vec![0i32; canonical_len];
    for (p_idx, v) in values.iter().enumerate() {
        if let Some(Some(i_idx)) = p_to_i.get(p_idx) {
            out[*i_idx] = *v;
        }
    }
    out
}

fn build_flight_data(header: &LogHeader, i_frames: &[FrameRecord], p_frames: &[FrameRecord]) -> FlightData {
    let mut all: Vec<&FrameRecord> = i_frames.iter().chain(p_frames.iter()).collect();
    let have_loop_iter = header.i_fields.index_of("loopIteration").is_some();
    if have_loop_iter {
        all.sort_by_key(|f| f.loop_iteration);
    }

    let frame_count = all.len();
    let sample_rate_hz =
        1_000_000.0 / (header.looptime.max(1) as f64 * header.p_interval.max(1) as f64 * header.p_denom.max(1) as f64);
    let dt = if sample_rate_hz > 0.0 { 1.0 / sample_rate_hz } else { 0.0 };

    let time_field_present = header.i_fields.index_of("time").is_some();
    let time_monotone = time_field_present
        && all.windows(2).all(|w| {
            let delta = (w[1].time_us - w[0].time_us) as f64 / 1_000_000.0;
            !(delta < -1.0 || delta > 10.0)
        });

    let time_s: Vec<f64> = if time_monotone {
        all.iter().map(|f| f.time_us as f64 / 1_000_000.0).collect()
    } else {
        (0..frame_count).map(|i| i as f64 * dt).collect()
    };

    let duration_s = time_s.last().copied().unwrap_or(0.0) - time_s.first().copied().unwrap_or(0.0);

    let extract = |name: &str| -> TimeSeries {
        match header.i_fields.index_of(name) {
            Some(idx) => TimeSeries {
                time_s: time_s.clone(),
                values: all.iter().map(|f| f.values[idx] as f64).collect(),
            },
            None => TimeSeries::zeroed(frame_count),
        }
    };

    let extract_setpoint = |axis: usize| -> TimeSeries {
        let primary = format!("setpoint[{axis}]");
        if header.i_fields.index_of(&primary).is_some() {
            return extract(&primary);
        }
        extract(&format!("rcCommand[{axis}]"))
    };

    FlightData {
        gyro: [extract("gyroADC[0]"), extract("gyroADC[1]"), extract("gyroADC[2]")],
        setpoint: [
            extract_setpoint(0),
            extract_setpoint(1),
            extract_setpoint(2),
            extract_setpoint(3),
        ],
        pid_p: [extract("axisP[0]"), extract("axisP[1]"), extract("axisP[2]")],
        pid_i: [extract("axisI[0]"), extract("axisI[1]"), extract("axisI[2]")],
        pid_d: [extract("axisD[0]"), extract("axisD[1]"), extract("axisD[2]")],
        pid_f: [extract("axisF[0]"), extract("axisF[1]"), extract("axisF[2]")],
        motor: [
            extract("motor[0]"),
            extract("motor[1]"),
            extract("motor[2]"),
            extract("motor[3]"),
        ],
        debug: (0..8).map(|i| extract(&format!("debug[{i}]"))).collect(),
        sample_rate_hz,
        duration_s,
        frame_count,
    }
}

/// Non-fatal quality diagnostics over a handful of the channels callers
/// most often rely on. These never affect `success`; they only surface
/// in `Session.warnings` for the caller to act on.
/// Channel magnitudes beyond this are implausible for any real gyro/motor
/// reading and point at a predictor-chain desync rather than flight data.
const EXTREME_RANGE_THRESHOLD: f64 = 1_000_000.0;

fn quality_warnings(flight_data: &FlightData) -> Vec<String> {
    let mut warnings = Vec::new();
    let named = [
        ("gyro[0]", &flight_data.gyro[0]),
        ("gyro[1]", &flight_data.gyro[1]),
        ("gyro[2]", &flight_data.gyro[2]),
        ("motor[0]", &flight_data.motor[0]),
        ("motor[1]", &flight_data.motor[1]),
    ];
    for (name, series) in named {
        if series.values.is_empty() {
            continue;
        }
        let zero_count = series.values.iter().filter(|v| **v == 0.0).count();
        if zero_count as f64 / series.values.len() as f64 > 0.9 {
            warnings.push(format!("channel {name} is >90% zero"));
            continue;
        }
        let first = series.values[0];
        if series.values.iter().all(|v| *v == first) {
            warnings.push(format!("channel {name} is constant at {first}"));
            continue;
        }
        let min = series.values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = series.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if max - min > EXTREME_RANGE_THRESHOLD {
            warnings.push(format!("channel {name} has an extreme range ({min}..{max})"));
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_buffer_already_starts_with_h() {
        let buf = b"H Product:Blackbox".to_vec();
        assert_eq!(strip_flash_headers(&buf), buf);
    }

    #[test]
    fn finds_single_session_boundary() {
        let buf = b"junkH Product:Blackbox flight data recorder\n".to_vec();
        let boundaries = find_session_boundaries(&buf);
        assert_eq!(boundaries, vec![4]);
    }

    #[test]
    fn finds_multiple_session_boundaries() {
        let mut buf = b"H Product:A".to_vec();
        buf.extend_from_slice(b"H Product:B");
        let boundaries = find_session_boundaries(&buf);
        assert_eq!(boundaries, vec![0, 11]);
    }

    #[test]
    fn quality_warnings_flags_extreme_range_channel() {
        let mut fd = FlightData::default();
        fd.gyro[0] = crate::types::TimeSeries {
            time_s: vec![0.0, 1.0],
            values: vec![-2_000_000.0, 2_000_000.0],
        };
        let warnings = quality_warnings(&fd);
        assert!(warnings.iter().any(|w| w.contains("gyro[0]") && w.contains("extreme range")));
    }

    #[test]
    fn quality_warnings_does_not_flag_normal_channel() {
        let mut fd = FlightData::default();
        fd.gyro[0] = crate::types::TimeSeries {
            time_s: vec![0.0, 1.0, 2.0],
            values: vec![-10.0, 0.0, 12.0],
        };
        let warnings = quality_warnings(&fd);
        assert!(!warnings.iter().any(|w| w.contains("gyro[0]")));
    }

    fn minimal_header() -> Vec<u8> {
        b"H Product:Blackbox flight data recorder\n\
H Data version:2\n\
H looptime:1000\n\
H I interval:1\n\
H P interval:1/1\n\
H Field I name:loopIteration,time,gyroADC[0]\n\
H Field I signed:0,0,1\n\
H Field I predictor:0,0,0\n\
H Field I encoding:1,1,0\n\
H Field P name:time,gyroADC[0]\n\
H Field P signed:0,1\n\
H Field P predictor:2,1\n\
H Field P encoding:0,7\n"
            .to_vec()
    }

    #[test]
    fn parses_minimal_i_frame_session() {
        let mut data = minimal_header();
        // loopIteration=0, time=0, gyro=10 (zigzag 20)
        data.extend_from_slice(&[b'I', 0, 0, 20]);
        let session = parse_session(&data, 0, false, None, None).expect("session");
        assert_eq!(session.flight_data.frame_count, 1);
        assert_eq!(session.flight_data.gyro[0].values, vec![10.0]);
    }

    #[test]
    fn log_end_stops_decoding_remaining_bytes() {
        let mut data = minimal_header();
        data.extend_from_slice(&[b'I', 0, 0, 20]);
        data.push(b'E');
        data.push(255);
        data.extend_from_slice(b"End of log\0");
        data.extend_from_slice(&[b'I', 0xff, 0xff, 0xff]); // garbage after log end
        let session = parse_session(&data, 0, false, None, None).expect("session");
        assert_eq!(session.flight_data.frame_count, 1);
    }

    #[test]
    fn oversize_frame_is_rejected_and_recovered() {
        // 60 UnsignedVb fields so a frame of unterminated continuation
        // bytes can exceed MAX_FRAME_LENGTH (each field reads up to 5
        // bytes before giving up).
        let mut names = vec!["loopIteration".to_string(), "time".to_string()];
        for i in 0..58 {
            names.push(format!("debugDummy[{i}]"));
        }
        let csv_names = names.join(",");
        let csv_signed = vec!["0"; names.len()].join(",");
        let csv_pred = vec!["0"; names.len()].join(",");
        let csv_enc = vec!["1"; names.len()].join(",");
        let mut data = format!(
            "H Product:Blackbox flight data recorder\n\
H Data version:2\n\
H looptime:1000\n\
H I interval:1\n\
H P interval:1/1\n\
H Field I name:{csv_names}\n\
H Field I signed:{csv_signed}\n\
H Field I predictor:{csv_pred}\n\
H Field I encoding:{csv_enc}\n"
        )
        .into_bytes();

        // Valid first I-frame: all zeros (single 0x00 byte per field).
        data.push(b'I');
        data.extend(std::iter::repeat(0u8).take(names.len()));

        // Oversize, corrupt I-frame: continuation bit always set so
        // each of the 60 fields consumes the full 5-byte cap (300 bytes
        // total), well past MAX_FRAME_LENGTH.
        data.push(b'I');
        data.extend(std::iter::repeat(0x80u8).take(300));

        // Recovery: scan resumes byte-by-byte through the filler until
        // the next real marker. Append a trailing valid I-frame.
        data.push(b'I');
        data.extend(std::iter::repeat(0u8).take(names.len()));

        let session = parse_session(&data, 0, false, None, None).expect("session");
        assert!(session.corrupted_frame_count >= 1);
        assert!(session.flight_data.frame_count >= 2);
    }
}
