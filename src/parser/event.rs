use super::stream::StreamReader;

const LOG_END_LITERAL: &[u8] = b"End of log\0";

/// Outcome of processing one `E` (event) marker.
pub enum EventOutcome {
    /// Event payload consumed normally; parsing continues.
    Continue,
    /// `LOG_END` validated; the session ends here.
    EndOfLog,
}

/// Parses the event-type byte and its payload, applying the documented
/// per-type layout. Returns [`EventOutcome::EndOfLog`] only when the
/// `LOG_END` literal trailer is validated; a mismatched trailer is
/// treated as a false positive and normal processing resumes.
pub fn parse_event(reader: &mut StreamReader) -> EventOutcome {
    let event_type = reader.read_byte();
    match event_type {
        0 => {
            // SYNC_BEEP
            reader.read_unsigned_vb();
        }
        10 | 11 | 12 => {
            // AUTOTUNE_CYCLE_START / RESULT / TARGETS: no documented
            // payload in this core; leave the reader position untouched.
        }
        13 => {
            // INFLIGHT_ADJUSTMENT
            let adj_func = reader.read_byte();
            if adj_func > 127 {
                reader.skip(4);
            } else {
                reader.read_signed_vb();
            }
        }
        14 => {
            // LOGGING_RESUME
            reader.read_unsigned_vb();
            reader.read_unsigned_vb();
        }
        15 => {
            // DISARM
            reader.read_unsigned_vb();
        }
        30 => {
            // FLIGHT_MODE
            reader.read_unsigned_vb();
            reader.read_unsigned_vb();
        }
        255 => {
            if reader.consume_literal(LOG_END_LITERAL) {
                return EventOutcome::EndOfLog;
            }
            // False positive 0xFF byte; nothing was consumed by
            // consume_literal on mismatch, so the reader is already
            // positioned right after the event-type byte.
        }
        _ => {
            // Unknown event type: no heuristic skip: leave the reader
            // where it is and let the main loop resynchronize.
        }
    }
    EventOutcome::Continue
}
