use crate::types::{LogHeader, Predictor};

/// Applies a predictor to a freshly-decoded delta, reconstructing the
/// absolute field value.
///
/// `prev`/`prev2` are whole-frame snapshots (`None` when no valid history
/// exists, e.g. right after a rejected frame). `current` is the frame
/// under construction, used only by `Motor0` on I-frames to read back a
/// field decoded earlier in the same frame.
#[allow(clippy::too_many_arguments)]
pub fn apply(
    predictor: Predictor,
    decoded: i32,
    field_idx: usize,
    is_i_frame: bool,
    prev: Option<&[i32]>,
    prev2: Option<&[i32]>,
    current: &[i32],
    header: &LogHeader,
    motor0_idx: Option<usize>,
) -> i32 {
    let prev_at = |idx: usize| -> Option<i32> { prev.and_then(|p| p.get(idx).copied()) };
    let prev2_at = |idx: usize| -> Option<i32> { prev2.and_then(|p| p.get(idx).copied()) };

    match predictor {
        Predictor::Zero => decoded,
        Predictor::Previous => decoded + prev_at(field_idx).unwrap_or(0),
        Predictor::StraightLine => {
            if is_i_frame {
                decoded
            } else if let (Some(p1), Some(p2)) = (prev_at(field_idx), prev2_at(field_idx)) {
                decoded + 2 * p1 - p2
            } else {
                decoded + prev_at(field_idx).unwrap_or(0)
            }
        }
        Predictor::Average2 => {
            if is_i_frame {
                decoded
            } else if let (Some(p1), Some(p2)) = (prev_at(field_idx), prev2_at(field_idx)) {
                // C-style truncation toward zero; Rust's `i32::/` already
                // truncates, so plain division matches.
                decoded + (p1 + p2) / 2
            } else {
                decoded + prev_at(field_idx).unwrap_or(0)
            }
        }
        Predictor::MinThrottle => {
            if is_i_frame {
                decoded + header.minthrottle
            } else {
                decoded + prev_at(field_idx).unwrap_or(header.minthrottle)
            }
        }
        Predictor::Motor0 => {
            if is_i_frame {
                let base = motor0_idx.and_then(|i| current.get(i).copied()).unwrap_or(0);
                decoded + base
            } else {
                decoded + prev_at(field_idx).unwrap_or(0)
            }
        }
        Predictor::Increment => {
            if is_i_frame {
                decoded
            } else {
                decoded + prev_at(field_idx).unwrap_or(0) + 1
            }
        }
        Predictor::HomeCoord => decoded + prev_at(field_idx).unwrap_or(0),
        Predictor::ServoCenter => {
            if is_i_frame {
                decoded + 1500
            } else {
                decoded + prev_at(field_idx).unwrap_or(1500)
            }
        }
        Predictor::VbatRef => {
            if is_i_frame {
                decoded + header.vbatref
            } else {
                decoded + prev_at(field_idx).unwrap_or(header.vbatref)
            }
        }
    }
}
