use crate::types::{Encoding, FieldDefinition, FrameFieldList, LogHeader, Predictor};

/// Parses the `H key:value` lines of one session's header text into a
/// [`LogHeader`]. Stops at (but does not consume) the first non-`H`
/// line; callers locate that boundary themselves.
pub fn parse_headers_from_text(text: &str, debug: bool) -> LogHeader {
    let mut header = LogHeader::default();

    let mut i_names: Vec<String> = Vec::new();
    let mut i_signed: Vec<bool> = Vec::new();
    let mut i_predictors: Vec<Predictor> = Vec::new();
    let mut i_encodings: Vec<Encoding> = Vec::new();

    let mut p_names: Vec<String> = Vec::new();
    let mut p_signed: Vec<bool> = Vec::new();
    let mut p_predictors: Vec<Predictor> = Vec::new();
    let mut p_encodings: Vec<Encoding> = Vec::new();

    let mut s_names: Vec<String> = Vec::new();
    let mut s_signed: Vec<bool> = Vec::new();
    let mut s_predictors: Vec<Predictor> = Vec::new();
    let mut s_encodings: Vec<Encoding> = Vec::new();

    let mut g_names: Vec<String> = Vec::new();
    let mut g_signed: Vec<bool> = Vec::new();
    let mut g_predictors: Vec<Predictor> = Vec::new();
    let mut g_encodings: Vec<Encoding> = Vec::new();

    let mut h_names: Vec<String> = Vec::new();
    let mut h_signed: Vec<bool> = Vec::new();
    let mut h_predictors: Vec<Predictor> = Vec::new();
    let mut h_encodings: Vec<Encoding> = Vec::new();

    for line in text.lines() {
        let Some(rest) = line.strip_prefix("H ") else {
            continue;
        };
        let Some((key, value)) = rest.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "Firmware revision" => header.firmware_revision = Some(value.to_string()),
            "Firmware date" => header.firmware_date = Some(value.to_string()),
            "Board information" => header.board_information = Some(value.to_string()),
            "Craft name" => header.craft_name = Some(value.to_string()),
            "Data version" => header.data_version = value.parse().unwrap_or(2),
            "looptime" => header.looptime = value.parse().unwrap_or(0),
            "minthrottle" => header.minthrottle = value.parse().unwrap_or(1000),
            "maxthrottle" => header.maxthrottle = value.parse().unwrap_or(2000),
            "vbatref" => header.vbatref = value.parse().unwrap_or(4095),
            "gyro_scale" => header.gyro_scale = value.parse().unwrap_or(1.0),
            "I interval" => header.i_interval = parse_ratio(value).0,
            "P interval" => {
                let (n, d) = parse_ratio(value);
                header.p_interval = n;
                header.p_denom = d;
            }
            "Field I name" => i_names = split_csv(value),
            "Field I signed" => i_signed = split_csv(value).iter().map(|v| v == "1").collect(),
            "Field I predictor" => {
                i_predictors = split_csv(value)
                    .iter()
                    .map(|v| Predictor::from_id(v.parse().unwrap_or(0)))
                    .collect()
            }
            "Field I encoding" => {
                i_encodings = split_csv(value)
                    .iter()
                    .map(|v| Encoding::from_id(v.parse().unwrap_or(0)))
                    .collect()
            }
            "Field P name" => p_names = split_csv(value),
            "Field P signed" => p_signed = split_csv(value).iter().map(|v| v == "1").collect(),
            "Field P predictor" => {
                p_predictors = split_csv(value)
                    .iter()
                    .map(|v| Predictor::from_id(v.parse().unwrap_or(0)))
                    .collect()
            }
            "Field P encoding" => {
                p_encodings = split_csv(value)
                    .iter()
                    .map(|v| Encoding::from_id(v.parse().unwrap_or(0)))
                    .collect()
            }
            "Field S name" => s_names = split_csv(value),
            "Field S signed" => s_signed = split_csv(value).iter().map(|v| v == "1").collect(),
            "Field S predictor" => {
                s_predictors = split_csv(value)
                    .iter()
                    .map(|v| Predictor::from_id(v.parse().unwrap_or(0)))
                    .collect()
            }
            "Field S encoding" => {
                s_encodings = split_csv(value)
                    .iter()
                    .map(|v| Encoding::from_id(v.parse().unwrap_or(0)))
                    .collect()
            }
            "Field G name" => g_names = split_csv(value),
            "Field G signed" => g_signed = split_csv(value).iter().map(|v| v == "1").collect(),
            "Field G predictor" => {
                g_predictors = split_csv(value)
                    .iter()
                    .map(|v| Predictor::from_id(v.parse().unwrap_or(0)))
                    .collect()
            }
            "Field G encoding" => {
                g_encodings = split_csv(value)
                    .iter()
                    .map(|v| Encoding::from_id(v.parse().unwrap_or(0)))
                    .collect()
            }
            "Field H name" => h_names = split_csv(value),
            "Field H signed" => h_signed = split_csv(value).iter().map(|v| v == "1").collect(),
            "Field H predictor" => {
                h_predictors = split_csv(value)
                    .iter()
                    .map(|v| Predictor::from_id(v.parse().unwrap_or(0)))
                    .collect()
            }
            "Field H encoding" => {
                h_encodings = split_csv(value)
                    .iter()
                    .map(|v| Encoding::from_id(v.parse().unwrap_or(0)))
                    .collect()
            }
            _ => {
                header.raw.insert(key.to_string(), value.to_string());
            }
        }
    }

    header.i_fields = build_field_list(&i_names, &i_signed, &i_predictors, &i_encodings);
    header.p_fields = build_field_list(&p_names, &p_signed, &p_predictors, &p_encodings);
    header.s_fields = build_field_list(&s_names, &s_signed, &s_predictors, &s_encodings);
    header.g_fields = build_field_list(&g_names, &g_signed, &g_predictors, &g_encodings);
    header.h_fields = build_field_list(&h_names, &h_signed, &h_predictors, &h_encodings);

    if debug {
        eprintln!(
            "[bbl_decoder] parsed header: {} I fields, {} P fields, looptime={}",
            header.i_fields.len(),
            header.p_fields.len(),
            header.looptime
        );
    }

    header
}

fn build_field_list(
    names: &[String],
    signed: &[bool],
    predictors: &[Predictor],
    encodings: &[Encoding],
) -> FrameFieldList {
    let fields = names
        .iter()
        .enumerate()
        .map(|(i, name)| FieldDefinition {
            name: name.clone(),
            encoding: encodings.get(i).copied().unwrap_or(Encoding::SignedVb),
            predictor: predictors.get(i).copied().unwrap_or(Predictor::Zero),
            signed: signed.get(i).copied().unwrap_or(true),
        })
        .collect();
    FrameFieldList { fields }
}

fn split_csv(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

/// Parses an `N/D` ratio header value, defaulting `D` to 1 when absent.
fn parse_ratio(value: &str) -> (i32, i32) {
    if let Some((n, d)) = value.split_once('/') {
        (n.trim().parse().unwrap_or(1), d.trim().parse().unwrap_or(1))
    } else {
        (value.trim().parse().unwrap_or(1), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_core_scalar_fields() {
        let text = "H Product:Blackbox flight data recorder\nH Data version:2\nH looptime:312\nH minthrottle:1070\nH vbatref:4095\n";
        let h = parse_headers_from_text(text, false);
        assert_eq!(h.data_version, 2);
        assert_eq!(h.looptime, 312);
        assert_eq!(h.minthrottle, 1070);
        assert_eq!(h.vbatref, 4095);
    }

    #[test]
    fn parses_interval_ratio_with_default_denominator() {
        let text = "H I interval:1\nH P interval:1/4\n";
        let h = parse_headers_from_text(text, false);
        assert_eq!(h.i_interval, 1);
        assert_eq!(h.p_interval, 1);
        assert_eq!(h.p_denom, 4);
    }

    #[test]
    fn builds_i_field_list_with_aligned_columns() {
        let text = "H Field I name:loopIteration,time,gyroADC[0]\nH Field I signed:0,0,1\nH Field I predictor:0,0,0\nH Field I encoding:1,1,0\n";
        let h = parse_headers_from_text(text, false);
        assert_eq!(h.i_fields.len(), 3);
        assert_eq!(h.i_fields.fields[2].name, "gyroADC[0]");
        assert!(h.i_fields.fields[2].signed);
        assert_eq!(h.i_fields.fields[2].encoding, Encoding::SignedVb);
    }

    #[test]
    fn unrecognized_keys_land_in_raw_map() {
        let text = "H Some Future Key:42\n";
        let h = parse_headers_from_text(text, false);
        assert_eq!(h.raw.get("Some Future Key").map(String::as_str), Some("42"));
    }

    #[test]
    fn builds_g_and_h_field_lists() {
        let text = "H Field G name:time,GPS_numSat,GPS_coord[0]\n\
H Field G signed:0,0,1\n\
H Field G predictor:0,0,0\n\
H Field G encoding:1,1,0\n\
H Field H name:GPS_home[0],GPS_home[1]\n\
H Field H signed:1,1\n\
H Field H predictor:0,0\n\
H Field H encoding:0,0\n";
        let h = parse_headers_from_text(text, false);
        assert_eq!(h.g_fields.len(), 3);
        assert_eq!(h.g_fields.fields[1].name, "GPS_numSat");
        assert_eq!(h.h_fields.len(), 2);
        assert_eq!(h.h_fields.fields[0].name, "GPS_home[0]");
    }
}
