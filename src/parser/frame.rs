use super::decoder::{decode_group, decode_single};
use super::predictor;
use super::stream::StreamReader;
use crate::types::{FrameFieldList, LogHeader};

/// Decodes and predictor-applies one frame's worth of fields against a
/// fixed field list, respecting the fixed-group (`Tag2_3S32`,
/// `Tag2_3SVariable`) and variable-group (`Tag8_8sVb`, `Tag8_4S16`)
/// packing rules.
pub struct FrameParser {
    i_fields: FrameFieldList,
    p_fields: FrameFieldList,
    s_fields: FrameFieldList,
    i_motor0_idx: Option<usize>,
    p_motor0_idx: Option<usize>,
    data_version: i32,
}

impl FrameParser {
    pub fn new(header: &LogHeader) -> Self {
        FrameParser {
            i_fields: header.i_fields.clone(),
            p_fields: header.p_fields.clone(),
            s_fields: header.s_fields.clone(),
            i_motor0_idx: header.i_fields.index_of("motor[0]"),
            p_motor0_idx: header.p_fields.index_of("motor[0]"),
            data_version: header.data_version,
        }
    }

    pub fn i_field_count(&self) -> usize {
        self.i_fields.len()
    }

    pub fn p_field_count(&self) -> usize {
        self.p_fields.len()
    }

    pub fn parse_i_frame(&self, reader: &mut StreamReader, header: &LogHeader) -> Vec<i32> {
        self.parse(reader, &self.i_fields, true, None, None, header, self.i_motor0_idx)
    }

    pub fn parse_p_frame(
        &self,
        reader: &mut StreamReader,
        prev: &[i32],
        prev2: Option<&[i32]>,
        header: &LogHeader,
    ) -> Vec<i32> {
        self.parse(
            reader,
            &self.p_fields,
            false,
            Some(prev),
            prev2,
            header,
            self.p_motor0_idx,
        )
    }

    /// S-frames carry slowly-changing absolute values, not predictor
    /// deltas, but still use the same fixed/variable-group field packing
    /// as I/P frames, so this shares the grouped-field walk and simply
    /// stores each decoded value raw instead of running it through
    /// `predictor::apply`.
    pub fn parse_s_frame(&self, reader: &mut StreamReader) -> Vec<i32> {
        let fields = &self.s_fields;
        let n = fields.len();
        let mut out = vec![0i32; n];
        let mut fi = 0;

        while fi < n {
            let enc = fields.fields[fi].encoding;

            if reader.eof() && !matches!(enc, crate::types::Encoding::Null) {
                break;
            }

            if enc.is_fixed_group() {
                let remaining = (n - fi).min(3);
                let mut tmp = [0i32; 3];
                decode_group(reader, enc, &mut tmp, 0, 3, self.data_version);
                out[fi..fi + remaining].copy_from_slice(&tmp[..remaining]);
                fi += remaining.max(1);
                continue;
            }

            if enc.is_variable_group() {
                let natural = enc.natural_group_size();
                let run_len = count_run(fields, fi, enc);
                let mut processed = 0;
                while processed < run_len {
                    let chunk = natural.min(run_len - processed);
                    let mut tmp = vec![0i32; chunk];
                    decode_group(reader, enc, &mut tmp, 0, chunk, self.data_version);
                    out[fi + processed..fi + processed + chunk].copy_from_slice(&tmp);
                    processed += chunk;
                }
                fi += run_len.max(1);
                continue;
            }

            decode_single(reader, enc, &mut out, fi);
            fi += 1;
        }
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn parse(
        &self,
        reader: &mut StreamReader,
        fields: &FrameFieldList,
        is_i_frame: bool,
        prev: Option<&[i32]>,
        prev2: Option<&[i32]>,
        header: &LogHeader,
        motor0_idx: Option<usize>,
    ) -> Vec<i32> {
        let n = fields.len();
        let mut out = vec![0i32; n];
        let mut fi = 0;

        while fi < n {
            let enc = fields.fields[fi].encoding;

            if reader.eof() && !matches!(enc, crate::types::Encoding::Null) {
                break;
            }

            if enc.is_fixed_group() {
                let remaining = (n - fi).min(3);
                let mut tmp = [0i32; 3];
                decode_group(reader, enc, &mut tmp, 0, 3, self.data_version);
                for k in 0..remaining {
                    let val = predictor::apply(
                        fields.fields[fi + k].predictor,
                        tmp[k],
                        fi + k,
                        is_i_frame,
                        prev,
                        prev2,
                        &out,
                        header,
                        motor0_idx,
                    );
                    out[fi + k] = val;
                }
                fi += remaining.max(1);
                continue;
            }

            if enc.is_variable_group() {
                let natural = enc.natural_group_size();
                let run_len = count_run(fields, fi, enc);
                let mut processed = 0;
                while processed < run_len {
                    let chunk = natural.min(run_len - processed);
                    let mut tmp = vec![0i32; chunk];
                    decode_group(reader, enc, &mut tmp, 0, chunk, self.data_version);
                    for k in 0..chunk {
                        let field_idx = fi + processed + k;
                        let val = predictor::apply(
                            fields.fields[field_idx].predictor,
                            tmp[k],
                            field_idx,
                            is_i_frame,
                            prev,
                            prev2,
                            &out,
                            header,
                            motor0_idx,
                        );
                        out[field_idx] = val;
                    }
                    processed += chunk;
                }
                fi += run_len.max(1);
                continue;
            }

            let mut raw = [0i32; 1];
            decode_single(reader, enc, &mut raw, 0);
            let val = predictor::apply(
                fields.fields[fi].predictor,
                raw[0],
                fi,
                is_i_frame,
                prev,
                prev2,
                &out,
                header,
                motor0_idx,
            );
            out[fi] = val;
            fi += 1;
        }

        out
    }
}

fn count_run(fields: &FrameFieldList, start: usize, enc: crate::types::Encoding) -> usize {
    let mut c = 0;
    while start + c < fields.len() && fields.fields[start + c].encoding == enc {
        c += 1;
    }
    c.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Encoding, FieldDefinition, Predictor};

    fn field(name: &str, enc: Encoding, pred: Predictor) -> FieldDefinition {
        FieldDefinition {
            name: name.to_string(),
            encoding: enc,
            predictor: pred,
            signed: true,
        }
    }

    #[test]
    fn i_frame_single_value_fields() {
        let mut header = LogHeader::default();
        header.i_fields = FrameFieldList {
            fields: vec![
                field("loopIteration", Encoding::UnsignedVb, Predictor::Zero),
                field("time", Encoding::UnsignedVb, Predictor::Zero),
                field("gyroADC[0]", Encoding::SignedVb, Predictor::Zero),
            ],
        };
        let parser = FrameParser::new(&header);
        // loopIteration=0, time=312, gyro=-5 (zigzag 9)
        let bytes = [0u8, 0xb8, 0x02, 9];
        let mut r = StreamReader::new(&bytes);
        let out = parser.parse_i_frame(&mut r, &header);
        assert_eq!(out, vec![0, 312, -5]);
    }

    #[test]
    fn p_frame_tag2_3s32_group_advances_three_fields() {
        let mut header = LogHeader::default();
        header.i_fields = FrameFieldList {
            fields: vec![
                field("time", Encoding::UnsignedVb, Predictor::Zero),
                field("gyroADC[0]", Encoding::SignedVb, Predictor::Zero),
                field("gyroADC[1]", Encoding::SignedVb, Predictor::Zero),
                field("gyroADC[2]", Encoding::SignedVb, Predictor::Zero),
            ],
        };
        header.p_fields = FrameFieldList {
            fields: vec![
                field("time", Encoding::SignedVb, Predictor::StraightLine),
                field("gyroADC[0]", Encoding::Tag2_3S32, Predictor::Previous),
                field("gyroADC[1]", Encoding::Tag2_3S32, Predictor::Previous),
                field("gyroADC[2]", Encoding::Tag2_3S32, Predictor::Previous),
            ],
        };
        let parser = FrameParser::new(&header);
        let prev = vec![0, 100, -50, 30];
        // time delta 32 (zigzag 64), then tag2_3s32 selector1 group:
        // lead 0b01_0101 (v0=5), extra 0b1101_1110 (v1=-3,v2=-2)
        let bytes = [64u8, 0b0101_0101, 0b1101_1110];
        let mut r = StreamReader::new(&bytes);
        let out = parser.parse_p_frame(&mut r, &prev, None, &header);
        assert_eq!(out[0], 32); // StraightLine w/o prev2 falls back to +prev
        assert_eq!(out[1], 100 + 5);
        assert_eq!(out[2], -50 + -3);
        assert_eq!(out[3], 30 + -2);
    }

    #[test]
    fn variable_group_tag8_8svb_chunks_by_natural_size() {
        let mut header = LogHeader::default();
        let mut fields = vec![];
        for i in 0..9 {
            fields.push(field(&format!("debug[{i}]"), Encoding::Tag8_8sVb, Predictor::Zero));
        }
        header.i_fields = FrameFieldList { fields };
        let parser = FrameParser::new(&header);
        // First chunk of 8: tag selects index 0 only, value 7 (zigzag 14)
        // Second chunk of 1 (natural-size special case): bare signed vb, value 2 (zigzag 4)
        let bytes = [0b0000_0001u8, 14, 4];
        let mut r = StreamReader::new(&bytes);
        let out = parser.parse_i_frame(&mut r, &header);
        assert_eq!(out[0], 7);
        assert_eq!(out[1..8], [0; 7]);
        assert_eq!(out[8], 2);
    }

    #[test]
    fn s_frame_decodes_tag2_3s32_group_without_predictor() {
        let mut header = LogHeader::default();
        header.s_fields = FrameFieldList {
            fields: vec![
                field("amperageLatest", Encoding::UnsignedVb, Predictor::Zero),
                field("vbatLatest", Encoding::Tag2_3S32, Predictor::Previous),
                field("rssi", Encoding::Tag2_3S32, Predictor::Previous),
                field("flightModeFlags", Encoding::Tag2_3S32, Predictor::Previous),
            ],
        };
        let parser = FrameParser::new(&header);
        // amperageLatest = 7; then selector-0 group: v0=1, v1=-2, v2=-1
        let bytes = [7u8, 0b00_01_10_11];
        let mut r = StreamReader::new(&bytes);
        let out = parser.parse_s_frame(&mut r);
        // S-frame values are stored raw; Previous's "+prev" is never applied.
        assert_eq!(out, vec![7, 1, -2, -1]);
    }
}
