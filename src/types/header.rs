use super::encoding::{Encoding, Predictor};
use std::collections::HashMap;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDefinition {
    pub name: String,
    pub encoding: Encoding,
    pub predictor: Predictor,
    pub signed: bool,
}

/// Ordered field list for one frame type (I, P, S, G or H). Order is both
/// the wire order and the index used by predictor lookups.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameFieldList {
    pub fields: Vec<FieldDefinition>,
}

impl FrameFieldList {
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogHeader {
    pub firmware_revision: Option<String>,
    pub firmware_date: Option<String>,
    pub board_information: Option<String>,
    pub craft_name: Option<String>,
    pub data_version: i32,

    pub i_fields: FrameFieldList,
    pub p_fields: FrameFieldList,
    pub s_fields: FrameFieldList,
    pub g_fields: FrameFieldList,
    pub h_fields: FrameFieldList,

    pub i_interval: i32,
    pub p_interval: i32,
    pub p_denom: i32,
    pub looptime: i32,
    pub minthrottle: i32,
    pub maxthrottle: i32,
    pub vbatref: i32,
    pub gyro_scale: f64,

    /// Every `H key:value` line not otherwise recognized, kept for
    /// diagnostics and forward-compatibility with new firmware keys.
    pub raw: HashMap<String, String>,
}

impl Default for LogHeader {
    fn default() -> Self {
        LogHeader {
            firmware_revision: None,
            firmware_date: None,
            board_information: None,
            craft_name: None,
            data_version: 2,
            i_fields: FrameFieldList::default(),
            p_fields: FrameFieldList::default(),
            s_fields: FrameFieldList::default(),
            g_fields: FrameFieldList::default(),
            h_fields: FrameFieldList::default(),
            i_interval: 1,
            p_interval: 1,
            p_denom: 1,
            looptime: 0,
            minthrottle: 1000,
            maxthrottle: 2000,
            vbatref: 4095,
            gyro_scale: 1.0,
            raw: HashMap::new(),
        }
    }
}
