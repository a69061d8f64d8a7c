/// Wire encoding for a single field or a field group.
///
/// Integer ids match the tags used on the wire; an id outside this set
/// falls back to `SignedVb` at the call site rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    SignedVb,
    UnsignedVb,
    Neg14Bit,
    Tag8_8sVb,
    Tag2_3S32,
    Tag8_4S16,
    Null,
    Tag2_3SVariable,
}

impl Encoding {
    pub fn from_id(id: i32) -> Self {
        match id {
            0 => Encoding::SignedVb,
            1 => Encoding::UnsignedVb,
            3 => Encoding::Neg14Bit,
            6 => Encoding::Tag8_8sVb,
            7 => Encoding::Tag2_3S32,
            8 => Encoding::Tag8_4S16,
            9 => Encoding::Null,
            10 => Encoding::Tag2_3SVariable,
            _ => Encoding::SignedVb,
        }
    }

    /// Fixed-group encodings always consume exactly three declared fields
    /// per tag, regardless of each field's own declared encoding.
    pub fn is_fixed_group(self) -> bool {
        matches!(self, Encoding::Tag2_3S32 | Encoding::Tag2_3SVariable)
    }

    /// Variable-group encodings pack a run of consecutive fields sharing
    /// this same encoding under one tag byte, chunked by natural size.
    pub fn is_variable_group(self) -> bool {
        matches!(self, Encoding::Tag8_8sVb | Encoding::Tag8_4S16)
    }

    /// Natural chunk size for a variable-group encoding.
    pub fn natural_group_size(self) -> usize {
        match self {
            Encoding::Tag8_8sVb => 8,
            Encoding::Tag8_4S16 => 4,
            _ => 1,
        }
    }
}

/// Delta predictor applied after a raw value is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Predictor {
    Zero,
    Previous,
    StraightLine,
    Average2,
    MinThrottle,
    Motor0,
    Increment,
    HomeCoord,
    ServoCenter,
    VbatRef,
}

impl Predictor {
    pub fn from_id(id: i32) -> Self {
        match id {
            0 => Predictor::Zero,
            1 => Predictor::Previous,
            2 => Predictor::StraightLine,
            3 => Predictor::Average2,
            4 => Predictor::MinThrottle,
            5 => Predictor::Motor0,
            6 => Predictor::Increment,
            7 => Predictor::HomeCoord,
            8 => Predictor::ServoCenter,
            9 => Predictor::VbatRef,
            _ => Predictor::Zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_encoding_id_falls_back_to_signed_vb() {
        assert_eq!(Encoding::from_id(42), Encoding::SignedVb);
    }

    #[test]
    fn group_classification() {
        assert!(Encoding::Tag2_3S32.is_fixed_group());
        assert!(Encoding::Tag2_3SVariable.is_fixed_group());
        assert!(Encoding::Tag8_8sVb.is_variable_group());
        assert!(Encoding::Tag8_4S16.is_variable_group());
        assert!(!Encoding::SignedVb.is_fixed_group());
        assert!(!Encoding::SignedVb.is_variable_group());
    }

    #[test]
    fn natural_group_sizes() {
        assert_eq!(Encoding::Tag8_8sVb.natural_group_size(), 8);
        assert_eq!(Encoding::Tag8_4S16.natural_group_size(), 4);
    }
}
