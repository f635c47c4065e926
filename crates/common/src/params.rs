//! Abstract encoder parameter enums.
//!
//! These are the codec-neutral configuration values callers work with.
//! Each maps to exactly one native property in the driver's property
//! store; the mapping (and the vendor's numeric encoding of each variant)
//! lives in `vcn-encoder` and is fixed at compile time.
//!
//! `display_name()` is for diagnostics only and carries no behavioral
//! contract.

use serde::{Deserialize, Serialize};

/// Encoder usage preset -- selects the driver's internal parameter
/// defaults for a workload class.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Usage {
    Transcoding,
    UltraLowLatency,
    LowLatency,
    Webcam,
}

impl Usage {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Transcoding => "Transcoding",
            Self::UltraLowLatency => "Ultra Low Latency",
            Self::LowLatency => "Low Latency",
            Self::Webcam => "Webcam",
        }
    }
}

/// Speed/quality trade-off of the hardware encode.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityPreset {
    Speed,
    Balanced,
    Quality,
}

impl QualityPreset {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Speed => "Speed",
            Self::Balanced => "Balanced",
            Self::Quality => "Quality",
        }
    }
}

/// Bitstream profile.
///
/// The H.264 component accepts the full set; HEVC encodes only `Main`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    ConstrainedBaseline,
    Baseline,
    Main,
    ConstrainedHigh,
    High,
}

impl Profile {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::ConstrainedBaseline => "Constrained Baseline",
            Self::Baseline => "Baseline",
            Self::Main => "Main",
            Self::ConstrainedHigh => "Constrained High",
            Self::High => "High",
        }
    }
}

/// Bitstream level, encoded as level number x10 (`L41` = 4.1).
///
/// `Automatic` is a sentinel with no native encoding: the encoder resolves
/// it to a concrete level from the current resolution and frame rate
/// before it ever reaches the device.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i64)]
pub enum ProfileLevel {
    Automatic = 0,
    L10 = 10,
    L11 = 11,
    L12 = 12,
    L13 = 13,
    L20 = 20,
    L21 = 21,
    L22 = 22,
    L30 = 30,
    L31 = 31,
    L32 = 32,
    L40 = 40,
    L41 = 41,
    L42 = 42,
    L50 = 50,
    L51 = 51,
    L52 = 52,
    L60 = 60,
    L61 = 61,
    L62 = 62,
}

impl ProfileLevel {
    /// Level number x10 (`L51` -> 51). `Automatic` is 0.
    pub fn as_number(self) -> i64 {
        self as i64
    }
}

/// Decoder conformance tier (HEVC only).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Main,
    High,
}

impl Tier {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Main => "Main",
            Self::High => "High",
        }
    }
}

/// Rate control method executed inside the device.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RateControlMethod {
    ConstantQp,
    ConstantBitrate,
    PeakConstrainedVariableBitrate,
    LatencyConstrainedVariableBitrate,
}

impl RateControlMethod {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::ConstantQp => "Constant QP",
            Self::ConstantBitrate => "Constant Bitrate",
            Self::PeakConstrainedVariableBitrate => "Peak Constrained Variable Bitrate",
            Self::LatencyConstrainedVariableBitrate => "Latency Constrained Variable Bitrate",
        }
    }
}

/// Rate-control pre-analysis pass.
///
/// The HEVC component backs this with a plain boolean property.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrePassMode {
    Disabled,
    Enabled,
}

impl PrePassMode {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Disabled => "Disabled",
            Self::Enabled => "Enabled",
        }
    }
}

/// Entropy coding selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodingType {
    /// Let the driver pick.
    Automatic,
    Cabac,
    Cavlc,
}

impl CodingType {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Automatic => "Automatic",
            Self::Cabac => "CABAC",
            Self::Cavlc => "CAVLC",
        }
    }
}

/// GOP structure mode (HEVC component).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GopType {
    Fixed,
    Variable,
}

impl GopType {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Fixed => "Fixed",
            Self::Variable => "Variable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_numbers() {
        assert_eq!(ProfileLevel::Automatic.as_number(), 0);
        assert_eq!(ProfileLevel::L41.as_number(), 41);
        assert_eq!(ProfileLevel::L62.as_number(), 62);
    }

    #[test]
    fn level_ordering() {
        assert!(ProfileLevel::L30 < ProfileLevel::L31);
        assert!(ProfileLevel::L51 < ProfileLevel::L62);
        assert!(ProfileLevel::Automatic < ProfileLevel::L10);
    }

    #[test]
    fn display_names() {
        assert_eq!(Usage::UltraLowLatency.display_name(), "Ultra Low Latency");
        assert_eq!(
            RateControlMethod::PeakConstrainedVariableBitrate.display_name(),
            "Peak Constrained Variable Bitrate"
        );
        assert_eq!(CodingType::Cabac.display_name(), "CABAC");
    }
}
