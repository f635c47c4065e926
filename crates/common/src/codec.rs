//! Codec identifiers for the VCN encode block.

use serde::{Deserialize, Serialize};

/// Video codec selecting the AMF encoder component and its property set.
///
/// The VCN hardware exposes one encoder component per codec; every native
/// property key and enum encoding is codec-specific, so the codec identity
/// threads through the key tables and translators rather than being baked
/// into parallel per-codec copies of them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Codec {
    H264,
    Hevc,
}

impl Codec {
    /// Human-readable codec name (for display/logging).
    pub fn display_name(self) -> &'static str {
        match self {
            Self::H264 => "H.264/AVC",
            Self::Hevc => "H.265/HEVC",
        }
    }
}
