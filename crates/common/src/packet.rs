//! Encoded output packets and their per-frame annotation.

/// NAL priority tiers used by the packet annotation.
///
/// The classifier assigns `HIGHEST` to keyframes and `LOW` to P-frames;
/// everything else keeps the caller-supplied default.
pub mod nal_priority {
    pub const DISPOSABLE: u8 = 0;
    pub const LOW: u8 = 1;
    pub const HIGH: u8 = 2;
    pub const HIGHEST: u8 = 3;
}

/// An encoded video packet produced by the hardware encoder.
///
/// `keyframe` and `priority` start at caller-supplied defaults (typically
/// `false` / [`nal_priority::DISPOSABLE`]) and are filled in per frame by
/// the output classifier from the device-reported output type.
#[derive(Clone, Debug, Default)]
pub struct EncodedPacket {
    /// Annex-B bitstream data.
    pub data: Vec<u8>,
    /// Presentation timestamp in stream ticks.
    pub pts: i64,
    /// Decode timestamp in stream ticks.
    pub dts: i64,
    /// Whether this packet starts a new decodable sequence.
    pub keyframe: bool,
    /// Drop priority, one of the [`nal_priority`] tiers.
    pub priority: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_packet_is_lowest_tier() {
        let pkt = EncodedPacket::default();
        assert!(!pkt.keyframe);
        assert_eq!(pkt.priority, nal_priority::DISPOSABLE);
    }
}
