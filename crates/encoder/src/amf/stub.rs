//! In-memory property store standing in for the AMF runtime.
//!
//! `StubStore` implements [`PropertyStore`] over a hash map seeded with
//! the property set, capability descriptors, and defaults a VCN device
//! reports for the given codec component. It enforces the same contract
//! the real store does -- unknown keys, type mismatches, range violations,
//! and enum membership are rejected with native result codes -- so the
//! accessor layer above it can be exercised end-to-end on machines
//! without AMD hardware.

use std::collections::HashMap;

use vcn_common::Codec;

use crate::amf::ffi::{
    keys_for, AmfResultCode, EnumEntry, PropertyInfo, PropertyStore, Variant, VariantType,
    AMF_INVALID_ARG, AMF_NOT_FOUND, AMF_OUT_OF_RANGE,
};

/// Hash-map backed [`PropertyStore`] with device-style validation.
#[derive(Debug, Default)]
pub struct StubStore {
    props: HashMap<String, Variant>,
    infos: HashMap<String, PropertyInfo>,
}

impl StubStore {
    /// A store seeded with the property set of one codec component.
    pub fn new(codec: Codec) -> Self {
        let mut store = Self::empty();
        store.seed(codec);
        store
    }

    /// A store with no properties declared. Useful for modelling produced
    /// output buffers, which carry only a handful of per-frame keys.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Inject a value directly, bypassing declaration and validation.
    ///
    /// Test backdoor for modelling driver-side state this layer cannot
    /// write (output-type tags, unmapped enum values).
    pub fn set_raw(&mut self, key: &str, value: Variant) {
        self.props.insert(key.to_string(), value);
    }

    fn declare(&mut self, key: &str, info: PropertyInfo, default: Variant) {
        self.infos.insert(key.to_string(), info);
        self.props.insert(key.to_string(), default);
    }

    fn declare_range(&mut self, key: &str, min: i64, max: i64, default: i64) {
        self.declare(
            key,
            PropertyInfo {
                value_type: VariantType::Int64,
                min: Some(Variant::Int64(min)),
                max: Some(Variant::Int64(max)),
                entries: Vec::new(),
            },
            Variant::Int64(default),
        );
    }

    fn declare_bool(&mut self, key: &str, default: bool) {
        self.declare(
            key,
            PropertyInfo {
                value_type: VariantType::Bool,
                min: None,
                max: None,
                entries: Vec::new(),
            },
            Variant::Bool(default),
        );
    }

    /// Declare an enumerated property. The descriptor gets the native
    /// null-named terminator appended, as the runtime's lists do.
    fn declare_enum(&mut self, key: &str, entries: &[(&str, i64)], default: i64) {
        let mut list: Vec<EnumEntry> = entries
            .iter()
            .map(|(name, value)| EnumEntry::named(name, *value))
            .collect();
        list.push(EnumEntry::terminator());
        self.declare(
            key,
            PropertyInfo {
                value_type: VariantType::Int64,
                min: None,
                max: None,
                entries: list,
            },
            Variant::Int64(default),
        );
    }

    fn seed(&mut self, codec: Codec) {
        let k = keys_for(codec);

        self.declare_enum(
            k.usage,
            &[
                ("Transcoding", 0),
                ("UltraLowLatency", 1),
                ("LowLatency", 2),
                ("Webcam", 3),
            ],
            0,
        );

        match codec {
            Codec::H264 => {
                self.declare_enum(
                    k.quality_preset,
                    &[("Balanced", 0), ("Speed", 1), ("Quality", 2)],
                    0,
                );
                self.declare_enum(
                    k.profile,
                    &[
                        ("Baseline", 66),
                        ("Main", 77),
                        ("High", 100),
                        ("ConstrainedBaseline", 256),
                        ("ConstrainedHigh", 257),
                    ],
                    77,
                );
                self.declare_enum(
                    k.profile_level,
                    &[
                        ("1.0", 10),
                        ("1.1", 11),
                        ("1.2", 12),
                        ("1.3", 13),
                        ("2.0", 20),
                        ("2.1", 21),
                        ("2.2", 22),
                        ("3.0", 30),
                        ("3.1", 31),
                        ("3.2", 32),
                        ("4.0", 40),
                        ("4.1", 41),
                        ("4.2", 42),
                        ("5.0", 50),
                        ("5.1", 51),
                        ("5.2", 52),
                    ],
                    41,
                );
                self.declare_enum(
                    k.rate_control_method,
                    &[
                        ("ConstantQP", 0),
                        ("CBR", 1),
                        ("PeakConstrainedVBR", 2),
                        ("LatencyConstrainedVBR", 3),
                    ],
                    1,
                );
            }
            Codec::Hevc => {
                self.declare_enum(
                    k.quality_preset,
                    &[("Quality", 0), ("Balanced", 5), ("Speed", 10)],
                    5,
                );
                self.declare_enum(k.profile, &[("Main", 1)], 1);
                // Level numbers scaled by three on the wire.
                self.declare_enum(
                    k.profile_level,
                    &[
                        ("1.0", 30),
                        ("2.0", 60),
                        ("2.1", 63),
                        ("3.0", 90),
                        ("3.1", 93),
                        ("4.0", 120),
                        ("4.1", 123),
                        ("5.0", 150),
                        ("5.1", 153),
                        ("5.2", 156),
                        ("6.0", 180),
                        ("6.1", 183),
                        ("6.2", 186),
                    ],
                    123,
                );
                self.declare_enum(
                    k.rate_control_method,
                    &[
                        ("ConstantQP", 0),
                        ("LatencyConstrainedVBR", 1),
                        ("PeakConstrainedVBR", 2),
                        ("CBR", 3),
                    ],
                    3,
                );
            }
        }

        self.declare(
            k.frame_size,
            PropertyInfo {
                value_type: VariantType::Size,
                min: Some(Variant::Size(64, 64)),
                max: Some(Variant::Size(7680, 4320)),
                entries: Vec::new(),
            },
            Variant::Size(1280, 720),
        );
        self.declare(
            k.frame_rate,
            PropertyInfo {
                value_type: VariantType::Rate,
                min: None,
                max: None,
                entries: Vec::new(),
            },
            Variant::Rate(60, 1),
        );
        self.declare(
            k.aspect_ratio,
            PropertyInfo {
                value_type: VariantType::Ratio,
                min: None,
                max: None,
                entries: Vec::new(),
            },
            Variant::Ratio(1, 1),
        );

        if let Some(tier) = k.tier {
            self.declare_enum(tier, &[("Main", 0), ("High", 1)], 0);
        }
        self.declare_range(k.max_reference_frames, 1, 16, 4);
        self.declare_enum(
            k.coding_type,
            &[("Undefined", 0), ("CABAC", 1), ("CAVLC", 2)],
            0,
        );

        self.declare_bool(k.pre_pass, false);
        self.declare_bool(k.vbaq, false);
        self.declare_bool(k.skip_frame, false);
        self.declare_bool(k.enforce_hrd, false);
        self.declare_bool(k.filler_data, false);

        self.declare_range(k.min_qp_i, 0, 51, 0);
        self.declare_range(k.max_qp_i, 0, 51, 51);
        self.declare_range(k.min_qp_p, 0, 51, 0);
        self.declare_range(k.max_qp_p, 0, 51, 51);
        self.declare_range(k.qp_i, 0, 51, 22);
        self.declare_range(k.qp_p, 0, 51, 22);

        self.declare_range(k.target_bitrate, 10_000, 100_000_000, 20_000_000);
        self.declare_range(k.peak_bitrate, 10_000, 100_000_000, 30_000_000);
        self.declare_range(k.vbv_buffer_size, 1_000, 100_000_000, 20_000_000);
        self.declare_range(k.vbv_initial_fullness, 0, 64, 64);

        if let Some(gop_type) = k.gop_type {
            self.declare_enum(gop_type, &[("Fixed", 0), ("Variable", 1)], 0);
        }
        if let Some(gop_size) = k.gop_size {
            self.declare_range(gop_size, 0, 1_000, 60);
        }
        if let Some(gop_size_min) = k.gop_size_min {
            self.declare_range(gop_size_min, 0, 1_000, 0);
        }
        if let Some(gop_size_max) = k.gop_size_max {
            self.declare_range(gop_size_max, 0, 1_000, 16);
        }
        self.declare_range(k.idr_period, 0, 1_000, 30);

        self.declare_bool(k.deblocking_disable, false);
        self.declare_bool(k.motion_half_pixel, true);
        self.declare_bool(k.motion_quarter_pixel, true);

        if let Some(input_queue_size) = k.input_queue_size {
            self.declare_range(input_queue_size, 1, 32, 16);
        }

        self.declare(
            k.extra_data,
            PropertyInfo {
                value_type: VariantType::Blob,
                min: None,
                max: None,
                entries: Vec::new(),
            },
            // Annex-B start code + NAL header stand-in.
            Variant::Blob(vec![0x00, 0x00, 0x00, 0x01, 0x40, 0x01, 0x0c, 0x01]),
        );
    }
}

impl PropertyStore for StubStore {
    fn property_info(&self, key: &str) -> Result<PropertyInfo, AmfResultCode> {
        self.infos.get(key).cloned().ok_or(AMF_NOT_FOUND)
    }

    fn get(&self, key: &str) -> Result<Variant, AmfResultCode> {
        self.props.get(key).cloned().ok_or(AMF_NOT_FOUND)
    }

    fn set(&mut self, key: &str, value: Variant) -> Result<(), AmfResultCode> {
        let info = self.infos.get(key).ok_or(AMF_NOT_FOUND)?;
        if value.variant_type() != info.value_type {
            return Err(AMF_INVALID_ARG);
        }
        match value {
            Variant::Int64(v) => {
                if let Some(min) = info.min.as_ref().and_then(Variant::as_i64) {
                    if v < min {
                        return Err(AMF_OUT_OF_RANGE);
                    }
                }
                if let Some(max) = info.max.as_ref().and_then(Variant::as_i64) {
                    if v > max {
                        return Err(AMF_OUT_OF_RANGE);
                    }
                }
                let mut supported = info.enum_values();
                if info.entries.first().is_some_and(|e| e.name.is_some())
                    && !supported.any(|s| s == v)
                {
                    return Err(AMF_OUT_OF_RANGE);
                }
            }
            Variant::Size(w, h) => {
                if let Some((min_w, min_h)) = info.min.as_ref().and_then(Variant::as_size) {
                    if w < min_w || h < min_h {
                        return Err(AMF_OUT_OF_RANGE);
                    }
                }
                if let Some((max_w, max_h)) = info.max.as_ref().and_then(Variant::as_size) {
                    if w > max_w || h > max_h {
                        return Err(AMF_OUT_OF_RANGE);
                    }
                }
            }
            _ => {}
        }
        self.props.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_not_found() {
        let mut store = StubStore::new(Codec::Hevc);
        assert_eq!(store.get("NoSuchKey"), Err(AMF_NOT_FOUND));
        assert_eq!(
            store.set("NoSuchKey", Variant::Int64(1)),
            Err(AMF_NOT_FOUND)
        );
        assert!(store.property_info("NoSuchKey").is_err());
    }

    #[test]
    fn type_mismatch_rejected() {
        let mut store = StubStore::new(Codec::Hevc);
        assert_eq!(
            store.set("HevcTargetBitrate", Variant::Bool(true)),
            Err(AMF_INVALID_ARG)
        );
    }

    #[test]
    fn range_violation_rejected() {
        let mut store = StubStore::new(Codec::Hevc);
        assert_eq!(
            store.set("HevcQP_I", Variant::Int64(52)),
            Err(AMF_OUT_OF_RANGE)
        );
        assert!(store.set("HevcQP_I", Variant::Int64(51)).is_ok());
    }

    #[test]
    fn enum_membership_enforced() {
        let mut store = StubStore::new(Codec::Hevc);
        // 7 is not a declared quality preset on the HEVC component.
        assert_eq!(
            store.set("HevcQualityPreset", Variant::Int64(7)),
            Err(AMF_OUT_OF_RANGE)
        );
        assert!(store.set("HevcQualityPreset", Variant::Int64(10)).is_ok());
    }

    #[test]
    fn size_bounds_enforced() {
        let mut store = StubStore::new(Codec::Hevc);
        assert_eq!(
            store.set("HevcFrameSize", Variant::Size(16, 16)),
            Err(AMF_OUT_OF_RANGE)
        );
        assert!(store
            .set("HevcFrameSize", Variant::Size(1920, 1080))
            .is_ok());
    }

    #[test]
    fn descriptor_lists_end_with_terminator() {
        let store = StubStore::new(Codec::Hevc);
        let info = store.property_info("HevcUsage").unwrap();
        assert!(info.entries.last().is_some_and(|e| e.name.is_none()));
        assert_eq!(info.enum_values().count(), 4);
    }

    #[test]
    fn h264_component_has_no_tier_key() {
        let store = StubStore::new(Codec::H264);
        assert!(store.property_info("HevcTier").is_err());
        assert!(store.property_info("Usage").is_ok());
    }
}
