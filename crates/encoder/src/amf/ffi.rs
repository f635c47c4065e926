//! Native boundary types for the AMF runtime's property store.
//!
//! The AMF runtime exposes every encoder knob as an entry in a property
//! bag addressed by a wide-string key, with values carried in a tagged
//! variant and capabilities described by a per-key descriptor. This module
//! mirrors that surface in safe Rust: result codes, the variant type, the
//! capability descriptor, the [`PropertyStore`] trait the rest of the
//! crate programs against, and the per-codec key tables.
//!
//! Reference: AMD AMF SDK -- `core/Result.h`, `core/Variant.h`,
//! `components/VideoEncoderVCE.h`, `components/VideoEncoderHEVC.h`.

use std::fmt;

use vcn_common::Codec;

// ---------------------------------------------------------------------------
// Result codes
// ---------------------------------------------------------------------------

/// AMF API return type.
pub type AmfResultCode = i32;

/// Success return code.
pub const AMF_OK: AmfResultCode = 0;

/// Generic failure.
pub const AMF_FAIL: AmfResultCode = 1;

/// Error: unexpected internal state.
pub const AMF_UNEXPECTED: AmfResultCode = 2;

/// Error: access denied.
pub const AMF_ACCESS_DENIED: AmfResultCode = 3;

/// Error: invalid argument (includes variant type mismatches).
pub const AMF_INVALID_ARG: AmfResultCode = 4;

/// Error: value outside the device-enforced range.
pub const AMF_OUT_OF_RANGE: AmfResultCode = 5;

/// Error: allocation failed.
pub const AMF_OUT_OF_MEMORY: AmfResultCode = 6;

/// Error: entry point not implemented by the runtime.
pub const AMF_NOT_IMPLEMENTED: AmfResultCode = 9;

/// Error: operation not supported by this device/driver.
pub const AMF_NOT_SUPPORTED: AmfResultCode = 10;

/// Error: property key unknown to the component.
pub const AMF_NOT_FOUND: AmfResultCode = 11;

/// Diagnostic text for a native result code.
pub fn result_text(code: AmfResultCode) -> &'static str {
    match code {
        AMF_OK => "AMF_OK",
        AMF_FAIL => "AMF_FAIL",
        AMF_UNEXPECTED => "AMF_UNEXPECTED",
        AMF_ACCESS_DENIED => "AMF_ACCESS_DENIED",
        AMF_INVALID_ARG => "AMF_INVALID_ARG",
        AMF_OUT_OF_RANGE => "AMF_OUT_OF_RANGE",
        AMF_OUT_OF_MEMORY => "AMF_OUT_OF_MEMORY",
        AMF_NOT_IMPLEMENTED => "AMF_NOT_IMPLEMENTED",
        AMF_NOT_SUPPORTED => "AMF_NOT_SUPPORTED",
        AMF_NOT_FOUND => "AMF_NOT_FOUND",
        _ => "unknown AMF result",
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// Type tag of a [`Variant`], reported by capability descriptors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VariantType {
    Int64,
    Bool,
    Double,
    Size,
    Ratio,
    Rate,
    Blob,
}

/// Native-encoded property value.
///
/// Scalar integers carry enum encodings as well as plain counts; the pair
/// variants mirror the runtime's small structs (`AMFSize`, `AMFRatio`,
/// `AMFRate`). `Blob` carries opaque bitstream headers (extra data).
#[derive(Clone, Debug, PartialEq)]
pub enum Variant {
    Int64(i64),
    Bool(bool),
    Double(f64),
    /// Width, height.
    Size(u32, u32),
    /// Numerator, denominator.
    Ratio(u32, u32),
    /// Numerator, denominator.
    Rate(u32, u32),
    Blob(Vec<u8>),
}

impl Variant {
    pub fn variant_type(&self) -> VariantType {
        match self {
            Self::Int64(_) => VariantType::Int64,
            Self::Bool(_) => VariantType::Bool,
            Self::Double(_) => VariantType::Double,
            Self::Size(_, _) => VariantType::Size,
            Self::Ratio(_, _) => VariantType::Ratio,
            Self::Rate(_, _) => VariantType::Rate,
            Self::Blob(_) => VariantType::Blob,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_size(&self) -> Option<(u32, u32)> {
        match *self {
            Self::Size(w, h) => Some((w, h)),
            _ => None,
        }
    }

    pub fn as_ratio(&self) -> Option<(u32, u32)> {
        match *self {
            Self::Ratio(n, d) => Some((n, d)),
            _ => None,
        }
    }

    pub fn as_rate(&self) -> Option<(u32, u32)> {
        match *self {
            Self::Rate(n, d) => Some((n, d)),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Size(w, h) => write!(f, "{w}x{h}"),
            Self::Ratio(n, d) => write!(f, "{n}:{d}"),
            Self::Rate(n, d) => write!(f, "{n}/{d}"),
            Self::Blob(b) => write!(f, "<blob {} bytes>", b.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// Capability descriptors
// ---------------------------------------------------------------------------

/// One entry of an enumerated property's value list.
///
/// The native list is terminated by an entry with a null name; readers must
/// stop at the first such entry rather than trusting the container length.
#[derive(Clone, Debug)]
pub struct EnumEntry {
    pub name: Option<String>,
    pub value: i64,
}

impl EnumEntry {
    pub fn named(name: &str, value: i64) -> Self {
        Self {
            name: Some(name.to_string()),
            value,
        }
    }

    /// The null-named list terminator.
    pub fn terminator() -> Self {
        Self {
            name: None,
            value: 0,
        }
    }
}

/// Capability descriptor for one property key.
///
/// Ranged properties report `min`/`max`; enumerated properties report
/// their supported native codes in `entries`. Queried on demand and never
/// cached -- the store is the source of truth and may change across
/// driver versions.
#[derive(Clone, Debug)]
pub struct PropertyInfo {
    pub value_type: VariantType,
    pub min: Option<Variant>,
    pub max: Option<Variant>,
    pub entries: Vec<EnumEntry>,
}

impl PropertyInfo {
    /// Supported enumerated values, stopping at the first null-named
    /// terminator entry.
    pub fn enum_values(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries
            .iter()
            .take_while(|e| e.name.is_some())
            .map(|e| e.value)
    }
}

// ---------------------------------------------------------------------------
// Property store
// ---------------------------------------------------------------------------

/// The device-side property bag.
///
/// Implemented by the live AMF component wrapper and by [`StubStore`] for
/// machines without AMD hardware. Values are native-encoded ([`Variant`]);
/// all range and membership validation happens behind this trait -- the
/// accessor layer deliberately performs none of its own.
///
/// The store serializes concurrent access from one encoder instance;
/// callers of the accessor layer must serialize access to the encoder
/// object itself.
///
/// [`StubStore`]: crate::amf::stub::StubStore
pub trait PropertyStore: Send {
    /// Capability descriptor for `key`.
    fn property_info(&self, key: &str) -> Result<PropertyInfo, AmfResultCode>;

    /// Read the current value of `key`.
    fn get(&self, key: &str) -> Result<Variant, AmfResultCode>;

    /// Write `value` to `key`. The store enforces its own bounds and
    /// rejects with a native result code.
    fn set(&mut self, key: &str, value: Variant) -> Result<(), AmfResultCode>;
}

// ---------------------------------------------------------------------------
// Output data type tags
// ---------------------------------------------------------------------------

/// Per-frame output type reported on produced buffers
/// (`OutputDataType` / `HevcOutputDataType`).
pub mod output_data_type {
    pub const IDR: i64 = 0;
    pub const I: i64 = 1;
    pub const P: i64 = 2;
    pub const B: i64 = 3;
}

// ---------------------------------------------------------------------------
// Property key tables
// ---------------------------------------------------------------------------

/// Native property keys for one codec component.
///
/// Fixed at compile time. Keys the component does not expose at all are
/// `None`; their accessors fail uniformly with `NotImplemented` without
/// touching the store.
pub struct KeySet {
    pub usage: &'static str,
    pub quality_preset: &'static str,
    pub frame_size: &'static str,
    pub aspect_ratio: &'static str,
    pub frame_rate: &'static str,
    pub profile: &'static str,
    pub profile_level: &'static str,
    pub tier: Option<&'static str>,
    pub max_reference_frames: &'static str,
    pub coding_type: &'static str,
    pub rate_control_method: &'static str,
    pub pre_pass: &'static str,
    pub vbaq: &'static str,
    pub skip_frame: &'static str,
    pub enforce_hrd: &'static str,
    pub filler_data: &'static str,
    pub min_qp_i: &'static str,
    pub max_qp_i: &'static str,
    pub min_qp_p: &'static str,
    pub max_qp_p: &'static str,
    pub qp_i: &'static str,
    pub qp_p: &'static str,
    pub target_bitrate: &'static str,
    pub peak_bitrate: &'static str,
    pub vbv_buffer_size: &'static str,
    pub vbv_initial_fullness: &'static str,
    pub gop_type: Option<&'static str>,
    pub gop_size: Option<&'static str>,
    pub gop_size_min: Option<&'static str>,
    pub gop_size_max: Option<&'static str>,
    pub idr_period: &'static str,
    pub deblocking_disable: &'static str,
    pub motion_half_pixel: &'static str,
    pub motion_quarter_pixel: &'static str,
    pub input_queue_size: Option<&'static str>,
    pub output_data_type: &'static str,
    pub extra_data: &'static str,
}

/// H.264/AVC component keys (`VideoEncoderVCE.h`).
///
/// The AVC component exposes one QP bound shared by all frame types, so
/// the per-frame-type bound accessors alias `MinQP`/`MaxQP`.
pub static H264_KEYS: KeySet = KeySet {
    usage: "Usage",
    quality_preset: "QualityPreset",
    frame_size: "FrameSize",
    aspect_ratio: "AspectRatio",
    frame_rate: "FrameRate",
    profile: "Profile",
    profile_level: "ProfileLevel",
    tier: None,
    max_reference_frames: "MaxNumRefFrames",
    coding_type: "CabacEnable",
    rate_control_method: "RateControlMethod",
    pre_pass: "RateControlPreanalysisEnable",
    vbaq: "EnableVBAQ",
    skip_frame: "RateControlSkipFrameEnable",
    enforce_hrd: "EnforceHRD",
    filler_data: "FillerDataEnable",
    min_qp_i: "MinQP",
    max_qp_i: "MaxQP",
    min_qp_p: "MinQP",
    max_qp_p: "MaxQP",
    qp_i: "QPI",
    qp_p: "QPP",
    target_bitrate: "TargetBitrate",
    peak_bitrate: "PeakBitrate",
    vbv_buffer_size: "VBVBufferSize",
    vbv_initial_fullness: "InitialVBVBufferFullness",
    gop_type: None,
    gop_size: None,
    gop_size_min: None,
    gop_size_max: None,
    idr_period: "IDRPeriod",
    deblocking_disable: "DeBlockingFilter",
    motion_half_pixel: "HalfPixel",
    motion_quarter_pixel: "QuarterPixel",
    input_queue_size: None,
    output_data_type: "OutputDataType",
    extra_data: "ExtraData",
};

/// H.265/HEVC component keys (`VideoEncoderHEVC.h`).
pub static HEVC_KEYS: KeySet = KeySet {
    usage: "HevcUsage",
    quality_preset: "HevcQualityPreset",
    frame_size: "HevcFrameSize",
    aspect_ratio: "HevcAspectRatio",
    frame_rate: "HevcFrameRate",
    profile: "HevcProfile",
    profile_level: "HevcProfileLevel",
    tier: Some("HevcTier"),
    max_reference_frames: "HevcMaxNumRefFrames",
    coding_type: "CabacEnable",
    rate_control_method: "HevcRateControlMethod",
    pre_pass: "HevcRateControlPreAnalysisEnable",
    vbaq: "HevcEnableVBAQ",
    skip_frame: "HevcRateControlSkipFrameEnable",
    enforce_hrd: "HevcEnforceHRD",
    filler_data: "HevcFillerDataEnable",
    min_qp_i: "HevcMinQP_I",
    max_qp_i: "HevcMaxQP_I",
    min_qp_p: "HevcMinQP_P",
    max_qp_p: "HevcMaxQP_P",
    qp_i: "HevcQP_I",
    qp_p: "HevcQP_P",
    target_bitrate: "HevcTargetBitrate",
    peak_bitrate: "HevcPeakBitrate",
    vbv_buffer_size: "HevcVBVBufferSize",
    vbv_initial_fullness: "HevcInitialVBVBufferFullness",
    gop_type: Some("GOPType"),
    gop_size: Some("HevcGOPSize"),
    gop_size_min: Some("GOPSizeMin"),
    gop_size_max: Some("GOPSizeMax"),
    idr_period: "GOPSPerIDR",
    deblocking_disable: "HevcDeBlockingFilterDisable",
    motion_half_pixel: "HevcHalfPixel",
    motion_quarter_pixel: "HevcQuarterPixel",
    input_queue_size: Some("HevcInputQueueSize"),
    output_data_type: "HevcOutputDataType",
    extra_data: "HevcExtraData",
};

/// Key table for a codec component.
pub fn keys_for(codec: Codec) -> &'static KeySet {
    match codec {
        Codec::H264 => &H264_KEYS,
        Codec::Hevc => &HEVC_KEYS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_text_known_codes() {
        assert_eq!(result_text(AMF_OK), "AMF_OK");
        assert_eq!(result_text(AMF_OUT_OF_RANGE), "AMF_OUT_OF_RANGE");
        assert_eq!(result_text(999), "unknown AMF result");
    }

    #[test]
    fn variant_accessors_reject_wrong_type() {
        assert_eq!(Variant::Int64(5).as_i64(), Some(5));
        assert_eq!(Variant::Bool(true).as_i64(), None);
        assert_eq!(Variant::Size(1920, 1080).as_size(), Some((1920, 1080)));
        assert_eq!(Variant::Rate(30, 1).as_ratio(), None);
    }

    #[test]
    fn variant_display() {
        assert_eq!(Variant::Size(1920, 1080).to_string(), "1920x1080");
        assert_eq!(Variant::Rate(30000, 1001).to_string(), "30000/1001");
        assert_eq!(Variant::Blob(vec![0; 16]).to_string(), "<blob 16 bytes>");
    }

    #[test]
    fn enum_values_stop_at_terminator() {
        let info = PropertyInfo {
            value_type: VariantType::Int64,
            min: None,
            max: None,
            entries: vec![
                EnumEntry::named("A", 0),
                EnumEntry::named("B", 1),
                EnumEntry::terminator(),
                EnumEntry::named("stale", 7),
            ],
        };
        let values: Vec<i64> = info.enum_values().collect();
        assert_eq!(values, vec![0, 1]);
    }

    #[test]
    fn key_tables_differ_per_codec() {
        assert_eq!(keys_for(Codec::H264).usage, "Usage");
        assert_eq!(keys_for(Codec::Hevc).usage, "HevcUsage");
        assert!(keys_for(Codec::H264).tier.is_none());
        assert!(keys_for(Codec::Hevc).tier.is_some());
    }
}
