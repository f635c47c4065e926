//! Typed parameter access and derived-value computation over an AMF
//! encoder component.
//!
//! [`Encoder`] wraps the component's [`PropertyStore`] and exposes one
//! getter/setter/(optional) capability-query triple per abstract
//! parameter. Every call is a single synchronous round trip; range and
//! membership validation is delegated entirely to the store, and every
//! rejection surfaces immediately as a typed [`PropertyError`] carrying
//! the field name and the native diagnostic.
//!
//! The only state this layer holds is a small cache of the last-known
//! resolution and frame rate. Later derived computations (automatic
//! profile level, VBV strictness) need both without another device round
//! trip, so the cache is refreshed -- via the explicit `refresh_*` helpers
//! -- by every accessor call that touches the corresponding native
//! property, on the get path as well as the set path.
//!
//! Not thread-safe by design: the store serializes device access, but the
//! cache is plain instance state with last-writer-wins semantics. Callers
//! sharing one `Encoder` across threads must serialize access themselves.

use std::fmt;

use tracing::{debug, info, warn};

use vcn_common::{
    nal_priority, Codec, CodingType, ColorFormat, EncodedPacket, GopType, PrePassMode, Profile,
    ProfileLevel, QualityPreset, Rational, RateControlMethod, Resolution, Tier, Usage,
};

use crate::amf::ffi::{
    keys_for, output_data_type, KeySet, PropertyInfo, PropertyStore, Variant, VariantType,
    AMF_INVALID_ARG,
};
use crate::amf::translate;
use crate::error::{PropertyError, Result};

/// Property translation/accessor layer over one AMF encoder component.
pub struct Encoder {
    store: Box<dyn PropertyStore>,
    codec: Codec,
    keys: &'static KeySet,
    color_format: ColorFormat,
    /// Last-known picture geometry, kept in step with the native
    /// frame-size property.
    resolution: Resolution,
    /// Last-known frame rate, kept in step with the native frame-rate
    /// property.
    frame_rate: Rational,
    /// Frame period in seconds, recomputed whenever `frame_rate` is.
    frame_period: f64,
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("codec", &self.codec)
            .field("color_format", &self.color_format)
            .field("resolution", &self.resolution)
            .field("frame_rate", &self.frame_rate)
            .finish()
    }
}

impl Encoder {
    /// Wrap an encoder component's property store.
    ///
    /// The store (and the device session behind it) is created and torn
    /// down by the owner; this layer only borrows its lifetime. The cache
    /// starts at 1080p30 until the first resolution/frame-rate accessor
    /// call replaces it.
    pub fn new(store: Box<dyn PropertyStore>, codec: Codec, color_format: ColorFormat) -> Self {
        info!(
            codec = codec.display_name(),
            color_format = ?color_format,
            "encoder property layer attached"
        );
        Self {
            store,
            codec,
            keys: keys_for(codec),
            color_format,
            resolution: Resolution::HD,
            frame_rate: Rational::FPS_30,
            frame_period: Rational::FPS_30.period_secs(),
        }
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn color_format(&self) -> ColorFormat {
        self.color_format
    }

    /// Last-known resolution (updated by every frame-size accessor call).
    pub fn cached_resolution(&self) -> Resolution {
        self.resolution
    }

    /// Last-known frame rate (updated by every frame-rate accessor call).
    pub fn cached_frame_rate(&self) -> Rational {
        self.frame_rate
    }

    // -----------------------------------------------------------------------
    // Cache refresh
    // -----------------------------------------------------------------------

    /// Explicit cache refresh, invoked by every successful get or set that
    /// touches the native frame-size property.
    fn refresh_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    /// Explicit cache refresh, invoked by every successful get or set that
    /// touches the native frame-rate property.
    fn refresh_frame_rate(&mut self, frame_rate: Rational) {
        self.frame_rate = frame_rate;
        self.frame_period = frame_rate.period_secs();
    }

    // -----------------------------------------------------------------------
    // Store round-trip helpers
    // -----------------------------------------------------------------------

    fn property_info(&self, field: &'static str, key: &'static str) -> Result<PropertyInfo> {
        self.store
            .property_info(key)
            .map_err(|code| PropertyError::QueryFailed { field, code })
    }

    fn get_raw(&self, field: &'static str, key: &'static str) -> Result<Variant> {
        self.store
            .get(key)
            .map_err(|code| PropertyError::GetFailed { field, code })
    }

    fn get_i64(&self, field: &'static str, key: &'static str) -> Result<i64> {
        self.get_raw(field, key)?
            .as_i64()
            .ok_or(PropertyError::GetFailed {
                field,
                code: AMF_INVALID_ARG,
            })
    }

    fn get_bool(&self, field: &'static str, key: &'static str) -> Result<bool> {
        self.get_raw(field, key)?
            .as_bool()
            .ok_or(PropertyError::GetFailed {
                field,
                code: AMF_INVALID_ARG,
            })
    }

    fn set_property(
        &mut self,
        field: &'static str,
        key: &'static str,
        value: Variant,
        shown: impl fmt::Display,
    ) -> Result<()> {
        match self.store.set(key, value) {
            Ok(()) => {
                debug!(field, value = %shown, "property set");
                Ok(())
            }
            Err(code) => Err(PropertyError::SetFailed {
                field,
                value: shown.to_string(),
                code,
            }),
        }
    }

    /// Device-reported `{min, max}` for a ranged integer property.
    fn caps_range(&self, field: &'static str, key: &'static str) -> Result<(i64, i64)> {
        let info = self.property_info(field, key)?;
        let bound = |v: &Option<Variant>| {
            v.as_ref()
                .and_then(Variant::as_i64)
                .ok_or(PropertyError::QueryFailed {
                    field,
                    code: AMF_INVALID_ARG,
                })
        };
        Ok((bound(&info.min)?, bound(&info.max)?))
    }

    fn require_key(field: &'static str, key: Option<&'static str>) -> Result<&'static str> {
        key.ok_or(PropertyError::NotImplemented { field })
    }

    // -----------------------------------------------------------------------
    // Initialization properties
    // -----------------------------------------------------------------------

    pub fn caps_usage(&self) -> Result<Vec<Usage>> {
        let info = self.property_info("usage", self.keys.usage)?;
        info.enum_values().map(translate::usage_from_native).collect()
    }

    pub fn set_usage(&mut self, v: Usage) -> Result<()> {
        let native = translate::usage_to_native(v);
        self.set_property("usage", self.keys.usage, Variant::Int64(native), v.display_name())
    }

    pub fn usage(&self) -> Result<Usage> {
        translate::usage_from_native(self.get_i64("usage", self.keys.usage)?)
    }

    pub fn caps_quality_preset(&self) -> Result<Vec<QualityPreset>> {
        let info = self.property_info("quality_preset", self.keys.quality_preset)?;
        info.enum_values()
            .map(|raw| translate::quality_preset_from_native(self.codec, raw))
            .collect()
    }

    pub fn set_quality_preset(&mut self, v: QualityPreset) -> Result<()> {
        let native = translate::quality_preset_to_native(self.codec, v);
        self.set_property(
            "quality_preset",
            self.keys.quality_preset,
            Variant::Int64(native),
            v.display_name(),
        )
    }

    pub fn quality_preset(&self) -> Result<QualityPreset> {
        let raw = self.get_i64("quality_preset", self.keys.quality_preset)?;
        translate::quality_preset_from_native(self.codec, raw)
    }

    // -----------------------------------------------------------------------
    // Frame geometry and timing
    // -----------------------------------------------------------------------

    /// Device limits as `((min_width, max_width), (min_height, max_height))`.
    pub fn caps_resolution(&self) -> Result<((u32, u32), (u32, u32))> {
        let info = self.property_info("resolution", self.keys.frame_size)?;
        let bound = |v: &Option<Variant>| {
            v.as_ref()
                .and_then(Variant::as_size)
                .ok_or(PropertyError::QueryFailed {
                    field: "resolution",
                    code: AMF_INVALID_ARG,
                })
        };
        let (min_w, min_h) = bound(&info.min)?;
        let (max_w, max_h) = bound(&info.max)?;
        Ok(((min_w, max_w), (min_h, max_h)))
    }

    pub fn set_resolution(&mut self, v: Resolution) -> Result<()> {
        self.set_property(
            "resolution",
            self.keys.frame_size,
            Variant::Size(v.width, v.height),
            v,
        )?;
        self.refresh_resolution(v);
        Ok(())
    }

    pub fn resolution(&mut self) -> Result<Resolution> {
        let (width, height) = self
            .get_raw("resolution", self.keys.frame_size)?
            .as_size()
            .ok_or(PropertyError::GetFailed {
                field: "resolution",
                code: AMF_INVALID_ARG,
            })?;
        let v = Resolution::new(width, height);
        self.refresh_resolution(v);
        Ok(v)
    }

    /// The device reports no capability descriptor for the aspect ratio.
    pub fn caps_aspect_ratio(&self) -> Result<(Rational, Rational)> {
        Err(PropertyError::NoCapability {
            field: "aspect_ratio",
        })
    }

    pub fn set_aspect_ratio(&mut self, v: Rational) -> Result<()> {
        self.set_property(
            "aspect_ratio",
            self.keys.aspect_ratio,
            Variant::Ratio(v.num, v.den),
            v,
        )
    }

    pub fn aspect_ratio(&self) -> Result<Rational> {
        let (num, den) = self
            .get_raw("aspect_ratio", self.keys.aspect_ratio)?
            .as_ratio()
            .ok_or(PropertyError::GetFailed {
                field: "aspect_ratio",
                code: AMF_INVALID_ARG,
            })?;
        if den == 0 {
            return Err(PropertyError::GetFailed {
                field: "aspect_ratio",
                code: AMF_INVALID_ARG,
            });
        }
        Ok(Rational::new(num, den))
    }

    /// The device reports no capability descriptor for the frame rate.
    pub fn caps_frame_rate(&self) -> Result<(Rational, Rational)> {
        Err(PropertyError::NoCapability { field: "frame_rate" })
    }

    pub fn set_frame_rate(&mut self, v: Rational) -> Result<()> {
        self.set_property(
            "frame_rate",
            self.keys.frame_rate,
            Variant::Rate(v.num, v.den),
            v,
        )?;
        self.refresh_frame_rate(v);
        Ok(())
    }

    pub fn frame_rate(&mut self) -> Result<Rational> {
        let (num, den) = self
            .get_raw("frame_rate", self.keys.frame_rate)?
            .as_rate()
            .ok_or(PropertyError::GetFailed {
                field: "frame_rate",
                code: AMF_INVALID_ARG,
            })?;
        if den == 0 {
            return Err(PropertyError::GetFailed {
                field: "frame_rate",
                code: AMF_INVALID_ARG,
            });
        }
        let v = Rational::new(num, den);
        self.refresh_frame_rate(v);
        Ok(v)
    }

    // -----------------------------------------------------------------------
    // Profile, level, tier
    // -----------------------------------------------------------------------

    pub fn caps_profile(&self) -> Result<Vec<Profile>> {
        let info = self.property_info("profile", self.keys.profile)?;
        info.enum_values()
            .map(|raw| translate::profile_from_native(self.codec, raw))
            .collect()
    }

    pub fn set_profile(&mut self, v: Profile) -> Result<()> {
        let native = translate::profile_to_native(self.codec, v);
        self.set_property("profile", self.keys.profile, Variant::Int64(native), v.display_name())
    }

    pub fn profile(&self) -> Result<Profile> {
        translate::profile_from_native(self.codec, self.get_i64("profile", self.keys.profile)?)
    }

    pub fn caps_profile_level(&self) -> Result<Vec<ProfileLevel>> {
        let info = self.property_info("profile_level", self.keys.profile_level)?;
        info.enum_values()
            .map(|raw| translate::profile_level_from_native(self.codec, raw))
            .collect()
    }

    /// Set the bitstream level.
    ///
    /// [`ProfileLevel::Automatic`] is resolved against the standard level
    /// table using the cached resolution and frame rate before
    /// translation; profile-level selection therefore depends on those
    /// already being set.
    pub fn set_profile_level(&mut self, v: ProfileLevel) -> Result<()> {
        let level = if v == ProfileLevel::Automatic {
            let resolved = translate::automatic_level(self.codec, self.resolution, self.frame_rate);
            debug!(
                resolution = %self.resolution,
                frame_rate = %self.frame_rate,
                level = resolved.as_number(),
                "resolved automatic profile level"
            );
            resolved
        } else {
            v
        };
        let native = translate::profile_level_to_native(self.codec, level);
        self.set_property(
            "profile_level",
            self.keys.profile_level,
            Variant::Int64(native),
            level.as_number(),
        )
    }

    pub fn profile_level(&self) -> Result<ProfileLevel> {
        let raw = self.get_i64("profile_level", self.keys.profile_level)?;
        translate::profile_level_from_native(self.codec, raw)
    }

    pub fn caps_tier(&self) -> Result<Vec<Tier>> {
        let key = Self::require_key("tier", self.keys.tier)?;
        let info = self.property_info("tier", key)?;
        info.enum_values().map(translate::tier_from_native).collect()
    }

    pub fn set_tier(&mut self, v: Tier) -> Result<()> {
        let key = Self::require_key("tier", self.keys.tier)?;
        self.set_property("tier", key, Variant::Int64(translate::tier_to_native(v)), v.display_name())
    }

    pub fn tier(&self) -> Result<Tier> {
        let key = Self::require_key("tier", self.keys.tier)?;
        translate::tier_from_native(self.get_i64("tier", key)?)
    }

    // -----------------------------------------------------------------------
    // Reference frames and entropy coding
    // -----------------------------------------------------------------------

    pub fn caps_max_reference_frames(&self) -> Result<(u64, u64)> {
        let (min, max) = self.caps_range("max_reference_frames", self.keys.max_reference_frames)?;
        Ok((min as u64, max as u64))
    }

    pub fn set_max_reference_frames(&mut self, v: u64) -> Result<()> {
        self.set_property(
            "max_reference_frames",
            self.keys.max_reference_frames,
            Variant::Int64(v as i64),
            v,
        )
    }

    pub fn max_reference_frames(&self) -> Result<u64> {
        Ok(self.get_i64("max_reference_frames", self.keys.max_reference_frames)? as u64)
    }

    pub fn caps_coding_type(&self) -> Result<Vec<CodingType>> {
        let info = self.property_info("coding_type", self.keys.coding_type)?;
        info.enum_values()
            .map(translate::coding_type_from_native)
            .collect()
    }

    pub fn set_coding_type(&mut self, v: CodingType) -> Result<()> {
        let native = translate::coding_type_to_native(v);
        self.set_property(
            "coding_type",
            self.keys.coding_type,
            Variant::Int64(native),
            v.display_name(),
        )
    }

    pub fn coding_type(&self) -> Result<CodingType> {
        translate::coding_type_from_native(self.get_i64("coding_type", self.keys.coding_type)?)
    }

    // No backing native property in this codec profile.

    pub fn caps_max_long_term_reference_frames(&self) -> Result<(u32, u32)> {
        Err(PropertyError::NotImplemented {
            field: "max_long_term_reference_frames",
        })
    }

    pub fn set_max_long_term_reference_frames(&mut self, _v: u32) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "max_long_term_reference_frames",
        })
    }

    pub fn max_long_term_reference_frames(&self) -> Result<u32> {
        Err(PropertyError::NotImplemented {
            field: "max_long_term_reference_frames",
        })
    }

    // -----------------------------------------------------------------------
    // Rate control
    // -----------------------------------------------------------------------

    pub fn caps_rate_control_method(&self) -> Result<Vec<RateControlMethod>> {
        let info = self.property_info("rate_control_method", self.keys.rate_control_method)?;
        info.enum_values()
            .map(|raw| translate::rate_control_from_native(self.codec, raw))
            .collect()
    }

    pub fn set_rate_control_method(&mut self, v: RateControlMethod) -> Result<()> {
        let native = translate::rate_control_to_native(self.codec, v);
        self.set_property(
            "rate_control_method",
            self.keys.rate_control_method,
            Variant::Int64(native),
            v.display_name(),
        )
    }

    pub fn rate_control_method(&self) -> Result<RateControlMethod> {
        let raw = self.get_i64("rate_control_method", self.keys.rate_control_method)?;
        translate::rate_control_from_native(self.codec, raw)
    }

    /// The pre-pass property is a plain boolean on this component; a
    /// bool-typed descriptor maps to the two-mode list. An enumerated
    /// descriptor would mean a newer driver grew modes this layer does not
    /// know -- those entries are logged and skipped rather than guessed at.
    pub fn caps_pre_pass_mode(&self) -> Result<Vec<PrePassMode>> {
        let info = self.property_info("pre_pass_mode", self.keys.pre_pass)?;
        if info.value_type == VariantType::Bool {
            return Ok(vec![PrePassMode::Disabled, PrePassMode::Enabled]);
        }
        for entry in info.entries.iter().take_while(|e| e.name.is_some()) {
            warn!(
                name = entry.name.as_deref().unwrap_or(""),
                value = entry.value,
                "unknown pre-pass mode entry"
            );
        }
        Ok(Vec::new())
    }

    pub fn set_pre_pass_mode(&mut self, v: PrePassMode) -> Result<()> {
        self.set_property(
            "pre_pass_mode",
            self.keys.pre_pass,
            Variant::Bool(v != PrePassMode::Disabled),
            v.display_name(),
        )
    }

    pub fn pre_pass_mode(&self) -> Result<PrePassMode> {
        let enabled = self.get_bool("pre_pass_mode", self.keys.pre_pass)?;
        Ok(if enabled {
            PrePassMode::Enabled
        } else {
            PrePassMode::Disabled
        })
    }

    pub fn set_vbaq_enabled(&mut self, v: bool) -> Result<()> {
        self.set_property("vbaq", self.keys.vbaq, Variant::Bool(v), v)
    }

    pub fn is_vbaq_enabled(&self) -> Result<bool> {
        self.get_bool("vbaq", self.keys.vbaq)
    }

    pub fn set_frame_skipping_enabled(&mut self, v: bool) -> Result<()> {
        self.set_property("frame_skipping", self.keys.skip_frame, Variant::Bool(v), v)
    }

    pub fn is_frame_skipping_enabled(&self) -> Result<bool> {
        self.get_bool("frame_skipping", self.keys.skip_frame)
    }

    pub fn set_enforce_hrd_enabled(&mut self, v: bool) -> Result<()> {
        self.set_property("enforce_hrd", self.keys.enforce_hrd, Variant::Bool(v), v)
    }

    pub fn is_enforce_hrd_enabled(&self) -> Result<bool> {
        self.get_bool("enforce_hrd", self.keys.enforce_hrd)
    }

    pub fn set_filler_data_enabled(&mut self, v: bool) -> Result<()> {
        self.set_property("filler_data", self.keys.filler_data, Variant::Bool(v), v)
    }

    pub fn is_filler_data_enabled(&self) -> Result<bool> {
        self.get_bool("filler_data", self.keys.filler_data)
    }

    // -----------------------------------------------------------------------
    // QP bounds and values
    // -----------------------------------------------------------------------

    pub fn set_i_frame_qp_min(&mut self, v: u8) -> Result<()> {
        self.set_property("i_frame_qp_min", self.keys.min_qp_i, Variant::Int64(v.into()), v)
    }

    pub fn i_frame_qp_min(&self) -> Result<u8> {
        Ok(self.get_i64("i_frame_qp_min", self.keys.min_qp_i)? as u8)
    }

    pub fn set_i_frame_qp_max(&mut self, v: u8) -> Result<()> {
        self.set_property("i_frame_qp_max", self.keys.max_qp_i, Variant::Int64(v.into()), v)
    }

    pub fn i_frame_qp_max(&self) -> Result<u8> {
        Ok(self.get_i64("i_frame_qp_max", self.keys.max_qp_i)? as u8)
    }

    pub fn set_p_frame_qp_min(&mut self, v: u8) -> Result<()> {
        self.set_property("p_frame_qp_min", self.keys.min_qp_p, Variant::Int64(v.into()), v)
    }

    pub fn p_frame_qp_min(&self) -> Result<u8> {
        Ok(self.get_i64("p_frame_qp_min", self.keys.min_qp_p)? as u8)
    }

    pub fn set_p_frame_qp_max(&mut self, v: u8) -> Result<()> {
        self.set_property("p_frame_qp_max", self.keys.max_qp_p, Variant::Int64(v.into()), v)
    }

    pub fn p_frame_qp_max(&self) -> Result<u8> {
        Ok(self.get_i64("p_frame_qp_max", self.keys.max_qp_p)? as u8)
    }

    pub fn set_i_frame_qp(&mut self, v: u8) -> Result<()> {
        self.set_property("i_frame_qp", self.keys.qp_i, Variant::Int64(v.into()), v)
    }

    pub fn i_frame_qp(&self) -> Result<u8> {
        Ok(self.get_i64("i_frame_qp", self.keys.qp_i)? as u8)
    }

    pub fn set_p_frame_qp(&mut self, v: u8) -> Result<()> {
        self.set_property("p_frame_qp", self.keys.qp_p, Variant::Int64(v.into()), v)
    }

    pub fn p_frame_qp(&self) -> Result<u8> {
        Ok(self.get_i64("p_frame_qp", self.keys.qp_p)? as u8)
    }

    // -----------------------------------------------------------------------
    // Bitrates and VBV
    // -----------------------------------------------------------------------

    pub fn caps_target_bitrate(&self) -> Result<(u64, u64)> {
        let (min, max) = self.caps_range("target_bitrate", self.keys.target_bitrate)?;
        Ok((min as u64, max as u64))
    }

    pub fn set_target_bitrate(&mut self, v: u64) -> Result<()> {
        self.set_property("target_bitrate", self.keys.target_bitrate, Variant::Int64(v as i64), v)
    }

    pub fn target_bitrate(&self) -> Result<u64> {
        Ok(self.get_i64("target_bitrate", self.keys.target_bitrate)? as u64)
    }

    pub fn caps_peak_bitrate(&self) -> Result<(u64, u64)> {
        let (min, max) = self.caps_range("peak_bitrate", self.keys.peak_bitrate)?;
        Ok((min as u64, max as u64))
    }

    pub fn set_peak_bitrate(&mut self, v: u64) -> Result<()> {
        self.set_property("peak_bitrate", self.keys.peak_bitrate, Variant::Int64(v as i64), v)
    }

    pub fn peak_bitrate(&self) -> Result<u64> {
        Ok(self.get_i64("peak_bitrate", self.keys.peak_bitrate)? as u64)
    }

    pub fn caps_vbv_buffer_size(&self) -> Result<(u64, u64)> {
        let (min, max) = self.caps_range("vbv_buffer_size", self.keys.vbv_buffer_size)?;
        Ok((min as u64, max as u64))
    }

    pub fn set_vbv_buffer_size(&mut self, v: u64) -> Result<()> {
        self.set_property("vbv_buffer_size", self.keys.vbv_buffer_size, Variant::Int64(v as i64), v)
    }

    pub fn vbv_buffer_size(&self) -> Result<u64> {
        Ok(self.get_i64("vbv_buffer_size", self.keys.vbv_buffer_size)? as u64)
    }

    /// Derive the VBV buffer size from a strictness fraction and write it.
    ///
    /// `strictness` sweeps three operating points: 0.0 is the loosest
    /// buffer the device allows (its maximum target bitrate), 0.5 is the
    /// nominal target bitrate, 1.0 is one frame's worth of the target
    /// (`target x frame period`). The two interpolation stages are
    /// deliberate -- the midpoint pins the nominal bitrate exactly, which a
    /// single lerp across the full range would not. Out-of-range input is
    /// clamped, not rejected. A UX convenience, not a device requirement.
    ///
    /// The reference target depends on the active rate control: CBR and
    /// ultra-low-latency usage take the target bitrate as-is, the
    /// constrained VBR modes take the larger of target and peak, and
    /// constant-QP estimates the bitrate its QP configuration will
    /// average.
    pub fn set_vbv_buffer_strictness(&mut self, strictness: f64) -> Result<()> {
        let target = if self.usage()? == Usage::UltraLowLatency {
            self.target_bitrate()? as f64
        } else {
            match self.rate_control_method()? {
                RateControlMethod::ConstantBitrate => self.target_bitrate()? as f64,
                RateControlMethod::LatencyConstrainedVariableBitrate
                | RateControlMethod::PeakConstrainedVariableBitrate => {
                    self.target_bitrate()?.max(self.peak_bitrate()?) as f64
                }
                RateControlMethod::ConstantQp => self.constant_qp_bitrate_estimate()?,
            }
        };
        let strict = target * self.frame_period;
        let loose = self.caps_target_bitrate()?.1 as f64;

        // Three-point lerp: 0% = loose, 50% = target, 100% = strict.
        let strictness = strictness.clamp(0.0, 1.0);
        let a_fade = (strictness * 2.0).min(1.0);
        let b_fade = (strictness * 2.0 - 1.0).max(0.0);
        let a = loose * (1.0 - a_fade) + target * a_fade;
        let b = a * (1.0 - b_fade) + strict * b_fade;

        let size = b.round() as u64;
        debug!(strictness, loose, target, strict, size, "derived VBV buffer size");
        self.set_vbv_buffer_size(size)
    }

    /// Estimate the bitrate a constant-QP configuration will average.
    ///
    /// `BITRATE = (1 - QP/51)^2 * factor(color) * width * height * fps`
    /// with the smaller of the I/P QPs and the squared term floored at
    /// 0.001 so the estimate never collapses to zero. Reads resolution and
    /// frame rate through the accessors, refreshing the cache.
    fn constant_qp_bitrate_estimate(&mut self) -> Result<f64> {
        let resolution = self.resolution()?;
        let frame_rate = self.frame_rate()?;

        let mut bitrate =
            resolution.pixel_count() as f64 * self.color_format.bits_per_pixel_factor();
        bitrate *= frame_rate.as_f64();

        let qp_i = self.i_frame_qp()?;
        let qp_p = self.p_frame_qp()?;
        let quality = 1.0 - f64::from(qp_i.min(qp_p)) / 51.0;
        let scale = (quality * quality).max(0.001);

        Ok(bitrate * scale)
    }

    /// Initial VBV fullness as a fraction in `[0, 1]`, stored as a 1/64
    /// fixed-point value. The fraction is not clamped by this layer.
    pub fn set_vbv_initial_fullness(&mut self, fraction: f64) -> Result<()> {
        let fixed = (fraction * 64.0).round() as i64;
        self.set_property(
            "vbv_initial_fullness",
            self.keys.vbv_initial_fullness,
            Variant::Int64(fixed),
            fraction,
        )
    }

    pub fn vbv_initial_fullness(&self) -> Result<f64> {
        let fixed = self.get_i64("vbv_initial_fullness", self.keys.vbv_initial_fullness)?;
        Ok(fixed as f64 / 64.0)
    }

    // -----------------------------------------------------------------------
    // Picture control
    // -----------------------------------------------------------------------

    pub fn caps_gop_type(&self) -> Result<Vec<GopType>> {
        let key = Self::require_key("gop_type", self.keys.gop_type)?;
        let info = self.property_info("gop_type", key)?;
        info.enum_values().map(translate::gop_type_from_native).collect()
    }

    pub fn set_gop_type(&mut self, v: GopType) -> Result<()> {
        let key = Self::require_key("gop_type", self.keys.gop_type)?;
        self.set_property("gop_type", key, Variant::Int64(translate::gop_type_to_native(v)), v.display_name())
    }

    pub fn gop_type(&self) -> Result<GopType> {
        let key = Self::require_key("gop_type", self.keys.gop_type)?;
        translate::gop_type_from_native(self.get_i64("gop_type", key)?)
    }

    pub fn set_gop_size(&mut self, v: u32) -> Result<()> {
        let key = Self::require_key("gop_size", self.keys.gop_size)?;
        self.set_property("gop_size", key, Variant::Int64(v.into()), v)
    }

    pub fn gop_size(&self) -> Result<u32> {
        let key = Self::require_key("gop_size", self.keys.gop_size)?;
        Ok(self.get_i64("gop_size", key)? as u32)
    }

    pub fn set_gop_size_min(&mut self, v: u32) -> Result<()> {
        let key = Self::require_key("gop_size_min", self.keys.gop_size_min)?;
        self.set_property("gop_size_min", key, Variant::Int64(v.into()), v)
    }

    pub fn gop_size_min(&self) -> Result<u32> {
        let key = Self::require_key("gop_size_min", self.keys.gop_size_min)?;
        Ok(self.get_i64("gop_size_min", key)? as u32)
    }

    pub fn set_gop_size_max(&mut self, v: u32) -> Result<()> {
        let key = Self::require_key("gop_size_max", self.keys.gop_size_max)?;
        self.set_property("gop_size_max", key, Variant::Int64(v.into()), v)
    }

    pub fn gop_size_max(&self) -> Result<u32> {
        let key = Self::require_key("gop_size_max", self.keys.gop_size_max)?;
        Ok(self.get_i64("gop_size_max", key)? as u32)
    }

    pub fn set_gop_alignment_enabled(&mut self, _v: bool) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "gop_alignment",
        })
    }

    pub fn is_gop_alignment_enabled(&self) -> Result<bool> {
        Err(PropertyError::NotImplemented {
            field: "gop_alignment",
        })
    }

    pub fn set_idr_period(&mut self, v: u32) -> Result<()> {
        self.set_property("idr_period", self.keys.idr_period, Variant::Int64(v.into()), v)
    }

    pub fn idr_period(&self) -> Result<u32> {
        Ok(self.get_i64("idr_period", self.keys.idr_period)? as u32)
    }

    pub fn set_header_insertion_mode(&mut self, _v: u32) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "header_insertion_mode",
        })
    }

    pub fn header_insertion_mode(&self) -> Result<u32> {
        Err(PropertyError::NotImplemented {
            field: "header_insertion_mode",
        })
    }

    pub fn set_max_access_unit_size(&mut self, _v: u32) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "max_access_unit_size",
        })
    }

    pub fn max_access_unit_size(&self) -> Result<u32> {
        Err(PropertyError::NotImplemented {
            field: "max_access_unit_size",
        })
    }

    /// The native property is the *disable* flag; both directions invert
    /// so callers see the positive sense.
    pub fn set_deblocking_filter_enabled(&mut self, v: bool) -> Result<()> {
        self.set_property(
            "deblocking_filter",
            self.keys.deblocking_disable,
            Variant::Bool(!v),
            v,
        )
    }

    pub fn is_deblocking_filter_enabled(&self) -> Result<bool> {
        Ok(!self.get_bool("deblocking_filter", self.keys.deblocking_disable)?)
    }

    pub fn set_motion_half_pixel_enabled(&mut self, v: bool) -> Result<()> {
        self.set_property(
            "motion_half_pixel",
            self.keys.motion_half_pixel,
            Variant::Bool(v),
            v,
        )
    }

    pub fn is_motion_half_pixel_enabled(&self) -> Result<bool> {
        self.get_bool("motion_half_pixel", self.keys.motion_half_pixel)
    }

    pub fn set_motion_quarter_pixel_enabled(&mut self, v: bool) -> Result<()> {
        self.set_property(
            "motion_quarter_pixel",
            self.keys.motion_quarter_pixel,
            Variant::Bool(v),
            v,
        )
    }

    pub fn is_motion_quarter_pixel_enabled(&self) -> Result<bool> {
        self.get_bool("motion_quarter_pixel", self.keys.motion_quarter_pixel)
    }

    // -----------------------------------------------------------------------
    // Slicing (no backing native property in this codec profile)
    // -----------------------------------------------------------------------

    pub fn set_slices_per_frame(&mut self, _v: u32) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "slices_per_frame",
        })
    }

    pub fn slices_per_frame(&self) -> Result<u32> {
        Err(PropertyError::NotImplemented {
            field: "slices_per_frame",
        })
    }

    pub fn set_slice_control_mode(&mut self, _v: u32) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "slice_control_mode",
        })
    }

    pub fn slice_control_mode(&self) -> Result<u32> {
        Err(PropertyError::NotImplemented {
            field: "slice_control_mode",
        })
    }

    pub fn set_slice_control_size(&mut self, _v: u32) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "slice_control_size",
        })
    }

    pub fn slice_control_size(&self) -> Result<u32> {
        Err(PropertyError::NotImplemented {
            field: "slice_control_size",
        })
    }

    // -----------------------------------------------------------------------
    // Experimental (no backing native property in this codec profile)
    // -----------------------------------------------------------------------

    pub fn set_qp_cb_offset(&mut self, _v: u8) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "qp_cb_offset",
        })
    }

    pub fn qp_cb_offset(&self) -> Result<u8> {
        Err(PropertyError::NotImplemented {
            field: "qp_cb_offset",
        })
    }

    pub fn set_qp_cr_offset(&mut self, _v: u8) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "qp_cr_offset",
        })
    }

    pub fn qp_cr_offset(&self) -> Result<u8> {
        Err(PropertyError::NotImplemented {
            field: "qp_cr_offset",
        })
    }

    pub fn caps_input_queue_size(&self) -> Result<(u32, u32)> {
        let key = Self::require_key("input_queue_size", self.keys.input_queue_size)?;
        let (min, max) = self.caps_range("input_queue_size", key)?;
        Ok((min as u32, max as u32))
    }

    pub fn set_input_queue_size(&mut self, v: u32) -> Result<()> {
        let key = Self::require_key("input_queue_size", self.keys.input_queue_size)?;
        self.set_property("input_queue_size", key, Variant::Int64(v.into()), v)
    }

    pub fn input_queue_size(&self) -> Result<u32> {
        let key = Self::require_key("input_queue_size", self.keys.input_queue_size)?;
        Ok(self.get_i64("input_queue_size", key)? as u32)
    }

    pub fn set_low_latency_internal(&mut self, _v: bool) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "low_latency_internal",
        })
    }

    pub fn low_latency_internal(&self) -> Result<bool> {
        Err(PropertyError::NotImplemented {
            field: "low_latency_internal",
        })
    }

    pub fn set_common_low_latency_internal(&mut self, _v: bool) -> Result<()> {
        Err(PropertyError::NotImplemented {
            field: "common_low_latency_internal",
        })
    }

    pub fn common_low_latency_internal(&self) -> Result<bool> {
        Err(PropertyError::NotImplemented {
            field: "common_low_latency_internal",
        })
    }

    // -----------------------------------------------------------------------
    // Per-frame output path
    // -----------------------------------------------------------------------

    /// Annotate an output packet from the produced buffer's output-type
    /// tag. Runs on the per-frame path: one property read plus
    /// constant-time branching, nothing that can block.
    ///
    /// An I-frame tag marks the packet as a keyframe at the highest
    /// priority tier; a P-frame tag assigns the low tier. Any other tag
    /// (B-frame, skip) leaves the caller-supplied defaults untouched.
    pub fn annotate_packet(
        &self,
        output: &dyn PropertyStore,
        packet: &mut EncodedPacket,
    ) -> Result<()> {
        let tag = output
            .get(self.keys.output_data_type)
            .map_err(|code| PropertyError::GetFailed {
                field: "output_data_type",
                code,
            })?
            .as_i64()
            .ok_or(PropertyError::GetFailed {
                field: "output_data_type",
                code: AMF_INVALID_ARG,
            })?;
        match tag {
            output_data_type::I => {
                packet.keyframe = true;
                packet.priority = nal_priority::HIGHEST;
            }
            output_data_type::P => {
                packet.priority = nal_priority::LOW;
            }
            _ => {}
        }
        Ok(())
    }

    /// Bitstream headers as the runtime reports them -- a pass-through of
    /// the native variant blob, no transformation.
    pub fn extra_data(&self) -> Result<Variant> {
        self.get_raw("extra_data", self.keys.extra_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::stub::StubStore;

    fn hevc_encoder() -> Encoder {
        Encoder::new(
            Box::new(StubStore::new(Codec::Hevc)),
            Codec::Hevc,
            ColorFormat::Nv12,
        )
    }

    fn h264_encoder() -> Encoder {
        Encoder::new(
            Box::new(StubStore::new(Codec::H264)),
            Codec::H264,
            ColorFormat::Nv12,
        )
    }

    #[test]
    fn usage_set_get() {
        let mut enc = hevc_encoder();
        enc.set_usage(Usage::UltraLowLatency).unwrap();
        assert_eq!(enc.usage().unwrap(), Usage::UltraLowLatency);
    }

    #[test]
    fn caps_usage_lists_all_modes() {
        let enc = hevc_encoder();
        let caps = enc.caps_usage().unwrap();
        assert_eq!(caps.len(), 4);
        assert!(caps.contains(&Usage::Transcoding));
        assert!(caps.contains(&Usage::Webcam));
    }

    #[test]
    fn quality_preset_vendor_encoding() {
        let mut enc = hevc_encoder();
        enc.set_quality_preset(QualityPreset::Speed).unwrap();
        assert_eq!(enc.quality_preset().unwrap(), QualityPreset::Speed);
    }

    #[test]
    fn resolution_set_refreshes_cache() {
        let mut enc = hevc_encoder();
        enc.set_resolution(Resolution::UHD).unwrap();
        assert_eq!(enc.cached_resolution(), Resolution::UHD);
    }

    #[test]
    fn resolution_get_refreshes_cache() {
        let mut enc = hevc_encoder();
        // Cache starts at HD; the stub's seeded default differs, so the
        // get path must overwrite the stale value.
        let dev = enc.resolution().unwrap();
        assert_eq!(enc.cached_resolution(), dev);
    }

    #[test]
    fn frame_rate_set_refreshes_cache_and_period() {
        let mut enc = hevc_encoder();
        enc.set_frame_rate(Rational::FPS_60).unwrap();
        assert_eq!(enc.cached_frame_rate(), Rational::FPS_60);
    }

    #[test]
    fn caps_without_descriptor_fail_uniformly() {
        let enc = hevc_encoder();
        assert!(matches!(
            enc.caps_frame_rate(),
            Err(PropertyError::NoCapability { field: "frame_rate" })
        ));
        assert!(matches!(
            enc.caps_aspect_ratio(),
            Err(PropertyError::NoCapability { field: "aspect_ratio" })
        ));
    }

    #[test]
    fn profile_level_automatic_resolves_from_cache() {
        let mut enc = hevc_encoder();
        enc.set_resolution(Resolution::UHD).unwrap();
        enc.set_frame_rate(Rational::FPS_60).unwrap();
        enc.set_profile_level(ProfileLevel::Automatic).unwrap();
        // 2160p60 needs HEVC level 5.1; the readback must round-trip the
        // wire scaling.
        assert_eq!(enc.profile_level().unwrap(), ProfileLevel::L51);
    }

    #[test]
    fn tier_not_implemented_on_h264() {
        let mut enc = h264_encoder();
        assert!(matches!(
            enc.set_tier(Tier::High),
            Err(PropertyError::NotImplemented { field: "tier" })
        ));
        assert!(matches!(
            enc.tier(),
            Err(PropertyError::NotImplemented { field: "tier" })
        ));
    }

    #[test]
    fn tier_set_get_on_hevc() {
        let mut enc = hevc_encoder();
        enc.set_tier(Tier::High).unwrap();
        assert_eq!(enc.tier().unwrap(), Tier::High);
    }

    #[test]
    fn device_rejects_out_of_range_bitrate() {
        let mut enc = hevc_encoder();
        let (_, max) = enc.caps_target_bitrate().unwrap();
        let err = enc.set_target_bitrate(max + 1).unwrap_err();
        match err {
            PropertyError::SetFailed { field, value, .. } => {
                assert_eq!(field, "target_bitrate");
                assert_eq!(value, (max + 1).to_string());
            }
            other => panic!("expected SetFailed, got {other:?}"),
        }
    }

    #[test]
    fn pre_pass_caps_from_bool_descriptor() {
        let enc = hevc_encoder();
        let caps = enc.caps_pre_pass_mode().unwrap();
        assert_eq!(caps, vec![PrePassMode::Disabled, PrePassMode::Enabled]);
    }

    #[test]
    fn pre_pass_set_get() {
        let mut enc = hevc_encoder();
        enc.set_pre_pass_mode(PrePassMode::Enabled).unwrap();
        assert_eq!(enc.pre_pass_mode().unwrap(), PrePassMode::Enabled);
        enc.set_pre_pass_mode(PrePassMode::Disabled).unwrap();
        assert_eq!(enc.pre_pass_mode().unwrap(), PrePassMode::Disabled);
    }

    #[test]
    fn deblocking_filter_inverts_native_sense() {
        let mut enc = hevc_encoder();
        enc.set_deblocking_filter_enabled(true).unwrap();
        assert!(enc.is_deblocking_filter_enabled().unwrap());
        enc.set_deblocking_filter_enabled(false).unwrap();
        assert!(!enc.is_deblocking_filter_enabled().unwrap());
    }

    #[test]
    fn vbv_initial_fullness_fixed_point() {
        let mut enc = hevc_encoder();
        enc.set_vbv_initial_fullness(1.0).unwrap();
        assert!((enc.vbv_initial_fullness().unwrap() - 1.0).abs() < 1e-9);
        enc.set_vbv_initial_fullness(0.5).unwrap();
        assert!((enc.vbv_initial_fullness().unwrap() - 0.5).abs() < 1e-9);
        // 1/64 granularity: 0.51 rounds to 33/64.
        enc.set_vbv_initial_fullness(0.51).unwrap();
        assert!((enc.vbv_initial_fullness().unwrap() - 33.0 / 64.0).abs() < 1e-9);
    }

    #[test]
    fn stub_fields_never_touch_the_store() {
        let mut enc = hevc_encoder();
        let stubs: Vec<PropertyError> = vec![
            enc.set_slices_per_frame(4).unwrap_err(),
            enc.slices_per_frame().unwrap_err(),
            enc.set_slice_control_mode(1).unwrap_err(),
            enc.slice_control_size().unwrap_err(),
            enc.set_header_insertion_mode(2).unwrap_err(),
            enc.set_max_access_unit_size(1500).unwrap_err(),
            enc.set_gop_alignment_enabled(true).unwrap_err(),
            enc.set_qp_cb_offset(2).unwrap_err(),
            enc.qp_cr_offset().unwrap_err(),
            enc.set_low_latency_internal(true).unwrap_err(),
            enc.common_low_latency_internal().unwrap_err(),
            enc.caps_max_long_term_reference_frames().unwrap_err(),
            enc.set_max_long_term_reference_frames(2).unwrap_err(),
        ];
        for err in stubs {
            assert!(matches!(err, PropertyError::NotImplemented { .. }), "{err}");
        }
    }

    #[test]
    fn annotate_packet_i_frame() {
        let enc = hevc_encoder();
        let mut output = StubStore::empty();
        output.set_raw("HevcOutputDataType", Variant::Int64(output_data_type::I));
        let mut packet = EncodedPacket::default();
        enc.annotate_packet(&output, &mut packet).unwrap();
        assert!(packet.keyframe);
        assert_eq!(packet.priority, nal_priority::HIGHEST);
    }

    #[test]
    fn annotate_packet_p_frame() {
        let enc = hevc_encoder();
        let mut output = StubStore::empty();
        output.set_raw("HevcOutputDataType", Variant::Int64(output_data_type::P));
        let mut packet = EncodedPacket::default();
        enc.annotate_packet(&output, &mut packet).unwrap();
        assert!(!packet.keyframe);
        assert_eq!(packet.priority, nal_priority::LOW);
    }

    #[test]
    fn annotate_packet_other_tags_pass_through() {
        let enc = hevc_encoder();
        for tag in [output_data_type::B, output_data_type::IDR, 99] {
            let mut output = StubStore::empty();
            output.set_raw("HevcOutputDataType", Variant::Int64(tag));
            let mut packet = EncodedPacket {
                keyframe: false,
                priority: nal_priority::HIGH,
                ..Default::default()
            };
            enc.annotate_packet(&output, &mut packet).unwrap();
            assert!(!packet.keyframe);
            assert_eq!(packet.priority, nal_priority::HIGH);
        }
    }

    #[test]
    fn unknown_native_enum_value_is_fatal() {
        let mut store = StubStore::new(Codec::Hevc);
        store.set_raw("HevcUsage", Variant::Int64(250));
        let enc = Encoder::new(Box::new(store), Codec::Hevc, ColorFormat::Nv12);
        assert!(matches!(
            enc.usage(),
            Err(PropertyError::UnknownNativeValue { field: "usage", value: 250 })
        ));
    }

    #[test]
    fn extra_data_is_passed_through() {
        let enc = hevc_encoder();
        match enc.extra_data().unwrap() {
            Variant::Blob(data) => assert!(!data.is_empty()),
            other => panic!("expected blob, got {other:?}"),
        }
    }
}
