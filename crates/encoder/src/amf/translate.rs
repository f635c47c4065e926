//! Bidirectional translation between the abstract parameter enums and the
//! AMF components' native integer encodings.
//!
//! All functions are pure. Where the two codec components encode a value
//! differently (quality preset, profile, profile level, rate control), the
//! mapping takes the codec identity instead of duplicating a table per
//! codec. `*_from_native` never accepts an undefined code: an unmapped
//! value is a contract violation between this layer and the driver and
//! surfaces as [`PropertyError::UnknownNativeValue`].

use vcn_common::{
    Codec, CodingType, GopType, Profile, ProfileLevel, QualityPreset, Rational, RateControlMethod,
    Resolution, Tier, Usage,
};

use crate::error::{PropertyError, Result};

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

/// Both components share the usage encoding.
pub fn usage_to_native(v: Usage) -> i64 {
    match v {
        Usage::Transcoding => 0,
        Usage::UltraLowLatency => 1,
        Usage::LowLatency => 2,
        Usage::Webcam => 3,
    }
}

pub fn usage_from_native(raw: i64) -> Result<Usage> {
    match raw {
        0 => Ok(Usage::Transcoding),
        1 => Ok(Usage::UltraLowLatency),
        2 => Ok(Usage::LowLatency),
        3 => Ok(Usage::Webcam),
        _ => Err(PropertyError::UnknownNativeValue {
            field: "usage",
            value: raw,
        }),
    }
}

// ---------------------------------------------------------------------------
// Quality preset
// ---------------------------------------------------------------------------

/// The components disagree here: AVC counts Balanced=0/Speed=1/Quality=2,
/// HEVC counts Quality=0/Balanced=5/Speed=10.
pub fn quality_preset_to_native(codec: Codec, v: QualityPreset) -> i64 {
    match codec {
        Codec::H264 => match v {
            QualityPreset::Balanced => 0,
            QualityPreset::Speed => 1,
            QualityPreset::Quality => 2,
        },
        Codec::Hevc => match v {
            QualityPreset::Quality => 0,
            QualityPreset::Balanced => 5,
            QualityPreset::Speed => 10,
        },
    }
}

pub fn quality_preset_from_native(codec: Codec, raw: i64) -> Result<QualityPreset> {
    let preset = match (codec, raw) {
        (Codec::H264, 0) => QualityPreset::Balanced,
        (Codec::H264, 1) => QualityPreset::Speed,
        (Codec::H264, 2) => QualityPreset::Quality,
        (Codec::Hevc, 0) => QualityPreset::Quality,
        (Codec::Hevc, 5) => QualityPreset::Balanced,
        (Codec::Hevc, 10) => QualityPreset::Speed,
        _ => {
            return Err(PropertyError::UnknownNativeValue {
                field: "quality_preset",
                value: raw,
            })
        }
    };
    Ok(preset)
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// AVC uses the standard `profile_idc` values (66/77/100) plus the
/// constrained variants; HEVC encodes Main only.
pub fn profile_to_native(codec: Codec, v: Profile) -> i64 {
    match codec {
        Codec::H264 => match v {
            Profile::ConstrainedBaseline => 256,
            Profile::Baseline => 66,
            Profile::Main => 77,
            Profile::ConstrainedHigh => 257,
            Profile::High => 100,
        },
        // The HEVC component only encodes Main; map everything there.
        Codec::Hevc => 1,
    }
}

pub fn profile_from_native(codec: Codec, raw: i64) -> Result<Profile> {
    let profile = match (codec, raw) {
        (Codec::H264, 256) => Profile::ConstrainedBaseline,
        (Codec::H264, 66) => Profile::Baseline,
        (Codec::H264, 77) => Profile::Main,
        (Codec::H264, 257) => Profile::ConstrainedHigh,
        (Codec::H264, 100) => Profile::High,
        (Codec::Hevc, 1) => Profile::Main,
        _ => {
            return Err(PropertyError::UnknownNativeValue {
                field: "profile",
                value: raw,
            })
        }
    };
    Ok(profile)
}

// ---------------------------------------------------------------------------
// Profile level
// ---------------------------------------------------------------------------

/// AVC stores the level number as-is (4.1 -> 41); HEVC stores it scaled by
/// three (4.1 -> 123, matching `general_level_idc / 10`).
///
/// [`ProfileLevel::Automatic`] has no native encoding -- resolve it with
/// [`automatic_level`] before translating.
pub fn profile_level_to_native(codec: Codec, v: ProfileLevel) -> i64 {
    match codec {
        Codec::H264 => v.as_number(),
        Codec::Hevc => v.as_number() * 3,
    }
}

pub fn profile_level_from_native(codec: Codec, raw: i64) -> Result<ProfileLevel> {
    let unknown = || PropertyError::UnknownNativeValue {
        field: "profile_level",
        value: raw,
    };
    let number = match codec {
        Codec::H264 => raw,
        Codec::Hevc => {
            if raw % 3 != 0 {
                return Err(unknown());
            }
            raw / 3
        }
    };
    level_limits(codec)
        .iter()
        .find(|l| l.level.as_number() == number)
        .map(|l| l.level)
        .ok_or_else(unknown)
}

// ---------------------------------------------------------------------------
// Tier (HEVC)
// ---------------------------------------------------------------------------

pub fn tier_to_native(v: Tier) -> i64 {
    match v {
        Tier::Main => 0,
        Tier::High => 1,
    }
}

pub fn tier_from_native(raw: i64) -> Result<Tier> {
    match raw {
        0 => Ok(Tier::Main),
        1 => Ok(Tier::High),
        _ => Err(PropertyError::UnknownNativeValue {
            field: "tier",
            value: raw,
        }),
    }
}

// ---------------------------------------------------------------------------
// Rate control method
// ---------------------------------------------------------------------------

/// Another component disagreement: AVC orders CQP/CBR/PCVBR/LCVBR, HEVC
/// orders CQP/LCVBR/PCVBR/CBR.
pub fn rate_control_to_native(codec: Codec, v: RateControlMethod) -> i64 {
    match codec {
        Codec::H264 => match v {
            RateControlMethod::ConstantQp => 0,
            RateControlMethod::ConstantBitrate => 1,
            RateControlMethod::PeakConstrainedVariableBitrate => 2,
            RateControlMethod::LatencyConstrainedVariableBitrate => 3,
        },
        Codec::Hevc => match v {
            RateControlMethod::ConstantQp => 0,
            RateControlMethod::LatencyConstrainedVariableBitrate => 1,
            RateControlMethod::PeakConstrainedVariableBitrate => 2,
            RateControlMethod::ConstantBitrate => 3,
        },
    }
}

pub fn rate_control_from_native(codec: Codec, raw: i64) -> Result<RateControlMethod> {
    let method = match (codec, raw) {
        (Codec::H264, 0) => RateControlMethod::ConstantQp,
        (Codec::H264, 1) => RateControlMethod::ConstantBitrate,
        (Codec::H264, 2) => RateControlMethod::PeakConstrainedVariableBitrate,
        (Codec::H264, 3) => RateControlMethod::LatencyConstrainedVariableBitrate,
        (Codec::Hevc, 0) => RateControlMethod::ConstantQp,
        (Codec::Hevc, 1) => RateControlMethod::LatencyConstrainedVariableBitrate,
        (Codec::Hevc, 2) => RateControlMethod::PeakConstrainedVariableBitrate,
        (Codec::Hevc, 3) => RateControlMethod::ConstantBitrate,
        _ => {
            return Err(PropertyError::UnknownNativeValue {
                field: "rate_control_method",
                value: raw,
            })
        }
    };
    Ok(method)
}

// ---------------------------------------------------------------------------
// Coding type
// ---------------------------------------------------------------------------

pub fn coding_type_to_native(v: CodingType) -> i64 {
    match v {
        CodingType::Automatic => 0,
        CodingType::Cabac => 1,
        CodingType::Cavlc => 2,
    }
}

pub fn coding_type_from_native(raw: i64) -> Result<CodingType> {
    match raw {
        0 => Ok(CodingType::Automatic),
        1 => Ok(CodingType::Cabac),
        2 => Ok(CodingType::Cavlc),
        _ => Err(PropertyError::UnknownNativeValue {
            field: "coding_type",
            value: raw,
        }),
    }
}

// ---------------------------------------------------------------------------
// GOP type (HEVC)
// ---------------------------------------------------------------------------

pub fn gop_type_to_native(v: GopType) -> i64 {
    match v {
        GopType::Fixed => 0,
        GopType::Variable => 1,
    }
}

pub fn gop_type_from_native(raw: i64) -> Result<GopType> {
    match raw {
        0 => Ok(GopType::Fixed),
        1 => Ok(GopType::Variable),
        _ => Err(PropertyError::UnknownNativeValue {
            field: "gop_type",
            value: raw,
        }),
    }
}

// ---------------------------------------------------------------------------
// Automatic level selection
// ---------------------------------------------------------------------------

/// Per-level constraint row.
///
/// `max_picture_size` and `max_rate` are in macroblocks (and
/// macroblocks/sec) for AVC, luma samples (and samples/sec) for HEVC --
/// the units the respective standards write their level tables in.
struct LevelLimit {
    level: ProfileLevel,
    max_picture_size: u64,
    max_rate: u64,
}

/// H.264 levels: MaxFS (macroblocks) and MaxMBPS, table A-1.
const H264_LEVEL_LIMITS: &[LevelLimit] = &[
    LevelLimit { level: ProfileLevel::L10, max_picture_size: 99, max_rate: 1_485 },
    LevelLimit { level: ProfileLevel::L11, max_picture_size: 396, max_rate: 3_000 },
    LevelLimit { level: ProfileLevel::L12, max_picture_size: 396, max_rate: 6_000 },
    LevelLimit { level: ProfileLevel::L13, max_picture_size: 396, max_rate: 11_880 },
    LevelLimit { level: ProfileLevel::L20, max_picture_size: 396, max_rate: 11_880 },
    LevelLimit { level: ProfileLevel::L21, max_picture_size: 792, max_rate: 19_800 },
    LevelLimit { level: ProfileLevel::L22, max_picture_size: 1_620, max_rate: 20_250 },
    LevelLimit { level: ProfileLevel::L30, max_picture_size: 1_620, max_rate: 40_500 },
    LevelLimit { level: ProfileLevel::L31, max_picture_size: 3_600, max_rate: 108_000 },
    LevelLimit { level: ProfileLevel::L32, max_picture_size: 5_120, max_rate: 216_000 },
    LevelLimit { level: ProfileLevel::L40, max_picture_size: 8_192, max_rate: 245_760 },
    LevelLimit { level: ProfileLevel::L41, max_picture_size: 8_192, max_rate: 245_760 },
    LevelLimit { level: ProfileLevel::L42, max_picture_size: 8_704, max_rate: 522_240 },
    LevelLimit { level: ProfileLevel::L50, max_picture_size: 22_080, max_rate: 589_824 },
    LevelLimit { level: ProfileLevel::L51, max_picture_size: 36_864, max_rate: 983_040 },
    LevelLimit { level: ProfileLevel::L52, max_picture_size: 36_864, max_rate: 2_073_600 },
];

/// HEVC levels: MaxLumaPs and MaxLumaSr, table A.8.
const HEVC_LEVEL_LIMITS: &[LevelLimit] = &[
    LevelLimit { level: ProfileLevel::L10, max_picture_size: 36_864, max_rate: 552_960 },
    LevelLimit { level: ProfileLevel::L20, max_picture_size: 122_880, max_rate: 3_686_400 },
    LevelLimit { level: ProfileLevel::L21, max_picture_size: 245_760, max_rate: 7_372_800 },
    LevelLimit { level: ProfileLevel::L30, max_picture_size: 552_960, max_rate: 16_588_800 },
    LevelLimit { level: ProfileLevel::L31, max_picture_size: 983_040, max_rate: 33_177_600 },
    LevelLimit { level: ProfileLevel::L40, max_picture_size: 2_228_224, max_rate: 66_846_720 },
    LevelLimit { level: ProfileLevel::L41, max_picture_size: 2_228_224, max_rate: 133_693_440 },
    LevelLimit { level: ProfileLevel::L50, max_picture_size: 8_912_896, max_rate: 267_386_880 },
    LevelLimit { level: ProfileLevel::L51, max_picture_size: 8_912_896, max_rate: 534_773_760 },
    LevelLimit { level: ProfileLevel::L52, max_picture_size: 8_912_896, max_rate: 1_069_547_520 },
    LevelLimit { level: ProfileLevel::L60, max_picture_size: 35_651_584, max_rate: 1_069_547_520 },
    LevelLimit { level: ProfileLevel::L61, max_picture_size: 35_651_584, max_rate: 2_139_095_040 },
    LevelLimit { level: ProfileLevel::L62, max_picture_size: 35_651_584, max_rate: 4_278_190_080 },
];

fn level_limits(codec: Codec) -> &'static [LevelLimit] {
    match codec {
        Codec::H264 => H264_LEVEL_LIMITS,
        Codec::Hevc => HEVC_LEVEL_LIMITS,
    }
}

/// Resolve [`ProfileLevel::Automatic`] to the lowest level admitting the
/// given picture size and frame rate.
///
/// Deterministic in {resolution, frame rate} only -- the active rate
/// control method is deliberately not consulted. Falls back to the
/// highest defined level when the input exceeds every row.
pub fn automatic_level(codec: Codec, resolution: Resolution, frame_rate: Rational) -> ProfileLevel {
    let table = level_limits(codec);
    let picture_size = match codec {
        Codec::H264 => resolution.macroblocks(),
        Codec::Hevc => resolution.pixel_count(),
    };
    let rate = (picture_size as f64 * frame_rate.as_f64()).ceil() as u64;
    table
        .iter()
        .find(|l| picture_size <= l.max_picture_size && rate <= l.max_rate)
        .map(|l| l.level)
        .unwrap_or_else(|| {
            // Past the top of the table the device will reject the level
            // anyway; report the highest one we know.
            table[table.len() - 1].level
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODECS: [Codec; 2] = [Codec::H264, Codec::Hevc];

    #[test]
    fn usage_round_trip() {
        for v in [
            Usage::Transcoding,
            Usage::UltraLowLatency,
            Usage::LowLatency,
            Usage::Webcam,
        ] {
            assert_eq!(usage_from_native(usage_to_native(v)).unwrap(), v);
        }
    }

    #[test]
    fn usage_unknown_code() {
        assert!(matches!(
            usage_from_native(42),
            Err(PropertyError::UnknownNativeValue { field: "usage", value: 42 })
        ));
    }

    #[test]
    fn quality_preset_round_trip() {
        for codec in CODECS {
            for v in [
                QualityPreset::Speed,
                QualityPreset::Balanced,
                QualityPreset::Quality,
            ] {
                let native = quality_preset_to_native(codec, v);
                assert_eq!(quality_preset_from_native(codec, native).unwrap(), v);
            }
        }
    }

    #[test]
    fn quality_preset_encodings_differ() {
        assert_eq!(quality_preset_to_native(Codec::H264, QualityPreset::Quality), 2);
        assert_eq!(quality_preset_to_native(Codec::Hevc, QualityPreset::Quality), 0);
        assert_eq!(quality_preset_to_native(Codec::Hevc, QualityPreset::Speed), 10);
    }

    #[test]
    fn profile_round_trip_h264() {
        for v in [
            Profile::ConstrainedBaseline,
            Profile::Baseline,
            Profile::Main,
            Profile::ConstrainedHigh,
            Profile::High,
        ] {
            let native = profile_to_native(Codec::H264, v);
            assert_eq!(profile_from_native(Codec::H264, native).unwrap(), v);
        }
    }

    #[test]
    fn profile_hevc_is_main_only() {
        assert_eq!(profile_to_native(Codec::Hevc, Profile::Main), 1);
        // Unsupported profiles collapse to Main rather than failing.
        assert_eq!(profile_to_native(Codec::Hevc, Profile::Baseline), 1);
        assert_eq!(profile_from_native(Codec::Hevc, 1).unwrap(), Profile::Main);
        assert!(profile_from_native(Codec::Hevc, 77).is_err());
    }

    #[test]
    fn profile_level_round_trip_all_levels() {
        for codec in CODECS {
            for limit in level_limits(codec) {
                let native = profile_level_to_native(codec, limit.level);
                assert_eq!(
                    profile_level_from_native(codec, native).unwrap(),
                    limit.level
                );
            }
        }
    }

    #[test]
    fn profile_level_hevc_scaling() {
        // HEVC stores the level number times three, exactly.
        assert_eq!(profile_level_to_native(Codec::Hevc, ProfileLevel::L41), 123);
        assert_eq!(profile_level_to_native(Codec::Hevc, ProfileLevel::L51), 153);
        assert_eq!(
            profile_level_from_native(Codec::Hevc, 153).unwrap(),
            ProfileLevel::L51
        );
        // Not a multiple of three -> no inverse mapping.
        assert!(profile_level_from_native(Codec::Hevc, 152).is_err());
        // H.264 takes the number unscaled.
        assert_eq!(profile_level_to_native(Codec::H264, ProfileLevel::L41), 41);
    }

    #[test]
    fn tier_round_trip() {
        for v in [Tier::Main, Tier::High] {
            assert_eq!(tier_from_native(tier_to_native(v)).unwrap(), v);
        }
        assert!(tier_from_native(2).is_err());
    }

    #[test]
    fn rate_control_round_trip() {
        for codec in CODECS {
            for v in [
                RateControlMethod::ConstantQp,
                RateControlMethod::ConstantBitrate,
                RateControlMethod::PeakConstrainedVariableBitrate,
                RateControlMethod::LatencyConstrainedVariableBitrate,
            ] {
                let native = rate_control_to_native(codec, v);
                assert_eq!(rate_control_from_native(codec, native).unwrap(), v);
            }
        }
    }

    #[test]
    fn rate_control_encodings_differ() {
        assert_eq!(
            rate_control_to_native(Codec::H264, RateControlMethod::ConstantBitrate),
            1
        );
        assert_eq!(
            rate_control_to_native(Codec::Hevc, RateControlMethod::ConstantBitrate),
            3
        );
    }

    #[test]
    fn coding_and_gop_type_round_trip() {
        for v in [CodingType::Automatic, CodingType::Cabac, CodingType::Cavlc] {
            assert_eq!(coding_type_from_native(coding_type_to_native(v)).unwrap(), v);
        }
        for v in [GopType::Fixed, GopType::Variable] {
            assert_eq!(gop_type_from_native(gop_type_to_native(v)).unwrap(), v);
        }
    }

    #[test]
    fn automatic_level_uhd60_hevc() {
        // 3840x2160 = 8,294,400 luma samples fits level 5.0, but the
        // sample rate at 60fps (497,664,000/s) needs 5.1.
        let level = automatic_level(Codec::Hevc, Resolution::UHD, Rational::FPS_60);
        assert_eq!(level, ProfileLevel::L51);
    }

    #[test]
    fn automatic_level_hd_hevc() {
        let level = automatic_level(Codec::Hevc, Resolution::HD, Rational::FPS_30);
        assert_eq!(level, ProfileLevel::L40);
        let level = automatic_level(Codec::Hevc, Resolution::HD, Rational::FPS_60);
        assert_eq!(level, ProfileLevel::L41);
    }

    #[test]
    fn automatic_level_h264() {
        // 1080p30: 8,160 macroblocks at 244,800 MB/s -> level 4.0.
        let level = automatic_level(Codec::H264, Resolution::HD, Rational::FPS_30);
        assert_eq!(level, ProfileLevel::L40);
        // 1080p60 blows the 4.0/4.1 MaxMBPS budget -> 4.2.
        let level = automatic_level(Codec::H264, Resolution::HD, Rational::FPS_60);
        assert_eq!(level, ProfileLevel::L42);
    }

    #[test]
    fn automatic_level_saturates_at_table_top() {
        let level = automatic_level(
            Codec::Hevc,
            Resolution::new(16_384, 8_640),
            Rational::FPS_60,
        );
        assert_eq!(level, ProfileLevel::L62);
    }
}
