//! Input color formats accepted by the encoder.

use serde::{Deserialize, Serialize};

/// Color format of the frames submitted to the encoder.
///
/// Negotiated at session creation; this layer only needs it for the
/// constant-QP bitrate estimate, which scales with the storage cost of a
/// pixel in the given format.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorFormat {
    /// NV12: Y plane + interleaved UV at half resolution (4:2:0).
    Nv12,
    /// I420: planar Y, U, V at half resolution (4:2:0).
    I420,
    /// YUY2: packed 4:2:2.
    Yuy2,
    /// 32-bit BGRA.
    Bgra,
    /// 32-bit RGBA.
    Rgba,
    /// Single-channel luma.
    Gray,
}

impl ColorFormat {
    /// Weight applied per pixel when estimating raw frame cost.
    ///
    /// 4:2:0 formats weigh 1.5 per pixel, packed 4:2:2 is weighted 4,
    /// 32-bit RGB formats 3, and single-channel 1.
    pub fn bits_per_pixel_factor(self) -> f64 {
        match self {
            Self::Nv12 | Self::I420 => 1.5,
            Self::Yuy2 => 4.0,
            Self::Bgra | Self::Rgba => 3.0,
            Self::Gray => 1.0,
        }
    }

    pub fn is_planar(self) -> bool {
        matches!(self, Self::Nv12 | Self::I420)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_factors() {
        assert_eq!(ColorFormat::Nv12.bits_per_pixel_factor(), 1.5);
        assert_eq!(ColorFormat::I420.bits_per_pixel_factor(), 1.5);
        assert_eq!(ColorFormat::Yuy2.bits_per_pixel_factor(), 4.0);
        assert_eq!(ColorFormat::Bgra.bits_per_pixel_factor(), 3.0);
        assert_eq!(ColorFormat::Gray.bits_per_pixel_factor(), 1.0);
    }

    #[test]
    fn planar_formats() {
        assert!(ColorFormat::Nv12.is_planar());
        assert!(!ColorFormat::Yuy2.is_planar());
    }
}
