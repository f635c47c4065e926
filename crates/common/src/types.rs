//! Core value types with newtype pattern for type safety.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rational number for frame rates and aspect ratios
/// (e.g., 30000/1001 for 29.97fps).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub const FPS_24: Self = Self { num: 24, den: 1 };
    pub const FPS_25: Self = Self { num: 25, den: 1 };
    pub const FPS_30: Self = Self { num: 30, den: 1 };
    pub const FPS_29_97: Self = Self {
        num: 30000,
        den: 1001,
    };
    pub const FPS_60: Self = Self { num: 60, den: 1 };
    pub const FPS_59_94: Self = Self {
        num: 60000,
        den: 1001,
    };
    /// 1:1 sample aspect ratio.
    pub const SQUARE: Self = Self { num: 1, den: 1 };

    pub fn new(num: u32, den: u32) -> Self {
        assert!(den > 0, "Rational denominator must be > 0");
        Self { num, den }
    }

    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /// Duration of one tick in seconds (den/num). For a frame rate this is
    /// the frame period.
    pub fn period_secs(self) -> f64 {
        self.den as f64 / self.num as f64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

/// Video frame resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD: Self = Self {
        width: 1920,
        height: 1080,
    };
    pub const UHD: Self = Self {
        width: 3840,
        height: 2160,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total luma samples per picture.
    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Picture size in 16x16 macroblocks, rounded up (H.264 level math).
    pub fn macroblocks(self) -> u64 {
        let mb_w = (self.width as u64).div_ceil(16);
        let mb_h = (self.height as u64).div_ceil(16);
        mb_w * mb_h
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_display() {
        assert_eq!(Rational::FPS_30.to_string(), "30");
        assert_eq!(Rational::FPS_29_97.to_string(), "30000/1001");
    }

    #[test]
    fn rational_period() {
        assert!((Rational::FPS_30.period_secs() - 1.0 / 30.0).abs() < 1e-12);
        assert!((Rational::FPS_59_94.period_secs() - 1001.0 / 60000.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "Rational denominator must be > 0")]
    fn rational_zero_den_panics() {
        let _r = Rational::new(30, 0);
    }

    #[test]
    fn resolution_pixels_and_macroblocks() {
        assert_eq!(Resolution::HD.pixel_count(), 1920 * 1080);
        // 1920/16 = 120, 1080/16 = 67.5 -> 68 rows
        assert_eq!(Resolution::HD.macroblocks(), 120 * 68);
        assert_eq!(Resolution::UHD.pixel_count(), 3840 * 2160);
    }
}
