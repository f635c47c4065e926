//! `vcn-common` -- Shared abstract encoder model for the VCN engine crates.
//!
//! This crate defines the codec-neutral vocabulary the rest of the engine
//! speaks:
//!
//! - **Types**: `Rational`, `Resolution` (newtypes for safety)
//! - **Codec/Color**: `Codec`, `ColorFormat`
//! - **Parameters**: the closed abstract enum set (`Usage`,
//!   `QualityPreset`, `Profile`, `ProfileLevel`, `Tier`,
//!   `RateControlMethod`, `PrePassMode`, `CodingType`, `GopType`)
//! - **Packets**: `EncodedPacket` with its keyframe/priority annotation
//!
//! Nothing here talks to a device. The translation of these values to and
//! from the driver's native property encodings lives in `vcn-encoder`.

pub mod codec;
pub mod color;
pub mod packet;
pub mod params;
pub mod types;

// Re-export commonly used items at crate root
pub use codec::Codec;
pub use color::ColorFormat;
pub use packet::{nal_priority, EncodedPacket};
pub use params::{
    CodingType, GopType, PrePassMode, Profile, ProfileLevel, QualityPreset, RateControlMethod,
    Tier, Usage,
};
pub use types::{Rational, Resolution};
