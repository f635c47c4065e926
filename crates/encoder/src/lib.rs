//! `vcn-encoder` -- Hardware video encoding control through AMD's AMF
//! runtime.
//!
//! The AMF runtime exposes each encoder component (H.264/AVC, H.265/HEVC)
//! as an opaque, capability-queryable property store. This crate is the
//! translation layer between that store and the abstract configuration
//! model in `vcn-common`:
//!
//! - [`amf::translate`] -- pure bidirectional mapping between abstract
//!   enums and the components' native integer encodings
//! - [`amf::Encoder`] -- one getter/setter/capability triple per
//!   parameter, plus the derived-value computations (automatic profile
//!   level, VBV strictness blending, constant-QP bitrate estimation) and
//!   per-frame packet annotation
//! - [`amf::runtime`] -- `libloading`-based binding of the driver-shipped
//!   runtime library
//! - [`amf::StubStore`] -- in-memory store so everything above is
//!   testable without AMD hardware
//!
//! # Usage
//!
//! ```
//! use vcn_common::{Codec, ColorFormat, ProfileLevel, Rational, Resolution, Usage};
//! use vcn_encoder::amf::{Encoder, StubStore};
//!
//! # fn main() -> vcn_encoder::Result<()> {
//! let store = Box::new(StubStore::new(Codec::Hevc));
//! let mut encoder = Encoder::new(store, Codec::Hevc, ColorFormat::Nv12);
//!
//! encoder.set_usage(Usage::Transcoding)?;
//! encoder.set_resolution(Resolution::UHD)?;
//! encoder.set_frame_rate(Rational::FPS_60)?;
//! // Resolved against the level table from the values above.
//! encoder.set_profile_level(ProfileLevel::Automatic)?;
//! # Ok(())
//! # }
//! ```

pub mod amf;
pub mod error;

pub use amf::{Encoder, StubStore};
pub use error::{PropertyError, Result, RuntimeLoadError};
