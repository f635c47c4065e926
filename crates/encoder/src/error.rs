//! Encoder-specific error types.
//!
//! Every property-layer failure is surfaced immediately with the field
//! name, the attempted value (for writes), and the native diagnostic
//! text/code. Nothing in this crate recovers, retries, or silently
//! defaults -- masking a device rejection would hide a configuration error
//! the caller must correct.

use thiserror::Error;

use crate::amf::ffi::{result_text, AmfResultCode};

/// Failures of the property translation/accessor layer.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// Capability/info query rejected by the driver.
    #[error("{field}: capability query failed: {} (code {code})", result_text(*.code))]
    QueryFailed {
        field: &'static str,
        code: AmfResultCode,
    },

    /// Read rejected by the driver.
    #[error("{field}: failed to retrieve value: {} (code {code})", result_text(*.code))]
    GetFailed {
        field: &'static str,
        code: AmfResultCode,
    },

    /// Write rejected by the driver (includes device-enforced bounds).
    #[error("{field}: failed to set to {value}: {} (code {code})", result_text(*.code))]
    SetFailed {
        field: &'static str,
        value: String,
        code: AmfResultCode,
    },

    /// The field has no backing native property in this codec profile.
    /// Uniform across all such fields; no store call is ever attempted.
    #[error("{field}: not implemented for this codec profile")]
    NotImplemented { field: &'static str },

    /// The driver reported an enumerated value with no inverse mapping.
    /// A contract violation between this layer and the device, not a
    /// normal runtime condition.
    #[error("{field}: driver reported unmapped enum value {value}")]
    UnknownNativeValue { field: &'static str, value: i64 },

    /// The field exposes no device-reported capability descriptor; no
    /// range is fabricated in its place.
    #[error("{field}: no capability descriptor reported by the driver")]
    NoCapability { field: &'static str },
}

/// Convenience Result type for property-layer operations.
pub type Result<T> = std::result::Result<T, PropertyError>;

/// Errors that can occur when loading the AMF runtime library.
#[derive(Debug, Error)]
pub enum RuntimeLoadError {
    #[error("AMF runtime library not found: {0}")]
    LibraryNotFound(String),

    #[error("Required symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("AMF runtime version query failed: {} (code {code})", result_text(*.code))]
    VersionQueryFailed { code: AmfResultCode },

    #[error("AMF runtime too old: found {found_major}.{found_minor}, need {need_major}.{need_minor}")]
    VersionTooOld {
        found_major: u16,
        found_minor: u16,
        need_major: u16,
        need_minor: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amf::ffi::AMF_OUT_OF_RANGE;

    #[test]
    fn set_failed_display_carries_field_value_and_code() {
        let err = PropertyError::SetFailed {
            field: "target_bitrate",
            value: "6000000".to_string(),
            code: AMF_OUT_OF_RANGE,
        };
        let msg = err.to_string();
        assert!(msg.contains("target_bitrate"));
        assert!(msg.contains("6000000"));
        assert!(msg.contains("AMF_OUT_OF_RANGE"));
        assert!(msg.contains("code 5"));
    }

    #[test]
    fn not_implemented_display() {
        let err = PropertyError::NotImplemented {
            field: "slice_control_size",
        };
        assert_eq!(
            err.to_string(),
            "slice_control_size: not implemented for this codec profile"
        );
    }

    #[test]
    fn unknown_native_value_display() {
        let err = PropertyError::UnknownNativeValue {
            field: "usage",
            value: 42,
        };
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn runtime_load_error_display() {
        let err = RuntimeLoadError::LibraryNotFound("libamfrt64.so.1".to_string());
        assert!(err.to_string().contains("libamfrt64.so.1"));
    }
}
