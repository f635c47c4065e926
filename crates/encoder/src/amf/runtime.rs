//! Dynamic loader for the AMF runtime library.
//!
//! The AMF runtime ships with the AMD driver as a shared library
//! (`amfrt64.dll` / `libamfrt64.so.1`) and is bound at process runtime via
//! `libloading`, so the engine starts -- and fails gracefully -- on machines
//! without the driver installed.
//!
//! Reference: AMD AMF SDK -- `core/Factory.h` (`AMFQueryVersion`,
//! `AMFInit`).

use std::ffi::c_void;
use std::fmt;

use libloading::Library;
use tracing::{debug, info};

use crate::error::RuntimeLoadError;

/// Minimum runtime version this crate targets.
pub const AMF_VERSION_MAJOR: u16 = 1;
pub const AMF_VERSION_MINOR: u16 = 4;

/// Candidate library names, probed in order.
#[cfg(target_os = "windows")]
const CANDIDATES: &[&str] = &["amfrt64.dll"];
#[cfg(not(target_os = "windows"))]
const CANDIDATES: &[&str] = &["libamfrt64.so.1", "libamfrt64.so"];

/// `AMFQueryVersion(amf_uint64* pVersion)`.
type QueryVersionFn = unsafe extern "C" fn(*mut u64) -> i32;

/// `AMFInit(amf_uint64 version, AMFFactory** ppFactory)`.
type InitFn = unsafe extern "C" fn(u64, *mut *mut c_void) -> i32;

/// Split a packed AMF version into (major, minor, submajor, subminor).
pub fn unpack_version(version: u64) -> (u16, u16, u16, u16) {
    (
        (version >> 48) as u16,
        (version >> 32) as u16,
        (version >> 16) as u16,
        version as u16,
    )
}

/// The loaded AMF runtime.
///
/// Loading verifies both entry points resolve and that the installed
/// runtime is new enough. Creating the factory and the encoder component
/// from it is the session owner's job, not this layer's.
pub struct AmfLibrary {
    _lib: Library,
    version: u64,
}

impl fmt::Debug for AmfLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor, submajor, subminor) = unpack_version(self.version);
        f.debug_struct("AmfLibrary")
            .field(
                "version",
                &format_args!("{major}.{minor}.{submajor}.{subminor}"),
            )
            .finish()
    }
}

impl AmfLibrary {
    /// Probe the candidate library names and bind the runtime.
    pub fn load() -> Result<Self, RuntimeLoadError> {
        let mut last_err = String::new();
        for name in CANDIDATES {
            debug!(name, "probing AMF runtime");
            // SAFETY: loading the vendor runtime executes its init hooks;
            // there is no safer way to bind a driver-shipped library.
            match unsafe { Library::new(name) } {
                Ok(lib) => return Self::from_library(lib),
                Err(e) => last_err = e.to_string(),
            }
        }
        Err(RuntimeLoadError::LibraryNotFound(last_err))
    }

    fn from_library(lib: Library) -> Result<Self, RuntimeLoadError> {
        // SAFETY: symbol names and signatures match the AMF SDK headers.
        let query_version = unsafe {
            lib.get::<QueryVersionFn>(b"AMFQueryVersion\0")
                .map_err(|_| RuntimeLoadError::SymbolNotFound("AMFQueryVersion".to_string()))?
        };
        // Resolved now so a broken installation fails at load, not at
        // session creation.
        unsafe {
            lib.get::<InitFn>(b"AMFInit\0")
                .map_err(|_| RuntimeLoadError::SymbolNotFound("AMFInit".to_string()))?;
        }

        let mut version: u64 = 0;
        // SAFETY: `version` outlives the call; the function only writes
        // through the pointer.
        let code = unsafe { query_version(&mut version) };
        if code != 0 {
            return Err(RuntimeLoadError::VersionQueryFailed { code });
        }

        let (major, minor, submajor, subminor) = unpack_version(version);
        if (major, minor) < (AMF_VERSION_MAJOR, AMF_VERSION_MINOR) {
            return Err(RuntimeLoadError::VersionTooOld {
                found_major: major,
                found_minor: minor,
                need_major: AMF_VERSION_MAJOR,
                need_minor: AMF_VERSION_MINOR,
            });
        }

        info!(
            version = %format_args!("{major}.{minor}.{submajor}.{subminor}"),
            "AMF runtime loaded"
        );
        drop(query_version);
        Ok(Self {
            _lib: lib,
            version,
        })
    }

    /// Packed runtime version as reported by `AMFQueryVersion`.
    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_unpacking() {
        let packed: u64 = (1u64 << 48) | (4u64 << 32) | (29u64 << 16) | 0;
        assert_eq!(unpack_version(packed), (1, 4, 29, 0));
    }

    #[test]
    #[ignore] // Requires an AMD driver with the AMF runtime installed
    fn amf_runtime_loads() {
        let lib = AmfLibrary::load().expect("AMF runtime not available");
        let (major, minor, _, _) = unpack_version(lib.version());
        assert!((major, minor) >= (AMF_VERSION_MAJOR, AMF_VERSION_MINOR));
        let dbg = format!("{lib:?}");
        assert!(dbg.contains("AmfLibrary"));
    }
}
