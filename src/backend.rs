//! Backend selection.
//!
//! Two loading strategies exist: the flat-library loader for single
//! shared-object files and the bundle loader for directory-like packages.
//! Selection is a pure decision over the path's classification plus a
//! fallback attempt; each backend's data is only valid for its own tag, so
//! the live handle is a tagged variant rather than a dispatch hierarchy.

use crate::{Result, bundle::BundlePackage, flat::FlatLibrary};
use std::path::Path;

/// Suffixes that classify a path as a flat dynamic library, matched
/// case-insensitively.
pub(crate) const FLAT_SUFFIXES: [&str; 3] = ["so", "dylib", "dll"];

/// Which native loading strategy claimed the module at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// No backend claimed the module; every lookup yields not-found.
    None,
    /// A flat dynamic library, loaded as a single file.
    FlatLibrary,
    /// A structured bundle package with a nested executable.
    BundlePackage,
}

/// The live loading backend of a handle. Set exactly once at open.
pub(crate) enum Backend {
    None,
    Flat(FlatLibrary),
    Bundle(BundlePackage),
}

impl Backend {
    pub(crate) fn kind(&self) -> BackendKind {
        match self {
            Backend::None => BackendKind::None,
            Backend::Flat(_) => BackendKind::FlatLibrary,
            Backend::Bundle(_) => BackendKind::BundlePackage,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        !matches!(self, Backend::None)
    }

    /// Abandons the native references without releasing them.
    pub(crate) fn leak(self) {
        match self {
            Backend::None => {}
            Backend::Flat(lib) => lib.leak(),
            Backend::Bundle(bundle) => bundle.leak(),
        }
    }
}

/// Decides which backend loads `path`.
///
/// Flat-suffixed paths try the flat loader first and short-circuit on
/// success; everything else, including flat attempts the native loader
/// rejected, falls through to the bundle loader. A path neither backend
/// accepts leaves the selection at `Backend::None`: the open is a silent
/// no-op failure and every later call sees a defined not-found result.
/// Only a path-encoding violation escalates, aborting the open outright.
pub(crate) fn select(path: &Path) -> Result<Backend> {
    if has_flat_suffix(path) {
        if let Some(lib) = FlatLibrary::open(path)? {
            #[cfg(feature = "log")]
            log::debug!("[Open] {} claimed by the flat-library backend", path.display());
            return Ok(Backend::Flat(lib));
        }
    }
    if let Some(bundle) = BundlePackage::open(path) {
        #[cfg(feature = "log")]
        log::debug!("[Open] {} claimed by the bundle backend", path.display());
        return Ok(Backend::Bundle(bundle));
    }
    #[cfg(feature = "log")]
    log::debug!("[Open] no backend claimed {}", path.display());
    Ok(Backend::None)
}

fn has_flat_suffix(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| FLAT_SUFFIXES.iter().any(|s| ext.eq_ignore_ascii_case(s)))
}
