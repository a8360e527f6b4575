//! Bundle package backend.
//!
//! A bundle is a structured, directory-like package that carries its
//! executable inside a conventional layout rather than being a loadable
//! file itself. The canonical shape is `Name.bundle/Contents/MacOS/Name`;
//! flattened layouts that keep the executable next to the package root are
//! accepted as well. The nested executable is loaded with the same
//! lazy-binding native loader the flat backend uses.

use crate::{backend::FLAT_SUFFIXES, flat};
use libloading::Library;
use std::{
    ffi::CString,
    path::{Path, PathBuf},
};

/// A loaded bundle package.
pub(crate) struct BundlePackage {
    exec: Library,
}

impl BundlePackage {
    /// Attempts to open `path` as a bundle package.
    ///
    /// The path must name an existing directory containing a locatable
    /// executable; anything else yields `None`. Bundle acquisition has no
    /// reportable failure mode of its own.
    pub(crate) fn open(path: &Path) -> Option<Self> {
        if !path.is_dir() {
            return None;
        }
        let exec_path = locate_executable(path)?;
        #[cfg(feature = "log")]
        log::debug!(
            "[Open] bundle {} resolved its executable to {}",
            path.display(),
            exec_path.display()
        );
        let exec = flat::load_native(&exec_path)?;
        Some(BundlePackage { exec })
    }

    /// Resolves `name` through the bundle executable's symbol table.
    ///
    /// The bundle lookup accepts the full text type directly: a name that
    /// has no C string form is reported as not-found, never as an encoding
    /// error.
    pub(crate) fn get(&self, name: &str) -> Option<*const ()> {
        let cname = CString::new(name).ok()?;
        flat::resolve(&self.exec, &cname)
    }

    /// Abandons the native handle without closing it.
    pub(crate) fn leak(self) {
        core::mem::forget(self.exec);
    }
}

/// Finds the executable inside a bundle directory.
///
/// Candidates are probed in order for the package stem `s`:
/// `Contents/MacOS/s`, `Contents/MacOS/s.<ext>`, `s.<ext>`, and `s`, where
/// `<ext>` ranges over the flat-library suffixes. The first existing file
/// wins.
fn locate_executable(dir: &Path) -> Option<PathBuf> {
    let stem = dir.file_stem()?.to_str()?;
    let nested = dir.join("Contents").join("MacOS");
    let mut candidates = vec![nested.join(stem)];
    for suffix in FLAT_SUFFIXES {
        candidates.push(nested.join(format!("{stem}.{suffix}")));
    }
    for suffix in FLAT_SUFFIXES {
        candidates.push(dir.join(format!("{stem}.{suffix}")));
    }
    candidates.push(dir.join(stem));
    candidates.into_iter().find(|candidate| candidate.is_file())
}
