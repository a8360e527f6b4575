//! Flat dynamic library backend.
//!
//! A flat library is a single shared-object file (`.so`, `.dylib`, `.dll`)
//! opened through the platform loader as one unit. Symbols are bound
//! lazily; the loader only resolves an export when it is first requested.

use crate::{Result, error::path_encoding_error, error::symbol_encoding_error};
use cfg_if::cfg_if;
use core::ffi::CStr;
use libloading::Library;
use std::{ffi::CString, path::Path};

/// A loaded flat library.
pub(crate) struct FlatLibrary {
    lib: Library,
}

impl FlatLibrary {
    /// Attempts to open `path` as a flat library.
    ///
    /// The path must be representable in the native loader's text encoding;
    /// a violation is reported as [`Error::PathEncoding`](crate::Error) and
    /// aborts the open. A path the loader rejects for any other reason
    /// (missing file, wrong format) yields `Ok(None)` so the caller can
    /// fall back to the next backend.
    pub(crate) fn open(path: &Path) -> Result<Option<Self>> {
        verify_loader_encoding(path)?;
        Ok(load_native(path).map(|lib| FlatLibrary { lib }))
    }

    /// Resolves `name` through the library's symbol table.
    ///
    /// The name is converted to the loader's C string form first; an
    /// unrepresentable name is a distinct, reportable error rather than a
    /// lookup miss.
    pub(crate) fn get(&self, name: &str) -> Result<Option<*const ()>> {
        let cname = CString::new(name).map_err(|_| {
            symbol_encoding_error(format!("symbol name {name:?} contains an interior NUL"))
        })?;
        Ok(resolve(&self.lib, &cname))
    }

    /// Abandons the native handle without closing it.
    ///
    /// The image stays resident for the remaining life of the process.
    pub(crate) fn leak(self) {
        core::mem::forget(self.lib);
    }
}

cfg_if! {
    if #[cfg(unix)] {
        /// Opens `path` with the platform loader, requesting lazy symbol
        /// binding. Shared with the bundle backend, which loads its nested
        /// executable the same way. Returns `None` when the loader rejects
        /// the path.
        pub(crate) fn load_native(path: &Path) -> Option<Library> {
            use libloading::os::unix::{Library as OsLibrary, RTLD_LAZY, RTLD_LOCAL};
            match unsafe { OsLibrary::open(Some(path), RTLD_LAZY | RTLD_LOCAL) } {
                Ok(lib) => Some(Library::from(lib)),
                Err(_err) => {
                    #[cfg(feature = "log")]
                    log::debug!("[Open] native loader rejected {}: {_err}", path.display());
                    None
                }
            }
        }
    } else {
        /// Opens `path` with the platform loader. Windows resolves imports
        /// at load time; there is no lazy-binding mode to request. Returns
        /// `None` when the loader rejects the path.
        pub(crate) fn load_native(path: &Path) -> Option<Library> {
            match unsafe { Library::new(path) } {
                Ok(lib) => Some(lib),
                Err(_err) => {
                    #[cfg(feature = "log")]
                    log::debug!("[Open] native loader rejected {}: {_err}", path.display());
                    None
                }
            }
        }
    }
}

/// Looks up `name` in `lib`, returning the exported address if present.
pub(crate) fn resolve(lib: &Library, name: &CStr) -> Option<*const ()> {
    let addr = match unsafe { lib.get::<*mut core::ffi::c_void>(name.to_bytes_with_nul()) } {
        Ok(sym) => *sym as *const (),
        Err(_err) => {
            #[cfg(feature = "log")]
            log::trace!("[Resolve] {name:?} not found: {_err}");
            return None;
        }
    };
    if addr.is_null() { None } else { Some(addr) }
}

cfg_if! {
    if #[cfg(unix)] {
        /// Checks that `path` survives conversion to the C string form the
        /// loader consumes.
        fn verify_loader_encoding(path: &Path) -> Result<()> {
            use std::os::unix::ffi::OsStrExt;
            if path.as_os_str().as_bytes().contains(&0) {
                return Err(path_encoding_error(format!(
                    "path {} contains an interior NUL",
                    path.display()
                )));
            }
            Ok(())
        }
    } else {
        /// Checks that `path` survives conversion to the wide string form
        /// the loader consumes.
        fn verify_loader_encoding(path: &Path) -> Result<()> {
            use std::os::windows::ffi::OsStrExt;
            if path.as_os_str().encode_wide().any(|unit| unit == 0) {
                return Err(path_encoding_error(format!(
                    "path {} contains an interior NUL",
                    path.display()
                )));
            }
            Ok(())
        }
    }
}
