//! # plugin_loader
//! A `safe`, `lightweight`, cross-platform library for loading native plugin
//! modules, resolving their exported symbols, and deciding at runtime
//! whether a module can ever be safely unloaded again.
//!
//! ## Usage
//! A module is acquired through one of two backends: a flat dynamic library
//! (`.so`, `.dylib`, `.dll`) loaded as a single file with lazy symbol
//! binding, or a structured bundle package whose executable lives inside a
//! directory layout. Open classifies the path, tries the flat loader first,
//! and falls back to the bundle loader; if neither claims the module the
//! handle stays empty and every lookup returns not-found.
//!
//! The first successfully resolved symbol is traced back to its owning
//! image, which is probed for managed-runtime metadata (see [`safety`]).
//! Images that registered themselves with such a runtime must never be
//! unloaded; [`PluginLibrary::close`] refuses and the native references are
//! deliberately leaked instead.
//!
//! ## Example
//! ```no_run
//! use plugin_loader::PluginLibrary;
//!
//! # fn main() -> plugin_loader::Result<()> {
//! let mut plugin = PluginLibrary::open("plugins/audio.so")?;
//! if let Some(compute) = (unsafe { plugin.get::<extern "C" fn(f64) -> f64>("compute") })? {
//!     println!("{}", compute(0.42));
//! }
//! if plugin.can_unload() {
//!     plugin.close()?;
//! }
//! # Ok(())
//! # }
//! ```

mod backend;
mod bundle;
mod error;
mod flat;
pub mod safety;

use core::{
    cell::{Cell, RefCell},
    fmt::Debug,
    marker::PhantomData,
    ops,
};
use std::path::{Path, PathBuf};

use backend::Backend;
use delegate::delegate;
use hashbrown::HashMap;

pub use backend::BackendKind;
pub use error::Error;
pub use safety::SafetyStatus;

use crate::error::unload_refused_error;

pub type Result<T> = core::result::Result<T, Error>;

/// A handle to a native plugin module.
///
/// The handle owns its native references exclusively and releases them on
/// [`close`](PluginLibrary::close) or drop, unless the unload-safety latch
/// forbids it, in which case the references are deliberately abandoned and
/// the image stays resident.
///
/// One handle is not meant for concurrent mutation: `open`, `get`, and
/// `close` on the same handle must be serialized by the caller. The type is
/// `Send` but not `Sync`; independent handles are independent and may live
/// on different threads.
pub struct PluginLibrary {
    /// Which loading strategy claimed the module.
    backend: Backend,
    /// One-way unload-safety latch.
    safety: Cell<SafetyStatus>,
    /// Memoized resolutions.
    resolved: RefCell<HashMap<Box<str>, *const ()>>,
    /// The path the module was opened from.
    path: PathBuf,
}

// Resolved addresses point into an image the handle keeps resident, so the
// handle may migrate between threads.
unsafe impl Send for PluginLibrary {}

impl PluginLibrary {
    /// Attempts to load the module at `path`.
    ///
    /// Failure to acquire a backend is not an error: the returned handle is
    /// simply empty ([`BackendKind::None`]) and every resolution yields
    /// not-found. The only reportable failure is a path that cannot be
    /// represented in the native loader's text encoding.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(PluginLibrary {
            backend: backend::select(path)?,
            safety: Cell::new(SafetyStatus::Unavailable),
            resolved: RefCell::new(HashMap::new()),
            path: path.to_path_buf(),
        })
    }

    delegate! {
        to self.backend {
            /// Returns which backend claimed the module at open time.
            pub fn kind(&self) -> BackendKind;
            /// Whether any backend claimed the module.
            pub fn is_open(&self) -> bool;
        }
    }

    /// Returns the path the module was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves an exported symbol to its raw address.
    ///
    /// Absence is an expected outcome, reported as `Ok(None)`. Repeated
    /// lookups of the same name return the identical address. The first
    /// successful resolution may latch the handle's
    /// [`SafetyStatus`]; see [`safety`].
    pub fn get_ptr(&self, name: &str) -> Result<Option<*const ()>> {
        if let Some(&addr) = self.resolved.borrow().get(name) {
            return Ok(Some(addr));
        }
        let addr = match &self.backend {
            Backend::None => None,
            Backend::Flat(lib) => lib.get(name)?,
            Backend::Bundle(bundle) => bundle.get(name),
        };
        if let Some(addr) = addr {
            self.resolved.borrow_mut().insert(name.into(), addr);
            self.inspect_resolved(addr);
        }
        Ok(addr)
    }

    /// Resolves an exported symbol as a typed [`Symbol`].
    ///
    /// The name is interpreted as-is; no mangling is done.
    ///
    /// # Safety
    /// Users of this API must specify the correct type of the function or
    /// variable being resolved.
    ///
    /// # Examples
    /// ```no_run
    /// # let plugin = plugin_loader::PluginLibrary::open("a.so").unwrap();
    /// unsafe {
    ///     let compute: plugin_loader::Symbol<extern "C" fn() -> i32> =
    ///         plugin.get("compute").unwrap().unwrap();
    ///     compute();
    /// }
    /// ```
    pub unsafe fn get<'lib, T>(&'lib self, name: &str) -> Result<Option<Symbol<'lib, T>>> {
        Ok(self.get_ptr(name)?.map(|ptr| Symbol {
            ptr,
            pd: PhantomData,
        }))
    }

    /// Returns the current unload-safety status.
    #[inline]
    pub fn safety_status(&self) -> SafetyStatus {
        self.safety.get()
    }

    /// Whether the module may be unloaded.
    ///
    /// `false` is permanent: once a resolved symbol's image turns out to
    /// carry managed-runtime metadata, no later call flips this back.
    /// Exposed standalone so a caller can pick its own policy before
    /// forcing a [`close`](PluginLibrary::close) attempt.
    #[inline]
    pub fn can_unload(&self) -> bool {
        self.safety.get() != SafetyStatus::RuntimePresent
    }

    /// Releases the native references.
    ///
    /// When [`can_unload`](PluginLibrary::can_unload) is `false` the call
    /// fails with [`Error::UnloadRefused`] and nothing is released; the
    /// handle stays valid and a retry fails the same way. On success the
    /// handle is left empty: later lookups return not-found and later
    /// closes succeed trivially.
    pub fn close(&mut self) -> Result<()> {
        if !self.can_unload() {
            return Err(unload_refused_error(format!(
                "{} registered with the managed runtime and must stay resident",
                self.path.display()
            )));
        }
        self.resolved.get_mut().clear();
        let released = core::mem::replace(&mut self.backend, Backend::None);
        #[cfg(feature = "log")]
        if released.is_open() {
            log::debug!("[Close] released {}", self.path.display());
        }
        drop(released);
        Ok(())
    }

    /// Latches the unload-safety status from a freshly resolved address.
    ///
    /// Runs only while the status is undecided; the decision reflects the
    /// first resolved symbol whose owning image could be inspected and is
    /// never revisited.
    fn inspect_resolved(&self, addr: *const ()) {
        if self.safety.get() != SafetyStatus::Unavailable {
            return;
        }
        let Some(image) = safety::image_of_addr(addr) else {
            return;
        };
        match safety::image_declares_runtime(&image) {
            Some(true) => {
                #[cfg(feature = "log")]
                log::debug!(
                    "[Safety] {} carries managed-runtime metadata; unload disabled",
                    image.display()
                );
                self.safety.set(SafetyStatus::RuntimePresent);
            }
            Some(false) => self.safety.set(SafetyStatus::RuntimeAbsent),
            // Image unreadable; leave the decision to a later resolution.
            None => {}
        }
    }
}

impl Drop for PluginLibrary {
    fn drop(&mut self) {
        if !self.can_unload() {
            #[cfg(feature = "log")]
            log::warn!(
                "[Close] leaking the native references of {}; the image must stay resident",
                self.path.display()
            );
            let backend = core::mem::replace(&mut self.backend, Backend::None);
            backend.leak();
        }
    }
}

impl Debug for PluginLibrary {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PluginLibrary")
            .field("path", &self.path)
            .field("backend", &self.kind())
            .field("safety", &self.safety.get())
            .finish()
    }
}

/// A symbol resolved from a plugin module.
///
/// Borrows the handle, so the module cannot be closed while the symbol is
/// alive.
#[derive(Debug, Clone)]
pub struct Symbol<'lib, T: 'lib> {
    ptr: *const (),
    pd: PhantomData<&'lib T>,
}

impl<'lib, T> ops::Deref for Symbol<'lib, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*(&self.ptr as *const *const () as *const T) }
    }
}

impl<'lib, T> Symbol<'lib, T> {
    /// Extracts the raw address, discarding the borrow of the handle.
    pub fn into_raw(self) -> *const () {
        self.ptr
    }
}
