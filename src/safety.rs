//! Unload-safety tracking.
//!
//! Some binaries register classes and methods with a managed object-model
//! runtime when they are loaded; the runtime caches that metadata keyed by
//! load address for the life of the process. Unloading such an image leaves
//! the cache pointing at unmapped memory even though the dynamic loader
//! itself would accept the unload request. Images that have registered
//! themselves carry a recognizable metadata section, so the hazard can be
//! detected at the binary-format level without executing anything.
//!
//! The probe runs once per handle, on the first successfully resolved
//! symbol: the address is reverse-mapped to its owning image and the image
//! is searched for the marker section. The verdict is latched for the rest
//! of the handle's life.

use cfg_if::cfg_if;
use std::path::{Path, PathBuf};

use object::{Object, ObjectSection};

/// Section name that marks an image as registered with the managed runtime.
///
/// Mach-O images place it in a `__DATA`-family segment; on formats without
/// segment names the section name alone identifies the marker.
pub const RUNTIME_MARKER_SECTION: &str = "__objc_imageinfo";

/// Whether a handle's module may ever be unloaded.
///
/// The status moves out of [`Unavailable`](SafetyStatus::Unavailable) at
/// most once, and only to one of the two terminal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyStatus {
    /// No resolved symbol's owning image has been inspected yet.
    Unavailable,
    /// The owning image registered itself with the managed runtime;
    /// unloading it would corrupt the runtime's process-wide caches.
    RuntimePresent,
    /// The owning image carries no runtime marker; unloading is safe.
    RuntimeAbsent,
}

cfg_if! {
    if #[cfg(unix)] {
        /// Reverse-maps `addr` to the filesystem path of its owning image.
        ///
        /// Returns `None` when the platform cannot attribute the address to
        /// a loaded module.
        pub(crate) fn image_of_addr(addr: *const ()) -> Option<PathBuf> {
            use std::os::unix::ffi::OsStrExt;
            let mut info: libc::Dl_info = unsafe { core::mem::zeroed() };
            if unsafe { libc::dladdr(addr.cast(), &mut info) } == 0 || info.dli_fname.is_null() {
                return None;
            }
            let fname = unsafe { core::ffi::CStr::from_ptr(info.dli_fname) };
            Some(PathBuf::from(std::ffi::OsStr::from_bytes(fname.to_bytes())))
        }
    } else {
        /// Reverse-maps `addr` to the filesystem path of its owning image.
        ///
        /// Returns `None` when the platform cannot attribute the address to
        /// a loaded module.
        pub(crate) fn image_of_addr(addr: *const ()) -> Option<PathBuf> {
            use std::os::windows::ffi::OsStringExt;
            use windows_sys::Win32::Foundation::{HMODULE, MAX_PATH};
            use windows_sys::Win32::System::LibraryLoader::{
                GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS,
                GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT, GetModuleFileNameW,
                GetModuleHandleExW,
            };
            let mut module: HMODULE = core::ptr::null_mut();
            let found = unsafe {
                GetModuleHandleExW(
                    GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS
                        | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
                    addr as *const u16,
                    &mut module,
                )
            };
            if found == 0 || module.is_null() {
                return None;
            }
            let mut buf = vec![0u16; MAX_PATH as usize];
            loop {
                let len =
                    unsafe { GetModuleFileNameW(module, buf.as_mut_ptr(), buf.len() as u32) }
                        as usize;
                if len == 0 {
                    return None;
                }
                if len < buf.len() {
                    return Some(PathBuf::from(std::ffi::OsString::from_wide(&buf[..len])));
                }
                buf.resize(buf.len() * 4, 0);
            }
        }
    }
}

/// Searches the image at `path` for the managed-runtime marker section.
///
/// Returns `Some(true)` when the marker is present, `Some(false)` when the
/// image parses cleanly without it, and `None` when the file cannot be read
/// or is not a recognizable object format. Callers that want to decide
/// unload policy before loading a module can use this directly.
pub fn image_declares_runtime(path: &Path) -> Option<bool> {
    let data = std::fs::read(path).ok()?;
    let image = object::File::parse(&*data).ok()?;
    for section in image.sections() {
        if section.name().ok() != Some(RUNTIME_MARKER_SECTION) {
            continue;
        }
        // Mach-O scopes the marker to the data segment; other formats have
        // no segment names and the section name is decisive.
        match section.segment_name() {
            Ok(Some(segment)) if !segment.starts_with("__DATA") => continue,
            _ => return Some(true),
        }
    }
    Some(false)
}
