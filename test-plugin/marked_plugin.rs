//! A plugin whose image carries the managed-runtime marker section.

#[no_mangle]
pub extern "C" fn compute() -> i32 {
    7
}

#[no_mangle]
pub extern "C" fn plugin_version() -> u32 {
    2
}

/// Stand-in for the image-info record a managed-runtime registration emits.
#[cfg_attr(
    any(target_os = "macos", target_os = "ios"),
    link_section = "__DATA,__objc_imageinfo"
)]
#[cfg_attr(
    not(any(target_os = "macos", target_os = "ios")),
    link_section = "__objc_imageinfo"
)]
#[no_mangle]
pub static RUNTIME_IMAGE_INFO: [u8; 8] = [0; 8];
