mod common;

use common::{fixture, make_bundle};
use plugin_loader::{BackendKind, Error, PluginLibrary};
use rstest::rstest;

#[rstest]
fn unclaimed_path_is_a_silent_noop() {
    let dir = tempfile::tempdir().unwrap();
    let mut plugin = PluginLibrary::open(dir.path().join("missing.dylib")).unwrap();
    assert_eq!(plugin.kind(), BackendKind::None);
    assert!(!plugin.is_open());
    assert!(plugin.get_ptr("anything").unwrap().is_none());
    assert!(plugin.can_unload());
    plugin.close().unwrap();
}

#[rstest]
fn flat_suffix_claims_the_flat_backend() {
    let Some(path) = fixture("compute_plugin") else {
        eprintln!("Skipping test: fixture compute_plugin not built");
        return;
    };
    let plugin = PluginLibrary::open(&path).unwrap();
    assert_eq!(plugin.kind(), BackendKind::FlatLibrary);
    assert!(plugin.is_open());
    let compute = unsafe { plugin.get::<extern "C" fn() -> i32>("compute") }
        .unwrap()
        .expect("compute must be exported");
    assert_eq!(compute(), 42);
    assert!(plugin.get_ptr("definitely_absent").unwrap().is_none());
}

#[rstest]
fn suffix_match_is_case_insensitive() {
    let Some(path) = fixture("compute_plugin") else {
        eprintln!("Skipping test: fixture compute_plugin not built");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let upper = dir
        .path()
        .join(format!("PLUGIN{}", std::env::consts::DLL_SUFFIX.to_uppercase()));
    std::fs::copy(&path, &upper).unwrap();
    let plugin = PluginLibrary::open(&upper).unwrap();
    assert_eq!(plugin.kind(), BackendKind::FlatLibrary);
}

#[rstest]
fn resolution_is_idempotent() {
    let Some(path) = fixture("compute_plugin") else {
        eprintln!("Skipping test: fixture compute_plugin not built");
        return;
    };
    let plugin = PluginLibrary::open(&path).unwrap();
    let first = plugin.get_ptr("compute").unwrap().unwrap();
    let second = plugin.get_ptr("compute").unwrap().unwrap();
    assert_eq!(first, second);
}

#[rstest]
fn bundle_layout_claims_the_bundle_backend() {
    let Some(exec) = fixture("compute_plugin") else {
        eprintln!("Skipping test: fixture compute_plugin not built");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let bundle = make_bundle(dir.path(), "demo.bundle", &exec);
    let plugin = PluginLibrary::open(&bundle).unwrap();
    assert_eq!(plugin.kind(), BackendKind::BundlePackage);
    let compute = unsafe { plugin.get::<extern "C" fn() -> i32>("compute") }
        .unwrap()
        .expect("compute must be exported");
    assert_eq!(compute(), 42);
}

#[rstest]
fn failed_flat_attempt_falls_back_to_the_bundle_loader() {
    let Some(exec) = fixture("compute_plugin") else {
        eprintln!("Skipping test: fixture compute_plugin not built");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    // A directory with a flat suffix: the flat loader rejects it, the
    // bundle loader claims it.
    let bundle = make_bundle(dir.path(), "weird.so", &exec);
    let plugin = PluginLibrary::open(&bundle).unwrap();
    assert_eq!(plugin.kind(), BackendKind::BundlePackage);
    assert!(plugin.get_ptr("compute").unwrap().is_some());
}

#[rstest]
fn flat_symbol_with_interior_nul_is_an_encoding_error() {
    let Some(path) = fixture("compute_plugin") else {
        eprintln!("Skipping test: fixture compute_plugin not built");
        return;
    };
    let plugin = PluginLibrary::open(&path).unwrap();
    let err = plugin.get_ptr("bad\0name").unwrap_err();
    assert!(matches!(err, Error::SymbolEncoding { .. }));
}

#[rstest]
fn bundle_symbol_with_interior_nul_is_not_found() {
    let Some(exec) = fixture("compute_plugin") else {
        eprintln!("Skipping test: fixture compute_plugin not built");
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let bundle = make_bundle(dir.path(), "demo.bundle", &exec);
    let plugin = PluginLibrary::open(&bundle).unwrap();
    assert!(plugin.get_ptr("bad\0name").unwrap().is_none());
}

#[cfg(unix)]
#[rstest]
fn path_with_interior_nul_fails_to_open() {
    use std::{ffi::OsStr, os::unix::ffi::OsStrExt, path::Path};
    let path = Path::new(OsStr::from_bytes(b"bad\0name.so"));
    let err = PluginLibrary::open(path).unwrap_err();
    assert!(matches!(err, Error::PathEncoding { .. }));
}
