use std::{
    env::consts::{DLL_PREFIX, DLL_SUFFIX},
    fs,
    path::{Path, PathBuf},
};

/// Platform artifact name for a fixture plugin stem.
pub fn artifact_name(stem: &str) -> String {
    format!("{DLL_PREFIX}{stem}{DLL_SUFFIX}")
}

/// Path to a fixture plugin compiled by the build script, or `None` when
/// the fixture could not be built on this toolchain.
pub fn fixture(stem: &str) -> Option<PathBuf> {
    let path = Path::new(env!("PLUGIN_FIXTURE_DIR")).join(artifact_name(stem));
    path.exists().then_some(path)
}

/// Lays out a bundle directory `parent/<dir_name>` whose executable is a
/// copy of `exec` at `Contents/MacOS/<stem>`.
pub fn make_bundle(parent: &Path, dir_name: &str, exec: &Path) -> PathBuf {
    let bundle = parent.join(dir_name);
    let stem = Path::new(dir_name).file_stem().unwrap().to_str().unwrap();
    let exec_dir = bundle.join("Contents").join("MacOS");
    fs::create_dir_all(&exec_dir).unwrap();
    fs::copy(exec, exec_dir.join(stem)).unwrap();
    bundle
}
