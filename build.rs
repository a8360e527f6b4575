use std::{env, path::Path, process::Command};

const PLUGIN_FILE_NAME: [&str; 2] = ["compute_plugin.rs", "marked_plugin.rs"];
const PLUGIN_DIR_PATH: &str = "test-plugin";

fn compile_plugin(out_dir: &Path, name: &str) -> bool {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let mut cmd = Command::new(rustc);
    cmd.arg("-O")
        .arg("--edition=2021")
        .arg("--crate-type=cdylib")
        .arg("-C")
        .arg("panic=abort")
        .arg(format!("{PLUGIN_DIR_PATH}/{name}"))
        .arg("--out-dir")
        .arg(out_dir);
    matches!(cmd.status(), Ok(status) if status.success())
}

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let out_dir = Path::new(&out_dir);
    for name in PLUGIN_FILE_NAME {
        println!("cargo:rerun-if-changed={PLUGIN_DIR_PATH}/{name}");
        if !compile_plugin(out_dir, name) {
            println!("cargo:warning=could not compile the test plugin {name}, tests using it will skip");
        }
    }
    println!("cargo:rustc-env=PLUGIN_FIXTURE_DIR={}", out_dir.display());
}
