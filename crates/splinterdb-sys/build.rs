//! Link setup for libsplinterdb.
//!
//! The engine is built and installed out of band (`make && sudo make install`
//! inside the vendored `splinterdb/` checkout). Point `SPLINTERDB_LIB_DIR` at
//! a different directory to link against a non-installed build, and
//! `SPLINTERDB_INCLUDE_DIR` at its headers for the `verify-layout` check.

use std::env;
use std::path::PathBuf;

const DEFAULT_LIB_DIR: &str = "/usr/local/lib";
const DEFAULT_INCLUDE_DIR: &str = "/usr/local/include";

fn main() {
    println!("cargo:rerun-if-env-changed=SPLINTERDB_LIB_DIR");
    println!("cargo:rustc-check-cfg=cfg(splinterdb_layout)");

    #[cfg(feature = "verify-layout")]
    generate_layout_bindings();

    let lib_dir = env::var_os("SPLINTERDB_LIB_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LIB_DIR));

    if !lib_dir.join("libsplinterdb.so").exists() {
        // Declarations alone still compile; anything calling into them will
        // fail at link time with the missing symbols.
        println!(
            "cargo:warning=libsplinterdb.so not found in {}; set SPLINTERDB_LIB_DIR",
            lib_dir.display()
        );
        return;
    }

    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    // Let test binaries find the shared object without LD_LIBRARY_PATH
    println!("cargo:rustc-link-arg=-Wl,-rpath,{}", lib_dir.display());
    println!("cargo:rustc-link-lib=dylib=splinterdb");
    println!("cargo:lib_dir={}", lib_dir.display());
}

/// Run bindgen over the installed headers so `src/lib.rs` can assert its
/// declarations against the generated ones.
#[cfg(feature = "verify-layout")]
fn generate_layout_bindings() {
    println!("cargo:rerun-if-env-changed=SPLINTERDB_INCLUDE_DIR");
    println!("cargo:rerun-if-changed=wrapper.h");

    let include_dir = env::var_os("SPLINTERDB_INCLUDE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INCLUDE_DIR));

    if !include_dir.join("splinterdb/splinterdb.h").exists() {
        println!(
            "cargo:warning=splinterdb headers not found in {}; layout check skipped",
            include_dir.display()
        );
        return;
    }

    let bindings = bindgen::Builder::default()
        .header("wrapper.h")
        .clang_arg("-DSPLINTERDB_PLATFORM_DIR=platform_linux")
        .clang_arg(format!("-I{}", include_dir.display()))
        .allowlist_type("splinterdb.*")
        .allowlist_type("data_config")
        .allowlist_var("SPLINTERDB.*")
        .allowlist_var(".*_SIZE")
        .layout_tests(false)
        .parse_callbacks(Box::new(bindgen::CargoCallbacks::new()))
        .generate()
        .expect("bindgen failed on the splinterdb headers");

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    bindings
        .write_to_file(out_dir.join("bindings.rs"))
        .expect("failed to write bindings.rs");
    println!("cargo:rustc-cfg=splinterdb_layout");
}
