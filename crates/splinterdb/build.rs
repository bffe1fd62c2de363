//! Forwards the rpath of libsplinterdb to this crate's test and bench
//! binaries. `splinterdb-sys` publishes the directory through its `links`
//! metadata; link args from a dependency's build script are not inherited.

fn main() {
    println!("cargo:rerun-if-env-changed=DEP_SPLINTERDB_LIB_DIR");
    if let Some(lib_dir) = std::env::var_os("DEP_SPLINTERDB_LIB_DIR") {
        println!(
            "cargo:rustc-link-arg=-Wl,-rpath,{}",
            std::path::Path::new(&lib_dir).display()
        );
    }
}
