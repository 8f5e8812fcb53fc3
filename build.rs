//! Link a CBLAS provider for the `blas` feature.
//!
//! `SYMMAT_BLAS_LIB` names the library (default `openblas`) and
//! `OPENBLAS_LIB_DIR` adds a search directory. Without a directory, macOS
//! targets search the Homebrew prefixes.

const HOMEBREW_PREFIXES: [&str; 2] = [
    "/opt/homebrew/opt/openblas/lib",
    "/usr/local/opt/openblas/lib",
];

fn main() {
    println!("cargo:rerun-if-env-changed=OPENBLAS_LIB_DIR");
    println!("cargo:rerun-if-env-changed=SYMMAT_BLAS_LIB");

    if std::env::var_os("CARGO_FEATURE_BLAS").is_none() {
        return;
    }

    match std::env::var("OPENBLAS_LIB_DIR") {
        Ok(dir) => println!("cargo:rustc-link-search=native={dir}"),
        Err(_) => {
            // cfg!(target_os) here would describe the build host.
            if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("macos") {
                for dir in HOMEBREW_PREFIXES {
                    println!("cargo:rustc-link-search=native={dir}");
                }
            }
        }
    }

    let lib = std::env::var("SYMMAT_BLAS_LIB").unwrap_or_else(|_| "openblas".to_string());
    println!("cargo:rustc-link-lib={lib}");
}
