//! Records the compiler version for the client's user agent

fn main() {
    let version = match rustc_version::version() {
        Ok(version) => format!("{}.{}.{}", version.major, version.minor, version.patch),
        Err(e) => {
            println!("cargo:warning=could not read the rustc version: {}", e);
            env!("CARGO_PKG_RUST_VERSION").to_string()
        }
    };

    println!("cargo:rustc-env=SG_RUSTC_VERSION={}", version);
    println!("cargo:rerun-if-env-changed=RUSTC");
}
