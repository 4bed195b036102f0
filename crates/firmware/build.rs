use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only run linker script setup for hardware builds. Build scripts see the
    // package's features through the environment, not through cfg.
    if env::var_os("CARGO_FEATURE_HARDWARE").is_some() {
        // Put `memory.x` in our output directory and ensure it's on the linker search path.
        let out = PathBuf::from(env::var_os("OUT_DIR").ok_or("OUT_DIR not set")?);
        File::create(out.join("memory.x"))?.write_all(include_bytes!("memory.x"))?;

        println!("cargo:rustc-link-search={}", out.display());
        println!("cargo:rustc-link-arg-bin=firmware=-Tlink.x");
        println!("cargo:rustc-link-arg-bin=firmware=-Tdefmt.x");
        println!("cargo:rerun-if-changed=memory.x");
    }

    println!("cargo:rerun-if-changed=build.rs");
    Ok(())
}
