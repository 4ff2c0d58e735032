use std::env;

/// Linker arguments for a native kernel-mode image. Only applies when the
/// driver is actually built for Windows; on other hosts the crate is empty.
fn main() {
    println!("cargo:rerun-if-env-changed=GIVEIO_WDK_LIB_DIR");

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        return;
    }

    // e.g. C:\Program Files (x86)\Windows Kits\10\Lib\10.0.22621.0\km\x64
    if let Ok(dir) = env::var("GIVEIO_WDK_LIB_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
    }

    let entry = match env::var("CARGO_CFG_TARGET_ARCH").as_deref() {
        Ok("x86") => "DriverEntry@8",
        _ => "DriverEntry",
    };

    for arg in [
        "/DRIVER",
        "/SUBSYSTEM:NATIVE",
        "/NODEFAULTLIB",
        "/MANIFEST:NO",
        "/OPT:REF,ICF",
    ] {
        println!("cargo:rustc-link-arg-cdylib={arg}");
    }
    println!("cargo:rustc-link-arg-cdylib=/ENTRY:{entry}");
}
