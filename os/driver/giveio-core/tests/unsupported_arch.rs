//! Building for an architecture without a known trap frame layout must fail.
//!
//! Needs the `aarch64-unknown-none` target:
//!
//! ```text
//! rustup target add aarch64-unknown-none
//! cargo test -p giveio-core --test unsupported_arch -- --ignored
//! ```

use std::process::Command;

#[test]
#[ignore = "needs the aarch64-unknown-none target installed"]
fn aarch64_build_is_refused() {
    let out = Command::new(env!("CARGO"))
        .args([
            "check",
            "-p",
            "giveio-core",
            "--lib",
            "--target",
            "aarch64-unknown-none",
            "--target-dir",
        ])
        .arg(concat!(env!("CARGO_TARGET_TMPDIR"), "/unsupported-arch"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run cargo");

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(!out.status.success(), "build succeeded:\n{stderr}");
    assert!(
        stderr.contains("no trap frame layout is known for this target architecture"),
        "{stderr}"
    );
}
