// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=POSTCAM_VERSION");

    // Packagers may pin the version explicitly
    let version = std::env::var("POSTCAM_VERSION").unwrap_or_else(|_| git_version());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `<crate version>-<short hash>`, or the bare crate version outside git
fn git_version() -> String {
    let crate_version = env!("CARGO_PKG_VERSION");
    match commit_hash() {
        Some(hash) => format!("{}-{}", crate_version, hash),
        None => crate_version.to_string(),
    }
}

fn commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
