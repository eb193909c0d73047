use std::env;
use std::process::Command;

fn main() {
    embuild::espidf::sysenv::output();

    // Full git version for the boot banner (e.g. "v0.1.0-3-gabcdef")
    let git_version = Command::new("git")
        .args(["describe", "--tags", "--always"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .or_else(|| env::var("CARGO_PKG_VERSION").ok())
        .unwrap_or_default();
    println!("cargo:rustc-env=GIT_VERSION={}", git_version.trim());
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs/tags");
}
