use std::{env, process::Command};
use vergen::EmitBuilder;

fn main() {
    // Build & cargo info always; git info only inside a worktree with a HEAD
    let mut emit_builder = EmitBuilder::builder();
    emit_builder.all_build().all_cargo();

    let has_head = Command::new("git")
        .args(["rev-parse", "--verify", "HEAD"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if has_head {
        emit_builder.all_git();
    }

    emit_builder
        .emit()
        .expect("Unable to generate build information");

    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into());
    let profile = env::var("PROFILE").unwrap_or_default();
    let build_version = if profile == "release" {
        version
    } else {
        format!("{}-{}", version, profile)
    };
    println!("cargo:rustc-env=APP_BUILD_VERSION={}", build_version);

    if let Ok(desc) = env::var("CARGO_PKG_DESCRIPTION") {
        println!("cargo:rustc-env=APP_PKG_DESCRIPTION={}", desc);
    }
}
