//! Build script: embeds the git hash and runs a pre-flight check for ffmpeg.
//!
//! ffmpeg is a runtime dependency, so a missing binary only produces a
//! warning here. `tonetwist check` reports the same thing at runtime.

use std::process::Command;

fn main() {
    // Embed git short hash for version string
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=GIT_HASH={}", hash);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");

    check_ffmpeg();
}

fn check_ffmpeg() {
    match Command::new("ffmpeg").arg("-version").output() {
        Ok(output) if output.status.success() => {}
        _ => {
            println!(
                "cargo:warning=ffmpeg not found on PATH. Audio normalization needs it at runtime \
                 (set [transcoder] ffmpeg_path in the config to point at a custom binary)."
            );
        }
    }
}
