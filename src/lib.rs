//! tonetwist - Turn a short voice clip into a re-styled character voice
//!
//! Speech recognition, persona rewriting and streamed speech synthesis
//! behind one [`Pipeline`].

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod error;
pub mod logging;
pub mod persona;
pub mod pipeline;
pub mod rewrite;
#[cfg(feature = "server")]
pub mod server;
pub mod stt;
pub mod synth;

// Stage traits
pub use audio::{AudioNormalizer, AudioPayload};
pub use rewrite::StyleRewriter;
pub use stt::Transcriber;
pub use synth::{SynthesisStream, Synthesizer};

// Pipeline
pub use pipeline::{Pipeline, PipelineConfig, RunOutput, StageResult};
pub use synth::AudioResult;

// Error handling
pub use error::{ErrorResponse, Result, Stage, StageError, ToneTwistError};

// Config
pub use config::Config;
pub use persona::{PersonaProfile, get_persona, list_personas};

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{version}+{hash}"),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {ver}"
        );
    }

    #[test]
    fn version_string_has_hash_suffix_only_with_git_hash() {
        let ver = version_string();
        if option_env!("GIT_HASH").is_some_and(|h| !h.is_empty()) {
            assert!(ver.contains('+'), "expected '+<hash>', got: {ver}");
        } else {
            assert_eq!(ver, env!("CARGO_PKG_VERSION"));
        }
    }
}
