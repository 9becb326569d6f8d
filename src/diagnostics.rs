//! System diagnostics and dependency checking.
//!
//! Verifies that the transcoder is installed and every provider credential
//! the persona table relies on is configured.

use crate::config::Config;
use crate::persona::list_personas;
use std::collections::BTreeSet;
use std::path::Path;
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Tool is installed and working, or the setting is present
    Ok,
    /// Tool or setting is missing
    NotFound,
    /// Present but with issues
    Warning(String),
}

/// Check if the transcoder exists and runs.
pub fn check_transcoder(ffmpeg: &Path) -> CheckResult {
    match Command::new(ffmpeg).arg("-version").output() {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("'{}' found but -version failed", ffmpeg.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", ffmpeg.display(), e)),
    }
}

fn check_key(key: Option<&str>) -> CheckResult {
    match key {
        Some(key) if !key.trim().is_empty() => CheckResult::Ok,
        _ => CheckResult::NotFound,
    }
}

/// Credential slots referenced by at least one persona, ascending.
pub fn required_slots() -> Vec<u8> {
    list_personas()
        .iter()
        .map(|persona| persona.credential_slot)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Slots some persona needs that have no key configured.
pub fn missing_slots(config: &Config) -> Vec<u8> {
    required_slots()
        .into_iter()
        .filter(|slot| config.synthesis.api_key_for_slot(*slot).is_none())
        .collect()
}

fn print_result(label: &str, result: CheckResult, hint: &str) -> bool {
    print!("{label}: ");
    match result {
        CheckResult::Ok => {
            println!("✓ OK");
            true
        }
        CheckResult::NotFound => {
            println!("✗ NOT FOUND");
            if !hint.is_empty() {
                println!("  {hint}");
            }
            false
        }
        CheckResult::Warning(msg) => {
            println!("⚠ WARNING: {msg}");
            false
        }
    }
}

/// Run all dependency checks and print results.
///
/// Returns `true` when every check passed.
pub fn check_dependencies(config: &Config) -> bool {
    println!("Checking system dependencies...\n");

    let mut ok = print_result(
        "ffmpeg (audio conversion)",
        check_transcoder(&config.transcoder.ffmpeg_path),
        "Install: sudo apt install ffmpeg  (Debian/Ubuntu)  or set TONETWIST_FFMPEG",
    );

    ok &= print_result(
        "Speech recognition key",
        check_key(config.transcription.api_key.as_deref()),
        "Set GOOGLE_SPEECH_API_KEY or [transcription] api_key",
    );

    ok &= print_result(
        "Text generation key",
        check_key(config.rewrite.api_key.as_deref()),
        "Set OPENROUTER_API_KEY or [rewrite] api_key",
    );

    for slot in required_slots() {
        let personas: Vec<&str> = list_personas()
            .iter()
            .filter(|p| p.credential_slot == slot)
            .map(|p| p.key)
            .collect();
        ok &= print_result(
            &format!("Synthesis key slot {slot} ({})", personas.join(", ")),
            check_key(config.synthesis.api_key_for_slot(slot)),
            &format!("Set ELEVENLABS_API_KEY{slot}"),
        );
    }

    println!();
    if ok {
        println!("✓ Ready to transcribe, enhance and synthesize.");
    } else {
        println!("⚠ Some checks failed; affected stages will return configuration errors.");
    }
    ok
}
