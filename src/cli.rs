//! Command-line interface for tonetwist
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Turn a short voice clip into a re-styled character voice
#[derive(Parser, Debug)]
#[command(
    name = "tonetwist",
    version,
    about = "Turn a short voice clip into a re-styled character voice"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a timeout such as `90`, `30s` or `2m`.
///
/// Supports any duration format accepted by `humantime`; bare numbers are
/// seconds.
pub fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    // Bare number → seconds
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe an audio file to text
    Transcribe {
        /// Audio file (any container ffmpeg can read)
        file: PathBuf,
    },

    /// Rewrite text in a persona's speaking style
    Enhance {
        /// Persona key (see `tonetwist styles`)
        #[arg(long, short = 's', value_name = "KEY")]
        style: String,

        /// Text to rewrite
        text: String,
    },

    /// Speak text in a persona's voice
    Synthesize {
        /// Persona key (see `tonetwist styles`)
        #[arg(long, short = 's', value_name = "KEY")]
        style: String,

        /// Output file (default: tonetwist.mp3)
        #[arg(long, short = 'o', value_name = "FILE", default_value = "tonetwist.mp3")]
        output: PathBuf,

        /// Stream collection timeout (e.g., 90, 30s, 2m)
        #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
        timeout: Option<Duration>,

        /// Text to speak
        text: String,
    },

    /// Transcribe, rewrite and re-speak an audio file
    Run {
        /// Persona key (see `tonetwist styles`)
        #[arg(long, short = 's', value_name = "KEY")]
        style: String,

        /// Output file (default: tonetwist.mp3)
        #[arg(long, short = 'o', value_name = "FILE", default_value = "tonetwist.mp3")]
        output: PathBuf,

        /// Stream collection timeout (e.g., 90, 30s, 2m)
        #[arg(long, value_name = "DURATION", value_parser = parse_timeout)]
        timeout: Option<Duration>,

        /// Audio file (any container ffmpeg can read)
        file: PathBuf,
    },

    /// List available personas
    Styles,

    /// Serve the HTTP API
    #[cfg(feature = "server")]
    Serve {
        /// Address to bind (default from config: 127.0.0.1:3000)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Check transcoder and provider credentials
    Check,

    /// Manage configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (credentials masked)
    Dump,
    /// Print the default configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_transcribe_command() {
        let cli = Cli::try_parse_from(["tonetwist", "transcribe", "clip.webm"]).unwrap();
        match cli.command {
            Commands::Transcribe { file } => assert_eq!(file, PathBuf::from("clip.webm")),
            other => panic!("Expected Transcribe, got {other:?}"),
        }
    }

    #[test]
    fn test_enhance_command() {
        let cli =
            Cli::try_parse_from(["tonetwist", "enhance", "--style", "pirate", "hello world"])
                .unwrap();
        match cli.command {
            Commands::Enhance { style, text } => {
                assert_eq!(style, "pirate");
                assert_eq!(text, "hello world");
            }
            other => panic!("Expected Enhance, got {other:?}"),
        }
    }

    #[test]
    fn test_synthesize_defaults_output() {
        let cli = Cli::try_parse_from(["tonetwist", "synthesize", "-s", "robot", "beep"]).unwrap();
        match cli.command {
            Commands::Synthesize {
                output, timeout, ..
            } => {
                assert_eq!(output, PathBuf::from("tonetwist.mp3"));
                assert_eq!(timeout, None);
            }
            other => panic!("Expected Synthesize, got {other:?}"),
        }
    }

    #[test]
    fn test_run_command_with_timeout_and_output() {
        let cli = Cli::try_parse_from([
            "tonetwist",
            "run",
            "-s",
            "cowboy",
            "-o",
            "out.mp3",
            "--timeout",
            "2m",
            "clip.wav",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                style,
                output,
                timeout,
                file,
            } => {
                assert_eq!(style, "cowboy");
                assert_eq!(output, PathBuf::from("out.mp3"));
                assert_eq!(timeout, Some(Duration::from_secs(120)));
                assert_eq!(file, PathBuf::from("clip.wav"));
            }
            other => panic!("Expected Run, got {other:?}"),
        }
    }

    #[test]
    fn test_enhance_requires_style() {
        assert!(Cli::try_parse_from(["tonetwist", "enhance", "hello"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tonetwist", "styles", "-vv", "--config", "/tmp/c.toml"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(!cli.quiet);
    }

    #[test]
    fn test_config_dump() {
        let cli = Cli::try_parse_from(["tonetwist", "config", "dump"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Dump
            }
        ));
    }

    #[test]
    fn test_parse_timeout() {
        assert_eq!(parse_timeout("90"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_timeout("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_timeout(" 1m30s "), Ok(Duration::from_secs(90)));
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn test_completions_command() {
        let cli = Cli::try_parse_from(["tonetwist", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }
}
