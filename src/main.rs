use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Duration;
use tonetwist::audio::AudioPayload;
use tonetwist::cli::{Cli, Commands, ConfigAction};
use tonetwist::config::Config;
use tonetwist::diagnostics::check_dependencies;
use tonetwist::persona::list_personas;
use tonetwist::{AudioResult, Pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tonetwist::logging::init(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Transcribe { file } => {
            let pipeline = Pipeline::from_config(&load_config(cli.config.as_deref(), None)?);
            let payload = read_audio(&file)?;
            let transcript = pipeline.transcribe(&payload).await?;
            if transcript.is_empty() {
                eprintln!("{}", "No speech was recognized in the audio.".yellow());
            } else {
                println!("{transcript}");
            }
        }
        Commands::Enhance { style, text } => {
            let pipeline = Pipeline::from_config(&load_config(cli.config.as_deref(), None)?);
            let enhanced = pipeline.enhance(&text, &style).await?;
            println!("{enhanced}");
        }
        Commands::Synthesize {
            style,
            output,
            timeout,
            text,
        } => {
            let pipeline = Pipeline::from_config(&load_config(cli.config.as_deref(), timeout)?);
            let audio = pipeline.synthesize(&text, &style).await?;
            write_audio(&output, &audio, cli.quiet)?;
        }
        Commands::Run {
            style,
            output,
            timeout,
            file,
        } => {
            let pipeline = Pipeline::from_config(&load_config(cli.config.as_deref(), timeout)?);
            let payload = read_audio(&file)?;
            let result = pipeline.run(&payload, &style).await?;
            if !cli.quiet {
                eprintln!("{} {}", "Heard:".dimmed(), result.transcript);
                eprintln!("{} {}", "Styled:".dimmed(), result.styled_text);
            }
            write_audio(&output, &result.audio, cli.quiet)?;
        }
        Commands::Styles => {
            for persona in list_personas() {
                println!(
                    "{} {:<12} {}",
                    persona.avatar,
                    persona.key.bold(),
                    persona.description.dimmed()
                );
            }
        }
        #[cfg(feature = "server")]
        Commands::Serve { bind } => {
            let config = load_config(cli.config.as_deref(), None)?;
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            tonetwist::server::serve(Pipeline::from_config(&config), &bind).await?;
        }
        Commands::Check => {
            let config = load_config(cli.config.as_deref(), None)?;
            if !check_dependencies(&config) {
                std::process::exit(1);
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Dump => {
                let config = load_config(cli.config.as_deref(), None)?;
                print!("{}", config.to_display_toml()?);
            }
            ConfigAction::Path => {
                let path = cli.config.unwrap_or_else(Config::default_path);
                println!("{}", path.display());
            }
        },
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "tonetwist", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load configuration with optional custom path
fn load_config(custom_path: Option<&Path>, stream_timeout: Option<Duration>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path).with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    let mut config = config.with_env_overrides();
    if let Some(timeout) = stream_timeout {
        config.synthesis.stream_timeout_secs = timeout.as_secs().max(1);
    }
    Ok(config)
}

fn read_audio(path: &Path) -> Result<AudioPayload> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(AudioPayload::new(bytes, filename))
}

fn write_audio(path: &Path, audio: &AudioResult, quiet: bool) -> Result<()> {
    std::fs::write(path, &audio.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    if !quiet {
        eprintln!(
            "{} {} ({} bytes, {})",
            "Saved".green(),
            path.display(),
            audio.len(),
            audio.content_type
        );
    }
    Ok(())
}
