// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concierge - an AI hotel front desk.
//!
//! This is the binary entry point: a text chat REPL, a live voice session,
//! and a few inspection commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod render;
mod shell;
mod voice;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use concierge_config::ConciergeConfig;
use concierge_core::ConciergeError;

/// Concierge - an AI hotel front desk.
#[derive(Parser, Debug)]
#[command(name = "concierge", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the default locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the concierge in the terminal.
    Chat,
    /// Talk to the concierge through the microphone until Ctrl+C.
    Voice {
        /// Do not draw the microphone waveform.
        #[arg(long)]
        no_waveform: bool,
    },
    /// Print the tool declarations sent to the model.
    Tools,
    /// Print the effective configuration.
    Config,
    /// Check configuration, model connectivity and audio devices.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<ConciergeConfig, Vec<concierge_config::ConfigError>> {
    match path {
        Some(path) => concierge_config::load_and_validate_path(path),
        None => concierge_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            concierge_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Chat) => {
            init_tracing(&config.agent.log_level);
            shell::run_chat(config).await
        }
        Some(Commands::Voice { no_waveform }) => {
            init_tracing(&config.agent.log_level);
            voice::run_voice(config, !no_waveform).await
        }
        Some(Commands::Tools) => print_tools(),
        Some(Commands::Config) => print_config(&config),
        Some(Commands::Doctor { plain }) => doctor::run_doctor(&config, cli.config.as_deref(), plain).await,
        None => {
            println!("concierge: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

fn print_tools() -> Result<(), ConciergeError> {
    let declarations = serde_json::Value::Array(concierge_tools::function_declarations());
    let json = serde_json::to_string_pretty(&declarations)
        .map_err(|e| ConciergeError::Internal(format!("failed to serialize tools: {e}")))?;
    println!("{json}");
    Ok(())
}

fn print_config(config: &ConciergeConfig) -> Result<(), ConciergeError> {
    print!("{}", render::effective_config(config)?);
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("concierge={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_voice_flags_and_global_config() {
        let cli = Cli::parse_from(["concierge", "voice", "--no-waveform", "--config", "desk.toml"]);
        assert!(matches!(cli.command, Some(Commands::Voice { no_waveform: true })));
        assert_eq!(cli.config, Some(PathBuf::from("desk.toml")));
    }

    #[test]
    fn loads_config_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concierge.toml");
        std::fs::write(&path, "[agent]\nhotel_name = \"Seaside Inn\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.agent.hotel_name, "Seaside Inn");
    }

    #[test]
    fn rejects_unknown_config_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("concierge.toml");
        std::fs::write(&path, "[agent]\nhotel_nmae = \"typo\"\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
