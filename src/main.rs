use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod logging;
mod ui;

use ui::WizardApp;
use wizard_history::config::Config;
use wizard_history::replay::{SessionRunner, SessionScript, Transcript};

#[derive(Parser)]
#[command(name = "wizard-history")]
#[command(about = "Keeps a multi-step form wizard in sync with session history")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted session against an in-memory tab
    Replay {
        /// Session script (YAML, or JSON with a .json extension)
        script: PathBuf,

        /// Transcript format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Also write it to .wizard-history/config.toml
        #[arg(long)]
        write: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    // No subcommand = terminal demo, which owns the screen
    let is_tui_mode = cli.command.is_none();
    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Replay { script, format }) => cmd_replay(&config, &script, format)?,
        Some(Commands::Config { write }) => cmd_config(&config, write)?,
        None => run_tui(config, logging_handle.log_file_path)?,
    }

    Ok(())
}

fn run_tui(config: Config, log_file_path: Option<PathBuf>) -> Result<()> {
    ui::install_panic_hook();

    let mut app = WizardApp::new(config)?;
    let result = app.run();

    if let Some(path) = log_file_path {
        if logging::log_written(&path) {
            eprintln!("Logs written to: {}", path.display());
        }
    }

    result
}

fn cmd_replay(config: &Config, script_path: &std::path::Path, format: OutputFormat) -> Result<()> {
    let script = SessionScript::load(script_path)?;
    tracing::info!(
        script = %script_path.display(),
        actions = script.actions.len(),
        "Replaying session"
    );

    let transcript = SessionRunner::new(&config.wizard)
        .run(&script)
        .with_context(|| format!("Session {} failed", script_path.display()))?;

    println!("{}", render_transcript(&transcript, format)?);
    Ok(())
}

fn render_transcript(transcript: &Transcript, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(transcript).context("Failed to serialize transcript")
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(transcript).context("Failed to serialize transcript")
        }
    }
}

fn cmd_config(config: &Config, write: bool) -> Result<()> {
    print!("{}", config.to_toml()?);
    if write {
        let path = config.save()?;
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
