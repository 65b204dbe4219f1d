// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use crate::app_config::FilterConfig;
use app_controller::Controller;
use file_utils::FileManager;

mod app_config;
mod app_controller;
mod content;
mod dom;
mod encoders;
mod engine;
mod errors;
mod event;
mod file_utils;
mod simplify;
mod skeleton;
mod subfilter;
mod writer;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract translatable units into a JSON manifest
    Extract {
        /// Input document, or a directory to process recursively
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Manifest output path (default: INPUT.units.json)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// File extension to match when INPUT_PATH is a directory
        #[arg(long, default_value = "xml")]
        extension: String,
    },

    /// Merge a translated manifest back into the document
    Merge {
        /// Input document the manifest was extracted from
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Translated manifest path
        #[arg(value_name = "MANIFEST_PATH")]
        manifest_path: PathBuf,

        /// Merged document output path (default: INPUT.TARGET.xml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract and merge without translating, writing the canonical
    /// form of the document
    Roundtrip {
        /// Input document
        #[arg(value_name = "INPUT_PATH")]
        input_path: PathBuf,

        /// Output path (default: INPUT.roundtrip.xml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions for docfilter
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// docfilter - format-preserving document filter for translation
///
/// Extracts translatable text from structured documents into flat
/// units, and merges translated units back without disturbing the
/// surrounding markup.
#[derive(Parser, Debug)]
#[command(name = "docfilter")]
#[command(version = "0.1.0")]
#[command(about = "Format-preserving document filter for translation")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Source locale tag (e.g. 'en', 'en-US')
    #[arg(short, long)]
    source_locale: Option<String>,

    /// Target locale tag (e.g. 'fr', 'pt-BR')
    #[arg(short, long)]
    target_locale: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let mut stderr = std::io::stderr();
            let color = Self::color_for_level(record.level());
            let _ = writeln!(
                stderr,
                "{}{:5} {}\x1B[0m",
                color,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "docfilter", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let target_locale = config.target_locale.clone();
    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Extract {
            input_path,
            output,
            extension,
        } => {
            if FileManager::dir_exists(&input_path) {
                let count = controller.extract_folder(&input_path, &input_path, &extension)?;
                info!("Extracted {count} unit(s) in total");
                return Ok(());
            }
            let manifest_path = output
                .unwrap_or_else(|| default_output(&input_path, "units", "json"));
            let count = controller.extract(&input_path, &manifest_path)?;
            info!(
                "Extracted {count} unit(s) into {}",
                manifest_path.display()
            );
        }
        Commands::Merge {
            input_path,
            manifest_path,
            output,
        } => {
            let output_path = output
                .unwrap_or_else(|| default_output(&input_path, &target_locale, "xml"));
            controller.merge(&input_path, &manifest_path, &output_path)?;
            info!("Merged document written to {}", output_path.display());
        }
        Commands::Roundtrip { input_path, output } => {
            let output_path = output
                .unwrap_or_else(|| default_output(&input_path, "roundtrip", "xml"));
            controller.roundtrip(&input_path, &output_path)?;
            info!("Canonical document written to {}", output_path.display());
        }
        Commands::Completions { .. } => unreachable!("handled before config loading"),
    }
    Ok(())
}

/// Load the configuration file if it exists, falling back to defaults,
/// then apply command-line locale overrides
fn load_config(cli: &CommandLineOptions) -> Result<FilterConfig> {
    let mut config = if FileManager::file_exists(&cli.config_path) {
        FilterConfig::from_file(&cli.config_path)
            .with_context(|| format!("Failed to load config from {}", cli.config_path))?
    } else {
        FilterConfig::new("en", "fr")
    };
    if let Some(source) = &cli.source_locale {
        config.source_locale = source.clone();
    }
    if let Some(target) = &cli.target_locale {
        config.target_locale = target.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }
    config.validate()?;
    Ok(config)
}

fn default_output(input_path: &std::path::Path, tag: &str, extension: &str) -> PathBuf {
    let dir = input_path.parent().unwrap_or_else(|| std::path::Path::new("."));
    FileManager::generate_output_path(input_path, dir, tag, extension)
}
