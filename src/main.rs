// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use sapsplit::app_config::{self, Config};
use sapsplit::app_controller::{Controller, SplitOptions, Strategy};
use sapsplit::file_utils::FileManager;

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

/// CLI Wrapper for Strategy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliStrategy {
    Majority,
    Table,
    Markers,
}

impl From<CliStrategy> for Strategy {
    fn from(cli_strategy: CliStrategy) -> Self {
        match cli_strategy {
            CliStrategy::Majority => Strategy::Majority,
            CliStrategy::Table => Strategy::Table,
            CliStrategy::Markers => Strategy::Markers,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Assign contributors to subsets and write the split manifest
    Split(SplitArgs),

    /// Copy contributor directories into train/dev/test trees
    Arrange {
        /// Directory holding the unsplit corpus and both manifests
        #[arg(value_name = "DATADIR")]
        datadir: PathBuf,

        /// Directory into which to write
        #[arg(value_name = "OUTPUTDIR")]
        outputdir: PathBuf,

        /// Do not draw a progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Compare two split manifests
    Diff {
        /// Earlier split manifest
        old: PathBuf,

        /// Later split manifest
        new: PathBuf,

        /// Where to write the INSERTED/DELETED/SUBSTITUTED report
        output: PathBuf,
    },

    /// Show which prompt texts occur in one list and which in several
    Lists {
        /// Prompt list directory (list<N>.txt) or prompt catalog JSON
        prompts: PathBuf,

        /// Write the report here instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions for sapsplit
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct SplitArgs {
    /// Directory containing the unsplit dataset
    #[arg(value_name = "DATADIR")]
    datadir: PathBuf,

    /// Output split manifest
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Prompt list directory (list<N>.txt) or prompt catalog JSON
    #[arg(short, long)]
    prompts: Option<PathBuf>,

    /// Contributor table CSV with ContributorID and List# columns
    #[arg(short, long)]
    table: Option<PathBuf>,

    /// Also write the subset -> contributor IDs manifest here
    #[arg(short, long)]
    contributors_out: Option<PathBuf>,

    /// Assignment strategy (default: table if --table is given, else majority)
    #[arg(short, long, value_enum)]
    strategy: Option<CliStrategy>,

    /// Where the marker strategy writes its per-list report
    #[arg(short, long)]
    report: Option<PathBuf>,
}

/// sapsplit - train/dev/test splitting for prompted speech corpora
#[derive(Parser, Debug)]
#[command(name = "sapsplit")]
#[command(version)]
#[command(about = "Split a prompted speech corpus into train/dev/test subsets")]
#[command(long_about = "sapsplit assigns each contributor of a speech corpus to train, dev or test
according to the prompt list they read, and marks each dev/test utterance as shared or
unshared depending on whether its prompt text also occurs in train.

EXAMPLES:
    sapsplit split -p lists/ data/ split.json                 # Majority vote over prompt lists
    sapsplit split -t contributors.csv -c contributors.json data/ split.json
    sapsplit split -s markers -r lists.log data/ split.json   # Marker prompts
    sapsplit arrange data/ out/                               # Copy into out/{train,dev,test}
    sapsplit diff old.json new.json changes.json              # Compare two releases
    sapsplit lists lists/                                     # Prompts unique to one list
    sapsplit completions bash > sapsplit.bash

CONFIGURATION:
    Configuration is stored in sapsplit.json by default. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, global = true, default_value = "sapsplit.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
    log_file: Option<PathBuf>,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter, log_file: Option<PathBuf>) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger { level, log_file });
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let now = chrono::Local::now().format("%H:%M:%S.%3f");
        let (emoji, color) = Self::style_for_level(record.level());
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());

        if let Some(path) = &self.log_file {
            let line = format!("{:<5} {}", record.level(), record.args());
            let _ = FileManager::append_to_log_file(path, &line);
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn main() -> Result<()> {
    let cli = CommandLineOptions::parse();

    // Trace is the ceiling; the effective level is lowered once the config is known
    CustomLogger::init(LevelFilter::Trace, cli.log_file.clone())?;
    log::set_max_level(LevelFilter::Info);

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "sapsplit", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Split(args) => {
            let mut options = SplitOptions::new(&args.datadir, &args.output);
            options.prompts = args.prompts;
            options.table = args.table;
            options.contributors_out = args.contributors_out;
            options.report = args.report;
            options.strategy = args.strategy.map(Strategy::from);
            controller.run_split(&options)?;
        }
        Commands::Arrange { datadir, outputdir, no_progress } => {
            controller.run_arrange(&datadir, &outputdir, !no_progress)?;
        }
        Commands::Diff { old, new, output } => {
            let diff = controller
                .run_diff(&old, &new, &output)
                .context("Failed to compare split manifests")?;
            print!("{}", diff);
            if diff.is_empty() {
                info!("The two splits are identical");
            }
        }
        Commands::Lists { prompts, output } => {
            let overlap = controller.run_compare_lists(&prompts, output.as_deref())?;
            if output.is_none() {
                print!("{}", overlap.to_log_text());
            }
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
