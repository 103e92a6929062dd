//! Prism CLI - Compile query states to server wire queries
//!
//! Usage:
//!   prism compile <store.json> [--pretty]
//!   prism validate <mode> <state.json>
//!
//! Examples:
//!   prism compile store.json --pretty
//!   prism validate funnel funnel.json

use clap::{Parser, Subcommand, ValueEnum};
use prism::builder::{build, build_multi_query_config, is_multi_query_mode};
use prism::modes::{FlowState, FunnelState, RetentionState, ValidationReport};
use prism::store::QueryStore;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "prism")]
#[command(about = "Prism - Analysis query compilation for semantic data APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a query store to the server wire queries it would execute
    Compile {
        /// Path to the store JSON file
        file: PathBuf,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate a mode configuration without compiling it
    Validate {
        /// Which mode the file configures
        mode: ModeArg,

        /// Path to the mode state JSON file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Funnel,
    Flow,
    Retention,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { file, pretty } => cmd_compile(file, pretty),
        Commands::Validate { mode, file } => cmd_validate(mode, file),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(file: &PathBuf) -> Result<T, ExitCode> {
    let source = match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            return Err(ExitCode::FAILURE);
        }
    };
    match serde_json::from_str(&source) {
        Ok(value) => Ok(value),
        Err(e) => {
            eprintln!("Error parsing '{}': {}", file.display(), e);
            Err(ExitCode::FAILURE)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> ExitCode {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match rendered {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing output: {e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_compile(file: PathBuf, pretty: bool) -> ExitCode {
    let store: QueryStore = match read_json(&file) {
        Ok(store) => store,
        Err(code) => return code,
    };

    if is_multi_query_mode(&store.states) {
        if let Some(config) = build_multi_query_config(&store.states, store.merge_strategy) {
            return print_json(&config.queries, pretty);
        }
    }

    let query = build(store.active_state());
    if !query.has_content() {
        eprintln!("Store '{}' compiles to an empty query", file.display());
        return ExitCode::FAILURE;
    }
    print_json(&query, pretty)
}

fn cmd_validate(mode: ModeArg, file: PathBuf) -> ExitCode {
    let report = match mode {
        ModeArg::Funnel => match read_json::<FunnelState>(&file) {
            Ok(state) => state.validate(),
            Err(code) => return code,
        },
        ModeArg::Flow => match read_json::<FlowState>(&file) {
            Ok(state) => state.validate(),
            Err(code) => return code,
        },
        ModeArg::Retention => match read_json::<RetentionState>(&file) {
            Ok(state) => state.validate(),
            Err(code) => return code,
        },
    };
    report_outcome(report)
}

fn report_outcome(report: ValidationReport) -> ExitCode {
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    if report.is_valid {
        println!("ok");
        ExitCode::SUCCESS
    } else {
        for error in &report.errors {
            eprintln!("error: {error}");
        }
        ExitCode::FAILURE
    }
}
