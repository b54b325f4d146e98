#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use unitgraph_core::ErrorCode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ug: dependency graph diagnostics for extracted code units",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format. Defaults to pretty on a TTY, text when piped.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true)]
    json: bool,

    /// Analysis config file. Defaults to `<config_dir>/unitgraph/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run every structural diagnostic",
        long_about = "Build the dependency graph from unit records and report orphans, \
                      dead ends, hubs, cycles, and bridges.",
        after_help = "EXAMPLES:\n    # Analyze one extraction dump\n    ug analyze units.json\n\n    # Merge several dumps, reproducible bridge sampling\n    UNITGRAPH_SEED=7 ug analyze models.json services.json --json"
    )]
    Analyze(cmd::analyze::AnalyzeArgs),

    #[command(
        about = "Export the built graph as a snapshot",
        long_about = "Build the dependency graph and print its node/edge snapshot. \
                      The JSON snapshot can be fed back to any command."
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        about = "List units affected by changed files",
        after_help = "EXAMPLES:\n    ug impact units.json app/models/user.rb"
    )]
    Impact(cmd::impact::ImpactArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("UNITGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "unitgraph=debug,info"
        } else {
            "unitgraph=info,warn"
        })
    });

    let format = env::var("UNITGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = resolve_output_mode(cli.format, cli.json);
    debug!(?output, "resolved output mode");

    let config = match unitgraph_core::config::resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let code = ErrorCode::ConfigParseError;
            render_error(
                output,
                &CliError::with_details(
                    format!("{err:#}"),
                    code.hint().unwrap_or("check the --config path and UNITGRAPH_SEED"),
                    code.code(),
                ),
            )?;
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Analyze(ref args) => cmd::analyze::run_analyze(args, &config, output),
        Commands::Export(ref args) => cmd::export::run_export(args, output),
        Commands::Impact(ref args) => cmd::impact::run_impact(args, output),
    };

    if let Err(err) = result {
        render_error(output, &CliError::new(format!("{err:#}")))?;
        std::process::exit(1);
    }

    info!("done");
    Ok(())
}
