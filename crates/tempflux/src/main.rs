use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tempflux_core::{logging, pipeline, PipelineConfig};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Convert Kelvin temperature records to Fahrenheit", long_about = None)]
struct Cli {
    /// Delimited file with Year,Month,Day,Time,TempK rows
    #[arg(long, env = "TEMPFLUX_INPUT", default_value = pipeline::DEFAULT_INPUT_FILE)]
    input: PathBuf,
    /// Destination file, created or truncated
    #[arg(long, env = "TEMPFLUX_OUTPUT", default_value = pipeline::DEFAULT_OUTPUT_FILE)]
    output: PathBuf,
    /// Write to a temporary file and move it into place only if the run succeeds
    #[arg(long, env = "TEMPFLUX_STAGED_OUTPUT")]
    staged_output: bool,
    /// Verbosity threshold when RUST_LOG is unset
    #[arg(long, env = "TEMPFLUX_LOG", default_value = "info")]
    log_level: String,
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli) {
        eprintln!("failed to initialise logging: {err:#}");
        return ExitCode::FAILURE;
    }

    let config = PipelineConfig::new(cli.input, cli.output).staged(cli.staged_output);

    info!("===============================================");
    info!("Starting batch process.");
    match pipeline::run(&config) {
        Ok(summary) => {
            info!(
                "Processing complete! Check for new file {} ({} rows).",
                summary.output.display(),
                summary.rows_written
            );
            info!("===============================================");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("An error occurred: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let filter = logging::filter(&cli.log_level);
    let installed = match cli.log_format {
        LogFormat::Text => {
            tracing::subscriber::set_global_default(logging::subscriber(filter, io::stderr))
        }
        LogFormat::Json => {
            tracing::subscriber::set_global_default(logging::json_subscriber(filter, io::stderr))
        }
    };
    installed?;
    Ok(())
}
