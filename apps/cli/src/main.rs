//! `in` step of the release-fetch resource
//!
//! Reads the request from stdin, downloads the selected product files into the
//! destination directory and prints the response on stdout. Diagnostics go to
//! a log file in the temp directory with the API token redacted.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use release_fetch::pipeline::{self, InResponse, Pipeline, PipelineError, RedactingMakeWriter, Redactor, Source};
use release_fetch::{CatalogClient, DEFAULT_USER_AGENT, DownloadConfig, Downloader};

#[derive(Parser, Debug)]
#[command(name = "in", version, about = "Fetch the product files of a catalog release")]
struct Args {
    /// Directory the product files are written to
    destination: PathBuf,
}

/// A failure together with the stage reported to the user
struct Failure {
    stage: &'static str,
    error: anyhow::Error,
}

impl Failure {
    fn new(stage: &'static str, error: impl Into<anyhow::Error>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }
}

impl From<PipelineError> for Failure {
    fn from(e: PipelineError) -> Self {
        Self::new(e.stage(), e)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args).await {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to write response: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(failure) => {
            error!("Failed to {}: {:#}", failure.stage, failure.error);
            eprintln!("Failed to {}: {:#}", failure.stage, failure.error);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<InResponse, Failure> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading request from stdin")
        .map_err(|e| Failure::new("validate input", e))?;
    let request = pipeline::parse_request(&input)?;

    let log_path = init_tracing(&request.source).map_err(|e| Failure::new("set up logging", e))?;
    eprintln!("logging to {}", log_path.display());
    info!("release-fetch {}", env!("CARGO_PKG_VERSION"));

    let catalog = CatalogClient::new(request.source.client_config(DEFAULT_USER_AGENT))
        .map_err(|e| Failure::new("validate input", e))?;
    let downloader = Downloader::new(DownloadConfig::default().with_user_agent(DEFAULT_USER_AGENT))
        .map_err(|e| Failure::new("validate input", e))?;

    let response = Pipeline::new(catalog, downloader)
        .run(&request, &args.destination)
        .await?;
    Ok(response)
}

/// Log to a kept temp file; level from RUST_LOG (default: debug)
fn init_tracing(source: &Source) -> anyhow::Result<PathBuf> {
    let (file, path) = tempfile::Builder::new()
        .prefix("release-fetch-in")
        .suffix(".log")
        .tempfile()
        .context("creating log file")?
        .keep()
        .context("keeping log file")?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .with_writer(RedactingMakeWriter::new(Mutex::new(file), Redactor::from_source(source)))
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {}", e))?;

    Ok(path)
}
