// Entrypoint for the CLI application.
// - Keeps `main` small: build the config, create an API client and hand it
//   to the UI, either for one image or for the interactive loop.

use anyhow::Context;
use car_detect_cli::{config, ui, ApiClient, Config};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "car-detect-cli", version, about = "Upload an image and show the detected labels")]
struct Cli {
    /// Image to analyze; starts the interactive menu when omitted
    image: Option<PathBuf>,

    /// Base URL of the detection backend (overrides DETECT_BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Request timeout in seconds (overrides DETECT_TIMEOUT_SECS)
    #[arg(long)]
    timeout_secs: Option<String>,

    /// Do not retry after a connection failure or timeout
    #[arg(long)]
    no_retry: bool,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut cfg = Config::from_env().context("Failed to read configuration")?;
    if let Some(url) = &cli.backend_url {
        cfg.backend_url = config::parse_backend_url(url)?;
    }
    if let Some(secs) = &cli.timeout_secs {
        cfg.timeout = config::parse_timeout(secs)?;
    }
    if cli.no_retry {
        cfg.retry = false;
    }
    tracing::debug!(?cfg, "configuration");

    let api = ApiClient::new(&cfg).context("Failed to build HTTP client")?;

    match cli.image {
        Some(path) => {
            let ok = ui::submit(&api, Some(path))?;
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        None => {
            ui::main_menu(&api)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
