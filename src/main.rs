//! vizhub - compiles the visualization hub configuration into reverse-proxy
//! rules.
//!
//! # Usage
//!
//! ```bash
//! # Full build for the engine selected by `proxy_nginx`
//! vizhub build
//!
//! # Apache httpd rules for one organization in the test environment
//! vizhub build --proxy httpd --env test --organization ictu
//!
//! # Compare one template across engines
//! vizhub render nginx.conf --proxy nginx
//! ```

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vizhub::cli::{BuildArgs, ConfigArgs, ExitCode, MapsArgs, NamesArgs, RenderArgs};
use vizhub::constants::{APP_BINARY_NAME, APP_NAME};

/// Visualization Hub - reverse-proxy rule compiler
#[derive(Parser, Debug)]
#[command(name = APP_BINARY_NAME, author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile proxy rules, maps, snapshot and OpenAPI document
    Build(BuildArgs),
    /// Render one template with the full context to stdout
    Render(RenderArgs),
    /// Write only the branch/host lookup maps
    Maps(MapsArgs),
    /// Print build-eligible visualization names
    Names(NamesArgs),
    /// Print the resolved configuration as JSON
    Config(ConfigArgs),
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return;
            }
            _ => {
                eprint!("{e}");
                std::process::exit(ExitCode::ValidationError.code());
            }
        },
    };

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    tracing::debug!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Render(args) => args.execute(),
        Commands::Maps(args) => args.execute(),
        Commands::Names(args) => args.execute(),
        Commands::Config(args) => args.execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code().code());
    }
}
