//! Pizza City CLI - Pre-render and inspect the Pizza City application.
//!
//! Commands:
//! - `pizza-city ssg` - Render every static page to disk
//! - `pizza-city render` - Render one request and print the response

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use edge_sdk::prelude::{init_logging, LogFormat, LogLevel};

use commands::{RenderArgs, SsgArgs};

/// Pizza City - static generation and request rendering
#[derive(Parser)]
#[command(name = "pizza-city")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every static page into an output directory
    Ssg(SsgArgs),

    /// Render a single request through the pipeline
    Render(RenderArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = output::Output::new(cli.verbose, cli.json);

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Warn };
    let format = if cli.json { LogFormat::Json } else { LogFormat::Human };
    init_logging(format, level)?;

    let result = match cli.command {
        Commands::Ssg(args) => commands::ssg::run(args, &output).await,
        Commands::Render(args) => commands::render::run(args, &output).await,
    };

    if let Err(e) = result {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
