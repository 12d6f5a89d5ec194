use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use md2pdf::{Config, ConfigError, RenderError};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "md2pdf", version)]
#[command(about = "Convert Markdown files to PDF")]
#[command(after_help = "INPUT and OUTPUT are all a conversion needs. \
--config and --verbose are optional extras: without --config the built-in \
defaults apply, and RUST_LOG overrides --verbose.")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Output PDF file (defaults to input name with .pdf extension)
    output: Option<PathBuf>,

    /// TOML file with conversion settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log each conversion stage to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("input is not a file: {}", .0.display())]
    InputNotAFile(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Convert(#[from] md2pdf::Error),
}

impl CliError {
    /// Exit status following sysexits.h.
    fn exit_code(&self) -> u8 {
        match self {
            CliError::InputNotFound(_) | CliError::InputNotAFile(_) => 66,
            CliError::Config(_) => 78,
            CliError::Convert(err) => match err {
                md2pdf::Error::FileAccess { .. } => 66,
                md2pdf::Error::Decoding { .. } => 65,
                md2pdf::Error::Render(RenderError::Write { .. }) => 73,
                md2pdf::Error::Render(_) => 70,
            },
        }
    }
}

// ANSI colour helpers

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}

fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| md2pdf::default_output_path(&cli.input));

    match run(&cli, &output) {
        Ok(()) => {
            println!(
                "{}",
                green(&format!(
                    "✅ Converted {} → {}",
                    cli.input.display(),
                    output.display()
                ))
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", red(&format!("❌ Error: {e}")));
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli, output: &Path) -> Result<(), CliError> {
    if !cli.input.exists() {
        return Err(CliError::InputNotFound(cli.input.clone()));
    }
    if !cli.input.is_file() {
        return Err(CliError::InputNotAFile(cli.input.clone()));
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::compiled_default(),
    };

    md2pdf::convert_with_config(&cli.input, output, &config)?;
    Ok(())
}
