use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use derivative_submission::{load_settings, logging, run, SubmissionRequest};

#[derive(Debug, Parser)]
#[command(name = "derivative-submission")]
#[command(about = "Stage derivative copies as a submission package with a METS-style descriptor")]
struct Cli {
    /// Intellectual entity identifier; names the package directory
    id: String,

    /// Representation entity type (omitted from the descriptor when empty)
    entity_type: String,

    /// Representation code (omitted from the descriptor when empty)
    code: String,

    /// Directory holding the derivative files
    source: PathBuf,

    /// Directory the package is created under
    target: PathBuf,

    /// TOML file overriding layout and staging defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_cli_logger(cli.verbose);

    match submit(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("submission failed: {err:#}");
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn submit(cli: Cli) -> Result<()> {
    let settings = load_settings(cli.config.as_deref())?;
    let request =
        SubmissionRequest::new(cli.id, cli.entity_type, cli.code, cli.source, cli.target)?;

    let report = run(&request, &settings)?;
    println!(
        "[submission:{}] {} files ({} bytes); descriptor at {}",
        request.id(),
        report.files,
        report.bytes,
        report.descriptor.display()
    );
    Ok(())
}
