mod cli;
mod client;
mod credentials;
mod logging;
mod model;
mod orchestrator;
mod request;
mod secret;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    if args.is_interactive() && cfg!(feature = "tui") {
        let path = args
            .log_file
            .clone()
            .unwrap_or_else(logging::default_log_path);
        logging::init_file(&path)?;
    } else {
        logging::init_stderr()?;
    }

    match cli::run(args).await? {
        cli::Exit::Ok => Ok(()),
        // Notices have already been printed; only the status code is left.
        cli::Exit::SubmissionFailed => std::process::exit(1),
    }
}
