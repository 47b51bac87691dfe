// src/main.rs

use std::process::ExitCode;

use dockyard::{cli, logging, run};

/// Exit status is 1 only for errors that stop the run before or around
/// building; failed jobs are reported in the summary and exit 0.
#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("dockyard: {err:#}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("dockyard error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
