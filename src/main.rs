use clap::Parser;
use linksort::cli::{Cli, run_cli};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_cli(&cli) {
        Ok(report) if report.is_complete_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
