//! Command-line converter between NML and CATMAID tracings.

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;

mod cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            cli::report(&error);
            cli::exit_code(&error)
        }
    }
}
