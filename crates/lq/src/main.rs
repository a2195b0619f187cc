//! `lq` command-line entry point.

use std::process::ExitCode;

use lq::cli::{self, Command};

fn main() -> ExitCode {
    lq::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let query = match cli::parse_args(&args) {
        Ok(Command::Help) => {
            println!("{}", cli::USAGE);
            return ExitCode::SUCCESS;
        }
        Ok(Command::Query(query)) => query,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!();
            eprintln!("{}", cli::USAGE);
            return ExitCode::from(2);
        }
    };

    let text = match query.input.read() {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: cannot read input: {err}");
            return ExitCode::FAILURE;
        }
    };

    match cli::run(&query, &text) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(kind = ?err.kind(), "query failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
