mod args;
mod catalog;
mod config;
mod entry;
mod error;
mod http;
mod lifecycle;
mod logger;
mod metrics;
mod shutdown;
mod shutdown_handlers;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;

fn main() -> ExitCode {
    match entry::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
