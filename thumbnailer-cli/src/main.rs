// thumbnailer-cli/src/main.rs
//
// Entry point for the `thumbnailer` binary: parses arguments, runs the batch
// and maps startup errors to a non-zero exit status. Individual job failures
// are part of the logged summary and still exit 0.

use clap::Parser;
use std::process;

use thumbnailer_cli::{Cli, run_process};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_process(cli) {
        log::error!("{e:#}");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
