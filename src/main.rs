//! xcpd-launch CLI entrypoint.
//!
//! Provides a thin wrapper over the `cli` module: parse args, hand off to
//! the runner, and exit with the downstream (or failure-class) status.
//! For programmatic use, prefer the library API (`xcpd_launch`).

use clap::Parser;

mod cli;

fn main() {
    let args = cli::CliArgs::parse();
    std::process::exit(cli::run(args));
}
