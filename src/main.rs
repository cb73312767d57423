use clap::Parser;
use ratewatch::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
