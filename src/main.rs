mod cli;
mod config;
mod core;
mod models;
mod report;
mod sources;

use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();

    match cli::run(cli) {
        Ok(0) => {}
        Ok(errors) => std::process::exit(errors.min(255) as i32),
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            std::process::exit(1);
        }
    }
}
