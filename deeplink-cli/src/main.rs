use clap::Parser;

mod cli;
mod commands;
mod error;
mod util;

pub use error::AppError;

fn main() {
    env_logger::init();

    let args = cli::Cli::parse();
    if let Err(err) = args.run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
