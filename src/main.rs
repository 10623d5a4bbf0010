use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod error;
mod formats;
mod model;
mod pipeline;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let cfg = config::Config::load(args.config.as_deref())?;
    config::init_tracing(&cfg.logging, args.log_level.as_deref())?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ytsubs starting");

    match args.command {
        cli::Command::Parse(cmd) => pipeline::run_parse(cmd, &cfg),
        cli::Command::Extract(cmd) => pipeline::run_extract(cmd, &cfg),
        cli::Command::PrintDefaultConfig => {
            let s = cfg.to_toml_pretty()?;
            print!("{s}");
            Ok(())
        }
    }
}
