use clap::Parser;

mod cli;
mod commands;
mod viewer;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = cli::Cli::parse();
    commands::run(cli)
}
