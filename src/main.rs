use anyhow::Result;
use clap::Parser;
use matting_trainer::{cli::Cli, infra::logging::init_tracing};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    cli.run()
}
