use anyhow::Context;
use clap::Parser;
use tessera::kernel::config::{TesseraConfig, load_config};
use tessera_shell::args::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config: TesseraConfig = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    let _logger = tessera::init_logging(&config, env!("CARGO_PKG_NAME"))?;

    let map = tessera_shell::build_map(&cli, &config)?;
    let mut stdout = std::io::stdout().lock();
    tessera_shell::run(&cli, &map, &mut stdout)
}
