//! Parlance command line entry point

use anyhow::Result;
use clap::Parser;
use parlance_cli::{load_config, run, Cli};
use parlance_common::init_logging;
use tracing::{debug, error};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut logging = config.logging.clone();
    if let Some(level) = &cli.log_level {
        logging.level.clone_from(level);
    }
    init_logging(&logging)?;
    debug!("Running {:?}", cli.command);

    let mut stdout = std::io::stdout();
    if let Err(e) = run(&cli, config, &mut stdout).await {
        error!("Command failed: {:#}", e);
        return Err(e);
    }
    Ok(())
}
