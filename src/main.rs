use clap::Parser;
use leadcrm::cli::{run_process_inactive, run_seed, run_serve, Cli, Commands};
use leadcrm::config::{init_logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Serve(args) => run_serve(config, args).await?,
        Commands::Seed(args) => run_seed(&config, args)?,
        Commands::ProcessInactive(args) => run_process_inactive(&config, args)?,
    }

    Ok(())
}
