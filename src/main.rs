use clap::Parser;
use rate_monitor::cli::{self, Cli, Commands};
use rate_monitor::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let (config, load_error) = match Config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Initialize telemetry
    rate_monitor::telemetry::init_telemetry(&config.telemetry)?;

    if let Some(e) = load_error {
        tracing::warn!(path = %cli.config, error = %e, "Could not load config, using defaults");
    }

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting scheduler");
            args.execute(&config).await?;
        }
        Commands::Collect(args) => {
            tracing::info!("Starting one-off collection");
            args.execute(&config, cli.json).await?;
        }
        Commands::Latest(args) => args.execute(&config, cli.json)?,
        Commands::Changes(args) => args.execute(&config, cli.json)?,
        Commands::History(args) => args.execute(&config, cli.json)?,
        Commands::Status => cli::status(&config, cli.json)?,
        Commands::Config => cli::show_config(&config),
    }

    Ok(())
}
