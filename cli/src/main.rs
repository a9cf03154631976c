use clap::Parser;
use inkwell_cli::{Cli, InkwellConfig, commands, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; keys may already be in the environment.
    let _ = dotenvy::dotenv();
    logging::init(cli.verbose);

    let config = InkwellConfig::load(cli.config.as_deref())?;
    let pipeline = commands::build_pipeline(&config, cli.command.needs_provider()).await?;

    let output = commands::execute(&pipeline, &cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
