use clap::Parser;
use teamex::app::App;
use teamex::cli::{self, Cli, Commands};
use teamex::config::Config;
use teamex::error::Result;
use tracing::error;

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load_or_default(&cli.config)?;
    config.logging.init();

    let app = App::new(config)?;
    match cli.command {
        Commands::Rates(command) => cli::rates::execute(&app, command).await,
        Commands::Referral(command) => cli::referral::execute(&app, command).await,
        Commands::Commission(command) => cli::commission::execute(&app, command).await,
        Commands::Stats => cli::stats::execute(&app).await,
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!(error = %e, "command failed");
        cli::output::print_failure(&e.to_string());
        std::process::exit(1);
    }
}
