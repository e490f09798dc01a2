use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};

use gator::rss::HttpFetcher;
use gator::{command, AppContext, Cli, Config, Database};

async fn run(cli: Cli) -> gator::Result<()> {
    let config_path = Config::default_path()?;
    let config = Config::load_with_env(&config_path)?;

    gator::logging::init(config.log_level());
    debug!("Loaded configuration from {}", config_path.display());

    let db = Database::open(&config.db_url).await?;
    let source = Arc::new(HttpFetcher::new()?);
    let mut ctx = AppContext::new(config, config_path, db, source);

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current cycle");
            cancel.cancel();
        }
    });

    let mut out = std::io::stdout();
    command::dispatch(&mut ctx, cli.command, &mut out).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
