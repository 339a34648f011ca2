use anyhow::Context;
use clap::Parser;

use usdc_transfers_monitor::api;
use usdc_transfers_monitor::cli::{Cli, Commands};
use usdc_transfers_monitor::config::Config;
use usdc_transfers_monitor::dashboard::Dashboard;
use usdc_transfers_monitor::filter::Selection;
use usdc_transfers_monitor::registry::{Category, DatasetKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    let dashboard = Dashboard::connect(
        &config.query_api_base,
        config.cache_ttl,
        config.http_timeout,
    )
    .context("failed to set up dataset fetching")?;

    match cli.command {
        Commands::Serve { addr } => {
            let bind = addr.unwrap_or_else(|| config.http_bind_addr.clone());
            api::run_http_server(&bind, dashboard).await?;
        }
        Commands::Datasets => {
            for kind in DatasetKind::ALL {
                let url = dashboard.registry().resolve(Category::Transfers, kind);
                println!("{:<20} {}", kind.name(), url);
            }
        }
        Commands::Fetch { kind } => {
            let url = dashboard
                .registry()
                .resolve_named("Transfers", &kind)?
                .clone();
            let kind: DatasetKind = kind.parse()?;
            let dataset = dashboard
                .dataset(kind)
                .await
                .with_context(|| format!("failed to fetch {} from {}", kind, url))?;
            tracing::info!("fetched {} rows of {}", dataset.len(), kind);
            println!("{}", serde_json::to_string_pretty(&dataset)?);
        }
        Commands::Render { chains } => {
            let selection = (!chains.is_empty()).then(|| Selection::new(chains));
            let view = dashboard.view(selection).await;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}
