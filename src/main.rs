use anyhow::{Context, Result};
use finisher::{HttpFetcher, Pipeline, ScrapeConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,finisher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Only a broken selector or base url can fail here; network errors never do.
    let config = ScrapeConfig::sporoku().context("built-in settings are invalid")?;
    let fetcher = HttpFetcher::new()?;

    Pipeline::new(config, Arc::new(fetcher)).run().await;
    Ok(())
}
