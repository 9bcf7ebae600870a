mod cli;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use cli::{Cli, TerminalDisplay};
use metals_countdown::{Countdown, CountdownClient, HttpPriceFetcher, fetch_bootstrap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::init_logger("metals-countdown");

    let cli = Cli::parse();

    let mut bootstrap = fetch_bootstrap(&cli.server)
        .await
        .with_context(|| format!("failed to load bootstrap data from {}", cli.server))?;
    if let Some(unit) = cli.unit {
        bootstrap.price_unit_of_measure = unit;
    }

    let (state, first) = Countdown::boot(&bootstrap);
    let fetcher = HttpPriceFetcher::new(bootstrap.ajax_url.clone())
        .context("server advertised an unusable ajax url")?;

    let mut client = CountdownClient::new(fetcher, TerminalDisplay, state);

    tokio::select! {
        _ = client.run(first) => {}
        _ = tokio::signal::ctrl_c() => info!(target: "countdown", "interrupted"),
    }

    Ok(())
}
