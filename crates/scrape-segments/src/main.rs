use anyhow::{Context, Result};
use chrono::Utc;
use shared::{feed, pipeline, Config, Session};

#[tokio::main]
async fn main() -> Result<()> {
    // flexi_logger writes to stderr, keeping stdout clean for the feed.
    let _logger = flexi_logger::Logger::try_with_str("info")
        .context("Bad log spec")?
        .start()
        .context("Failed to start logger")?;

    let config = Config::npr();
    let session = Session::new(&config.base_url)?;

    let segments = pipeline::run(&session, &config).await?;
    log::info!("Collected {} segments", segments.len());

    let xml = feed::render(&segments, &config, Utc::now())?;
    println!("{}", xml);

    Ok(())
}
