use anyhow::Result;
use banks_etl::{config::Config, pipeline};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) config ───────────────────────────────────────────────────
    let cfg = Config::load()?;

    // ─── 2) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.log_filter.as_str()));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!(url = %cfg.source_url, table = %cfg.table_name, "startup");

    // ─── 3) extract → transform → load → query ───────────────────────
    pipeline::run(&cfg).await?;

    info!("all done");
    Ok(())
}
