use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::info;

use mietfach::model::Request;
use mietfach::{CachingGateway, ContractGateway, Engine, EngineConfig, InMemoryGateway};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the JSON response
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let metrics_port: Option<u16> = std::env::var("MIETFACH_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    mietfach::observability::init(metrics_port)?;

    let snapshot = std::env::var("MIETFACH_SNAPSHOT")
        .map_err(|_| "MIETFACH_SNAPSHOT must point to a contract snapshot file")?;
    let defaults = EngineConfig::default();
    let max_concurrency: usize = std::env::var("MIETFACH_MAX_CONCURRENCY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults.max_concurrency);
    let max_batch_units: usize = std::env::var("MIETFACH_MAX_BATCH_UNITS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(defaults.max_batch_units);
    let cache_ttl_secs: u64 = std::env::var("MIETFACH_CACHE_TTL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let store = InMemoryGateway::load_snapshot(&PathBuf::from(&snapshot))?;
    info!("loaded {} rental units from {snapshot}", store.unit_count());
    info!("  max_concurrency: {max_concurrency}");
    info!("  max_batch_units: {max_batch_units}");
    if cache_ttl_secs > 0 {
        info!("  cache: {cache_ttl_secs}s ttl");
    } else {
        info!("  cache: disabled");
    }

    let gateway: Arc<dyn ContractGateway> = if cache_ttl_secs > 0 {
        Arc::new(CachingGateway::new(store, Duration::from_secs(cache_ttl_secs)))
    } else {
        Arc::new(store)
    };
    let engine = Engine::with_config(
        gateway,
        EngineConfig {
            max_concurrency,
            max_batch_units,
            ..defaults
        },
    );

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;
    let request: Request = serde_json::from_str(&input)?;

    // Ctrl-C stops issuing fetches; unresolved units come back as cancelled
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            interrupt.cancel();
        }
    });

    let response = engine.execute(&request, &cancel).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
