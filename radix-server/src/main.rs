mod config;
mod error;
mod http;
mod orchestrator;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::{broadcast, RwLock};
use tracing::info;

use config::PipelineConfig;
use http::AppState;
use orchestrator::Orchestrator;

#[derive(Parser, Debug)]
#[command(name = "radix-server", about = "RADIX radar detection pipeline orchestrator")]
struct Args {
    /// Optional TOML config file; falls back to compiled-in defaults.
    #[arg(short, long)]
    config: Option<String>,
}

async fn run_tick_loop(
    orchestrator: Arc<RwLock<Orchestrator>>,
    updates: Arc<broadcast::Sender<Arc<str>>>,
    tick_interval_ms: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(tick_interval_ms));
    let dt = tick_interval_ms as f64 / 1000.0;

    loop {
        interval.tick().await;
        let frame = {
            let mut orch = orchestrator.write().await;
            orch.tick(chrono::Utc::now(), dt)
        };
        match serde_json::to_value(&frame) {
            Ok(mut v) => {
                orchestrator::round_floats(&mut v, 2);
                let _ = updates.send(Arc::from(v.to_string()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize frame update");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "radix_server=info".into()),
        )
        .init();

    let args = Args::parse();
    let pipeline_config = PipelineConfig::load(args.config.as_deref())?;

    info!(
        tick_interval_ms = pipeline_config.tick_interval_ms,
        bind_addr = %pipeline_config.bind_addr,
        "RADIX server starting"
    );

    let orchestrator = Arc::new(RwLock::new(Orchestrator::new(&pipeline_config)));
    let (updates_tx, _) = broadcast::channel::<Arc<str>>(pipeline_config.broadcast_capacity);
    let updates_tx = Arc::new(updates_tx);

    tokio::spawn(run_tick_loop(
        orchestrator.clone(),
        updates_tx.clone(),
        pipeline_config.tick_interval_ms,
    ));

    let state = AppState {
        orchestrator,
        updates: updates_tx,
    };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(&pipeline_config.bind_addr).await?;
    info!(addr = %pipeline_config.bind_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
