use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use confidant::adapters::http::{router, TurnAppState};
use confidant::bootstrap::{build_generator, build_turn_handler, Repositories};
use confidant::config::AppConfig;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true);
    if config.features.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = %err, "Confidant stopped");
        eprintln!("confidant: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let generator = build_generator(&config.ai)?;
    let repos = Repositories::in_memory();
    let handler = build_turn_handler(&config, generator, &repos)?;

    let app = router(
        TurnAppState::new(Arc::new(handler)),
        config.server.request_timeout(),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, environment = ?config.server.environment, "Confidant listening");
    axum::serve(listener, app).await?;
    Ok(())
}
