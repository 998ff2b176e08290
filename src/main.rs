use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

use restosehat_api::{app_router, config, db, events, schema, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config().context("failed to load configuration")?;
    config::init_tracing(app_config.log_level(), app_config.log_json);

    info!(
        environment = %app_config.environment,
        "starting restosehat-api"
    );

    let db_pool = Arc::new(
        db::establish_connection_from_app_config(&app_config)
            .await
            .context("failed to connect to database")?,
    );

    if app_config.auto_migrate {
        db::run_migrations(&db_pool)
            .await
            .context("failed to run migrations")?;
    }

    let caps = schema::SchemaCapabilities::detect(&*db_pool)
        .await
        .context("failed to probe schema capabilities")?;

    let (event_tx, event_rx) = mpsc::channel(app_config.event_channel_capacity);
    let (fanout_tx, _) = broadcast::channel(app_config.event_channel_capacity);
    let event_sender = events::EventSender::new(event_tx);
    tokio::spawn(events::process_events(event_rx, fanout_tx));

    let addr = format!("{}:{}", app_config.host, app_config.port);
    let state = AppState::build(db_pool, Arc::new(app_config), event_sender, caps);
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("listening on {}", addr);

    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
