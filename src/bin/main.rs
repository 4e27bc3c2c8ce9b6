#![warn(clippy::all)]

use std::sync::Arc;

use anyhow::Context;
use recipe_viewer::config::Settings;
use recipe_viewer::database::connection::establish_pooled_connection;
use recipe_viewer::http::{router, AppState};
use recipe_viewer::importer;
use recipe_viewer::logging::init_tracing;
use recipe_viewer::store::{DatabaseStore, MemoryStore, RecipeStore};
use tokio::net::TcpListener;
use tracing::{info, trace_span, warn};

fn open_store(settings: &Settings) -> anyhow::Result<Arc<dyn RecipeStore>> {
    let span = trace_span!("opening store");
    let _guard = span.enter();

    if settings.in_memory {
        let store = MemoryStore::new();
        importer::import(&store, importer::sample_recipes()?)?;
        return Ok(Arc::new(store));
    }

    let pool = establish_pooled_connection(settings.database_url()?, settings.db_pool_size)
        .context("Unable to create the database pool")?;

    Ok(Arc::new(DatabaseStore::new(pool)))
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load();
    init_tracing(settings.log_level).context("Unable to set global subscriber")?;

    let site = settings.site_config()?;
    let store = tokio::task::spawn_blocking({
        let settings = settings.clone();
        move || open_store(&settings)
    })
    .await??;

    let app = router(AppState::new(store, site));
    let listener = TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("Unable to bind {}", settings.bind_addr))?;
    info!(address = %settings.bind_addr, in_memory = settings.in_memory, "serving recipes");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
