use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;

pub mod adapter;
pub mod api;
pub mod config;
pub mod error;
pub mod refresh;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};

pub struct AppState {
    pub store: Arc<storage::ReadingStore>,
}

/// Open the journal (if configured) and load its readings into `store`.
async fn restore_journal(
    config: &Config,
    store: &storage::ReadingStore,
) -> anyhow::Result<Option<Arc<storage::Journal>>> {
    let Some(path) = config.journal_path() else {
        return Ok(None);
    };
    let journal = storage::Journal::open(path.clone())
        .await
        .with_context(|| format!("opening journal {}", path.display()))?;

    let readings = journal.replay().await?;
    let restored = readings.len();
    for reading in readings {
        let location = reading.location().to_string();
        store.append(&location, reading).await;
    }
    info!("Restored {} readings from {}", restored, journal.path().display());

    Ok(Some(Arc::new(journal)))
}

/// Wire the Open-Meteo adapters, store and journal into a scheduler.
pub async fn build_scheduler(
    config: &Config,
    store: Arc<storage::ReadingStore>,
) -> anyhow::Result<refresh::Scheduler> {
    let journal = restore_journal(config, &store).await?;

    let http = adapter::http_client(config.request_timeout())?;
    let resolver = adapter::GeocodingClient::new(
        http.clone(),
        config.geocoding_url.clone(),
        config.language.clone(),
    );
    let source = adapter::OpenMeteoClient::new(http, config.forecast_url.clone());

    let mut pipeline = refresh::RefreshPipeline::new(
        config.location.clone(),
        Arc::new(resolver),
        Arc::new(source),
        store,
    );
    if let Some(journal) = journal {
        pipeline = pipeline.with_journal(journal);
    }

    Ok(refresh::Scheduler::new(
        Arc::new(pipeline),
        config.refresh_interval(),
    ))
}

/// Run a single refresh cycle and return what was stored.
pub async fn run_once(config: Config) -> anyhow::Result<storage::Reading> {
    let store = Arc::new(storage::ReadingStore::new());
    let scheduler = build_scheduler(&config, store).await?;
    Ok(scheduler.trigger().await?)
}

/// Wait for `signal` or an early server exit, then broadcast shutdown and
/// collect the server's result. The broadcast goes out on every path.
async fn wait_for_stop<S>(
    signal: S,
    mut http_task: JoinHandle<anyhow::Result<()>>,
    shutdown_tx: &broadcast::Sender<()>,
) -> anyhow::Result<()>
where
    S: Future<Output = std::io::Result<()>>,
{
    let stopped = tokio::select! {
        received = signal => received.map(|()| None),
        exited = &mut http_task => Ok(Some(exited)),
    };
    info!("Shutting down");
    let _ = shutdown_tx.send(());

    match stopped {
        Err(e) => {
            let _ = http_task.await;
            Err(anyhow::Error::new(e).context("listening for ctrl-c"))
        }
        Ok(Some(exited)) => exited?,
        Ok(None) => http_task.await?,
    }
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let addr = config.listen_addr()?;
    let store = Arc::new(storage::ReadingStore::new());
    let scheduler = build_scheduler(&config, store.clone()).await?;
    info!(
        "Serving {} history on {}, refresh every {:?}",
        config.location,
        addr,
        scheduler.period()
    );
    let state = Arc::new(AppState { store });

    // broadcast channel for shutdown signaling
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let refresh_task = {
        let shutdown_sub = shutdown_tx.subscribe();
        tokio::spawn(async move {
            scheduler.run(shutdown_sub).await;
        })
    };

    let http_task = {
        let http_shutdown = shutdown_tx.clone();
        tokio::spawn(async move { api::serve(state, addr, http_shutdown).await })
    };

    let outcome = wait_for_stop(tokio::signal::ctrl_c(), http_task, &shutdown_tx).await;
    refresh_task.await?;
    outcome
}
