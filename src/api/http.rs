use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::broadcast::Sender as BroadcastSender;
use tracing::{debug, error, info};

use crate::error::Error;
use crate::storage::reading::{minute_format, Reading};

/// Wire shape of one reading; the location is already in the path.
#[derive(Serialize)]
pub struct ReadingView {
    #[serde(with = "minute_format")]
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
}

impl From<&Reading> for ReadingView {
    fn from(r: &Reading) -> Self {
        Self {
            timestamp: r.timestamp(),
            temperature: r.temperature(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound(location) => {
                debug!("no readings for {}", location);
                (StatusCode::NOT_FOUND, "not found").into_response()
            }
            other => {
                error!("query failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

pub fn router(state: Arc<crate::AppState>) -> Router {
    Router::new()
        .route("/:location", get(history_handler))
        .route("/:location/latest", get(latest_handler))
        .layer(Extension(state))
}

pub async fn serve(
    state: Arc<crate::AppState>,
    addr: SocketAddr,
    shutdown: BroadcastSender<()>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    let mut shutdown_sub = shutdown.subscribe();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown_sub.recv().await;
        })
        .await?;
    Ok(())
}

fn json_response<T: Serialize>(body: &T) -> Result<Response, Error> {
    let bytes = serde_json::to_vec(body)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

async fn history_handler(
    Extension(state): Extension<Arc<crate::AppState>>,
    Path(location): Path<String>,
) -> Result<Response, Error> {
    debug!("history requested for {}", location);
    let history = state
        .store
        .get(&location)
        .await
        .ok_or_else(|| Error::NotFound(location.clone()))?;
    let views: Vec<ReadingView> = history.iter().map(ReadingView::from).collect();
    json_response(&views)
}

async fn latest_handler(
    Extension(state): Extension<Arc<crate::AppState>>,
    Path(location): Path<String>,
) -> Result<Response, Error> {
    let latest = state
        .store
        .latest(&location)
        .await
        .ok_or_else(|| Error::NotFound(location.clone()))?;
    json_response(&ReadingView::from(&latest))
}
