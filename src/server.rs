use crate::{
    error::AppError,
    exposition,
};
use axum::{
    extract::State,
    http::header,
    response::{
        Html,
        IntoResponse,
    },
    routing::get,
    Router,
};
use eyre::{
    Context as _,
    Result,
};
use se_exporter_client::MetricsCollector;
use std::{
    net::SocketAddr,
    sync::Arc,
};
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<MetricsCollector>,
    pub metric_prefix: Arc<str>,
}

pub fn create_router(collector: MetricsCollector, metric_prefix: impl Into<Arc<str>>) -> Router {
    let state = AppState {
        collector: Arc::new(collector),
        metric_prefix: metric_prefix.into(),
    };

    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

pub async fn serve(address: SocketAddr, app: Router) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .wrap_err_with(|| format!("Failed to listen on {address}"))?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("interrupted, shutting down");
}

async fn index() -> Html<&'static str> {
    Html(
        "<html><head><title>Space Engineers Exporter</title></head>\
         <body><h1>Space Engineers Exporter</h1><p><a href=\"/metrics\">Metrics</a></p></body></html>",
    )
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let records = state.collector.collect().await?;
    let body = exposition::render(&records, &state.metric_prefix)?;
    Ok(([(header::CONTENT_TYPE, exposition::CONTENT_TYPE)], body))
}
