pub mod config;
pub mod error;
pub mod routes;
pub mod upstream;

use std::path::Path;
use std::sync::Arc;

use axum::http::Method;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use config::ProxyConfig;
use error::ProxyError;
use upstream::Upstream;

#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<Upstream>,
}

impl AppState {
    #[must_use]
    pub fn new(config: &ProxyConfig) -> Self {
        Self {
            upstream: Arc::new(Upstream::new(reqwest::Client::new(), config)),
        }
    }
}

pub fn router(state: AppState, public_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/apod/get_image", get(routes::get_image))
        .route("/apod/get_images", get(routes::get_images))
        .route("/epic/get_latest", get(routes::get_latest))
        .route("/mars-photos/manifest/:rover", get(routes::get_manifest))
        .route("/mars-photos/rovers/:rover/:date", get(routes::get_rover_photos))
        .fallback_service(ServeDir::new(public_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: ProxyConfig) -> Result<(), ProxyError> {
    let app = router(AppState::new(&config), &config.public_dir);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|source| ProxyError::Bind {
            addr: config.bind_addr.to_string(),
            source,
        })?;
    info!("proxy listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ProxyError::Serve)?;

    info!("proxy stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
}
