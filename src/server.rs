use crate::config::Config;
use crate::constants::{
    ADMIN_HEALTH_PATH, ADMIN_MAPPINGS_PATH, ADMIN_METRICS_PATH, ADMIN_PATH, STATIC_PATH,
};
use crate::error::Result;
use crate::handlers::{route, AdminListing, MappingAdmin, RedirectResolver};
use crate::repository::MappingRepository;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "urlshare",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus scrape endpoint
async fn metrics() -> impl IntoResponse {
    match crate::metrics::render() {
        Some(body) => body.into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

/// Build the router: admin routes, static assets, and the redirect resolver
/// as the fallback for every other path.
pub fn create_server(config: &Config, repo: MappingRepository) -> Result<Router> {
    let base = config.base_iri()?;

    let resolver = RedirectResolver::new(repo.clone(), base.clone(), config.server.addressing);
    let admin = MappingAdmin::new(repo.clone(), base.clone(), config.key_format()?);
    let listing = AdminListing::new(repo, base.to_string());

    let router = Router::new()
        .route(ADMIN_HEALTH_PATH, get(health))
        .route(ADMIN_METRICS_PATH, get(metrics))
        .route(ADMIN_PATH, route(listing))
        .route(ADMIN_MAPPINGS_PATH, route(admin))
        .nest_service(STATIC_PATH, ServeDir::new(&config.server.static_dir))
        .fallback_service(route(resolver))
        // INFO so request lines pass the default `urlshare=info,tower_http=info` filter
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn start_server(config: &Config, repo: MappingRepository) -> anyhow::Result<()> {
    let app = create_server(config, repo)?;
    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("HTTP server running on http://{}", listener.local_addr()?);
    info!("Admin page: {}admin", config.base_iri()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
    }
}
