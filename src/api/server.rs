//! HTTP server implementation

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::auth::Authenticator;
use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::rag::SearchService;
use crate::Result;

/// Full application router: `/api` routes plus tracing, compression and optional CORS
pub fn build_app(state: AppState, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .nest("/api", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server
pub async fn serve_api(config: &AppConfig, host: String, port: u16, enable_cors: bool) -> Result<()> {
    info!("🚀 Starting postrag API server...");

    // Initialize services
    let search = SearchService::from_config(config).await?;
    let auth = Authenticator::from_config(&config.auth)?;
    if auth.is_required() {
        info!("🔒 Bearer authentication required for /api/search");
    }

    let app = build_app(AppState::new(search, auth), enable_cors);

    // Start server
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /api/health  - Health check");
    info!("  POST /api/search  - Grounded answer search");

    axum::serve(listener, app).await?;

    Ok(())
}
