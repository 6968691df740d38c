use axum::{Router, http::header, routing::get};
use billpay::api::handlers::{AppState, api_routes};
use billpay::api::openapi::ApiDoc;
use billpay::auth::jwt::IdentityVerifier;
use billpay::config::CONFIG;
use billpay::{BillpayService, InMemoryNotifications, RemoteStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&CONFIG.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    info!(config = ?*CONFIG, "starting billpay");

    let store = RemoteStore::new(&CONFIG.bill_service_url, CONFIG.request_timeout)?;
    let notifications = InMemoryNotifications::new();
    let state = AppState {
        service: Arc::new(BillpayService::new(store, notifications)),
        verifier: Arc::new(IdentityVerifier::new(CONFIG.identity_secret.clone())),
    };

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .nest("/api", api_routes(state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    http::Method::GET,
                    http::Method::POST,
                    http::Method::PATCH,
                    http::Method::DELETE,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
