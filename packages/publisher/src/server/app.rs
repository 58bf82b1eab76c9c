//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domains::auth::JwtService;
use crate::kernel::ServerDeps;
use crate::server::middleware::{
    admin_rate_limit, extract_client_ip, jwt_auth_middleware, require_cron_secret,
};
use crate::server::routes::{cron, health_handler, posts, queue, taxonomy};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
    pub jwt_service: Arc<JwtService>,
    pub cron_secret: Option<String>,
    pub admin_rate_limit_per_minute: u32,
    pub scheduler_enabled: bool,
    /// Key rate limits on forwarded headers instead of the socket address
    pub trust_proxy_headers: bool,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let admin = Router::new()
        .route("/queue", get(queue::list_queue).post(queue::add_title))
        .route("/queue/bulk", post(queue::add_titles))
        .route(
            "/queue/:id",
            patch(queue::edit_item).delete(queue::delete_item),
        )
        .route("/queue/:id/retry", post(queue::retry_item))
        .route("/queue/:id/generate", post(queue::generate_item))
        .route("/queue/:id/reset", post(queue::reset_item))
        .route("/posts", get(posts::list_posts))
        .route("/posts/:id", patch(posts::edit_post))
        .route(
            "/categories",
            get(taxonomy::list_categories).post(taxonomy::create_category),
        )
        .route("/categories/:id", patch(taxonomy::rename_category))
        .route("/tags", get(taxonomy::list_tags).post(taxonomy::create_tag))
        .route("/tags/:id", patch(taxonomy::rename_tag))
        .layer(middleware::from_fn(jwt_auth_middleware)) // JWT authentication
        .layer(middleware::from_fn(admin_rate_limit)); // Per-IP admin limit

    let cron_routes = Router::new()
        .route("/generate", post(cron::cron_generate))
        .route("/publish", post(cron::cron_publish))
        .route_layer(middleware::from_fn(require_cron_secret));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/admin", admin)
        .nest("/api/cron", cron_routes)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(extract_client_ip))
        .layer(Extension(state)) // Shared state (must be after middlewares that need it)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
