//! vCard sharing server library
//!
//! Exposes the application state and router so that the binary and the
//! integration tests build the exact same service.

pub mod analytics;
pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;

pub use config::Config;
pub use db::{Db, open_database};
pub use error::{AppError, Result};

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, patch, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::{analytics as analytics_routes, auth as auth_routes, share, team, upload, vcards};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState with the given database and configuration
    pub fn new(db: Db, config: Config) -> Self {
        Self { db, config }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any)
}

/// Build the HTTP router with every endpoint
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        // Sessions
        .route("/auth/register", post(auth_routes::register))
        .route("/auth/login", post(auth_routes::login))
        .route("/auth/me", get(auth_routes::me))
        // Cards
        .route("/vcards", get(vcards::list_all).post(vcards::create_vcard))
        .route("/vcards/analytics", get(analytics_routes::summary))
        .route("/vcards/public/:public_id", get(share::view_public))
        .route(
            "/vcards/:id",
            get(vcards::get_vcard)
                .put(vcards::update_vcard)
                .delete(vcards::remove_vcard),
        )
        .route("/vcards/:id/qr", get(share::qr_code))
        .route("/vcards/:id/nfc", get(share::nfc_link).post(share::program_nfc))
        .route("/vcards/:id/analytics", get(analytics_routes::card_summary))
        .route("/analytics", get(analytics_routes::overview))
        // Teams
        .route("/team", get(team::list_teams).post(team::create_team))
        .route(
            "/team/:id/members",
            get(team::list_members).post(team::invite_member),
        )
        .route(
            "/team/:id/members/:member_id",
            patch(team::update_member).delete(team::delete_member),
        )
        .route("/upload", post(upload::upload_file))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
