pub mod config;
pub mod helpers;
mod response;
mod routes;
mod summoner;
mod validation;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use std::sync::Arc;
use std::time::Duration;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

pub use summoner::SummonerClient;

pub struct AppState {
    pub db: statline_db::Database,
    pub summoner: Option<SummonerClient>,
}

/// Rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests per minute for the key issuance endpoints
    pub key_per_min: u64,
    /// Burst size for the key issuance endpoints
    pub key_burst: u32,
    /// Requests per second for the player endpoints
    pub player_per_sec: u64,
    /// Burst size for the player endpoints
    pub player_burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            key_per_min: 30,
            key_burst: 5,
            player_per_sec: 50,
            player_burst: 100,
        }
    }
}

/// Create the application router with the given database and configuration
pub fn create_app(
    db: statline_db::Database,
    summoner: Option<SummonerClient>,
    request_body_limit: usize,
    request_timeout: Duration,
    rate_limit: RateLimitConfig,
) -> Router {
    let state = Arc::new(AppState { db, summoner });

    // Strict rate limit for key issuance - keys are minted rarely
    let key_governor = GovernorConfigBuilder::default()
        .per_second(rate_limit.key_per_min / 60 + 1) // Convert per-min to per-sec, min 1
        .burst_size(rate_limit.key_burst)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .unwrap();

    // Lenient rate limit for the player resource
    let player_governor = GovernorConfigBuilder::default()
        .per_second(rate_limit.player_per_sec)
        .burst_size(rate_limit.player_burst)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .unwrap();

    // A matched path with an unwired verb answers the 500 "insufficient
    // request handlers" envelope, not axum's native 405: every response
    // carries the envelope.
    let player_routes = Router::new()
        .route(
            "/v1/player",
            get(routes::list_players)
                .post(routes::create_player)
                .fallback(routes::player_insufficient),
        )
        .route(
            "/v1/player/{country}",
            get(routes::list_players_by_country).fallback(routes::player_insufficient),
        )
        .route(
            "/v1/player/{country}/{name}",
            get(routes::get_player)
                .put(routes::update_player)
                .delete(routes::delete_player)
                .fallback(routes::player_insufficient),
        )
        .layer(GovernorLayer::new(player_governor));

    let key_routes = Router::new()
        .route(
            "/v1/key",
            get(routes::list_keys).fallback(routes::key_insufficient),
        )
        .route(
            "/v1/key/admin",
            post(routes::create_admin_key).fallback(routes::key_insufficient),
        )
        .route(
            "/v1/key/guest",
            post(routes::create_guest_key).fallback(routes::key_insufficient),
        )
        .route(
            "/v1/key/reset",
            put(routes::reset_key).fallback(routes::key_insufficient),
        )
        .layer(GovernorLayer::new(key_governor));

    Router::new()
        .merge(player_routes)
        .merge(key_routes)
        .fallback(routes::unmatched_path)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(RequestBodyLimitLayer::new(request_body_limit))
        .with_state(state)
}
