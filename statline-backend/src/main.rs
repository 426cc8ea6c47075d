use statline_backend::{RateLimitConfig, SummonerClient, config::Config, create_app};
use statline_db::Database;
use std::net::SocketAddr;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    #[cfg(debug_assertions)]
    let log_level = tracing::Level::DEBUG;
    #[cfg(not(debug_assertions))]
    let log_level = tracing::Level::INFO;

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();
    tracing::info!("Starting statline backend server...");

    // Load configuration from environment variables or use defaults
    let config = Config::from_env();
    tracing::info!(
        "Configuration: port={}, db_path={}, body_limit={}KB, timeout={}s",
        config.port,
        config.database_path,
        config.request_body_limit / 1024,
        config.request_timeout.as_secs(),
    );
    tracing::info!(
        "Rate limits: key={}/min (burst {}), player={}/sec (burst {})",
        config.rate_limit_key_per_min,
        config.rate_limit_key_burst,
        config.rate_limit_player_per_sec,
        config.rate_limit_player_burst,
    );

    let db = Database::open(&config.database_path).await?;

    let summoner = match (&config.summoner_api_url, &config.summoner_api_key) {
        (Some(url), Some(key)) => {
            tracing::info!("Summoner verification enabled against {}", url);
            Some(SummonerClient::new(
                url.clone(),
                key.clone(),
                config.summoner_timeout,
            ))
        }
        _ => {
            tracing::info!("Summoner verification disabled (SUMMONER_API_URL not set)");
            None
        }
    };

    let rate_limit = RateLimitConfig {
        key_per_min: config.rate_limit_key_per_min,
        key_burst: config.rate_limit_key_burst,
        player_per_sec: config.rate_limit_player_per_sec,
        player_burst: config.rate_limit_player_burst,
    };
    let app = create_app(
        db,
        summoner,
        config.request_body_limit,
        config.request_timeout,
        rate_limit,
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
