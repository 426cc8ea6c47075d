use std::time::Duration;

use tracing::warn;

/// Client for the third-party summoner lookup used to verify that a player
/// actually exists on the region's server before we record them.
pub struct SummonerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SummonerClient {
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build summoner http client");

        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Status code the upstream reports for `(region, name)`. Any transport
    /// failure, timeouts included, reads as 503: the service is unavailable
    /// as far as this request is concerned.
    pub async fn verify(&self, region: &str, name: &str) -> u16 {
        let url = format!(
            "{}/{}/v1.4/summoner/by-name/{}?api_key={}",
            self.base_url.trim_end_matches('/'),
            region.to_ascii_lowercase(),
            name,
            self.api_key,
        );

        match self.http.get(&url).send().await {
            Ok(response) => response.status().as_u16(),
            Err(e) => {
                warn!(region, name, error = %e, "summoner lookup failed");
                503
            }
        }
    }
}

/// Translate the upstream status into the code a blocked creation should
/// answer with. `None` means the summoner checks out and creation proceeds.
/// Recognised failures mirror through unchanged; anything unrecognised is
/// treated as the upstream rate limit kicking in.
pub fn gate_code(status: u16) -> Option<u16> {
    match status {
        200 => None,
        400 | 401 | 404 | 500 | 503 => Some(status),
        _ => Some(429),
    }
}
