use crate::AppState;
use crate::helpers;
use crate::response::{KeyContext, KeyEnvelope, PlayerContext, PlayerEnvelope};
use crate::summoner::gate_code;
use crate::validation;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum_macros::debug_handler;
use serde::Deserialize;
use serde_json::json;
use statline_db::{DbError, Permission, Player};
use std::sync::Arc;
use tracing::{error, warn};

#[derive(Deserialize)]
pub(crate) struct ApiKeyQuery {
    api_key: Option<String>,
}

/// Wire shape of a player payload. Unknown fields (such as a client echoing
/// `player_id` back) are ignored; the row id always comes from the store.
#[derive(Deserialize)]
pub(crate) struct PlayerBody {
    player_name: String,
    player_location: String,
    #[serde(default)]
    player_wins: i64,
    #[serde(default)]
    player_draws: i64,
    #[serde(default)]
    player_losses: i64,
    #[serde(default)]
    player_points: i64,
}

impl PlayerBody {
    fn into_player(self) -> Result<Player, statline_db::ValidationError> {
        Player::unsaved(
            self.player_name,
            self.player_location,
            self.player_wins,
            self.player_draws,
            self.player_losses,
            self.player_points,
        )
    }
}

/// Resolve the caller's permission from the `api_key` query parameter.
///
/// `None` means the request is answered 401 before any verb handling: the
/// key is missing or not the right shape. A well-formed key that is not on
/// record reads as guest, and so does a failed lookup.
async fn caller_permission(state: &AppState, api_key: Option<&str>) -> Option<Permission> {
    let key = api_key?;
    validation::validate_api_key(key).ok()?;

    match state.db.get_permission(key.to_string()).await {
        Ok(permission) => Some(permission),
        Err(e) => {
            error!(error = %e, "permission lookup failed");
            Some(Permission::Guest)
        }
    }
}

fn unauthorized_players(method: &Method) -> Response {
    PlayerEnvelope::new(method, 401, &PlayerContext::default(), Vec::new()).into_response()
}

// ============================================================================
// Player resource
// ============================================================================

#[debug_handler]
pub(crate) async fn list_players(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ApiKeyQuery>,
) -> Response {
    if caller_permission(&state, query.api_key.as_deref())
        .await
        .is_none()
    {
        return unauthorized_players(&Method::GET);
    }

    list_players_response(&state, String::new()).await
}

#[debug_handler]
pub(crate) async fn list_players_by_country(
    State(state): State<Arc<AppState>>,
    Path(country): Path<String>,
    Query(query): Query<ApiKeyQuery>,
) -> Response {
    if caller_permission(&state, query.api_key.as_deref())
        .await
        .is_none()
    {
        return unauthorized_players(&Method::GET);
    }

    let country = country.to_ascii_uppercase();
    if let Err(e) = validation::validate_country(&country) {
        warn!(error = %e, "rejected player listing");
        return PlayerEnvelope::with_message(400, format!("Bad Request: {e}.")).into_response();
    }

    list_players_response(&state, country).await
}

async fn list_players_response(state: &AppState, country: String) -> Response {
    let method = Method::GET;
    let display = if country.is_empty() {
        "ALL".to_string()
    } else {
        country.clone()
    };
    let ctx = PlayerContext {
        location: &display,
        many: true,
        ..Default::default()
    };

    match state.db.get_all_players(country).await {
        Ok(players) if players.is_empty() => {
            PlayerEnvelope::new(&method, 404, &ctx, players).into_response()
        }
        Ok(players) => PlayerEnvelope::new(&method, 200, &ctx, players).into_response(),
        Err(e) => {
            error!(error = %e, "player listing failed");
            PlayerEnvelope::new(&method, 500, &ctx, Vec::new()).into_response()
        }
    }
}

#[debug_handler]
pub(crate) async fn get_player(
    State(state): State<Arc<AppState>>,
    Path((country, name)): Path<(String, String)>,
    Query(query): Query<ApiKeyQuery>,
) -> Response {
    let method = Method::GET;

    if caller_permission(&state, query.api_key.as_deref())
        .await
        .is_none()
    {
        return unauthorized_players(&method);
    }

    let country = country.to_ascii_uppercase();
    if let Err(e) =
        validation::validate_country(&country).and(validation::validate_player_name(&name))
    {
        warn!(error = %e, "rejected player lookup");
        return PlayerEnvelope::with_message(400, format!("Bad Request: {e}.")).into_response();
    }

    match state
        .db
        .get_players_by_name(country.clone(), name.clone())
        .await
    {
        Ok(players) => {
            let code = if players.is_empty() { 404 } else { 200 };
            let ctx = PlayerContext {
                name: &name,
                location: &country,
                many: players.len() > 1,
                ..Default::default()
            };
            PlayerEnvelope::new(&method, code, &ctx, players).into_response()
        }
        Err(e) => {
            error!(error = %e, "player lookup failed");
            let ctx = PlayerContext {
                name: &name,
                location: &country,
                ..Default::default()
            };
            PlayerEnvelope::new(&method, 500, &ctx, Vec::new()).into_response()
        }
    }
}

#[debug_handler]
pub(crate) async fn create_player(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ApiKeyQuery>,
    body: Result<Json<PlayerBody>, JsonRejection>,
) -> Response {
    let method = Method::POST;

    match caller_permission(&state, query.api_key.as_deref()).await {
        Some(Permission::Admin) => {}
        // Guests are read-only
        Some(Permission::Guest) | None => return unauthorized_players(&method),
    }

    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection, "rejected player payload");
            return PlayerEnvelope::with_message(
                400,
                "Bad Request: the player payload could not be parsed, please check the JSON body.",
            )
            .into_response();
        }
    };

    let player = match body.into_player() {
        Ok(player) => player,
        Err(e) => {
            warn!(error = %e, "rejected player payload");
            return PlayerEnvelope::with_message(400, format!("Bad Request: {e}.")).into_response();
        }
    };

    // The player must exist on the region's server before we track them
    if let Some(summoner) = &state.summoner {
        let status = summoner.verify(player.location(), player.name()).await;
        if let Some(code) = gate_code(status) {
            let ctx = PlayerContext {
                name: player.name(),
                location: player.location(),
                third_party: true,
                ..Default::default()
            };
            return PlayerEnvelope::new(&method, code, &ctx, Vec::new()).into_response();
        }
    }

    match state.db.insert_player(player.clone()).await {
        Ok(id) => {
            let ctx = PlayerContext {
                name: player.name(),
                location: player.location(),
                id,
                ..Default::default()
            };
            PlayerEnvelope::new(&method, 200, &ctx, vec![player.with_id(id)]).into_response()
        }
        Err(DbError::PlayerExists) => {
            let ctx = PlayerContext {
                name: player.name(),
                location: player.location(),
                ..Default::default()
            };
            PlayerEnvelope::new(&method, 400, &ctx, Vec::new()).into_response()
        }
        Err(e) => {
            error!(error = %e, "player creation failed");
            let ctx = PlayerContext {
                name: player.name(),
                location: player.location(),
                ..Default::default()
            };
            PlayerEnvelope::new(&method, 500, &ctx, Vec::new()).into_response()
        }
    }
}

#[debug_handler]
pub(crate) async fn update_player(
    State(state): State<Arc<AppState>>,
    Path((country, name)): Path<(String, String)>,
    Query(query): Query<ApiKeyQuery>,
    body: Result<Json<PlayerBody>, JsonRejection>,
) -> Response {
    let method = Method::PUT;

    match caller_permission(&state, query.api_key.as_deref()).await {
        Some(Permission::Admin) => {}
        Some(Permission::Guest) | None => return unauthorized_players(&method),
    }

    let country = country.to_ascii_uppercase();
    if let Err(e) =
        validation::validate_country(&country).and(validation::validate_player_name(&name))
    {
        warn!(error = %e, "rejected player update");
        return PlayerEnvelope::with_message(400, format!("Bad Request: {e}.")).into_response();
    }

    // The row id is not part of the payload; resolve it from the URI pair
    let id = match state
        .db
        .get_players_by_name(country.clone(), name.clone())
        .await
    {
        Ok(players) => match players.first() {
            Some(existing) => existing.id(),
            None => {
                let ctx = PlayerContext {
                    name: &name,
                    location: &country,
                    ..Default::default()
                };
                return PlayerEnvelope::new(&method, 404, &ctx, Vec::new()).into_response();
            }
        },
        Err(e) => {
            error!(error = %e, "player lookup failed");
            let ctx = PlayerContext {
                name: &name,
                location: &country,
                ..Default::default()
            };
            return PlayerEnvelope::new(&method, 500, &ctx, Vec::new()).into_response();
        }
    };

    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!(error = %rejection, "rejected player payload");
            return PlayerEnvelope::with_message(
                400,
                "Bad Request: the player payload could not be parsed, please check the JSON body.",
            )
            .into_response();
        }
    };

    let player = match body.into_player() {
        Ok(player) => player,
        Err(e) => {
            warn!(error = %e, "rejected player payload");
            return PlayerEnvelope::with_message(400, format!("Bad Request: {e}.")).into_response();
        }
    };

    match state.db.update_player(player.clone(), id).await {
        Ok(()) => {
            let ctx = PlayerContext {
                name: player.name(),
                location: player.location(),
                id,
                ..Default::default()
            };
            PlayerEnvelope::new(&method, 200, &ctx, vec![player.with_id(id)]).into_response()
        }
        Err(DbError::PlayerNotFound) => {
            let ctx = PlayerContext {
                name: &name,
                location: &country,
                ..Default::default()
            };
            PlayerEnvelope::new(&method, 404, &ctx, Vec::new()).into_response()
        }
        Err(e) => {
            error!(error = %e, "player update failed");
            let ctx = PlayerContext {
                name: player.name(),
                location: player.location(),
                ..Default::default()
            };
            PlayerEnvelope::new(&method, 500, &ctx, Vec::new()).into_response()
        }
    }
}

#[debug_handler]
pub(crate) async fn delete_player(
    State(state): State<Arc<AppState>>,
    Path((country, name)): Path<(String, String)>,
    Query(query): Query<ApiKeyQuery>,
) -> Response {
    let method = Method::DELETE;

    match caller_permission(&state, query.api_key.as_deref()).await {
        Some(Permission::Admin) => {}
        Some(Permission::Guest) | None => return unauthorized_players(&method),
    }

    let country = country.to_ascii_uppercase();
    if let Err(e) =
        validation::validate_country(&country).and(validation::validate_player_name(&name))
    {
        warn!(error = %e, "rejected player deletion");
        return PlayerEnvelope::with_message(400, format!("Bad Request: {e}.")).into_response();
    }

    let target = match state
        .db
        .get_players_by_name(country.clone(), name.clone())
        .await
    {
        Ok(players) => match players.into_iter().next() {
            Some(player) => player,
            None => {
                let ctx = PlayerContext {
                    name: &name,
                    location: &country,
                    ..Default::default()
                };
                return PlayerEnvelope::new(&method, 404, &ctx, Vec::new()).into_response();
            }
        },
        Err(e) => {
            error!(error = %e, "player lookup failed");
            let ctx = PlayerContext {
                name: &name,
                location: &country,
                ..Default::default()
            };
            return PlayerEnvelope::new(&method, 500, &ctx, Vec::new()).into_response();
        }
    };

    let ctx = PlayerContext {
        name: target.name(),
        location: target.location(),
        ..Default::default()
    };
    match state
        .db
        .delete_player(target.name().to_string(), target.location().to_string())
        .await
    {
        Ok(()) => PlayerEnvelope::new(&method, 200, &ctx, Vec::new()).into_response(),
        Err(DbError::PlayerNotFound) => {
            PlayerEnvelope::new(&method, 404, &ctx, Vec::new()).into_response()
        }
        Err(e) => {
            error!(error = %e, "player deletion failed");
            PlayerEnvelope::new(&method, 500, &ctx, Vec::new()).into_response()
        }
    }
}

// ============================================================================
// Key resource
// ============================================================================

#[debug_handler]
pub(crate) async fn list_keys(State(state): State<Arc<AppState>>) -> Response {
    let method = Method::GET;

    match state.db.get_keys().await {
        Ok(keys) if keys.is_empty() => {
            let ctx = KeyContext {
                uncaught: true,
                ..Default::default()
            };
            KeyEnvelope::new(&method, 404, &ctx, keys).into_response()
        }
        Ok(keys) => {
            let ctx = KeyContext {
                many: keys.len() > 1,
                ..Default::default()
            };
            KeyEnvelope::new(&method, 200, &ctx, keys).into_response()
        }
        Err(e) => {
            error!(error = %e, "key listing failed");
            let ctx = KeyContext {
                many: true,
                ..Default::default()
            };
            KeyEnvelope::new(&method, 500, &ctx, Vec::new()).into_response()
        }
    }
}

#[debug_handler]
pub(crate) async fn create_admin_key(State(state): State<Arc<AppState>>) -> Response {
    create_key_response(&state, Permission::Admin).await
}

#[debug_handler]
pub(crate) async fn create_guest_key(State(state): State<Arc<AppState>>) -> Response {
    create_key_response(&state, Permission::Guest).await
}

async fn create_key_response(state: &AppState, permission: Permission) -> Response {
    let method = Method::POST;
    let fresh = helpers::generate_api_key();

    match state.db.create_key(fresh, permission).await {
        Ok(key) => {
            let permission_label = key.permission().to_string();
            let ctx = KeyContext {
                key: key.key(),
                permission: &permission_label,
                ..Default::default()
            };
            KeyEnvelope::new(&method, 200, &ctx, vec![key.clone()]).into_response()
        }
        Err(e) => {
            error!(error = %e, "key creation failed");
            KeyEnvelope::new(&method, 500, &KeyContext::default(), Vec::new()).into_response()
        }
    }
}

#[debug_handler]
pub(crate) async fn reset_key(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ApiKeyQuery>,
) -> Response {
    let method = Method::PUT;

    let old = match query.api_key {
        Some(key) if validation::validate_api_key(&key).is_ok() => key,
        _ => {
            return KeyEnvelope::new(&method, 400, &KeyContext::default(), Vec::new())
                .into_response();
        }
    };

    let fresh = helpers::generate_api_key();
    match state.db.replace_key(old, fresh).await {
        Ok(key) => {
            let permission_label = key.permission().to_string();
            let ctx = KeyContext {
                key: key.key(),
                permission: &permission_label,
                ..Default::default()
            };
            KeyEnvelope::new(&method, 200, &ctx, vec![key.clone()]).into_response()
        }
        Err(DbError::KeyNotFound) => {
            KeyEnvelope::new(&method, 404, &KeyContext::default(), Vec::new()).into_response()
        }
        Err(e) => {
            error!(error = %e, "key rotation failed");
            KeyEnvelope::new(&method, 500, &KeyContext::default(), Vec::new()).into_response()
        }
    }
}

// ============================================================================
// Fallbacks
// ============================================================================

/// A matched player path whose verb has no handler wired.
pub(crate) async fn player_insufficient(method: Method) -> Response {
    let ctx = PlayerContext {
        uncaught: true,
        ..Default::default()
    };
    PlayerEnvelope::new(&method, 500, &ctx, Vec::new()).into_response()
}

/// A matched key path whose verb has no handler wired.
pub(crate) async fn key_insufficient(method: Method) -> Response {
    let ctx = KeyContext {
        uncaught: true,
        ..Default::default()
    };
    KeyEnvelope::new(&method, 500, &ctx, Vec::new()).into_response()
}

/// Router fallback for paths outside every resource.
pub(crate) async fn unmatched_path() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "errCode": 404,
            "errMsg": "The resource you requested was not valid, please check the format of your URI, it should look something like: /v1/player/ALL",
        })),
    )
        .into_response()
}
