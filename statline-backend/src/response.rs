//! The response envelope every route answers with.
//!
//! Success and failure alike serialize as `{errCode, errMsg, players|keys}`,
//! with the transport status code set from `errCode`. Message text comes from
//! a pure function over `(verb, code, context)`; nothing is cached or shared
//! between requests.

use axum::Json;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use statline_db::{Key, Player};

/// Everything the player message catalogue may interpolate.
#[derive(Debug, Default)]
pub struct PlayerContext<'a> {
    pub name: &'a str,
    pub location: &'a str,
    pub id: i64,
    /// Plural phrasing: the response describes a collection rather than one
    /// player.
    pub many: bool,
    /// The code mirrors a third-party summoner API response.
    pub third_party: bool,
    /// No handler was wired for this verb/template combination.
    pub uncaught: bool,
}

/// Everything the key message catalogue may interpolate.
#[derive(Debug, Default)]
pub struct KeyContext<'a> {
    pub key: &'a str,
    pub permission: &'a str,
    pub many: bool,
    pub uncaught: bool,
}

const UNAUTHORIZED_MSG: &str =
    "You are not authorised to access this resource, your API key is limited to GET requests.";

const FALLBACK_500_MSG: &str =
    "There was an uncaught internal server error, please check your URI and try again.";

/// Human-readable message for a player response.
///
/// Precedence, highest first: the fixed 401 text, third-party mirror texts,
/// unwired-handler texts, the per-verb table, and a generic fallback for
/// combinations the table does not know.
pub fn player_message(method: &Method, code: u16, ctx: &PlayerContext) -> String {
    if code == 401 {
        return UNAUTHORIZED_MSG.to_string();
    }

    if ctx.third_party {
        return match code {
            400 => "Bad request made to the third party API.".to_string(),
            404 => format!(
                "No player information matches: {} on the {} server. Please check your input and try again.",
                ctx.name, ctx.location
            ),
            429 => "Request limit exceeded on the third party API. Please try again later."
                .to_string(),
            500 => "The third party API encountered an internal server error.".to_string(),
            503 => "Sorry, the third party API is currently unavailable, this will only affect POST transactions. Please try again later."
                .to_string(),
            _ => FALLBACK_500_MSG.to_string(),
        };
    }

    if ctx.uncaught {
        return match code {
            500 => "Internal Server Error: This URI has insufficient request handlers, for example, this URI may be restricted to GET only."
                .to_string(),
            404 => "Resource not found: No players exist in the system.".to_string(),
            _ => FALLBACK_500_MSG.to_string(),
        };
    }

    match (method.as_str(), code) {
        ("GET", 500) if ctx.many => {
            "There was an internal server error when trying to retrieve the players.".to_string()
        }
        ("GET", 404) if ctx.many => {
            format!("No players were found on the {} server.", ctx.location)
        }
        ("GET", 400) if ctx.many => {
            "Bad Request: Please ensure the location you specified is correct.".to_string()
        }
        ("GET", 200) if ctx.many => {
            "Success: the players were retrieved from the system.".to_string()
        }
        ("GET", 500) => {
            "There was an internal server error when trying to retrieve the player.".to_string()
        }
        ("GET", 404) => format!(
            "The requested resource was not found on the server, please ensure the name is spelt correctly and check that you are searching the right region: /v1/player/{}/{} will produce different results to /v1/player/ALL/{}",
            ctx.location, ctx.name, ctx.name
        ),
        ("GET", 400) => format!(
            "Bad Request: Please ensure the location you specified is correct, and that the path is in valid format: /v1/player/{}/{}",
            ctx.location, ctx.name
        ),
        ("GET", 200) => "Success: the player was retrieved.".to_string(),
        ("PUT", 500) => "There was an internal server error when updating this player.".to_string(),
        ("PUT", 404) => format!(
            "The requested resource was not found on the server, please ensure that {} has been spelt correctly, and ensure that {} is the correct server.",
            ctx.name, ctx.location
        ),
        ("PUT", 400) => format!(
            "Bad Request: Please ensure the players location and name in the URI match that of your parameters: /v1/player/{}/{}",
            ctx.location, ctx.name
        ),
        ("PUT", 200) => format!("Success: the Player with ID: {} was updated!", ctx.id),
        ("POST", 500) => {
            "There was an internal server error when creating the new player.".to_string()
        }
        ("POST", 400) => format!(
            "Bad Request: The player {} already exists on the {} server, please try again.",
            ctx.name, ctx.location
        ),
        ("POST", 200) => format!(
            "Success: the Player {} on the {} server was created!",
            ctx.name, ctx.location
        ),
        ("DELETE", 500) => {
            "There was an internal server error when deleting this player.".to_string()
        }
        ("DELETE", 404) => format!(
            "The requested resource was not found on the server, please ensure that {} has been spelt correctly, and ensure that {} is the correct server.",
            ctx.name, ctx.location
        ),
        ("DELETE", 400) => format!(
            "Bad Request: Please ensure the players location and name in the URI match that of your parameters: /v1/player/{}/{}",
            ctx.location, ctx.name
        ),
        ("DELETE", 200) => format!(
            "Success: {} on the {} server was deleted.",
            ctx.name, ctx.location
        ),
        (_, 404) => "The resource you requested was not valid, please check the format of your URI, it should look something like: /v1/player/ALL"
            .to_string(),
        (_, 200) => "Success!".to_string(),
        _ => FALLBACK_500_MSG.to_string(),
    }
}

/// Human-readable message for a key response. Same precedence rules as
/// [`player_message`].
pub fn key_message(method: &Method, code: u16, ctx: &KeyContext) -> String {
    if code == 401 {
        return UNAUTHORIZED_MSG.to_string();
    }

    if ctx.uncaught {
        return match code {
            500 => "Internal Server Error: This URI has insufficient request handlers, for example, this URI may be restricted to GET only."
                .to_string(),
            404 => "Resource not found: No keys exist in the system.".to_string(),
            _ => FALLBACK_500_MSG.to_string(),
        };
    }

    match (method.as_str(), code) {
        ("GET", 500) if ctx.many => {
            "There was an internal server error when trying to retrieve the keys.".to_string()
        }
        ("GET", 404) if ctx.many => "No keys were found on the server.".to_string(),
        ("GET", 200) if ctx.many => {
            "Success: the keys were retrieved from the system.".to_string()
        }
        ("GET", 500) => {
            "There was an internal server error when trying to retrieve the key.".to_string()
        }
        ("GET", 404) => "The requested resource was not found on the server.".to_string(),
        ("GET", 200) => "Success: the key was retrieved.".to_string(),
        ("PUT", 500) => "There was an internal server error when updating this key.".to_string(),
        ("PUT", 404) => "The requested key was not found on the server.".to_string(),
        ("PUT", 400) => "Bad Request: Please ensure you specified the correct key.".to_string(),
        ("PUT", 200) => format!(
            "Success: your new key is {}, it has {} permissions.",
            ctx.key, ctx.permission
        ),
        ("POST", 500) => {
            "There was an internal server error when creating the new key.".to_string()
        }
        ("POST", 400) => {
            "Bad Request: Please ensure the path you are POSTing to is valid: /v1/key.".to_string()
        }
        ("POST", 200) => format!(
            "Success: the new {} key: {} was added to the system.",
            ctx.permission, ctx.key
        ),
        ("DELETE", 500) => {
            "There was an internal server error when deleting this key.".to_string()
        }
        ("DELETE", 404) => "The requested key was not found on the server.".to_string(),
        ("DELETE", 400) => "Bad Request: Please ensure you specified the correct key.".to_string(),
        ("DELETE", 200) => "Success: the key was deleted.".to_string(),
        (_, 404) => "The resource you requested was not valid, please check the format of your URI, it should look something like: /v1/key"
            .to_string(),
        (_, 200) => "Success!".to_string(),
        _ => FALLBACK_500_MSG.to_string(),
    }
}

/// Response envelope for the player resource.
#[derive(Debug, Serialize)]
pub struct PlayerEnvelope {
    #[serde(rename = "errCode")]
    pub err_code: u16,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
    pub players: Vec<Player>,
}

impl PlayerEnvelope {
    pub fn new(method: &Method, code: u16, ctx: &PlayerContext, players: Vec<Player>) -> Self {
        Self {
            err_code: code,
            err_msg: player_message(method, code, ctx),
            players,
        }
    }

    /// Envelope with an explicit message, for conditions the catalogue has
    /// no slot for (malformed request bodies and the like).
    pub fn with_message(code: u16, message: impl Into<String>) -> Self {
        Self {
            err_code: code,
            err_msg: message.into(),
            players: Vec::new(),
        }
    }
}

impl IntoResponse for PlayerEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.err_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Response envelope for the key resource.
#[derive(Debug, Serialize)]
pub struct KeyEnvelope {
    #[serde(rename = "errCode")]
    pub err_code: u16,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
    pub keys: Vec<Key>,
}

impl KeyEnvelope {
    pub fn new(method: &Method, code: u16, ctx: &KeyContext, keys: Vec<Key>) -> Self {
        Self {
            err_code: code,
            err_msg: key_message(method, code, ctx),
            keys,
        }
    }
}

impl IntoResponse for KeyEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.err_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
