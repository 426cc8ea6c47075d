use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use statline_backend::{RateLimitConfig, SummonerClient, config::Config, create_app, helpers};
use statline_db::{Database, Permission};
use std::time::Duration;
use tower::ServiceExt;
// for `oneshot` method

/// Helper to create test database with in-memory SQLite
async fn setup_test_db() -> Database {
    Database::open_in_memory()
        .await
        .expect("Failed to create in-memory database")
}

/// Helper to create app with default test configuration
fn create_test_app(db: Database) -> Router {
    let config = Config::default();
    create_app(
        db,
        None,
        config.request_body_limit,
        config.request_timeout,
        RateLimitConfig::default(),
    )
}

/// Helper to create app with a summoner gate pointing at a mock upstream
fn create_gated_app(db: Database, summoner_url: String) -> Router {
    let config = Config::default();
    let summoner = SummonerClient::new(
        summoner_url,
        "TESTCONSUMERKEY".to_string(),
        Duration::from_millis(2500),
    );
    create_app(
        db,
        Some(summoner),
        config.request_body_limit,
        config.request_timeout,
        RateLimitConfig::default(),
    )
}

/// Helper to persist a key of the given permission and return it
async fn seed_key(db: &Database, permission: Permission) -> String {
    let key = helpers::generate_api_key();
    db.create_key(key.clone(), permission)
        .await
        .expect("Failed to create key");
    key
}

/// Helper to send a request and get response
async fn send_request(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request_builder = Request::builder()
        .uri(uri)
        .method(method)
        // The rate limiter keys on the client IP
        .header("x-forwarded-for", "127.0.0.1");

    // Build request with body
    let request = if let Some(json_body) = body {
        request_builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_vec(&json_body).unwrap()))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    // Send request
    let response = app.oneshot(request).await.unwrap();

    // Extract status
    let status = response.status();

    // Extract body
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();

    // Try to parse as JSON, or return empty object
    let json = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };

    (status, json)
}

/// Spawn a tiny HTTP server answering every request with a fixed status,
/// standing in for the summoner API.
async fn spawn_status_server(status: StatusCode) -> String {
    let app = Router::new().fallback(move || async move { status });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn player_body(name: &str, location: &str, wins: i64, points: i64) -> Value {
    json!({
        "player_name": name,
        "player_location": location,
        "player_wins": wins,
        "player_draws": 0,
        "player_losses": 0,
        "player_points": points,
    })
}

// =============================================================================
// PLAYER CREATION
// =============================================================================

#[tokio::test]
async fn test_post_player_then_duplicate() {
    // GIVEN: An admin key
    let db = setup_test_db().await;
    let admin = seed_key(&db, Permission::Admin).await;
    let app = create_test_app(db);

    // WHEN: POSTing a new player
    let uri = format!("/v1/player?api_key={admin}");
    let (status, body) = send_request(
        app.clone(),
        "POST",
        &uri,
        Some(player_body("Foo", "EUW", 1, 10)),
    )
    .await;

    // THEN: The envelope echoes the player with a fresh nonzero id
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errCode"], 200);
    let players = body["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["player_name"], "Foo");
    assert_eq!(players[0]["player_location"], "EUW");
    assert!(players[0]["player_id"].as_i64().unwrap() > 0);

    // WHEN: POSTing the same identity again
    let (status, body) = send_request(app, "POST", &uri, Some(player_body("Foo", "EUW", 1, 10))).await;

    // THEN: The duplicate is a bad request
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errCode"], 400);
    assert!(body["errMsg"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_post_player_normalizes_location() {
    // GIVEN: An admin key
    let db = setup_test_db().await;
    let admin = seed_key(&db, Permission::Admin).await;
    let app = create_test_app(db);

    // WHEN: POSTing with a lower-case location
    let uri = format!("/v1/player?api_key={admin}");
    let (status, body) = send_request(app, "POST", &uri, Some(player_body("Foo", "euw", 0, 0))).await;

    // THEN: The stored location is upper-cased
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["players"][0]["player_location"], "EUW");
}

#[tokio::test]
async fn test_post_player_with_invalid_body() {
    // GIVEN: An admin key
    let db = setup_test_db().await;
    let admin = seed_key(&db, Permission::Admin).await;
    let app = create_test_app(db);
    let uri = format!("/v1/player?api_key={admin}");

    // WHEN: POSTing a body that is not JSON
    let request = Request::builder()
        .uri(&uri)
        .method("POST")
        .header("x-forwarded-for", "127.0.0.1")
        .header("Content-Type", "application/json")
        .body(Body::from("this is not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    // THEN: The envelope reports a bad request
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // WHEN: POSTing a player with a negative statistic
    let (status, body) = send_request(
        app,
        "POST",
        &uri,
        Some(json!({
            "player_name": "Foo",
            "player_location": "EUW",
            "player_wins": -1,
        })),
    )
    .await;

    // THEN: The entity invariant rejects it
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errCode"], 400);
    assert!(body["errMsg"].as_str().unwrap().contains("negative"));
}

// =============================================================================
// PLAYER RETRIEVAL
// =============================================================================

#[tokio::test]
async fn test_get_players_with_guest_key() {
    // GIVEN: Two stored players and a guest key
    let db = setup_test_db().await;
    let guest = seed_key(&db, Permission::Guest).await;
    db.insert_player(statline_db::Player::unsaved("Foo", "EUW", 1, 0, 0, 10).unwrap())
        .await
        .unwrap();
    db.insert_player(statline_db::Player::unsaved("Bar", "NA", 2, 0, 1, 20).unwrap())
        .await
        .unwrap();
    let app = create_test_app(db);

    // WHEN: Listing every player with the guest key
    let (status, body) =
        send_request(app.clone(), "GET", &format!("/v1/player/ALL?api_key={guest}"), None).await;

    // THEN: All players come back
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errCode"], 200);
    assert_eq!(body["players"].as_array().unwrap().len(), 2);

    // WHEN: Listing one region
    let (status, body) =
        send_request(app.clone(), "GET", &format!("/v1/player/NA?api_key={guest}"), None).await;

    // THEN: Only that region's players come back
    assert_eq!(status, StatusCode::OK);
    let players = body["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["player_name"], "Bar");

    // WHEN: Listing with a malformed 10-character key
    let (status, body) =
        send_request(app, "GET", "/v1/player/ALL?api_key=SHORTKEY42", None).await;

    // THEN: The request is unauthorized before any lookup
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errCode"], 401);
}

#[tokio::test]
async fn test_get_players_without_key() {
    // GIVEN: A running application
    let db = setup_test_db().await;
    let app = create_test_app(db);

    // WHEN: Listing players with no api_key at all
    let (status, body) = send_request(app, "GET", "/v1/player", None).await;

    // THEN: 401, with the fixed unauthorized text
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errCode"], 401);
    assert!(body["errMsg"].as_str().unwrap().contains("not authorised"));
}

#[tokio::test]
async fn test_get_player_by_name_across_regions() {
    // GIVEN: The same name on two regional servers
    let db = setup_test_db().await;
    let guest = seed_key(&db, Permission::Guest).await;
    db.insert_player(statline_db::Player::unsaved("Foo", "EUW", 1, 0, 0, 10).unwrap())
        .await
        .unwrap();
    db.insert_player(statline_db::Player::unsaved("Foo", "NA", 2, 0, 1, 20).unwrap())
        .await
        .unwrap();
    let app = create_test_app(db);

    // WHEN: Searching without a region filter
    let (status, body) = send_request(
        app.clone(),
        "GET",
        &format!("/v1/player/ALL/Foo?api_key={guest}"),
        None,
    )
    .await;

    // THEN: Both namesakes come back
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["players"].as_array().unwrap().len(), 2);

    // WHEN: Narrowing to one region
    let (status, body) = send_request(
        app.clone(),
        "GET",
        &format!("/v1/player/EUW/Foo?api_key={guest}"),
        None,
    )
    .await;

    // THEN: Only the regional match comes back
    assert_eq!(status, StatusCode::OK);
    let players = body["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["player_location"], "EUW");

    // WHEN: Searching a region where the name does not exist
    let (status, body) = send_request(
        app,
        "GET",
        &format!("/v1/player/KR/Foo?api_key={guest}"),
        None,
    )
    .await;

    // THEN: Not found, with the lookup hint in the message
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errCode"], 404);
    assert!(body["errMsg"].as_str().unwrap().contains("/v1/player/ALL/Foo"));
}

#[tokio::test]
async fn test_list_players_when_empty() {
    // GIVEN: No players at all
    let db = setup_test_db().await;
    let guest = seed_key(&db, Permission::Guest).await;
    let app = create_test_app(db);

    // WHEN: Listing every player
    let (status, body) =
        send_request(app, "GET", &format!("/v1/player?api_key={guest}"), None).await;

    // THEN: Not found with the plural message
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errCode"], 404);
    assert!(body["errMsg"].as_str().unwrap().contains("No players"));
}

// =============================================================================
// PLAYER UPDATE & DELETE
// =============================================================================

#[tokio::test]
async fn test_put_updates_player_by_uri_identity() {
    // GIVEN: A stored player and an admin key
    let db = setup_test_db().await;
    let admin = seed_key(&db, Permission::Admin).await;
    let id = db
        .insert_player(statline_db::Player::unsaved("Foo", "EUW", 1, 0, 0, 10).unwrap())
        .await
        .unwrap();
    let app = create_test_app(db);

    // WHEN: PUTting fresh statistics to the player's URI
    let (status, body) = send_request(
        app.clone(),
        "PUT",
        &format!("/v1/player/EUW/Foo?api_key={admin}"),
        Some(player_body("Foo", "EUW", 11, 43)),
    )
    .await;

    // THEN: The update lands on the row resolved from the URI
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errCode"], 200);
    assert!(
        body["errMsg"]
            .as_str()
            .unwrap()
            .contains(&format!("ID: {id}"))
    );
    assert_eq!(body["players"][0]["player_wins"], 11);

    // AND: A follow-up read sees the new statistics under the same id
    let (_, body) = send_request(
        app,
        "GET",
        &format!("/v1/player/EUW/Foo?api_key={admin}"),
        None,
    )
    .await;
    assert_eq!(body["players"][0]["player_wins"], 11);
    assert_eq!(body["players"][0]["player_id"], id);
}

#[tokio::test]
async fn test_put_unknown_player() {
    // GIVEN: An admin key and no players
    let db = setup_test_db().await;
    let admin = seed_key(&db, Permission::Admin).await;
    let app = create_test_app(db);

    // WHEN: PUTting to a player that does not exist
    let (status, body) = send_request(
        app,
        "PUT",
        &format!("/v1/player/EUW/Ghost?api_key={admin}"),
        Some(player_body("Ghost", "EUW", 1, 1)),
    )
    .await;

    // THEN: Not found, mentioning the requested identity
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errCode"], 404);
    assert!(body["errMsg"].as_str().unwrap().contains("Ghost"));
}

#[tokio::test]
async fn test_delete_player_lifecycle() {
    // GIVEN: A stored player and an admin key
    let db = setup_test_db().await;
    let admin = seed_key(&db, Permission::Admin).await;
    db.insert_player(statline_db::Player::unsaved("Foo", "EUW", 1, 0, 0, 10).unwrap())
        .await
        .unwrap();
    let app = create_test_app(db);

    // WHEN: DELETEing the player
    let (status, body) = send_request(
        app.clone(),
        "DELETE",
        &format!("/v1/player/EUW/Foo?api_key={admin}"),
        None,
    )
    .await;

    // THEN: Success, naming the deleted player
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errCode"], 200);
    assert!(body["errMsg"].as_str().unwrap().contains("Foo"));

    // WHEN: DELETEing again
    let (status, body) = send_request(
        app,
        "DELETE",
        &format!("/v1/player/EUW/Foo?api_key={admin}"),
        None,
    )
    .await;

    // THEN: The player is gone
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errCode"], 404);
}

#[tokio::test]
async fn test_guest_key_cannot_write() {
    // GIVEN: A guest key and a stored player
    let db = setup_test_db().await;
    let guest = seed_key(&db, Permission::Guest).await;
    db.insert_player(statline_db::Player::unsaved("Foo", "EUW", 1, 0, 0, 10).unwrap())
        .await
        .unwrap();
    let app = create_test_app(db);

    // WHEN/THEN: Every write verb is refused for the guest
    let (status, body) = send_request(
        app.clone(),
        "POST",
        &format!("/v1/player?api_key={guest}"),
        Some(player_body("Bar", "NA", 0, 0)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errCode"], 401);

    let (status, _) = send_request(
        app.clone(),
        "PUT",
        &format!("/v1/player/EUW/Foo?api_key={guest}"),
        Some(player_body("Foo", "EUW", 2, 20)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_request(
        app.clone(),
        "DELETE",
        &format!("/v1/player/EUW/Foo?api_key={guest}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // AND: The player is still there for readers
    let (status, body) = send_request(
        app,
        "GET",
        &format!("/v1/player/EUW/Foo?api_key={guest}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["players"].as_array().unwrap().len(), 1);
}

// =============================================================================
// KEY RESOURCE
// =============================================================================

#[tokio::test]
async fn test_key_listing_and_creation() {
    // GIVEN: An empty key table
    let db = setup_test_db().await;
    let app = create_test_app(db);

    // WHEN: Listing keys before any exist
    let (status, body) = send_request(app.clone(), "GET", "/v1/key", None).await;

    // THEN: Not found, with the no-keys message
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errCode"], 404);
    assert!(body["errMsg"].as_str().unwrap().contains("No keys exist"));

    // WHEN: Minting a guest key
    let (status, body) = send_request(app.clone(), "POST", "/v1/key/guest", None).await;

    // THEN: A 24-character key with guest permission comes back
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errCode"], 200);
    let key = body["keys"][0]["key"].as_str().unwrap();
    assert_eq!(key.len(), 24);
    assert!(key.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    assert_eq!(body["keys"][0]["permission"], 0);
    assert!(body["errMsg"].as_str().unwrap().contains("GUEST"));

    // WHEN: Minting an admin key
    let (status, body) = send_request(app.clone(), "POST", "/v1/key/admin", None).await;

    // THEN: The key carries admin permission
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keys"][0]["permission"], 1);
    assert!(body["errMsg"].as_str().unwrap().contains("ADMIN"));

    // WHEN: Listing keys again
    let (status, body) = send_request(app, "GET", "/v1/key", None).await;

    // THEN: Both minted keys are on record
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["keys"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_key_reset_rotates_in_place() {
    // GIVEN: A stored admin key
    let db = setup_test_db().await;
    let old = seed_key(&db, Permission::Admin).await;
    let app = create_test_app(db.clone());

    // WHEN: Resetting it
    let (status, body) = send_request(
        app.clone(),
        "PUT",
        &format!("/v1/key/reset?api_key={old}"),
        None,
    )
    .await;

    // THEN: A different key comes back with the same permission
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errCode"], 200);
    let new = body["keys"][0]["key"].as_str().unwrap().to_string();
    assert_eq!(new.len(), 24);
    assert_ne!(new, old);
    assert_eq!(body["keys"][0]["permission"], 1);

    // AND: The old key no longer grants admin access
    assert_eq!(
        db.get_permission(old).await.unwrap(),
        Permission::Guest
    );
    assert_eq!(
        db.get_permission(new).await.unwrap(),
        Permission::Admin
    );
}

#[tokio::test]
async fn test_key_reset_rejects_bad_input() {
    // GIVEN: A running application
    let db = setup_test_db().await;
    let app = create_test_app(db);

    // WHEN: Resetting with a key of the wrong length
    let (status, body) =
        send_request(app.clone(), "PUT", "/v1/key/reset?api_key=SHORT", None).await;

    // THEN: Bad request
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errCode"], 400);

    // WHEN: Resetting a well-formed key that is not on record
    let (status, body) = send_request(
        app,
        "PUT",
        "/v1/key/reset?api_key=NOSUCHKEYNOSUCHKEYNOSUCH",
        None,
    )
    .await;

    // THEN: Not found, and no key was minted
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errCode"], 404);
    assert!(body["keys"].as_array().unwrap().is_empty());
}

// =============================================================================
// SUMMONER GATE
// =============================================================================

#[tokio::test]
async fn test_summoner_gate_allows_known_players() {
    // GIVEN: An upstream that recognises every summoner
    let upstream = spawn_status_server(StatusCode::OK).await;
    let db = setup_test_db().await;
    let admin = seed_key(&db, Permission::Admin).await;
    let app = create_gated_app(db, upstream);

    // WHEN: POSTing a player
    let (status, body) = send_request(
        app,
        "POST",
        &format!("/v1/player?api_key={admin}"),
        Some(player_body("Foo", "EUW", 1, 10)),
    )
    .await;

    // THEN: Creation goes through
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errCode"], 200);
}

#[tokio::test]
async fn test_summoner_gate_mirrors_not_found() {
    // GIVEN: An upstream that knows no summoners
    let upstream = spawn_status_server(StatusCode::NOT_FOUND).await;
    let db = setup_test_db().await;
    let admin = seed_key(&db, Permission::Admin).await;
    let app = create_gated_app(db.clone(), upstream);

    // WHEN: POSTing a player
    let (status, body) = send_request(
        app,
        "POST",
        &format!("/v1/player?api_key={admin}"),
        Some(player_body("Foo", "EUW", 1, 10)),
    )
    .await;

    // THEN: The upstream's 404 mirrors through, phrased as a third-party miss
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errCode"], 404);
    assert!(
        body["errMsg"]
            .as_str()
            .unwrap()
            .contains("No player information matches")
    );

    // AND: Nothing was stored
    assert!(db.get_all_players(String::new()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_summoner_gate_treats_odd_codes_as_rate_limit() {
    // GIVEN: An upstream answering something the gate does not recognise
    let upstream = spawn_status_server(StatusCode::IM_A_TEAPOT).await;
    let db = setup_test_db().await;
    let admin = seed_key(&db, Permission::Admin).await;
    let app = create_gated_app(db, upstream);

    // WHEN: POSTing a player
    let (status, body) = send_request(
        app,
        "POST",
        &format!("/v1/player?api_key={admin}"),
        Some(player_body("Foo", "EUW", 1, 10)),
    )
    .await;

    // THEN: The catch-all reads as the upstream rate limit
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["errCode"], 429);
}

#[tokio::test]
async fn test_summoner_gate_unreachable_upstream_is_unavailable() {
    // GIVEN: An upstream address nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let db = setup_test_db().await;
    let admin = seed_key(&db, Permission::Admin).await;
    let app = create_gated_app(db, format!("http://{}", addr));

    // WHEN: POSTing a player
    let (status, body) = send_request(
        app,
        "POST",
        &format!("/v1/player?api_key={admin}"),
        Some(player_body("Foo", "EUW", 1, 10)),
    )
    .await;

    // THEN: The gate reports the service unavailable
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["errCode"], 503);
    assert!(body["errMsg"].as_str().unwrap().contains("unavailable"));
}
