use std::sync::Arc;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::progression::storage::{InMemorySyncStorage, SyncStorage};

use super::auth::{GUID_HEADER, TOKEN_HEADER};
use super::routes::{AppContext, ProgressionApiServer};

fn test_config() -> AppConfig {
    AppConfig {
        bind: "127.0.0.1:0".parse().expect("loopback addr"),
        database_url: String::new(),
        max_connections: 1,
        trust_proxy: false,
        xp_multiplier: 2.0,
        xp_anomaly_threshold: None,
    }
}

fn test_app() -> (Router, Arc<InMemorySyncStorage>) {
    let storage = Arc::new(InMemorySyncStorage::new());
    let context = Arc::new(AppContext::new(
        Arc::clone(&storage) as Arc<dyn SyncStorage>,
        &test_config(),
    ));
    (ProgressionApiServer::new(context).into_router(), storage)
}

async fn register(storage: &InMemorySyncStorage, owner: &str) -> (String, String) {
    let guid = Uuid::new_v4().as_simple().to_string();
    let token = format!("{}{}", Uuid::new_v4().as_simple(), Uuid::new_v4().as_simple());
    storage.register_server(owner, &guid, &token, true).await;
    (guid, token)
}

fn request(
    method: Method,
    uri: &str,
    auth: Option<(&str, &str)>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((guid, token)) = auth {
        builder = builder.header(TOKEN_HEADER, token).header(GUID_HEADER, guid);
    }
    match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request body"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(router: &Router, req: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = router.clone().oneshot(req).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

fn progression_json(name: Option<&str>, total_xp: i64) -> Value {
    let mut body = json!({
        "round_id": -1,
        "team_id": 1,
        "squad_id": 2,
        "kills": 5,
        "deaths": 2,
        "total_level": 1,
        "total_xp": total_xp,
        "assault_level": 1,
        "assault_xp": 10,
        "engineer_level": 0,
        "engineer_xp": 0,
        "support_level": 0,
        "support_xp": 0,
        "recon_level": 0,
        "recon_xp": 0,
        "weapon_progression": "w",
        "vehicle_progression": "v"
    });
    if let Some(name) = name {
        body["name"] = json!(name);
    }
    body
}

#[tokio::test]
async fn info_endpoint_is_public() -> Result<()> {
    let (router, _) = test_app();
    let (status, body) = send(&router, request(Method::GET, "/", None, None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "progression_api");
    assert_eq!(body["xpMultiplier"], 2.0);
    assert_eq!(body["minModVerSupported"]["Major"], 3);
    Ok(())
}

#[tokio::test]
async fn missing_auth_headers_are_unauthorized() -> Result<()> {
    let (router, _) = test_app();
    let (status, body) = send(&router, request(Method::GET, "/auth/check", None, None)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing required auth headers");
    Ok(())
}

#[tokio::test]
async fn unknown_token_is_forbidden() -> Result<()> {
    let (router, _) = test_app();
    let (status, body) = send(
        &router,
        request(
            Method::GET,
            "/auth/check",
            Some(("some-guid", "bogus-token")),
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid API token");
    Ok(())
}

#[tokio::test]
async fn auth_check_succeeds_for_registered_server() -> Result<()> {
    let (router, storage) = test_app();
    let (guid, token) = register(&storage, "Alice").await;
    let (status, body) = send(
        &router,
        request(
            Method::GET,
            "/auth/check",
            Some((guid.as_str(), token.as_str())),
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    Ok(())
}

#[tokio::test]
async fn submit_then_fetch_round_trips() -> Result<()> {
    let (router, storage) = test_app();
    let (guid, token) = register(&storage, "Alice").await;
    let auth = (guid.as_str(), token.as_str());
    let player_guid = Uuid::new_v4().as_simple().to_string();
    let uri = format!("/players/{player_guid}");

    let (status, body) = send(
        &router,
        request(
            Method::POST,
            &uri,
            Some(auth),
            Some(progression_json(Some("Recruit"), 500)),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["newPlayer"], true);

    let (status, body) = send(&router, request(Method::GET, &uri, Some(auth), None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Recruit");
    assert_eq!(body["total_xp"], 500);

    // Unknown GUIDs answer 204 with no body.
    let other = format!("/players/{}", Uuid::new_v4().as_simple());
    let (status, body) = send(&router, request(Method::GET, &other, Some(auth), None)).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    Ok(())
}

#[tokio::test]
async fn resubmission_reports_existing_player() -> Result<()> {
    let (router, storage) = test_app();
    let (guid, token) = register(&storage, "Alice").await;
    let auth = (guid.as_str(), token.as_str());
    let uri = format!("/players/{}", Uuid::new_v4().as_simple());

    send(
        &router,
        request(
            Method::POST,
            &uri,
            Some(auth),
            Some(progression_json(Some("Recruit"), 100)),
        ),
    )
    .await?;
    let (status, body) = send(
        &router,
        request(
            Method::POST,
            &uri,
            Some(auth),
            Some(progression_json(None, 150)),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["newPlayer"], false);

    let (status, body) = send(
        &router,
        request(
            Method::POST,
            &uri,
            Some(auth),
            Some(progression_json(None, 120)),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Outdated data");
    Ok(())
}

#[tokio::test]
async fn incomplete_submission_names_missing_fields() -> Result<()> {
    let (router, storage) = test_app();
    let (guid, token) = register(&storage, "Alice").await;
    let uri = format!("/players/{}", Uuid::new_v4().as_simple());

    let (status, body) = send(
        &router,
        request(
            Method::POST,
            &uri,
            Some((guid.as_str(), token.as_str())),
            Some(json!({ "name": "Recruit", "total_xp": 10 })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let missing = body["missing"].as_array().expect("missing key list");
    assert!(missing.contains(&json!("kills")));
    assert!(missing.contains(&json!("team_id")));
    Ok(())
}

#[tokio::test]
async fn round_lifecycle_over_http() -> Result<()> {
    let (router, storage) = test_app();
    let (guid, token) = register(&storage, "Alice").await;
    let (other_guid, other_token) = register(&storage, "Bob").await;
    let auth = (guid.as_str(), token.as_str());

    // Creation requires all descriptive fields.
    let (status, body) = send(
        &router,
        request(
            Method::POST,
            "/rounds",
            Some(auth),
            Some(json!({ "server_name": "EU #1" })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["missing"], json!(["gamemode", "map"]));

    let (status, body) = send(
        &router,
        request(
            Method::POST,
            "/rounds",
            Some(auth),
            Some(json!({
                "server_name": "EU #1",
                "gamemode": "ConquestLarge0",
                "map": "MP_Subway"
            })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let round_id = body["id"].as_i64().expect("round id");
    let round_uri = format!("/rounds/{round_id}");
    let finalize = json!({ "num_players": 32, "winning_team_id": 1, "duration": 1200.0 });

    // A different registered server cannot finalize it.
    let (status, body) = send(
        &router,
        request(
            Method::PATCH,
            &round_uri,
            Some((other_guid.as_str(), other_token.as_str())),
            Some(finalize.clone()),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You cannot finalize a round you did not create");

    let (status, body) = send(
        &router,
        request(Method::PATCH, &round_uri, Some(auth), Some(finalize.clone())),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(
        &router,
        request(Method::PATCH, &round_uri, Some(auth), Some(finalize)),
    )
    .await?;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["error"], "Round has already been finalized");

    let (status, _) = send(
        &router,
        request(
            Method::PATCH,
            "/rounds/99999",
            Some(auth),
            Some(json!({ "num_players": 1, "winning_team_id": 1, "duration": 1.0 })),
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn round_history_is_paginated() -> Result<()> {
    let (router, storage) = test_app();
    let (guid, token) = register(&storage, "Alice").await;
    let auth = (guid.as_str(), token.as_str());
    let player_guid = Uuid::new_v4().as_simple().to_string();
    let uri = format!("/players/{player_guid}");

    for (i, xp) in (100..=400).step_by(100).enumerate() {
        let name = if i == 0 { Some("Recruit") } else { None };
        let (status, _) = send(
            &router,
            request(
                Method::POST,
                &uri,
                Some(auth),
                Some(progression_json(name, xp)),
            ),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &router,
        request(
            Method::GET,
            &format!("{uri}/rounds?limit=2&offset=0"),
            Some(auth),
            None,
        ),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().expect("history array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["total_xp"], 100);
    assert_eq!(rows[0]["round_id"], -1);
    assert_eq!(rows[0]["map"], "Unknown");
    Ok(())
}

#[tokio::test]
async fn public_counts_reflect_registrations() -> Result<()> {
    let (router, storage) = test_app();
    register(&storage, "Alice").await;
    register(&storage, "Bob").await;

    let (status, body) = send(&router, request(Method::GET, "/servers", None, None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (status, body) = send(&router, request(Method::GET, "/players", None, None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    Ok(())
}
