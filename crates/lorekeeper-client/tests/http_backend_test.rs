//! `HttpBackend` against an in-process stub of the game backend.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Json, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use common::{settings, texts, wait_for, QUIET_POLL_INTERVAL};
use lorekeeper_client::http::HttpBackend;
use lorekeeper_client::orchestrator::{self, Command};
use lorekeeper_core::backend::GameBackend;
use lorekeeper_core::error::DomainError;
use serde_json::{json, Value};

async fn world() -> Json<Value> {
    Json(json!({
        "description": "A quiet village at the edge of the Ashwood.",
        "hours_passed": 30
    }))
}

async fn npcs() -> Json<Value> {
    Json(json!([{
        "id": "aldric",
        "personality": {
            "name": "Aldric",
            "role": "merchant",
            "backstory": "Trades salt along the river."
        }
    }]))
}

async fn events() -> Json<Value> {
    Json(json!([{
        "id": "evt-1",
        "description": "A caravan arrived.",
        "timestamp": "2026-01-15T10:30:00",
        "affected_npc_ids": ["aldric"]
    }]))
}

async fn chat(Path(npc_id): Path<String>, Json(body): Json<Value>) -> Response {
    if npc_id != "aldric" {
        return (StatusCode::NOT_FOUND, "no such npc").into_response();
    }
    let message = body["player_message"].as_str().unwrap_or_default();
    Json(json!({
        "npc_id": npc_id,
        "npc_dialogue": format!("You said: {message}"),
        "choices": ["Farewell"]
    }))
    .into_response()
}

async fn simulate() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "simulation worker down").into_response()
}

async fn recap() -> Json<Value> {
    Json(json!({ "summary": "Rain fell for a day." }))
}

async fn scenarios() -> Json<Value> {
    Json(json!([{
        "id": "ashwood",
        "name": "The Ashwood",
        "genre": "Fantasy",
        "tagline": "The forest remembers."
    }]))
}

async fn activate(Path(scenario_id): Path<String>) -> Response {
    if scenario_id == "ashwood" {
        Json(json!({ "status": "ok" })).into_response()
    } else {
        (StatusCode::NOT_FOUND, "unknown scenario").into_response()
    }
}

async fn starters() -> Json<Value> {
    Json(json!({ "aldric": ["What are you selling?"] }))
}

fn stub_router() -> Router {
    Router::new()
        .route("/world", get(world))
        .route("/npcs", get(npcs))
        .route("/world/events", get(events))
        .route("/world/simulate", post(simulate))
        .route("/world/recap", get(recap))
        .route("/npc/{npc_id}/chat", post(chat))
        .route("/scenarios", get(scenarios))
        .route("/scenarios/{scenario_id}/activate", post(activate))
        .route("/scenarios/active/starters", get(starters))
}

/// Serves the stub on an ephemeral port and returns its base URL.
async fn serve_stub() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub_router()).await.unwrap();
    });
    format!("http://{addr}")
}

async fn backend() -> HttpBackend {
    let base_url = serve_stub().await;
    HttpBackend::new(&base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_get_world_fills_missing_fields_with_defaults() {
    // Arrange
    let backend = backend().await;

    // Act
    let snapshot = backend.get_world().await.unwrap();

    // Assert
    assert_eq!(snapshot.hours_passed, 30);
    assert!(snapshot.recent_events.is_empty());
    assert_eq!(snapshot.day(), 2);
    assert_eq!(snapshot.hour_of_day(), 6);
}

#[tokio::test]
async fn test_get_npcs_defaults_mood_to_neutral() {
    // Arrange
    let backend = backend().await;

    // Act
    let npcs = backend.get_npcs().await.unwrap();

    // Assert
    assert_eq!(npcs.len(), 1);
    assert_eq!(npcs[0].name(), "Aldric");
    assert!(npcs[0].is_neutral());
    assert!(npcs[0].personality.goals.is_empty());
}

#[tokio::test]
async fn test_get_events_parses_naive_timestamps() {
    // Arrange
    let backend = backend().await;

    // Act
    let events = backend.get_events().await.unwrap();

    // Assert
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].timestamp.to_string(), "2026-01-15 10:30:00");
    assert_eq!(events[0].affected_npc_ids, vec!["aldric".to_owned()]);
}

#[tokio::test]
async fn test_chat_posts_player_message() {
    // Arrange
    let backend = backend().await;

    // Act
    let reply = backend.chat("aldric", "Any news?").await.unwrap();

    // Assert
    assert_eq!(reply.npc_id, "aldric");
    assert_eq!(reply.npc_dialogue, "You said: Any news?");
    assert_eq!(reply.choices, vec!["Farewell".to_owned()]);
    assert!(reply.memories_retrieved.is_empty());
}

#[tokio::test]
async fn test_not_found_maps_to_not_found_error() {
    // Arrange
    let backend = backend().await;

    // Act
    let result = backend.chat("ghost", "Hello?").await;

    // Assert
    match result {
        Err(DomainError::NotFound(message)) => assert!(message.contains("no such npc")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_maps_to_backend_error() {
    // Arrange
    let backend = backend().await;

    // Act
    let result = backend.simulate().await;

    // Assert
    match result {
        Err(DomainError::Backend { operation, message }) => {
            assert_eq!(operation, "simulate");
            assert!(message.contains("500"));
            assert!(message.contains("simulation worker down"));
        }
        other => panic!("expected Backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_partial_recap_decodes_but_is_not_presentable() {
    // Arrange
    let backend = backend().await;

    // Act
    let recap = backend.get_recap().await.unwrap();

    // Assert
    assert_eq!(recap.summary, "Rain fell for a day.");
    assert!(!recap.is_presentable());
}

#[tokio::test]
async fn test_scenario_listing_and_activation() {
    // Arrange
    let backend = backend().await;

    // Act
    let scenarios = backend.list_scenarios().await.unwrap();
    let activated = backend.activate_scenario("ashwood").await;
    let missing = backend.activate_scenario("atlantis").await;

    // Assert
    assert_eq!(scenarios[0].id, "ashwood");
    assert!(activated.is_ok());
    assert!(matches!(missing, Err(DomainError::NotFound(_))));
}

#[tokio::test]
async fn test_get_starters_keys_prompts_by_npc() {
    // Arrange
    let backend = backend().await;

    // Act
    let starters = backend.get_starters().await.unwrap();

    // Assert
    assert_eq!(
        starters.get("aldric"),
        Some(&vec!["What are you selling?".to_owned()])
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_a_backend_error() {
    // Arrange
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let backend = HttpBackend::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();

    // Act
    let result = backend.get_world().await;

    // Assert
    assert!(matches!(
        result,
        Err(DomainError::Backend {
            operation: "get_world",
            ..
        })
    ));
}

#[tokio::test]
async fn test_orchestrator_plays_against_http_backend() {
    // Arrange
    let backend: Arc<dyn GameBackend> = Arc::new(backend().await);
    let handle = orchestrator::spawn(backend, settings(QUIET_POLL_INTERVAL)).unwrap();
    wait_for(&handle, |v| v.world.is_some()).await;

    // Act
    handle.send(Command::SelectNpc("aldric".into())).unwrap();
    wait_for(&handle, |v| v.chat_enabled).await;
    handle.send(Command::Say("Any news?".into())).unwrap();
    let view = wait_for(&handle, |v| {
        texts(v).iter().any(|t| t == "You said: Any news?")
    })
    .await;

    // Assert
    assert_eq!(view.npc_name.as_deref(), Some("Aldric"));
    assert_eq!(view.choices, vec!["Farewell".to_owned()]);
    handle.shutdown().await;
}
