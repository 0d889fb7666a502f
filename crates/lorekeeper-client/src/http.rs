//! `GameBackend` over the backend's REST API.

use std::time::Duration;

use async_trait::async_trait;
use lorekeeper_core::backend::GameBackend;
use lorekeeper_core::error::DomainError;
use lorekeeper_core::model::{
    ChatReply, NarrativeRecap, Npc, ScenarioSummary, SimulationResult, StarterPrompts, WorldEvent,
    WorldSnapshot,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    player_message: &'a str,
}

/// HTTP client for the dialogue/simulation backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Backend` if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::backend("connect", e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, DomainError> {
        let response = send(operation, self.client.get(self.url(path))).await?;
        decode(operation, response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, DomainError> {
        let response = send(operation, request).await?;
        decode(operation, response).await
    }
}

async fn send(operation: &'static str, request: RequestBuilder) -> Result<Response, DomainError> {
    let response = request
        .send()
        .await
        .map_err(|e| DomainError::backend(operation, e.to_string()))?;
    let status = response.status();
    debug!(operation, %status, "backend responded");
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(DomainError::NotFound(format!("{operation}: {body}")));
    }
    Err(DomainError::backend(operation, format!("HTTP {status}: {body}")))
}

async fn decode<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, DomainError> {
    response
        .json()
        .await
        .map_err(|e| DomainError::backend(operation, format!("invalid response body: {e}")))
}

#[async_trait]
impl GameBackend for HttpBackend {
    async fn get_world(&self) -> Result<WorldSnapshot, DomainError> {
        self.get_json("get_world", "/world").await
    }

    async fn get_npcs(&self) -> Result<Vec<Npc>, DomainError> {
        self.get_json("get_npcs", "/npcs").await
    }

    async fn get_events(&self) -> Result<Vec<WorldEvent>, DomainError> {
        self.get_json("get_events", "/world/events").await
    }

    async fn chat(&self, npc_id: &str, message: &str) -> Result<ChatReply, DomainError> {
        let request = self
            .client
            .post(self.url(&format!("/npc/{npc_id}/chat")))
            .json(&ChatRequestBody {
                player_message: message,
            });
        self.post_json("chat", request).await
    }

    async fn simulate(&self) -> Result<SimulationResult, DomainError> {
        let request = self.client.post(self.url("/world/simulate"));
        self.post_json("simulate", request).await
    }

    async fn get_recap(&self) -> Result<NarrativeRecap, DomainError> {
        self.get_json("get_recap", "/world/recap").await
    }

    async fn list_scenarios(&self) -> Result<Vec<ScenarioSummary>, DomainError> {
        self.get_json("list_scenarios", "/scenarios").await
    }

    async fn activate_scenario(&self, scenario_id: &str) -> Result<(), DomainError> {
        let request = self
            .client
            .post(self.url(&format!("/scenarios/{scenario_id}/activate")));
        send("activate_scenario", request).await.map(drop)
    }

    async fn get_starters(&self) -> Result<StarterPrompts, DomainError> {
        self.get_json("get_starters", "/scenarios/active/starters")
            .await
    }
}
