//! Exchanging chat messages with the dialogue engine.

use lorekeeper_core::backend::GameBackend;
use lorekeeper_core::error::DomainError;
use lorekeeper_core::model::ChatReply;
use tracing::{info, instrument};

use crate::domain::session::{ChatRequest, DialogueSession, SendRejected};

/// Performs the backend call for a committed request.
///
/// # Errors
///
/// Returns whatever `DomainError` the backend reports.
#[instrument(
    skip(backend, request),
    fields(npc_id = %request.npc_id, correlation_id = %request.correlation_id)
)]
pub async fn exchange(
    backend: &dyn GameBackend,
    request: &ChatRequest,
) -> Result<ChatReply, DomainError> {
    info!("sending chat message");
    backend.chat(&request.npc_id, &request.message).await
}

/// Sends `message` within `session` and waits for the reply.
///
/// The player's line is appended before the call. A backend failure is
/// recorded in the log as a narrator fallback, never returned.
///
/// # Errors
///
/// Returns `SendRejected` if the session refused the message; nothing is
/// sent in that case.
pub async fn send(
    session: &mut DialogueSession,
    backend: &dyn GameBackend,
    message: &str,
) -> Result<(), SendRejected> {
    let request = session.begin_send(message)?;
    let outcome = exchange(backend, &request).await;
    session.complete(&request, outcome);
    Ok(())
}
