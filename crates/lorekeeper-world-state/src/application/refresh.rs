//! Fetching world state from the backend.

use std::sync::Arc;

use lorekeeper_core::backend::GameBackend;
use lorekeeper_core::error::DomainError;
use tracing::{debug, instrument};

use crate::domain::sync_store::{WorldSyncStore, WorldView};

/// Fetches world, NPCs and events concurrently.
///
/// # Errors
///
/// Returns the first `DomainError` any of the three calls produces; no
/// partial view is ever returned.
#[instrument(skip_all)]
pub async fn fetch_world_view(backend: &dyn GameBackend) -> Result<WorldView, DomainError> {
    let (snapshot, npcs, events) = tokio::try_join!(
        backend.get_world(),
        backend.get_npcs(),
        backend.get_events()
    )?;
    debug!(
        hours_passed = snapshot.hours_passed,
        npc_count = npcs.len(),
        event_count = events.len(),
        "fetched world view"
    );
    Ok(WorldView {
        snapshot,
        npcs,
        events,
    })
}

/// Fetches a fresh view and installs it in `store`, returning the new view.
///
/// # Errors
///
/// Returns `DomainError` if fetching fails; the held view is left untouched.
pub async fn refresh(
    store: &mut WorldSyncStore,
    backend: &dyn GameBackend,
) -> Result<Arc<WorldView>, DomainError> {
    let view = fetch_world_view(backend).await?;
    Ok(store.replace(view))
}
