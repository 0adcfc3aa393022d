//! Background mute queries.
//!
//! Every refresh runs as its own Tokio task driving a [`MuteFuture`], so the
//! result lands even if nobody awaits it and later readers can `peek` it.

use std::sync::Arc;

use futures::FutureExt;
use shared_types::Punishment;
use tracing::{debug, error};

use crate::domain::{MuteCacheKey, MuteFuture, MuteValue};
use crate::error::CacheError;
use crate::ports::MuteQuery;

/// Start a query for `key` on the current Tokio runtime.
///
/// Failures resolve to "no mute" after logging.
pub(crate) fn spawn_query(query: Arc<dyn MuteQuery>, key: MuteCacheKey) -> MuteFuture {
    let future = async move { downgrade(key, load(query.as_ref(), key).await) }
        .boxed()
        .shared();

    // Drive the shared future so completion is visible through `peek`.
    tokio::spawn(future.clone());
    future
}

/// Run a query in the caller's task.
pub(crate) async fn query_once(query: &dyn MuteQuery, key: MuteCacheKey) -> MuteValue {
    downgrade(key, load(query, key).await)
}

async fn load(query: &dyn MuteQuery, key: MuteCacheKey) -> Result<Option<Punishment>, CacheError> {
    let mute = query.query_applicable_mute(key).await?;
    debug!(%key, punishment_id = mute.as_ref().map(|p| p.id), "Loaded applicable mute");
    Ok(mute)
}

fn downgrade(key: MuteCacheKey, outcome: Result<MuteValue, CacheError>) -> MuteValue {
    outcome.unwrap_or_else(|e| {
        error!(%key, error = %e, "Mute lookup failed, assuming no mute");
        None
    })
}
