//! Mute values and the shared futures that compute them.

use futures::future::{BoxFuture, FutureExt, Shared};
use shared_types::{Punishment, UnixSeconds};

/// The mute applicable to a key, if any.
pub type MuteValue = Option<Punishment>;

/// A mute computation any number of callers can await.
///
/// Completion is observable without awaiting through [`Shared::peek`].
pub type MuteFuture = Shared<BoxFuture<'static, MuteValue>>;

/// An already completed computation.
pub fn ready(value: MuteValue) -> MuteFuture {
    let future = futures::future::ready(value).boxed().shared();
    // Polling one clone stores the output for `peek` on every other clone.
    let _ = future.clone().now_or_never();
    future
}

/// A view of `future` that reads a mute ended by `now_secs` as no mute.
pub fn unexpired(future: MuteFuture, now_secs: UnixSeconds) -> MuteFuture {
    async move { future.await.filter(|mute| !mute.is_expired(now_secs)) }
        .boxed()
        .shared()
}

/// Keep whichever of two mutes ends later. Ties keep `existing`.
pub fn later_expiring(existing: MuteValue, candidate: Punishment) -> Punishment {
    match existing {
        Some(existing) if !candidate.ends_later_than(&existing) => existing,
        _ => candidate,
    }
}
