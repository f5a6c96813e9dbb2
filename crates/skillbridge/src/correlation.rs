//! The pending-request registry.
//!
//! One entry per actor, keyed by [`ActorId`]. DashMap's sharded locking
//! gives race-free concurrent access for distinct actors and serializes
//! operations on the same actor, which is all the concurrency the engine
//! needs: whoever removes an entry owns its completion, so a correlation
//! resolves exactly once no matter which trigger wins.

use crate::error::RequestError;
use crate::types::{ActorId, AimResult};
use dashmap::DashMap;
use std::sync::Mutex;

/// One-shot consumer of a correlation's terminal outcome. Ownership moves
/// out of the table on resolution, making double-resolution structurally
/// impossible.
pub type Completion = Box<dyn FnOnce(Result<AimResult, RequestError>) + Send>;

/// A request that has been sent to a client and not yet resolved.
///
/// The completion sits behind a `Mutex<Option<_>>` so the correlation is
/// `Sync` and the table can be shared across the threads the transport
/// delivers frames on; `FnOnce` boxes alone are not.
pub struct PendingCorrelation {
    max_distance: f64,
    token: u64,
    completion: Mutex<Option<Completion>>,
}

impl PendingCorrelation {
    /// Binds an acceptance-distance threshold and an issue token to a
    /// result consumer.
    pub fn new(max_distance: f64, token: u64, completion: Completion) -> Self {
        Self {
            max_distance,
            token,
            completion: Mutex::new(Some(completion)),
        }
    }

    /// The acceptance-distance threshold for this request.
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// The unique token assigned when this request was issued.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Consumes the correlation, yielding its completion. `None` only if
    /// the completion was already taken, which consuming `self` rules out
    /// for every caller holding a correlation removed from the table.
    pub fn into_completion(self) -> Option<Completion> {
        match self.completion.into_inner() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl std::fmt::Debug for PendingCorrelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCorrelation")
            .field("max_distance", &self.max_distance)
            .field("token", &self.token)
            .field("completion", &"[completion]")
            .finish()
    }
}

/// Mapping from actor identity to its pending correlation.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    entries: DashMap<ActorId, PendingCorrelation>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Registers a correlation for an actor. If the actor already had one
    /// pending, the displaced entry is returned so the caller can resolve it
    /// `Superseded`; a new request always displaces, never queues.
    pub fn insert(
        &self,
        actor: ActorId,
        pending: PendingCorrelation,
    ) -> Option<PendingCorrelation> {
        self.entries.insert(actor, pending)
    }

    /// The acceptance-distance threshold of the actor's pending
    /// correlation, if any. Non-consuming lookup.
    pub fn max_distance_of(&self, actor: ActorId) -> Option<f64> {
        self.entries
            .get(&actor)
            .map(|entry| entry.value().max_distance())
    }

    /// Atomically removes and returns the actor's correlation, if any.
    pub fn remove(&self, actor: ActorId) -> Option<PendingCorrelation> {
        self.entries.remove(&actor).map(|(_, pending)| pending)
    }

    /// Removes the actor's correlation only if it still carries `token`.
    /// A rollback after a failed send must not take out a newer request
    /// that displaced the failing one while its send was in flight.
    pub fn remove_matching(&self, actor: ActorId, token: u64) -> Option<PendingCorrelation> {
        self.entries
            .remove_if(&actor, |_, pending| pending.token() == token)
            .map(|(_, pending)| pending)
    }

    /// Removes every correlation, snapshotting the key set first so removal
    /// never races iteration. Used for bulk teardown at shutdown.
    pub fn drain(&self) -> Vec<(ActorId, PendingCorrelation)> {
        let actors: Vec<ActorId> = self.entries.iter().map(|entry| *entry.key()).collect();
        actors
            .into_iter()
            .filter_map(|actor| self.entries.remove(&actor))
            .collect()
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.entries.contains_key(&actor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn pending(max_distance: f64, token: u64) -> PendingCorrelation {
        PendingCorrelation::new(max_distance, token, Box::new(|_| {}))
    }

    #[test]
    fn insert_displaces_prior_entry() {
        let table = CorrelationTable::new();
        let actor = ActorId::new();

        assert!(table.insert(actor, pending(6.0, 0)).is_none());
        let displaced = table.insert(actor, pending(9.0, 1)).expect("old entry back");
        assert_eq!(displaced.max_distance(), 6.0);
        assert_eq!(table.len(), 1);
        assert_eq!(table.max_distance_of(actor), Some(9.0));
        assert_eq!(table.max_distance_of(ActorId::new()), None);
    }

    #[test]
    fn remove_is_take_once() {
        let table = CorrelationTable::new();
        let actor = ActorId::new();
        table.insert(actor, pending(6.0, 0));

        assert!(table.remove(actor).is_some());
        assert!(table.remove(actor).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn remove_matching_ignores_a_stale_token() {
        let table = CorrelationTable::new();
        let actor = ActorId::new();
        table.insert(actor, pending(6.0, 0));
        table.insert(actor, pending(9.0, 1));

        assert!(table.remove_matching(actor, 0).is_none());
        assert_eq!(table.max_distance_of(actor), Some(9.0));

        let removed = table.remove_matching(actor, 1).expect("current entry");
        assert_eq!(removed.token(), 1);
        assert!(table.is_empty());
    }

    #[test]
    fn drain_empties_the_table_and_yields_every_entry() {
        let table = CorrelationTable::new();
        let actors: Vec<ActorId> = (0..8).map(|_| ActorId::new()).collect();
        for (token, actor) in actors.iter().enumerate() {
            table.insert(*actor, pending(1.0, token as u64));
        }

        let drained = table.drain();
        assert_eq!(drained.len(), actors.len());
        assert!(table.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn distinct_actors_never_interfere() {
        let table = Arc::new(CorrelationTable::new());
        let resolved = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for token in 0..32u64 {
            let table = table.clone();
            let resolved = resolved.clone();
            handles.push(tokio::spawn(async move {
                let actor = ActorId::new();
                let counter = resolved.clone();
                table.insert(
                    actor,
                    PendingCorrelation::new(
                        2.0,
                        token,
                        Box::new(move |_| {
                            counter.fetch_add(1, Ordering::SeqCst);
                        }),
                    ),
                );
                let pending = table.remove(actor).expect("own entry present");
                let completion = pending.into_completion().expect("completion untaken");
                completion(Err(RequestError::Cancelled));
            }));
        }
        for handle in handles {
            handle.await.expect("task completed");
        }

        assert_eq!(resolved.load(Ordering::SeqCst), 32);
        assert!(table.is_empty());
    }
}
