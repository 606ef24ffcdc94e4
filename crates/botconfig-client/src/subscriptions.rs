//! Guilds the client wants updates for.
//!
//! Changes made while the session is not ready only touch the local set; the
//! next ready handshake pushes the whole set with [`SubscriptionSet::resync`].

use std::collections::BTreeSet;

use botconfig_core::Envelope;

/// Ordered set of guild ids.
#[derive(Clone, Debug, Default)]
pub struct SubscriptionSet {
    guilds: BTreeSet<String>,
}

impl SubscriptionSet {
    /// Create a set seeded with `guilds`.
    pub fn new(guilds: impl IntoIterator<Item = String>) -> Self {
        Self {
            guilds: guilds.into_iter().collect(),
        }
    }

    /// Add ids. When `ready`, returns a `REQUEST_GUILD` for the newly added
    /// ones, or nothing if every id was already present.
    pub fn add(&mut self, ids: impl IntoIterator<Item = String>, ready: bool) -> Option<Envelope> {
        let added: Vec<String> = ids
            .into_iter()
            .filter(|id| self.guilds.insert(id.clone()))
            .collect();
        (ready && !added.is_empty()).then(|| Envelope::request_guilds(added))
    }

    /// Remove ids. When `ready`, returns a `REMOVE_GUILD` for the ids that
    /// were actually present.
    pub fn remove(
        &mut self,
        ids: impl IntoIterator<Item = String>,
        ready: bool,
    ) -> Option<Envelope> {
        let removed: Vec<String> = ids
            .into_iter()
            .filter(|id| self.guilds.remove(id))
            .collect();
        (ready && !removed.is_empty()).then(|| Envelope::remove_guilds(removed))
    }

    /// `REQUEST_GUILD` carrying the whole set, even when empty.
    pub fn resync(&self) -> Envelope {
        Envelope::request_guilds(self.to_vec())
    }

    /// Whether `id` is subscribed.
    pub fn contains(&self, id: &str) -> bool {
        self.guilds.contains(id)
    }

    /// Number of subscribed guilds.
    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }

    /// Sorted ids.
    pub fn to_vec(&self) -> Vec<String> {
        self.guilds.iter().cloned().collect()
    }
}
