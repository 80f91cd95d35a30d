//! In-memory repository

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use super::InteractionRepository;
use crate::interaction::Interaction;
use crate::{HartapeError, Result};

/// Repository keeping interactions in a concurrent map
///
/// Useful for fixtures built in code and for tests that must not touch disk.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    interactions: DashMap<String, Interaction>,
    stores: AtomicUsize,
}

impl MemoryRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an interaction without counting it as a store
    pub fn insert(&self, interaction: Interaction) {
        self.interactions
            .insert(interaction.name.clone(), interaction);
    }

    /// Stored interaction, if any
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Interaction> {
        self.interactions.get(name).map(|entry| entry.value().clone())
    }

    /// Remove a stored interaction
    pub fn remove(&self, name: &str) -> Option<Interaction> {
        self.interactions.remove(name).map(|(_, interaction)| interaction)
    }

    /// Number of `store` calls so far
    #[must_use]
    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::Relaxed)
    }
}

impl InteractionRepository for MemoryRepository {
    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.interactions.contains_key(name))
    }

    async fn load(&self, name: &str) -> Result<Interaction> {
        self.get(name)
            .ok_or_else(|| HartapeError::repository(name, "no interaction stored"))
    }

    async fn store(&self, interaction: &Interaction) -> Result<Interaction> {
        self.insert(interaction.clone());
        self.stores.fetch_add(1, Ordering::Relaxed);
        Ok(interaction.clone())
    }
}
