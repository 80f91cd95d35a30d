//! Persistence of interactions

pub mod har;
mod memory;

pub use har::{ArchiveSettings, HarRepository};
pub use memory::MemoryRepository;

use std::future::Future;
use std::sync::Arc;

use crate::interaction::Interaction;
use crate::Result;

/// Load/store capability for interactions
///
/// Implementations must not cache between calls; several recorders may share
/// one repository.
pub trait InteractionRepository: Send + Sync {
    /// Whether an interaction is stored under `name`
    ///
    /// Not-found is `Ok(false)`; only genuine I/O failures are errors.
    fn exists(&self, name: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Load the interaction stored under `name`
    ///
    /// Fails with `RepositoryFailure` if it is absent or unreadable.
    fn load(&self, name: &str) -> impl Future<Output = Result<Interaction>> + Send;

    /// Replace whatever is stored under `interaction.name`
    ///
    /// Returns the interaction as a later `load` would see it.
    fn store(&self, interaction: &Interaction) -> impl Future<Output = Result<Interaction>> + Send;
}

impl<R: InteractionRepository> InteractionRepository for Arc<R> {
    fn exists(&self, name: &str) -> impl Future<Output = Result<bool>> + Send {
        (**self).exists(name)
    }

    fn load(&self, name: &str) -> impl Future<Output = Result<Interaction>> + Send {
        (**self).load(name)
    }

    fn store(&self, interaction: &Interaction) -> impl Future<Output = Result<Interaction>> + Send {
        (**self).store(interaction)
    }
}
