use crate::ArtifactStore;
use contractsim_core::{ModelArtifact, Result};
use contractsim_embed::EncoderOptions;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::info;

/// Process-wide, read-only model state.
///
/// The artifact is loaded once at startup. Queries take a cheap `Arc` clone
/// under a momentary read lock and then run without holding any lock.
/// [`reload`](Self::reload) and [`replace`](Self::replace) fully prepare the
/// new artifact before swapping it in; on failure the current one keeps
/// serving.
pub struct ModelHandle {
    store: ArtifactStore,
    options: EncoderOptions,
    current: RwLock<Arc<ModelArtifact>>,
}

impl ModelHandle {
    /// Load the artifact from `store`.
    pub fn open(store: ArtifactStore, options: EncoderOptions) -> Result<Self> {
        let artifact = store.load(&options)?;
        Ok(Self::from_artifact(store, options, artifact))
    }

    /// Wrap an artifact that is already in memory.
    pub fn from_artifact(
        store: ArtifactStore,
        options: EncoderOptions,
        artifact: ModelArtifact,
    ) -> Self {
        Self {
            store,
            options,
            current: RwLock::new(Arc::new(artifact)),
        }
    }

    #[inline]
    pub fn current(&self) -> Arc<ModelArtifact> {
        self.current.read().clone()
    }

    #[inline]
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Re-read the artifact file and swap it in.
    pub fn reload(&self) -> Result<Arc<ModelArtifact>> {
        let artifact = Arc::new(self.store.load(&self.options)?);
        *self.current.write() = artifact.clone();
        info!("Model reloaded: {} contracts", artifact.len());
        Ok(artifact)
    }

    /// Persist a freshly built artifact, then serve it.
    pub fn replace(&self, artifact: ModelArtifact) -> Result<Arc<ModelArtifact>> {
        self.store.save(&artifact)?;
        let artifact = Arc::new(artifact);
        *self.current.write() = artifact.clone();
        info!("Model replaced: {} contracts", artifact.len());
        Ok(artifact)
    }
}
