//! # contractsim
//!
//! Finds the smart contracts most similar to a given one.
//!
//! Every contract in a corpus is comment-stripped, embedded into a dense
//! vector and stored in a brute-force Euclidean k-nearest-neighbor index. A
//! query contract goes through the same normalization and encoder, and the
//! bodies of its nearest neighbors come back nearest first.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! # corpus layout: contracts/<category>/<contract file>
//! contractsim build --corpus contracts --output model/contracts.bin
//! contractsim query --model-path model/contracts.bin contracts/tokens/Token.sol
//! contractsim serve --model-path model/contracts.bin --port 4500
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use contractsim::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> contractsim::Result<()> {
//! let encoder: Arc<dyn Encoder> = Arc::new(HashingEncoder::new(384)?);
//! let artifact = IndexBuilder::new(encoder).with_neighbors(5).build("contracts")?;
//!
//! let store = ArtifactStore::new("model/contracts.bin");
//! store.save(&artifact)?;
//!
//! let loaded = store.load(&EncoderOptions::default())?;
//! let similar = loaded.query("contract Token { /* ... */ }", 5)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `contractsim-core` - Normalizer, encoder trait, index, builder, artifact
//! - `contractsim-embed` - Hashing and fastembed encoder backends
//! - `contractsim-storage` - Artifact file format and the shared model handle
//! - `contractsim-api` - REST API

// Re-export core types
pub use contractsim_core::{
    collect_corpus, normalize, Contract, Encoder, EncoderBackend, EncoderDescriptor, Error,
    IndexBuilder, Match, ModelArtifact, Neighbor, Result, SimilarityIndex, Vector,
    DEFAULT_NEIGHBORS,
};

// Re-export encoders
pub use contractsim_embed::{
    create_encoder, load_encoder, EncoderOptions, HashingEncoder, DEFAULT_FASTEMBED_MODEL,
    DEFAULT_HASHING_DIM,
};

// Re-export storage
pub use contractsim_storage::{ArtifactStore, ModelHandle};

// Re-export API
pub use contractsim_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        normalize, ArtifactStore, Encoder, EncoderOptions, Error, HashingEncoder, IndexBuilder,
        ModelArtifact, ModelHandle, Result, RestApi,
    };
}
