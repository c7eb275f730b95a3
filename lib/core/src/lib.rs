//! # contractsim Core
//!
//! Core library for the contractsim similarity index.
//!
//! This crate provides the pieces that turn a corpus of smart-contract sources
//! into a queryable nearest-neighbor index:
//!
//! - [`normalize`] - Comment stripping applied before every embedding
//! - [`Encoder`] - Capability trait for text-to-vector models
//! - [`SimilarityIndex`] - Brute-force Euclidean k-nearest-neighbor index
//! - [`IndexBuilder`] - Walks a corpus directory and fits the index
//! - [`ModelArtifact`] - Encoder, index, names and bodies bundled together
//!
//! ## Example
//!
//! ```rust,no_run
//! use contractsim_core::{IndexBuilder, Encoder};
//! use std::sync::Arc;
//!
//! # fn run(encoder: Arc<dyn Encoder>) -> contractsim_core::Result<()> {
//! let artifact = IndexBuilder::new(encoder)
//!     .with_neighbors(5)
//!     .build("contracts")?;
//!
//! let source = std::fs::read_to_string("contracts/tokens/Token.sol")?;
//! let similar = artifact.query(&source, 5)?;
//! assert_eq!(similar.len(), 5);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod vector;
pub mod distance;
pub mod normalize;
pub mod encoder;
pub mod index;
pub mod corpus;
pub mod builder;
pub mod artifact;

pub use error::{Error, Result};
pub use vector::Vector;
pub use normalize::normalize;
pub use encoder::{Encoder, EncoderBackend, EncoderDescriptor};
pub use index::{Neighbor, SimilarityIndex};
pub use corpus::{collect_corpus, Contract};
pub use builder::{IndexBuilder, DEFAULT_NEIGHBORS};
pub use artifact::{ArtifactRecord, ArtifactRecordRef, Match, ModelArtifact};
