//! The model artifact: encoder, fitted index and the corpus it was fitted on.

use crate::encoder::encode_checked;
use crate::{Encoder, EncoderDescriptor, Error, Neighbor, Result, SimilarityIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A ranked query hit with the contract it points at
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub name: String,
    pub distance: f32,
    pub code: String,
}

/// Read-only bundle answering similarity queries.
///
/// Invariant: `names`, `codes` and the index rows have the same length and
/// position `i` refers to the same contract in all three. The artifact is
/// never mutated after construction, so one instance can serve any number of
/// concurrent queries.
pub struct ModelArtifact {
    encoder: Arc<dyn Encoder>,
    index: SimilarityIndex,
    names: Vec<String>,
    codes: Vec<String>,
}

/// Borrowed persisted form of a [`ModelArtifact`]
#[derive(Serialize)]
pub struct ArtifactRecordRef<'a> {
    pub encoder: EncoderDescriptor,
    pub index: &'a SimilarityIndex,
    pub names: &'a [String],
    pub codes: &'a [String],
}

/// Owned persisted form of a [`ModelArtifact`]; same field layout as
/// [`ArtifactRecordRef`]
#[derive(Debug, Deserialize)]
pub struct ArtifactRecord {
    pub encoder: EncoderDescriptor,
    pub index: SimilarityIndex,
    pub names: Vec<String>,
    pub codes: Vec<String>,
}

impl ModelArtifact {
    pub fn new(
        encoder: Arc<dyn Encoder>,
        index: SimilarityIndex,
        names: Vec<String>,
        codes: Vec<String>,
    ) -> Result<Self> {
        if names.len() != codes.len() || names.len() != index.len() {
            return Err(Error::Artifact(format!(
                "corpus sequences out of step: {} names, {} codes, {} vectors",
                names.len(),
                codes.len(),
                index.len()
            )));
        }
        if encoder.dimensions() != index.dim() {
            return Err(Error::Artifact(format!(
                "encoder {} does not match index dimension {}",
                encoder.descriptor(),
                index.dim()
            )));
        }

        Ok(Self {
            encoder,
            index,
            names,
            codes,
        })
    }

    /// Rebuild an artifact from its persisted record and a live encoder.
    ///
    /// Fails when the encoder differs from the one the index was built with.
    pub fn from_record(record: ArtifactRecord, encoder: Arc<dyn Encoder>) -> Result<Self> {
        let live = encoder.descriptor();
        if live != record.encoder {
            return Err(Error::Artifact(format!(
                "artifact was built with encoder {}, but {} was supplied",
                record.encoder, live
            )));
        }
        Self::new(encoder, record.index, record.names, record.codes)
    }

    pub fn record(&self) -> ArtifactRecordRef<'_> {
        ArtifactRecordRef {
            encoder: self.encoder.descriptor(),
            index: &self.index,
            names: &self.names,
            codes: &self.codes,
        }
    }

    #[inline]
    pub fn encoder(&self) -> &Arc<dyn Encoder> {
        &self.encoder
    }

    #[inline]
    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    #[inline]
    pub fn vector(&self, index: usize) -> Option<&[f32]> {
        self.index.vector(index)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Bodies of the `k` contracts nearest to `raw_contract`, nearest first
    pub fn query(&self, raw_contract: &str, k: usize) -> Result<Vec<String>> {
        let neighbors = self.neighbors(raw_contract, k)?;
        Ok(neighbors
            .into_iter()
            .map(|n| self.codes[n.index].clone())
            .collect())
    }

    /// [`query`](Self::query) with the neighbor count the index was fitted with
    pub fn query_default(&self, raw_contract: &str) -> Result<Vec<String>> {
        self.query(raw_contract, self.index.n_neighbors())
    }

    /// Same ranking as [`query`](Self::query), with names and distances
    pub fn query_neighbors(&self, raw_contract: &str, k: usize) -> Result<Vec<Match>> {
        let neighbors = self.neighbors(raw_contract, k)?;
        Ok(neighbors
            .into_iter()
            .map(|n| Match {
                name: self.names[n.index].clone(),
                distance: n.distance,
                code: self.codes[n.index].clone(),
            })
            .collect())
    }

    fn neighbors(&self, raw_contract: &str, k: usize) -> Result<Vec<Neighbor>> {
        // cheap checks before paying for an encode
        if k == 0 {
            return Err(Error::InvalidArgument("k must be at least 1".to_string()));
        }
        if k > self.len() {
            return Err(Error::InsufficientCorpus {
                requested: k,
                available: self.len(),
            });
        }

        let normalized = crate::normalize(raw_contract);
        let query = encode_checked(self.encoder.as_ref(), &normalized)?;
        let neighbors = self.index.search(query.as_slice(), k)?;
        debug!(
            "Query matched {:?}",
            neighbors
                .iter()
                .map(|n| self.names[n.index].as_str())
                .collect::<Vec<_>>()
        );
        Ok(neighbors)
    }
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("encoder", &self.encoder.descriptor())
            .field("contracts", &self.names.len())
            .field("dim", &self.index.dim())
            .field("n_neighbors", &self.index.n_neighbors())
            .finish()
    }
}
