use crate::corpus::collect_corpus;
use crate::encoder::encode_checked;
use crate::{Encoder, Error, ModelArtifact, Result, SimilarityIndex, Vector};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Neighbor count the index is fitted with unless configured otherwise
pub const DEFAULT_NEIGHBORS: usize = 5;

/// Offline job that embeds a corpus and fits the similarity index
pub struct IndexBuilder {
    encoder: Arc<dyn Encoder>,
    n_neighbors: usize,
}

impl IndexBuilder {
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self {
            encoder,
            n_neighbors: DEFAULT_NEIGHBORS,
        }
    }

    #[must_use]
    pub fn with_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    /// Build a model artifact from the corpus under `corpus_root`.
    ///
    /// Contracts are read in canonical order, comment-stripped and encoded.
    /// Encoding runs in parallel, but vectors are collected back in corpus
    /// order so `names[i]`, `codes[i]` and `vectors[i]` stay aligned.
    pub fn build<P: AsRef<Path>>(&self, corpus_root: P) -> Result<ModelArtifact> {
        if self.n_neighbors == 0 {
            return Err(Error::InvalidArgument(
                "n_neighbors must be at least 1".to_string(),
            ));
        }

        let started = Instant::now();
        let corpus = collect_corpus(corpus_root.as_ref())?;
        if corpus.len() < self.n_neighbors {
            return Err(Error::InsufficientCorpus {
                requested: self.n_neighbors,
                available: corpus.len(),
            });
        }

        info!(
            "Encoding {} contracts with {}",
            corpus.len(),
            self.encoder.descriptor()
        );

        let encoder = self.encoder.as_ref();
        let vectors: Vec<Vector> = corpus
            .par_iter()
            .map(|contract| {
                let normalized = crate::normalize(&contract.code);
                encode_checked(encoder, &normalized).map_err(|e| match e {
                    Error::Encoding(msg) => {
                        Error::Encoding(format!("{}: {}", contract.name, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let index = SimilarityIndex::fit(&vectors, self.n_neighbors)?;

        let (names, codes): (Vec<String>, Vec<String>) = corpus
            .into_iter()
            .map(|contract| (contract.name, contract.code))
            .unzip();

        let artifact = ModelArtifact::new(self.encoder.clone(), index, names, codes)?;
        info!(
            "Indexed {} contracts ({} dims, k={}) in {:?}",
            artifact.len(),
            artifact.index().dim(),
            self.n_neighbors,
            started.elapsed()
        );

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::tests::LetterCountEncoder;
    use std::fs;

    fn write_corpus(root: &Path, files: &[(&str, &str)]) {
        for (name, code) in files {
            let path = root.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, code).unwrap();
        }
    }

    fn encoder() -> Arc<dyn Encoder> {
        Arc::new(LetterCountEncoder { dim: 26 })
    }

    #[test]
    fn test_build_correlates_names_codes_vectors() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(
            dir.path(),
            &[
                ("b/two.sol", "bbb // aaaa"),
                ("a/one.sol", "aaa"),
                ("b/three.sol", "ccc /* zzz */"),
            ],
        );

        let artifact = IndexBuilder::new(encoder())
            .with_neighbors(2)
            .build(dir.path())
            .unwrap();

        assert_eq!(artifact.names(), &["a/one.sol", "b/three.sol", "b/two.sol"]);
        assert_eq!(artifact.codes()[2], "bbb // aaaa");
        assert_eq!(artifact.index().len(), 3);

        // vectors come from the normalized text, not the raw text
        let two = artifact.vector(2).unwrap();
        assert_eq!(two[0], 0.0);
        assert_eq!(two[1], 3.0);
        let three = artifact.vector(1).unwrap();
        assert_eq!(three[25], 0.0);
        assert_eq!(three[2], 3.0);
    }

    #[test]
    fn test_build_requires_enough_contracts() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path(), &[("a/one.sol", "a"), ("a/two.sol", "b")]);

        let err = IndexBuilder::new(encoder()).build(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientCorpus { requested: 5, available: 2 }
        ));
    }

    #[test]
    fn test_build_rejects_missing_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let err = IndexBuilder::new(encoder())
            .build(dir.path().join("nope"))
            .unwrap_err();
        assert!(matches!(err, Error::Corpus(_)));
    }

    #[test]
    fn test_build_rejects_zero_neighbors() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path(), &[("a/one.sol", "a")]);
        let err = IndexBuilder::new(encoder())
            .with_neighbors(0)
            .build(dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
