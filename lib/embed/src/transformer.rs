//! Sentence-transformer encoder backed by fastembed.
//!
//! - Model files are downloaded into the cache directory on first use
//! - Output width is probed once at load time
//! - Inference is serialized behind a mutex

use contractsim_core::{Encoder, EncoderBackend, EncoderDescriptor, Error, Result, Vector};
use ::fastembed::{InitOptions, TextEmbedding};
use parking_lot::Mutex;
use std::path::PathBuf;
use tracing::info;

/// fastembed's `embed()` takes `&mut self`, hence the mutex.
pub struct FastEmbedEncoder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedEncoder {
    /// Load `model_name`, downloading it into `cache_dir/models` if needed.
    pub fn new(model_name: &str, cache_dir: PathBuf) -> Result<Self> {
        let (canonical, model_enum) = parse_model_name(model_name)?;

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            Error::Encoding(format!("failed to create models directory: {}", e))
        })?;

        info!("Loading embedding model {} from {:?}", canonical, models_dir);
        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(true);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| Error::Encoding(format!("model initialization failed: {}", e)))?;
        let dimensions = probe_dimensions(&mut model)?;

        Ok(Self {
            model: Mutex::new(model),
            model_name: canonical.to_string(),
            dimensions,
        })
    }
}

impl Encoder for FastEmbedEncoder {
    fn descriptor(&self) -> EncoderDescriptor {
        EncoderDescriptor {
            backend: EncoderBackend::FastEmbed,
            model: self.model_name.clone(),
            dimensions: self.dimensions,
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn encode(&self, text: &str) -> Result<Vector> {
        let mut model = self.model.lock();
        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| Error::Encoding(format!("embedding generation failed: {}", e)))?;

        embeddings
            .into_iter()
            .next()
            .map(Vector::new)
            .ok_or_else(|| Error::Encoding("model returned no embedding".to_string()))
    }
}

/// Map a user-facing model name to its canonical spelling and fastembed enum.
fn parse_model_name(name: &str) -> Result<(&'static str, ::fastembed::EmbeddingModel)> {
    use ::fastembed::EmbeddingModel;

    match name.to_lowercase().as_str() {
        "all-minilm-l6-v2" | "allminiml6v2" => Ok(("all-MiniLM-L6-v2", EmbeddingModel::AllMiniLML6V2)),
        "all-minilm-l6-v2-q" | "allminiml6v2q" => {
            Ok(("all-MiniLM-L6-v2-q", EmbeddingModel::AllMiniLML6V2Q))
        }
        "bge-small-en-v1.5" | "bgesmallenv15" => {
            Ok(("bge-small-en-v1.5", EmbeddingModel::BGESmallENV15))
        }
        "bge-base-en-v1.5" | "bgebaseenv15" => {
            Ok(("bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15))
        }
        _ => Err(Error::Encoding(format!(
            "unknown model: {}. Supported models: all-MiniLM-L6-v2, all-MiniLM-L6-v2-q, bge-small-en-v1.5, bge-base-en-v1.5",
            name
        ))),
    }
}

fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize> {
    let probe = model
        .embed(vec!["contract Probe {}"], None)
        .map_err(|e| Error::Encoding(format!("failed to probe dimensions: {}", e)))?;

    probe
        .first()
        .map(|v| v.len())
        .ok_or_else(|| Error::Encoding("model returned no embedding".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_name() {
        let (canonical, _) = parse_model_name("ALL-MINILM-L6-V2").unwrap();
        assert_eq!(canonical, "all-MiniLM-L6-v2");
        assert!(parse_model_name("gpt-9").is_err());
    }

    // Requires model download - run with --ignored
    #[test]
    #[ignore = "requires model download"]
    fn test_minilm_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let encoder = FastEmbedEncoder::new("all-MiniLM-L6-v2", dir.path().to_path_buf()).unwrap();
        assert_eq!(encoder.dimensions(), 384);

        let v1 = encoder.encode("contract A { uint x; }").unwrap();
        let v2 = encoder.encode("contract A { uint x; }").unwrap();
        assert_eq!(v1.dim(), 384);
        assert_eq!(v1, v2);
    }
}
