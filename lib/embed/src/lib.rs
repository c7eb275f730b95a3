//! # contractsim Embed
//!
//! Embedding backends implementing [`contractsim_core::Encoder`].
//!
//! - [`HashingEncoder`] - deterministic feature hashing over identifiers and
//!   character trigrams; needs no model files and is the default backend
//! - `FastEmbedEncoder` (feature `fastembed`) - ONNX sentence transformers,
//!   `all-MiniLM-L6-v2` by default
//!
//! An artifact persists only an [`EncoderDescriptor`]; [`load_encoder`] turns
//! it back into a live encoder when the artifact is loaded.

pub mod hashing;
#[cfg(feature = "fastembed")]
pub mod transformer;

pub use hashing::{HashingEncoder, DEFAULT_HASHING_DIM, HASHING_MODEL};
#[cfg(feature = "fastembed")]
pub use transformer::FastEmbedEncoder;

use contractsim_core::{Encoder, EncoderBackend, EncoderDescriptor, Error, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Default sentence-transformer model for the fastembed backend
pub const DEFAULT_FASTEMBED_MODEL: &str = "all-MiniLM-L6-v2";

/// Runtime settings that are not part of an encoder's identity
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    /// Where downloaded model files are cached
    pub cache_dir: PathBuf,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cache/contractsim"),
        }
    }
}

/// Create a fresh encoder for an index build.
///
/// `dimensions` only applies to the hashing backend; fastembed models have a
/// fixed output size.
pub fn create_encoder(
    backend: EncoderBackend,
    model: &str,
    dimensions: usize,
    options: &EncoderOptions,
) -> Result<Arc<dyn Encoder>> {
    match backend {
        EncoderBackend::Hashing => Ok(Arc::new(HashingEncoder::new(dimensions)?)),
        EncoderBackend::FastEmbed => fastembed_encoder(model, options),
    }
}

/// Resolve a persisted descriptor back to a live encoder.
///
/// The returned encoder reports exactly `descriptor` or loading fails.
pub fn load_encoder(
    descriptor: &EncoderDescriptor,
    options: &EncoderOptions,
) -> Result<Arc<dyn Encoder>> {
    let encoder: Arc<dyn Encoder> = match descriptor.backend {
        EncoderBackend::Hashing => {
            if descriptor.model != HASHING_MODEL {
                return Err(Error::Encoding(format!(
                    "unknown hashing scheme {:?}, this build provides {:?}",
                    descriptor.model, HASHING_MODEL
                )));
            }
            Arc::new(HashingEncoder::new(descriptor.dimensions)?)
        }
        EncoderBackend::FastEmbed => fastembed_encoder(&descriptor.model, options)?,
    };

    let live = encoder.descriptor();
    if live != *descriptor {
        return Err(Error::Encoding(format!(
            "encoder {} does not match persisted {}",
            live, descriptor
        )));
    }
    Ok(encoder)
}

#[cfg(feature = "fastembed")]
fn fastembed_encoder(model: &str, options: &EncoderOptions) -> Result<Arc<dyn Encoder>> {
    Ok(Arc::new(FastEmbedEncoder::new(model, options.cache_dir.clone())?))
}

#[cfg(not(feature = "fastembed"))]
fn fastembed_encoder(model: &str, _options: &EncoderOptions) -> Result<Arc<dyn Encoder>> {
    Err(Error::Encoding(format!(
        "model {} needs the fastembed backend, which this build does not include",
        model
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_hashing_encoder() {
        let encoder =
            create_encoder(EncoderBackend::Hashing, "", 128, &EncoderOptions::default()).unwrap();
        assert_eq!(encoder.dimensions(), 128);
        assert_eq!(encoder.descriptor().model, HASHING_MODEL);
    }

    #[test]
    fn test_load_encoder_round_trips_descriptor() {
        let descriptor = HashingEncoder::new(64).unwrap().descriptor();
        let encoder = load_encoder(&descriptor, &EncoderOptions::default()).unwrap();
        assert_eq!(encoder.descriptor(), descriptor);
    }

    #[test]
    fn test_load_encoder_rejects_unknown_hashing_scheme() {
        let descriptor = EncoderDescriptor {
            backend: EncoderBackend::Hashing,
            model: "feature-hash-v0".to_string(),
            dimensions: 64,
        };
        assert!(matches!(
            load_encoder(&descriptor, &EncoderOptions::default()),
            Err(Error::Encoding(_))
        ));
    }

    #[cfg(not(feature = "fastembed"))]
    #[test]
    fn test_fastembed_unavailable_without_feature() {
        let descriptor = EncoderDescriptor {
            backend: EncoderBackend::FastEmbed,
            model: DEFAULT_FASTEMBED_MODEL.to_string(),
            dimensions: 384,
        };
        assert!(matches!(
            load_encoder(&descriptor, &EncoderOptions::default()),
            Err(Error::Encoding(_))
        ));
    }
}
