use crate::{Error, Result, Vector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Embedding backend family recorded in a model artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncoderBackend {
    /// Deterministic feature hashing, no model files required
    Hashing,
    /// ONNX sentence-transformer models served by fastembed
    FastEmbed,
}

impl fmt::Display for EncoderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderBackend::Hashing => write!(f, "hashing"),
            EncoderBackend::FastEmbed => write!(f, "fastembed"),
        }
    }
}

/// Serializable reference to an encoder.
///
/// The artifact stores this instead of the model weights; loading an artifact
/// resolves it back to a live [`Encoder`] and rejects the artifact when the
/// live encoder reports a different descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncoderDescriptor {
    pub backend: EncoderBackend,
    pub model: String,
    pub dimensions: usize,
}

impl fmt::Display for EncoderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({} dims)", self.backend, self.model, self.dimensions)
    }
}

/// Maps normalized contract text to a fixed-dimension vector.
///
/// Implementations must be deterministic: the same text always yields the
/// same vector for a given descriptor.
pub trait Encoder: Send + Sync {
    fn descriptor(&self) -> EncoderDescriptor;

    fn dimensions(&self) -> usize {
        self.descriptor().dimensions
    }

    fn encode(&self, text: &str) -> Result<Vector>;
}

/// Encode `text` and check the output against the encoder's declared shape.
pub(crate) fn encode_checked(encoder: &dyn Encoder, text: &str) -> Result<Vector> {
    let vector = encoder.encode(text)?;

    let expected = encoder.dimensions();
    if vector.dim() != expected {
        return Err(Error::InvalidDimension {
            expected,
            actual: vector.dim(),
        });
    }
    if !vector.is_finite() {
        return Err(Error::Encoding(
            "encoder produced a non-finite vector component".to_string(),
        ));
    }

    Ok(vector)
}
