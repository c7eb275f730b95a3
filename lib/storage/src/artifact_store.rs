//! Binary model artifact file.
//!
//! File format:
//!
//! Header (46 bytes):
//! - magic: `b"CSIM"`
//! - version: u16 (little-endian)
//! - payload_len: u64 (little-endian)
//! - checksum: [u8; 32] (SHA-256 of the payload)
//!
//! Payload: bincode-encoded [`ArtifactRecord`] (encoder descriptor, fitted
//! index, contract names, contract bodies).
//!
//! Files are replaced atomically (temp file, fsync, rename), so a reader sees
//! either the previous artifact or the new one, never a partial write.

use atomicwrites::{AtomicFile, OverwriteBehavior};
use contractsim_core::{ArtifactRecord, Encoder, Error, ModelArtifact, Result};
use contractsim_embed::{load_encoder, EncoderOptions};
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const MAGIC: &[u8; 4] = b"CSIM";

/// Current file format version
pub const FORMAT_VERSION: u16 = 1;

/// magic(4) + version(2) + payload_len(8) + checksum(32)
const HEADER_SIZE: usize = 46;

/// Serialize an artifact into the on-disk format.
pub fn encode_artifact(artifact: &ModelArtifact) -> Result<Vec<u8>> {
    let payload = bincode::serialize(&artifact.record())
        .map_err(|e| Error::Artifact(format!("serialization error: {}", e)))?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    bytes.extend_from_slice(&Sha256::digest(&payload));
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Validate and decode the on-disk format.
pub fn decode_artifact(bytes: &[u8]) -> Result<ArtifactRecord> {
    if bytes.len() < HEADER_SIZE {
        return Err(Error::Artifact(format!(
            "truncated header: {} bytes, expected at least {}",
            bytes.len(),
            HEADER_SIZE
        )));
    }
    let (header, payload) = bytes.split_at(HEADER_SIZE);

    if &header[0..4] != MAGIC {
        return Err(Error::Artifact("not a contractsim artifact (bad magic)".to_string()));
    }

    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != FORMAT_VERSION {
        return Err(Error::Artifact(format!(
            "unsupported format version {}, expected {}",
            version, FORMAT_VERSION
        )));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&header[6..14]);
    let payload_len = u64::from_le_bytes(len_bytes);
    if payload.len() as u64 != payload_len {
        return Err(Error::Artifact(format!(
            "payload is {} bytes, header declares {} (truncated or padded file)",
            payload.len(),
            payload_len
        )));
    }

    if Sha256::digest(payload).as_slice() != &header[14..46] {
        return Err(Error::Artifact("checksum mismatch: file may be corrupted".to_string()));
    }

    bincode::deserialize(payload)
        .map_err(|e| Error::Artifact(format!("deserialization error: {}", e)))
}

/// Location of a persisted model artifact
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Persist `artifact`, atomically replacing any previous file.
    pub fn save(&self, artifact: &ModelArtifact) -> Result<()> {
        let bytes = encode_artifact(artifact)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|file| file.write_all(&bytes))
            .map_err(|e| Error::Artifact(format!("failed to write {:?}: {}", self.path, e)))?;

        info!(
            "Saved artifact with {} contracts to {:?} ({} bytes)",
            artifact.len(),
            self.path,
            bytes.len()
        );
        Ok(())
    }

    /// Read and validate the persisted record without resolving its encoder.
    pub fn load_record(&self) -> Result<ArtifactRecord> {
        let bytes = std::fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                Error::Artifact(format!("artifact {:?} not found", self.path))
            }
            _ => Error::Artifact(format!("cannot read {:?}: {}", self.path, e)),
        })?;
        decode_artifact(&bytes)
    }

    /// Load the artifact, instantiating the encoder it was built with.
    pub fn load(&self, options: &EncoderOptions) -> Result<ModelArtifact> {
        let record = self.load_record()?;
        let encoder = load_encoder(&record.encoder, options)?;
        let artifact = ModelArtifact::from_record(record, encoder)?;
        info!("Loaded {:?} from {:?}", artifact, self.path);
        Ok(artifact)
    }

    /// Load the artifact with an encoder the caller already holds.
    pub fn load_with(&self, encoder: Arc<dyn Encoder>) -> Result<ModelArtifact> {
        let record = self.load_record()?;
        ModelArtifact::from_record(record, encoder)
    }
}
