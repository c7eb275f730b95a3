pub mod artifact_store;
pub mod model_handle;

pub use artifact_store::{decode_artifact, encode_artifact, ArtifactStore, FORMAT_VERSION};
pub use model_handle::ModelHandle;
