//! Binary artifact storage (QR images).

pub mod fs;
pub mod in_memory;
pub mod r#trait;

pub use fs::FsArtifactStore;
pub use in_memory::InMemoryArtifactStore;
pub use r#trait::{ArtifactError, ArtifactStore, artifact_ref, validate_name};
