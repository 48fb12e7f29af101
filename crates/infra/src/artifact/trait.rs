use std::sync::Arc;

use thiserror::Error;

use eventive_booking::ArtifactRef;

/// Path prefix under which stored artifacts are served.
pub const ARTIFACT_PREFIX: &str = "/artifacts/";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("invalid artifact name: {0}")]
    InvalidName(String),

    #[error("artifact encoding failed: {0}")]
    Encoding(String),

    #[error("artifact io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact backend failure: {0}")]
    Backend(String),
}

/// Named blob storage. Names are flat (no path separators).
pub trait ArtifactStore: Send + Sync {
    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<ArtifactRef, ArtifactError>;

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ArtifactError>;

    /// Deleting a missing artifact is not an error.
    fn delete(&self, name: &str) -> Result<(), ArtifactError>;
}

impl<S> ArtifactStore for Arc<S>
where
    S: ArtifactStore + ?Sized,
{
    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<ArtifactRef, ArtifactError> {
        (**self).put(name, bytes)
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
        (**self).get(name)
    }

    fn delete(&self, name: &str) -> Result<(), ArtifactError> {
        (**self).delete(name)
    }
}

pub fn validate_name(name: &str) -> Result<(), ArtifactError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.starts_with('.');
    if bad {
        return Err(ArtifactError::InvalidName(name.to_string()));
    }
    Ok(())
}

pub fn artifact_ref(name: &str) -> ArtifactRef {
    ArtifactRef::new(format!("{ARTIFACT_PREFIX}{name}"))
}
