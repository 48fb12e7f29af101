use std::collections::HashMap;
use std::sync::RwLock;

use eventive_booking::ArtifactRef;

use super::r#trait::{ArtifactError, ArtifactStore, artifact_ref, validate_name};

/// In-memory artifact store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<ArtifactRef, ArtifactError> {
        validate_name(name)?;
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| ArtifactError::Backend("lock poisoned".to_string()))?;
        blobs.insert(name.to_string(), bytes);
        Ok(artifact_ref(name))
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
        validate_name(name)?;
        let blobs = self
            .blobs
            .read()
            .map_err(|_| ArtifactError::Backend("lock poisoned".to_string()))?;
        Ok(blobs.get(name).cloned())
    }

    fn delete(&self, name: &str) -> Result<(), ArtifactError> {
        validate_name(name)?;
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| ArtifactError::Backend("lock poisoned".to_string()))?;
        blobs.remove(name);
        Ok(())
    }
}
