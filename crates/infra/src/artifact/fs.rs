use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use eventive_booking::ArtifactRef;

use super::r#trait::{ArtifactError, ArtifactStore, artifact_ref, validate_name};

/// Artifact store writing one file per artifact under a root directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ArtifactError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<ArtifactRef, ArtifactError> {
        let path = self.path_for(name)?;
        // Write beside the target and rename so readers never see a partial file.
        let tmp = self.root.join(format!(".{name}.tmp"));
        std::fs::write(&tmp, &bytes)?;
        std::fs::rename(&tmp, &path)?;
        Ok(artifact_ref(name))
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
        let path = self.path_for(name)?;
        match std::fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, name: &str) -> Result<(), ArtifactError> {
        let path = self.path_for(name)?;
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
