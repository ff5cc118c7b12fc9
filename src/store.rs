use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{DatascopeError, Result};

// ---------------------------------------------------------------------------
// ArtifactStore – flat-file persistence for model artifacts
// ---------------------------------------------------------------------------

/// Loads and saves JSON-serialized artifacts under a root directory.
///
/// `save` writes to a temporary sibling and renames it into place, so a
/// concurrent reader observes either the prior artifact or the new one,
/// never a partial write.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of a named artifact.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Load and deserialize an artifact.
    ///
    /// A missing file is `NotFound`; bytes that do not deserialize into `T`
    /// are `Corrupt`.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path_of(name);
        let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
            // A path through a missing directory (or a file posing as one)
            // simply does not resolve.
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                DatascopeError::NotFound(path.clone())
            }
            _ => DatascopeError::Io(e),
        })?;
        serde_json::from_str(&text).map_err(|e| DatascopeError::Corrupt {
            path,
            reason: e.to_string(),
        })
    }

    /// Serialize and persist an artifact, atomically replacing any prior one.
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.path_of(name);
        let json = serde_json::to_string_pretty(value).map_err(|e| DatascopeError::WriteDenied {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;

        fs::create_dir_all(&self.root).map_err(|e| DatascopeError::WriteDenied {
            path: self.root.clone(),
            source: e,
        })?;

        let tmp = self.root.join(format!("{name}.tmp"));
        fs::write(&tmp, json).map_err(|e| DatascopeError::WriteDenied {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &path).map_err(|e| DatascopeError::WriteDenied { path, source: e })
    }

    /// Delete a named artifact; absence is not an error.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_of(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DatascopeError::WriteDenied { path, source: e }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Labels {
        names: Vec<String>,
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let labels = Labels {
            names: vec!["setosa".into(), "versicolor".into(), "virginica".into()],
        };
        store.save("labels.json", &labels).unwrap();

        let loaded: Labels = store.load("labels.json").unwrap();
        assert_eq!(loaded, labels);

        // No temporary file is left behind.
        assert!(!store.path_of("labels.json.tmp").exists());
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let err = store.load::<Labels>("labels.json").unwrap_err();
        assert!(matches!(err, DatascopeError::NotFound(_)));
    }

    #[test]
    fn unparseable_artifact_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(store.path_of("labels.json"), "not json {").unwrap();

        let err = store.load::<Labels>("labels.json").unwrap_err();
        assert!(matches!(err, DatascopeError::Corrupt { .. }));
    }

    #[test]
    fn save_replaces_prior_artifact_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let first = Labels {
            names: vec!["a".into()],
        };
        let second = Labels {
            names: vec!["b".into(), "c".into()],
        };
        store.save("labels.json", &first).unwrap();
        store.save("labels.json", &second).unwrap();

        let loaded: Labels = store.load("labels.json").unwrap();
        assert_eq!(loaded, second);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store
            .save(
                "labels.json",
                &Labels {
                    names: vec!["a".into()],
                },
            )
            .unwrap();
        store.remove("labels.json").unwrap();
        store.remove("labels.json").unwrap();
        assert!(!store.path_of("labels.json").exists());
    }
}
