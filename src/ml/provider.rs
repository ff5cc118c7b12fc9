use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::cache::CachedProvider;
use crate::data::model::TabularDataset;
use crate::error::{DatascopeError, Result};
use crate::store::ArtifactStore;

use super::naive_bayes::GaussianNb;
use super::train::{train, ModelArtifact, TrainConfig, TrainReport};

/// Companion artifact file names.  Both halves must be present and mutually
/// consistent or the pair is treated as absent.
pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const LABELS_FILE: &str = "labels.json";

/// Persisted half holding the classifier and its feature order; the ordered
/// label list lives in the companion file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClassifierArtifact {
    model: GaussianNb,
    feature_names: Vec<String>,
}

// ---------------------------------------------------------------------------
// Provider state machine
// ---------------------------------------------------------------------------

/// Provisioning states.  `Loaded` is terminal for the process; repeated
/// `get` calls after that are cache hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Uninitialized,
    Training,
    Loaded,
}

/// Where the served artifact came from, for status display and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    Persisted,
    FreshlyTrained,
}

/// Serves a ready-to-use model: loads the persisted artifact pair when it is
/// present and consistent, trains and persists one otherwise.
///
/// A `Corrupt` or mismatched pair is healed by retraining rather than
/// propagated, since the artifact is fully derivable from the dataset.  A
/// failed persist after training is surfaced as a warning while the freshly
/// trained artifact keeps serving the session in-memory.
pub struct ModelProvider {
    store: ArtifactStore,
    config: TrainConfig,
    cache: CachedProvider<(PathBuf, String), ModelArtifact>,
    state: Mutex<ProviderState>,
    source: Mutex<Option<ArtifactSource>>,
    report: Mutex<Option<TrainReport>>,
    persist_warning: Mutex<Option<String>>,
}

impl ModelProvider {
    pub fn new(store: ArtifactStore, config: TrainConfig) -> Self {
        Self {
            store,
            config,
            cache: CachedProvider::new(),
            state: Mutex::new(ProviderState::Uninitialized),
            source: Mutex::new(None),
            report: Mutex::new(None),
            persist_warning: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ProviderState {
        *self.state.lock()
    }

    /// Source of the artifact served by the last successful `get`.
    pub fn source(&self) -> Option<ArtifactSource> {
        *self.source.lock()
    }

    /// Report of the last training run, if one happened.
    pub fn report(&self) -> Option<TrainReport> {
        self.report.lock().clone()
    }

    /// Persist failure from the last training run, if any.
    pub fn persist_warning(&self) -> Option<String> {
        self.persist_warning.lock().clone()
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Return the model for `dataset`, provisioning it on first call.
    ///
    /// `dataset_key` is the dataset's provenance (its source path); together
    /// with the label column it keys the cache, so repeated calls are
    /// idempotent and a new dataset invalidates the slot.
    pub fn get(&self, dataset: &TabularDataset, dataset_key: &Path) -> Result<Arc<ModelArtifact>> {
        let key = (dataset_key.to_path_buf(), self.config.target_column.clone());
        self.cache.get(key, || self.load_or_train(dataset))
    }

    fn load_or_train(&self, dataset: &TabularDataset) -> Result<ModelArtifact> {
        match self.load_pair() {
            Ok(artifact) => {
                log::info!(
                    "loaded classifier ({} classes, {} features) from {}",
                    artifact.labels.len(),
                    artifact.feature_names.len(),
                    self.store.root().display()
                );
                *self.state.lock() = ProviderState::Loaded;
                *self.source.lock() = Some(ArtifactSource::Persisted);
                Ok(artifact)
            }
            Err(e) if e.is_recoverable_artifact() => {
                log::warn!("model artifact unusable ({e}); training a fresh one");
                *self.state.lock() = ProviderState::Training;

                let (artifact, report) = match train(dataset, &self.config) {
                    Ok(trained) => trained,
                    Err(train_err) => {
                        *self.state.lock() = ProviderState::Uninitialized;
                        return Err(train_err);
                    }
                };
                log::info!(
                    "trained classifier on {} rows, held-out accuracy {:.3}",
                    report.n_train,
                    report.accuracy
                );
                *self.report.lock() = Some(report);

                match self.persist_pair(&artifact) {
                    Ok(()) => *self.persist_warning.lock() = None,
                    Err(persist_err) => {
                        log::warn!("could not persist model artifact: {persist_err}");
                        *self.persist_warning.lock() = Some(persist_err.to_string());
                    }
                }

                *self.state.lock() = ProviderState::Loaded;
                *self.source.lock() = Some(ArtifactSource::FreshlyTrained);
                Ok(artifact)
            }
            Err(e) => Err(e),
        }
    }

    /// Load both halves and check they belong together.
    fn load_pair(&self) -> Result<ModelArtifact> {
        let classifier: ClassifierArtifact = self.store.load(CLASSIFIER_FILE)?;
        let labels: Vec<String> = self.store.load(LABELS_FILE)?;

        if labels.len() != classifier.model.n_classes()
            || classifier.feature_names.len() != classifier.model.n_features()
        {
            return Err(DatascopeError::Corrupt {
                path: self.store.path_of(LABELS_FILE),
                reason: format!(
                    "label list ({}) does not match classifier ({} classes)",
                    labels.len(),
                    classifier.model.n_classes()
                ),
            });
        }

        Ok(ModelArtifact {
            classifier: classifier.model,
            labels,
            feature_names: classifier.feature_names,
        })
    }

    fn persist_pair(&self, artifact: &ModelArtifact) -> Result<()> {
        let classifier = ClassifierArtifact {
            model: artifact.classifier.clone(),
            feature_names: artifact.feature_names.clone(),
        };
        self.store.save(CLASSIFIER_FILE, &classifier)?;
        self.store.save(LABELS_FILE, &artifact.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Record};
    use ndarray::Array1;

    fn blobs_dataset() -> TabularDataset {
        let mut records = Vec::new();
        for i in 0..20 {
            let jitter = (i % 5) as f64 * 0.01;
            for (label, center) in [("low", 0.0), ("high", 5.0)] {
                let mut rec = Record::new();
                rec.insert("f1".into(), CellValue::Float(center + jitter));
                rec.insert("f2".into(), CellValue::Float(center - jitter));
                rec.insert("label".into(), CellValue::String(label.into()));
                records.push(rec);
            }
        }
        TabularDataset::from_records(records)
    }

    fn provider_in(dir: &Path) -> ModelProvider {
        ModelProvider::new(ArtifactStore::new(dir), TrainConfig::new("label"))
    }

    fn probe(artifact: &ModelArtifact) -> Vec<f64> {
        let x = Array1::from_vec(vec![1.0, 1.0]).insert_axis(ndarray::Axis(0));
        artifact.classifier.predict_proba(&x).row(0).to_vec()
    }

    #[test]
    fn trains_and_persists_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_in(dir.path());
        let ds = blobs_dataset();

        assert_eq!(provider.state(), ProviderState::Uninitialized);
        let artifact = provider.get(&ds, Path::new("blobs.csv")).unwrap();

        assert_eq!(provider.state(), ProviderState::Loaded);
        assert_eq!(provider.source(), Some(ArtifactSource::FreshlyTrained));
        assert_eq!(artifact.labels, vec!["high", "low"]);
        assert!(dir.path().join(CLASSIFIER_FILE).exists());
        assert!(dir.path().join(LABELS_FILE).exists());
        assert!(provider.persist_warning().is_none());
    }

    #[test]
    fn second_get_hits_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let provider = provider_in(dir.path());
        let ds = blobs_dataset();

        let first = provider.get(&ds, Path::new("blobs.csv")).unwrap();

        // Remove the persisted pair: a cache hit must not touch the store.
        std::fs::remove_file(dir.path().join(CLASSIFIER_FILE)).unwrap();
        std::fs::remove_file(dir.path().join(LABELS_FILE)).unwrap();

        let second = provider.get(&ds, Path::new("blobs.csv")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!dir.path().join(CLASSIFIER_FILE).exists());
    }

    #[test]
    fn loads_persisted_pair_without_training() {
        let dir = tempfile::tempdir().unwrap();
        let ds = blobs_dataset();

        let trained = provider_in(dir.path())
            .get(&ds, Path::new("blobs.csv"))
            .unwrap();

        // A fresh provider over the same store must load, not retrain.
        let provider = provider_in(dir.path());
        let loaded = provider.get(&ds, Path::new("blobs.csv")).unwrap();

        assert_eq!(provider.source(), Some(ArtifactSource::Persisted));
        assert!(provider.report().is_none());
        assert_eq!(*trained, *loaded);
    }

    #[test]
    fn corrupt_classifier_heals_by_retraining() {
        let dir = tempfile::tempdir().unwrap();
        let ds = blobs_dataset();

        provider_in(dir.path())
            .get(&ds, Path::new("blobs.csv"))
            .unwrap();
        std::fs::write(dir.path().join(CLASSIFIER_FILE), "garbage {").unwrap();

        let provider = provider_in(dir.path());
        let artifact = provider.get(&ds, Path::new("blobs.csv")).unwrap();

        assert_eq!(provider.source(), Some(ArtifactSource::FreshlyTrained));
        assert_eq!(artifact.labels, vec!["high", "low"]);
        // The healed pair is persisted again.
        let reloaded = provider_in(dir.path());
        reloaded.get(&ds, Path::new("blobs.csv")).unwrap();
        assert_eq!(reloaded.source(), Some(ArtifactSource::Persisted));
    }

    #[test]
    fn mismatched_pair_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let ds = blobs_dataset();

        provider_in(dir.path())
            .get(&ds, Path::new("blobs.csv"))
            .unwrap();
        // Overwrite the label half with the wrong number of labels.
        ArtifactStore::new(dir.path())
            .save(LABELS_FILE, &vec!["only".to_string()])
            .unwrap();

        let provider = provider_in(dir.path());
        let artifact = provider.get(&ds, Path::new("blobs.csv")).unwrap();
        assert_eq!(provider.source(), Some(ArtifactSource::FreshlyTrained));
        assert_eq!(artifact.labels.len(), 2);
    }

    #[test]
    fn deleting_artifacts_retrains_deterministically() {
        let dir = tempfile::tempdir().unwrap();
        let ds = blobs_dataset();

        let first = provider_in(dir.path())
            .get(&ds, Path::new("blobs.csv"))
            .unwrap();
        let reference = probe(&first);

        // Delete the pair and provision from scratch.
        let store = ArtifactStore::new(dir.path());
        store.remove(CLASSIFIER_FILE).unwrap();
        store.remove(LABELS_FILE).unwrap();

        let provider = provider_in(dir.path());
        let retrained = provider.get(&ds, Path::new("blobs.csv")).unwrap();
        assert_eq!(provider.source(), Some(ArtifactSource::FreshlyTrained));

        let probed = probe(&retrained);
        for (a, b) in reference.iter().zip(probed.iter()) {
            assert!((a - b).abs() < 1e-12, "probabilities diverged: {a} vs {b}");
        }
    }

    #[test]
    fn failed_persist_still_serves_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        // Make the store root an existing *file* so create_dir_all fails.
        let blocked = dir.path().join("store");
        std::fs::write(&blocked, b"").unwrap();

        let provider = provider_in(&blocked);
        let ds = blobs_dataset();
        let artifact = provider.get(&ds, Path::new("blobs.csv")).unwrap();

        assert_eq!(artifact.labels.len(), 2);
        assert_eq!(provider.source(), Some(ArtifactSource::FreshlyTrained));
        assert!(provider.persist_warning().is_some());
    }
}
