use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::CachedProvider;
use crate::color::ColorMap;
use crate::data::filter::{apply, DerivedView, FilterSpec, Predicate};
use crate::data::loader;
use crate::data::model::{CellValue, TabularDataset};
use crate::ml::predict::{predict, PredictionRequest, PredictionResult};
use crate::ml::provider::ModelProvider;
use crate::ml::train::TrainConfig;
use crate::store::ArtifactStore;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which page the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Explore,
    Predict,
}

/// The full UI state, independent of rendering.
///
/// One user action is processed to completion at a time; the derived view is
/// recomputed from scratch on every filter change while the dataset parse and
/// the model are the only cached artifacts.
pub struct AppState {
    /// Memoized dataset parse, keyed by source path.
    dataset_cache: CachedProvider<PathBuf, TabularDataset>,

    /// Loaded dataset (None until the user opens a file).
    pub dataset: Option<Arc<TabularDataset>>,

    /// Where the dataset came from; provenance key for the caches.
    pub source_path: Option<PathBuf>,

    /// Active page.
    pub mode: Mode,

    /// Per-column filter predicates.
    pub filters: FilterSpec,

    /// Rows passing the current filters, plus summary statistics.
    pub view: DerivedView,

    /// Which column is used for colouring the scatter chart.
    pub color_column: Option<String>,

    /// Active colour map.
    pub color_map: Option<ColorMap>,

    /// Column shown in the histogram.
    pub hist_column: Option<String>,

    /// Scatter chart axes.
    pub scatter_x: Option<String>,
    pub scatter_y: Option<String>,

    /// Label column the classifier is trained against.
    pub target_column: Option<String>,

    /// Current slider value per feature column.
    pub feature_inputs: BTreeMap<String, f64>,

    /// Lazily provisioned classifier for the current dataset/target.
    pub model: Option<ModelProvider>,

    /// Last prediction, if any.
    pub prediction: Option<PredictionResult>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset_cache: CachedProvider::new(),
            dataset: None,
            source_path: None,
            mode: Mode::Explore,
            filters: FilterSpec::default(),
            view: DerivedView::default(),
            color_column: None,
            color_map: None,
            hist_column: None,
            scatter_x: None,
            scatter_y: None,
            target_column: None,
            feature_inputs: BTreeMap::new(),
            model: None,
            prediction: None,
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Open a dataset file, reusing the cached parse when the path is
    /// unchanged.  A failed load keeps the prior dataset and surfaces the
    /// error; an empty dataset is never silently substituted.
    pub fn open_dataset(&mut self, path: PathBuf) {
        self.loading = true;
        let result = self
            .dataset_cache
            .get(path.clone(), || loader::load_file(&path));
        match result {
            Ok(dataset) => {
                log::info!(
                    "loaded {} rows with columns {:?} from {}",
                    dataset.len(),
                    dataset.column_names(),
                    path.display()
                );
                self.set_dataset(dataset, path);
            }
            Err(e) => {
                log::error!("failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                self.loading = false;
            }
        }
    }

    /// Ingest a newly loaded dataset, initialise filters, charts and model.
    pub fn set_dataset(&mut self, dataset: Arc<TabularDataset>, path: PathBuf) {
        self.filters = FilterSpec::default();

        let numeric = dataset.numeric_columns();
        let categorical = dataset.categorical_columns();

        self.color_column = categorical.first().cloned();
        self.hist_column = numeric.first().cloned();
        self.scatter_x = numeric.first().cloned();
        self.scatter_y = numeric.get(1).or(numeric.first()).cloned();

        // Default label column: the last categorical one (class columns tend
        // to sit at the end), falling back to the last column outright.
        self.target_column = categorical
            .last()
            .cloned()
            .or_else(|| dataset.column_names().last().cloned());

        self.rebuild_color_map(&dataset);

        self.source_path = Some(path);
        self.dataset = Some(dataset);
        self.prediction = None;
        self.status_message = None;
        self.loading = false;

        self.rebuild_model_provider();
        self.rebuild_feature_inputs();
        self.refilter();
    }

    /// Recompute the derived view after a dataset or filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            match apply(ds, &self.filters) {
                Ok(view) => self.view = view,
                Err(e) => {
                    log::error!("filter application failed: {e}");
                    self.status_message = Some(format!("Error: {e}"));
                }
            }
        }
    }

    // ---- filter helpers -------------------------------------------------

    /// Values currently accepted for a column (all of them when the column
    /// has no active filter).
    pub fn selected_values(&self, column: &str) -> BTreeSet<CellValue> {
        if let Some(Predicate::AnyOf(selected)) = self.filters.get(column) {
            return selected.clone();
        }
        self.dataset
            .as_ref()
            .and_then(|ds| ds.unique_values.get(column).cloned())
            .unwrap_or_default()
    }

    /// Toggle a single value in a column's membership filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &CellValue) {
        let mut selected = self.selected_values(column);
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.filters
            .insert(column.to_string(), Predicate::AnyOf(selected));
        self.refilter();
    }

    /// Select all values in a column (drops the constraint).
    pub fn select_all(&mut self, column: &str) {
        self.filters.remove(column);
        self.refilter();
    }

    /// Deselect all values in a column: nothing passes.
    pub fn select_none(&mut self, column: &str) {
        self.filters
            .insert(column.to_string(), Predicate::AnyOf(BTreeSet::new()));
        self.refilter();
    }

    /// Current interval filter for a numeric column, defaulting to its
    /// observed range.
    pub fn selected_range(&self, column: &str) -> Option<(f64, f64)> {
        if let Some(Predicate::Between(lo, hi)) = self.filters.get(column) {
            return Some((*lo, *hi));
        }
        self.dataset
            .as_ref()
            .and_then(|ds| ds.numeric_ranges.get(column).copied())
    }

    /// Constrain a numeric column to `[lo, hi]`; the full observed range
    /// drops the constraint.
    pub fn set_range(&mut self, column: &str, lo: f64, hi: f64) {
        let full = self
            .dataset
            .as_ref()
            .and_then(|ds| ds.numeric_ranges.get(column).copied());
        if full == Some((lo, hi)) {
            self.filters.remove(column);
        } else {
            self.filters
                .insert(column.to_string(), Predicate::Between(lo, hi));
        }
        self.refilter();
    }

    /// Drop every filter.
    pub fn reset_filters(&mut self) {
        self.filters.clear();
        self.refilter();
    }

    // ---- chart helpers --------------------------------------------------

    /// Set colour column and rebuild the map.
    pub fn set_color_column(&mut self, col: String) {
        self.color_column = Some(col);
        if let Some(ds) = &self.dataset {
            let ds = Arc::clone(ds);
            self.rebuild_color_map(&ds);
        }
    }

    /// Rebuild the colour map from the current `color_column`.
    pub fn rebuild_color_map(&mut self, dataset: &TabularDataset) {
        self.color_map = self.color_column.as_ref().and_then(|col| {
            dataset
                .unique_values
                .get(col)
                .map(|vals| ColorMap::new(col, vals))
        });
    }

    // ---- prediction helpers ---------------------------------------------

    /// Feature columns the classifier trains on: numeric columns other than
    /// the label column.
    pub fn feature_columns(&self) -> Vec<String> {
        let Some(ds) = &self.dataset else {
            return Vec::new();
        };
        ds.numeric_columns()
            .into_iter()
            .filter(|c| Some(c.as_str()) != self.target_column.as_deref())
            .collect()
    }

    /// Re-seed the slider values with per-column means.
    pub fn rebuild_feature_inputs(&mut self) {
        let Some(ds) = self.dataset.clone() else {
            self.feature_inputs.clear();
            return;
        };
        self.feature_inputs = self
            .feature_columns()
            .into_iter()
            .filter_map(|col| ds.column_mean(&col).map(|mean| (col, mean)))
            .collect();
    }

    /// Change the label column; the classifier for the old target stays on
    /// disk untouched, the new one provisions lazily.
    pub fn set_target_column(&mut self, column: String) {
        self.target_column = Some(column);
        self.prediction = None;
        self.rebuild_model_provider();
        self.rebuild_feature_inputs();
    }

    fn rebuild_model_provider(&mut self) {
        self.model = match (&self.source_path, &self.target_column) {
            (Some(path), Some(target)) => {
                let root = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
                Some(ModelProvider::new(
                    ArtifactStore::new(root),
                    TrainConfig::new(target.clone()),
                ))
            }
            _ => None,
        };
    }

    /// Run the current slider values through the (lazily provisioned)
    /// classifier.  A validation failure aborts only this request; the
    /// dataset, filters and any prior prediction stay untouched.
    pub fn run_prediction(&mut self) {
        let (Some(dataset), Some(path), Some(provider)) =
            (&self.dataset, &self.source_path, &self.model)
        else {
            self.status_message = Some("Load a dataset before predicting.".into());
            return;
        };

        let artifact = match provider.get(dataset, path) {
            Ok(artifact) => artifact,
            Err(e) => {
                log::error!("model provisioning failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                return;
            }
        };

        let request = PredictionRequest::new(
            self.feature_inputs
                .iter()
                .map(|(name, value)| (name.clone(), *value))
                .collect(),
        );

        match predict(&artifact, &request) {
            Ok(result) => {
                self.prediction = Some(result);
                self.status_message = provider
                    .persist_warning()
                    .map(|w| format!("Warning: {w}"));
            }
            Err(e) => {
                log::error!("prediction failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    fn iris_like() -> Arc<TabularDataset> {
        let mut records = Vec::new();
        for i in 0..30 {
            let (species, base) = if i % 2 == 0 {
                ("setosa", 1.0)
            } else {
                ("virginica", 6.0)
            };
            let mut rec = Record::new();
            rec.insert("petal_length".into(), CellValue::Float(base + (i % 3) as f64 * 0.1));
            rec.insert("petal_width".into(), CellValue::Float(base / 2.0));
            rec.insert("species".into(), CellValue::String(species.into()));
            records.push(rec);
        }
        Arc::new(TabularDataset::from_records(records))
    }

    #[test]
    fn set_dataset_initialises_selections() {
        let mut state = AppState::default();
        state.set_dataset(iris_like(), PathBuf::from("iris.csv"));

        assert_eq!(state.view.len(), 30);
        assert_eq!(state.target_column.as_deref(), Some("species"));
        assert_eq!(
            state.feature_columns(),
            vec!["petal_length".to_string(), "petal_width".to_string()]
        );
        assert!(state.feature_inputs.contains_key("petal_length"));
        assert!(state.model.is_some());
    }

    #[test]
    fn toggling_a_value_refilters() {
        let mut state = AppState::default();
        state.set_dataset(iris_like(), PathBuf::from("iris.csv"));

        state.toggle_filter_value("species", &CellValue::String("virginica".into()));
        assert_eq!(state.view.len(), 15);

        state.select_all("species");
        assert_eq!(state.view.len(), 30);

        state.select_none("species");
        assert_eq!(state.view.len(), 0);
    }

    #[test]
    fn full_range_drops_the_interval_filter() {
        let mut state = AppState::default();
        state.set_dataset(iris_like(), PathBuf::from("iris.csv"));

        let (lo, hi) = state.selected_range("petal_length").unwrap();
        state.set_range("petal_length", lo, hi);
        assert!(state.filters.is_empty());

        state.set_range("petal_length", lo, hi - 0.05);
        assert_eq!(state.filters.len(), 1);
        assert!(state.view.len() < 30);
    }

    #[test]
    fn prediction_round_trip_through_provider() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iris.csv");

        let mut state = AppState::default();
        state.set_dataset(iris_like(), path);
        state.run_prediction();

        let prediction = state.prediction.expect("prediction should succeed");
        assert!(["setosa", "virginica"].contains(&prediction.label.as_str()));
        let total: f64 = prediction.ranked.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-6);

        // The artifact pair was persisted next to the dataset.
        assert!(dir.path().join("classifier.json").exists());
        assert!(dir.path().join("labels.json").exists());
    }
}
