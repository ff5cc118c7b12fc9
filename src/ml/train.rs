use std::collections::BTreeSet;

use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data::model::{CellValue, TabularDataset};
use crate::error::{DatascopeError, Result};

use super::naive_bayes::GaussianNb;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Training parameters.  The seed fixes the shuffle split so repeated
/// training on the same dataset produces identical artifacts.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    /// Column holding the class label.
    pub target_column: String,
    /// Shuffle-split seed.
    pub seed: u64,
    /// Fraction of rows held out for the accuracy estimate.
    pub test_fraction: f64,
    /// Variance smoothing passed to the classifier.
    pub var_smoothing: f64,
}

impl TrainConfig {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            seed: 42,
            test_fraction: 0.2,
            var_smoothing: 1e-9,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }
}

// ---------------------------------------------------------------------------
// Model artifact
// ---------------------------------------------------------------------------

/// A trained classifier bundled with its ordered class labels and the feature
/// order it was trained on.
///
/// Invariant: `labels[i]` is the label of class index `i`.  The pairing is
/// produced together here and persisted/loaded as a unit, never recombined
/// from mismatched halves.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub classifier: GaussianNb,
    /// Class labels, index-aligned with the classifier's class indices.
    pub labels: Vec<String>,
    /// Feature columns, in matrix column order.
    pub feature_names: Vec<String>,
}

/// Summary of a training run, for display and logs.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainReport {
    /// Accuracy on the held-out split (or the training split when the
    /// dataset is too small to hold anything out).
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
}

// ---------------------------------------------------------------------------
// Training routine
// ---------------------------------------------------------------------------

/// Fit a classifier against the dataset's numeric columns with the configured
/// label column.
///
/// Rows with a null label or a missing/non-numeric feature cell are dropped.
/// The label list is the sorted set of distinct label values; sorting makes
/// the class-index ↔ label pairing deterministic across runs.
pub fn train(dataset: &TabularDataset, config: &TrainConfig) -> Result<(ModelArtifact, TrainReport)> {
    let target = &config.target_column;
    if dataset.column(target).is_none() {
        return Err(DatascopeError::SchemaMismatch {
            column: target.clone(),
            reason: "label column not in dataset schema".into(),
        });
    }

    let feature_names: Vec<String> = dataset
        .numeric_columns()
        .into_iter()
        .filter(|c| c != target)
        .collect();
    if feature_names.is_empty() {
        return Err(DatascopeError::SchemaMismatch {
            column: target.clone(),
            reason: "no numeric feature columns besides the label".into(),
        });
    }

    // Distinct labels, sorted for a stable class-index order.
    let classes: Vec<CellValue> = dataset
        .unique_values
        .get(target)
        .map(|vals| vals.iter().filter(|v| !v.is_null()).cloned().collect::<BTreeSet<_>>())
        .unwrap_or_default()
        .into_iter()
        .collect();
    if classes.len() < 2 {
        return Err(DatascopeError::SchemaMismatch {
            column: target.clone(),
            reason: format!("needs at least two distinct classes, found {}", classes.len()),
        });
    }
    let labels: Vec<String> = classes.iter().map(|v| v.to_string()).collect();

    // Extract complete rows: feature matrix + class index vector.
    let mut flat = Vec::new();
    let mut y = Vec::new();
    'rows: for rec in &dataset.records {
        let Some(label_value) = rec.get(target).filter(|v| !v.is_null()) else {
            continue;
        };
        let Some(class) = classes.iter().position(|c| c == label_value) else {
            continue;
        };

        let mut row = Vec::with_capacity(feature_names.len());
        for feat in &feature_names {
            match rec.get(feat).and_then(CellValue::as_f64) {
                Some(v) if v.is_finite() => row.push(v),
                _ => continue 'rows,
            }
        }
        flat.extend(row);
        y.push(class);
    }

    let n_samples = y.len();
    if n_samples < 2 {
        return Err(DatascopeError::SchemaMismatch {
            column: target.clone(),
            reason: format!("only {n_samples} usable rows after dropping incomplete ones"),
        });
    }

    // Seeded shuffle split.
    let mut order: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    order.shuffle(&mut rng);

    let n_test = ((n_samples as f64) * config.test_fraction).round() as usize;
    let n_test = n_test.min(n_samples - 1);
    let (test_idx, train_idx) = order.split_at(n_test);

    let n_features = feature_names.len();
    let take = |indices: &[usize]| -> (Array2<f64>, Vec<usize>) {
        let mut data = Vec::with_capacity(indices.len() * n_features);
        let mut targets = Vec::with_capacity(indices.len());
        for &i in indices {
            data.extend_from_slice(&flat[i * n_features..(i + 1) * n_features]);
            targets.push(y[i]);
        }
        // Length is indices.len() * n_features by construction.
        let x = Array2::from_shape_vec((indices.len(), n_features), data).unwrap();
        (x, targets)
    };

    let (x_train, y_train) = take(train_idx);
    let (x_test, y_test) = take(test_idx);

    let mut classifier = GaussianNb::new(config.var_smoothing);
    classifier.fit(&x_train, &y_train, classes.len());

    // Accuracy on the held-out rows, falling back to the training rows when
    // nothing was held out.
    let (x_eval, y_eval) = if y_test.is_empty() {
        (&x_train, &y_train)
    } else {
        (&x_test, &y_test)
    };
    let predictions = classifier.predict(x_eval);
    let hits = predictions
        .iter()
        .zip(y_eval.iter())
        .filter(|(p, a)| p == a)
        .count();
    let accuracy = hits as f64 / y_eval.len() as f64;

    let artifact = ModelArtifact {
        classifier,
        labels,
        feature_names,
    };
    let report = TrainReport {
        accuracy,
        n_train: y_train.len(),
        n_test: y_test.len(),
    };
    Ok((artifact, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Record;

    /// Two well-separated classes over two numeric features.
    fn blobs_dataset(n_per_class: usize) -> TabularDataset {
        let mut records = Vec::new();
        for i in 0..n_per_class {
            let jitter = (i % 5) as f64 * 0.01;
            for (label, cx, cy) in [("low", 0.0, 0.0), ("high", 5.0, 5.0)] {
                let mut rec = Record::new();
                rec.insert("f1".into(), CellValue::Float(cx + jitter));
                rec.insert("f2".into(), CellValue::Float(cy - jitter));
                rec.insert("label".into(), CellValue::String(label.into()));
                records.push(rec);
            }
        }
        TabularDataset::from_records(records)
    }

    #[test]
    fn trains_an_accurate_separable_model() {
        let ds = blobs_dataset(20);
        let (artifact, report) = train(&ds, &TrainConfig::new("label")).unwrap();

        assert_eq!(artifact.labels, vec!["high", "low"]);
        assert_eq!(artifact.feature_names, vec!["f1", "f2"]);
        assert_eq!(artifact.classifier.n_classes(), 2);
        assert!(report.accuracy > 0.9, "accuracy {}", report.accuracy);
        assert_eq!(report.n_train + report.n_test, 40);
    }

    #[test]
    fn same_seed_gives_identical_artifacts() {
        let ds = blobs_dataset(15);
        let config = TrainConfig::new("label").with_seed(7);
        let (a, _) = train(&ds, &config).unwrap();
        let (b, _) = train(&ds, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_label_column_is_schema_mismatch() {
        let ds = blobs_dataset(5);
        let err = train(&ds, &TrainConfig::new("species")).unwrap_err();
        assert!(matches!(err, DatascopeError::SchemaMismatch { .. }));
    }

    #[test]
    fn single_class_is_rejected() {
        let mut records = Vec::new();
        for i in 0..10 {
            let mut rec = Record::new();
            rec.insert("f1".into(), CellValue::Float(i as f64));
            rec.insert("label".into(), CellValue::String("only".into()));
            records.push(rec);
        }
        let ds = TabularDataset::from_records(records);
        let err = train(&ds, &TrainConfig::new("label")).unwrap_err();
        assert!(matches!(err, DatascopeError::SchemaMismatch { .. }));
    }

    #[test]
    fn incomplete_rows_are_dropped() {
        let mut ds_records = Vec::new();
        for i in 0..12 {
            let mut rec = Record::new();
            // Every third row is missing its feature value.
            if i % 3 != 0 {
                rec.insert("f1".into(), CellValue::Float(if i % 2 == 0 { 0.0 } else { 5.0 }));
            }
            rec.insert(
                "label".into(),
                CellValue::String(if i % 2 == 0 { "a" } else { "b" }.into()),
            );
            ds_records.push(rec);
        }
        let ds = TabularDataset::from_records(ds_records);
        let (_, report) = train(&ds, &TrainConfig::new("label")).unwrap();
        assert_eq!(report.n_train + report.n_test, 8);
    }
}
