use ndarray::{Array1, Axis};

use crate::error::{DatascopeError, Result};

use super::train::ModelArtifact;

// ---------------------------------------------------------------------------
// PredictionService – validated inference with ranked confidences
// ---------------------------------------------------------------------------

/// An ordered vector of named numeric features, as collected from the input
/// widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub features: Vec<(String, f64)>,
}

impl PredictionRequest {
    pub fn new(features: Vec<(String, f64)>) -> Self {
        Self { features }
    }
}

/// The predicted label plus the full confidence breakdown, sorted by
/// descending probability (ties keep the label list's original order).
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    pub ranked: Vec<(String, f64)>,
}

/// Validate a feature vector and run it through the model.
///
/// Validation precedes inference: every feature must be finite and must name
/// a column the model was trained on, otherwise `InvalidFeature` identifies
/// the offending field and the model is never invoked.  Out-of-range values
/// are deliberately not clamped; range restriction belongs to the sliders.
pub fn predict(artifact: &ModelArtifact, request: &PredictionRequest) -> Result<PredictionResult> {
    for (name, value) in &request.features {
        if !value.is_finite() {
            return Err(DatascopeError::InvalidFeature {
                feature: name.clone(),
                reason: format!("value {value} is not finite"),
            });
        }
        if !artifact.feature_names.iter().any(|f| f == name) {
            return Err(DatascopeError::InvalidFeature {
                feature: name.clone(),
                reason: "not a model feature".into(),
            });
        }
    }

    // Reorder into the matrix column order the classifier was trained with.
    let mut row = Vec::with_capacity(artifact.feature_names.len());
    for feature in &artifact.feature_names {
        let value = request
            .features
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, v)| *v)
            .ok_or_else(|| DatascopeError::InvalidFeature {
                feature: feature.clone(),
                reason: "missing from request".into(),
            })?;
        row.push(value);
    }

    let x = Array1::from_vec(row).insert_axis(Axis(0));
    let proba = artifact.classifier.predict_proba(&x);

    // Zip labels with probabilities by index position; the artifact invariant
    // guarantees the two are aligned.
    let mut ranked: Vec<(String, f64)> = artifact
        .labels
        .iter()
        .cloned()
        .zip(proba.row(0).iter().copied())
        .collect();
    // sort_by is stable, so equal probabilities keep label order.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let label = ranked[0].0.clone();
    Ok(PredictionResult { label, ranked })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::naive_bayes::GaussianNb;
    use ndarray::array;

    fn artifact() -> ModelArtifact {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.2],
            [5.0, 5.0],
            [5.1, 4.9],
            [10.0, 10.1],
            [10.2, 9.9],
        ];
        let y = vec![0, 0, 1, 1, 2, 2];
        let mut nb = GaussianNb::default();
        nb.fit(&x, &y, 3);
        ModelArtifact {
            classifier: nb,
            labels: vec!["setosa".into(), "versicolor".into(), "virginica".into()],
            feature_names: vec!["petal_length".into(), "petal_width".into()],
        }
    }

    fn request(a: f64, b: f64) -> PredictionRequest {
        PredictionRequest::new(vec![
            ("petal_length".into(), a),
            ("petal_width".into(), b),
        ])
    }

    #[test]
    fn ranked_result_is_a_distribution() {
        let result = predict(&artifact(), &request(5.0, 5.0)).unwrap();

        assert_eq!(result.ranked.len(), 3);
        let total: f64 = result.ranked.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-6);
        for (_, p) in &result.ranked {
            assert!((0.0..=1.0).contains(p));
        }
        // Sorted descending, argmax first.
        assert!(result.ranked[0].1 >= result.ranked[1].1);
        assert!(result.ranked[1].1 >= result.ranked[2].1);
        assert_eq!(result.label, result.ranked[0].0);
        assert_eq!(result.label, "versicolor");
    }

    #[test]
    fn nan_feature_is_rejected_by_name() {
        let err = predict(&artifact(), &request(f64::NAN, 1.0)).unwrap_err();
        match err {
            DatascopeError::InvalidFeature { feature, .. } => {
                assert_eq!(feature, "petal_length");
            }
            other => panic!("expected InvalidFeature, got {other:?}"),
        }
    }

    #[test]
    fn infinite_feature_is_rejected() {
        let err = predict(&artifact(), &request(1.0, f64::INFINITY)).unwrap_err();
        assert!(matches!(err, DatascopeError::InvalidFeature { .. }));
    }

    #[test]
    fn unknown_feature_is_rejected() {
        let req = PredictionRequest::new(vec![
            ("petal_length".into(), 1.0),
            ("petal_width".into(), 1.0),
            ("sepal_girth".into(), 1.0),
        ]);
        let err = predict(&artifact(), &req).unwrap_err();
        match err {
            DatascopeError::InvalidFeature { feature, .. } => assert_eq!(feature, "sepal_girth"),
            other => panic!("expected InvalidFeature, got {other:?}"),
        }
    }

    #[test]
    fn missing_feature_is_rejected() {
        let req = PredictionRequest::new(vec![("petal_length".into(), 1.0)]);
        let err = predict(&artifact(), &req).unwrap_err();
        match err {
            DatascopeError::InvalidFeature { feature, .. } => assert_eq!(feature, "petal_width"),
            other => panic!("expected InvalidFeature, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_values_are_passed_through() {
        // Far outside the training range: no clamping, still a distribution.
        let result = predict(&artifact(), &request(500.0, -500.0)).unwrap();
        let total: f64 = result.ranked.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}
