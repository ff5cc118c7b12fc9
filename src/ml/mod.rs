/// Model layer: training, provisioning, and prediction.
///
/// Architecture:
/// ```text
///   TabularDataset ──► train ──► ModelArtifact (classifier + labels)
///                                      │
///        classifier.json ◄── provider ─┤  load-or-train, persisted pair
///        labels.json     ◄─────────────┘
///                                      │
///   PredictionRequest ──► predict ──► ranked PredictionResult
/// ```

pub mod naive_bayes;
pub mod predict;
pub mod provider;
pub mod train;
