use std::f64::consts::PI;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Gaussian naive Bayes classifier
// ---------------------------------------------------------------------------

/// Gaussian naive Bayes over numeric features.
///
/// Classes are dense indices `0..n_classes`; the human-readable label list is
/// kept alongside the classifier in the model artifact, index-aligned with
/// these class indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNb {
    /// Per-class feature means, indexed `[class][feature]`.
    means: Vec<Vec<f64>>,
    /// Per-class feature variances (smoothed), same indexing.
    variances: Vec<Vec<f64>>,
    /// Prior probability per class.
    priors: Vec<f64>,
    n_features: usize,
    /// Additive variance smoothing.
    var_smoothing: f64,
}

impl Default for GaussianNb {
    fn default() -> Self {
        Self::new(1e-9)
    }
}

impl GaussianNb {
    pub fn new(var_smoothing: f64) -> Self {
        Self {
            means: Vec::new(),
            variances: Vec::new(),
            priors: Vec::new(),
            n_features: 0,
            var_smoothing,
        }
    }

    pub fn n_classes(&self) -> usize {
        self.priors.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Fit per-class feature statistics.
    ///
    /// `y[i]` is the class index of row `i` and must be `< n_classes`.  A
    /// class with no samples keeps a zero prior and can never be predicted.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        self.n_features = n_features;
        self.means = vec![vec![0.0; n_features]; n_classes];
        self.variances = vec![vec![self.var_smoothing; n_features]; n_classes];
        self.priors = vec![0.0; n_classes];

        let mut counts = vec![0usize; n_classes];
        let mut m2 = vec![vec![0.0; n_features]; n_classes];

        // Single-pass Welford update per class.
        for (i, &class) in y.iter().enumerate() {
            counts[class] += 1;
            let count = counts[class] as f64;
            let row = x.row(i);
            for (j, &val) in row.iter().enumerate() {
                let delta = val - self.means[class][j];
                self.means[class][j] += delta / count;
                let delta2 = val - self.means[class][j];
                m2[class][j] += delta * delta2;
            }
        }

        for class in 0..n_classes {
            if counts[class] == 0 {
                continue;
            }
            self.priors[class] = counts[class] as f64 / n_samples as f64;
            for j in 0..n_features {
                self.variances[class][j] = m2[class][j] / counts[class] as f64 + self.var_smoothing;
            }
        }
    }

    /// Predicted class index per row (argmax of the class posteriors).
    pub fn predict(&self, x: &Array2<f64>) -> Vec<usize> {
        let proba = self.predict_proba(x);
        proba
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.total_cmp(b))
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Class probabilities per row; each row is non-negative and sums to 1.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let log_proba = self.predict_log_proba(x);
        log_proba.mapv(|v| v.exp())
    }

    /// Normalized log posteriors (log-sum-exp trick keeps this stable for
    /// far-out feature values).
    pub fn predict_log_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        let n_samples = x.nrows();
        let n_classes = self.n_classes();
        let mut log_proba = Array2::zeros((n_samples, n_classes));

        for (i, row) in x.rows().into_iter().enumerate() {
            for class in 0..n_classes {
                let prior = self.priors[class];
                log_proba[[i, class]] = if prior > 0.0 {
                    prior.ln() + self.log_likelihood(&row.to_owned(), class)
                } else {
                    f64::NEG_INFINITY
                };
            }

            let max_val = log_proba
                .row(i)
                .iter()
                .cloned()
                .fold(f64::NEG_INFINITY, f64::max);
            let log_sum: f64 = log_proba
                .row(i)
                .iter()
                .map(|&v| (v - max_val).exp())
                .sum::<f64>()
                .ln();
            for class in 0..n_classes {
                log_proba[[i, class]] -= max_val + log_sum;
            }
        }

        log_proba
    }

    fn log_likelihood(&self, x: &Array1<f64>, class: usize) -> f64 {
        let means = &self.means[class];
        let vars = &self.variances[class];

        x.iter()
            .zip(means.iter())
            .zip(vars.iter())
            .map(|((&xi, &mean), &var)| {
                -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln())
            })
            .sum()
    }
}
