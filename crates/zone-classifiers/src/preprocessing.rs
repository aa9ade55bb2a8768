//! Feature scaling applied before training and prediction.
//!
//! Each feature is scaled linearly to [0, 1] using the range observed in the
//! training set. The fitted scaler is stored in the model so prediction sees
//! the same transformation.

use serde::{Deserialize, Serialize};

use crate::math::Array2;

/// Per-column min/max scaler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl FeatureScaler {
    /// Columns with a range below this are treated as constant.
    const MIN_RANGE: f64 = 1e-12;

    pub fn dimensions(&self) -> usize {
        self.min.len()
    }

    /// Scale one feature vector. Values outside the training range fall outside [0, 1].
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.min.iter().zip(self.max.iter()))
            .map(|(&v, (&lo, &hi))| {
                let range = hi - lo;
                if range < Self::MIN_RANGE {
                    0.0
                } else {
                    (v - lo) / range
                }
            })
            .collect()
    }
}

/// Fit a `FeatureScaler` from an `Array2<f64>` where rows are samples and
/// columns are features.
pub fn fit_scaler(x: &Array2<f64>) -> FeatureScaler {
    let (nrows, ncols) = x.shape();
    assert!(nrows > 0, "fit_scaler requires at least one row");

    let mut min = vec![f64::INFINITY; ncols];
    let mut max = vec![f64::NEG_INFINITY; ncols];
    for row in x.rows() {
        for (c, &v) in row.iter().enumerate() {
            min[c] = min[c].min(v);
            max[c] = max[c].max(v);
        }
    }

    FeatureScaler { min, max }
}

/// Transform all rows using the provided `FeatureScaler` and return a new `Array2<f64>`.
pub fn transform_all(x: &Array2<f64>, sc: &FeatureScaler) -> Array2<f64> {
    let (nrows, ncols) = x.shape();
    let mut out = Vec::with_capacity(nrows * ncols);
    for row in x.rows() {
        out.extend(sc.transform_row(row));
    }
    Array2::from_shape_vec((nrows, ncols), out).expect("transform_all: shape mismatch")
}
