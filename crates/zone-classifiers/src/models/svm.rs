//! Multi-class kernel SVM built from one-vs-one binary machines.
use serde::{Deserialize, Serialize};

use crate::config::SvmParameters;
use crate::error::{ClassifierError, Result};
use crate::math::Array2;
use crate::models::kernel::Kernel;
use crate::models::solver::{BinaryProblem, BinarySolver};

/// Decision function separating class `positive` from class `negative`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryMachine {
    pub positive: usize,
    pub negative: usize,
    pub support_vectors: Vec<Vec<f64>>,
    /// `alpha_i * y_i` for each support vector.
    pub coefficients: Vec<f64>,
    pub rho: f64,
}

impl BinaryMachine {
    pub fn decision_value(&self, kernel: &Kernel, x: &[f64]) -> f64 {
        self.support_vectors
            .iter()
            .zip(self.coefficients.iter())
            .map(|(sv, coef)| coef * kernel.evaluate(sv, x))
            .sum::<f64>()
            - self.rho
    }

    /// Primal weight vector; meaningful only for the linear kernel.
    pub fn primal_weights(&self, dimensions: usize) -> Vec<f64> {
        let mut w = vec![0.0; dimensions];
        for (sv, coef) in self.support_vectors.iter().zip(self.coefficients.iter()) {
            for (wi, xi) in w.iter_mut().zip(sv.iter()) {
                *wi += coef * xi;
            }
        }
        w
    }
}

/// Class-weight table handed to the trainer, positional like the solver expects.
#[derive(Debug, Clone, Default)]
pub struct ClassPenalties {
    /// Class ordinals.
    pub weight_label: Vec<usize>,
    /// Multipliers of C, parallel to `weight_label`.
    pub weight: Vec<f64>,
}

impl ClassPenalties {
    fn multiplier(&self, class: usize) -> f64 {
        self.weight_label
            .iter()
            .position(|&c| c == class)
            .map(|idx| self.weight[idx])
            .unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiClassSvm {
    pub kernel: Kernel,
    /// Class ordinals in canonical order.
    pub classes: Vec<usize>,
    /// One machine per class pair `(classes[a], classes[b])`, `a < b`, in lexicographic order.
    pub machines: Vec<BinaryMachine>,
}

impl MultiClassSvm {
    /// Train one-vs-one machines.
    ///
    /// `targets` holds the class ordinal of each row of `x`. The bound of a
    /// sample's alpha is `C * weight` of its class.
    pub fn train(
        x: &Array2<f64>,
        targets: &[usize],
        penalties: &ClassPenalties,
        params: &SvmParameters,
        solver: &dyn BinarySolver,
    ) -> Result<Self> {
        if targets.len() != x.nrows() {
            return Err(ClassifierError::training(format!(
                "{} targets for {} samples",
                targets.len(),
                x.nrows()
            )));
        }
        if penalties.weight_label.len() != penalties.weight.len() {
            return Err(ClassifierError::training(
                "class weight labels and weights differ in length",
            ));
        }

        let mut classes: Vec<usize> = targets.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(ClassifierError::training(format!(
                "at least two classes are required, found {}",
                classes.len()
            )));
        }

        let kernel = Kernel::from_parameters(params);
        let mut machines = Vec::with_capacity(classes.len() * (classes.len() - 1) / 2);

        for a in 0..classes.len() {
            for b in (a + 1)..classes.len() {
                let (pos, neg) = (classes[a], classes[b]);
                let rows: Vec<usize> = (0..targets.len())
                    .filter(|&r| targets[r] == pos || targets[r] == neg)
                    .collect();
                let y: Vec<i8> = rows
                    .iter()
                    .map(|&r| if targets[r] == pos { 1 } else { -1 })
                    .collect();
                let sub_x = x.select_rows(&rows);

                let problem = BinaryProblem {
                    x: &sub_x,
                    y: &y,
                    c_positive: params.cost * penalties.multiplier(pos),
                    c_negative: params.cost * penalties.multiplier(neg),
                };
                let solution = solver.solve(&problem, &kernel).map_err(|e| match e {
                    ClassifierError::Training(msg) => ClassifierError::training(format!(
                        "class pair ({}, {}): {}",
                        pos, neg, msg
                    )),
                    other => other,
                })?;

                let mut support_vectors = Vec::new();
                let mut coefficients = Vec::new();
                for (k, &alpha) in solution.alpha.iter().enumerate() {
                    if alpha > 0.0 {
                        support_vectors.push(sub_x.row_slice(k).to_vec());
                        coefficients.push(alpha * y[k] as f64);
                    }
                }
                log::trace!(
                    "[ZoneClassifier::Solver] Pair ({}, {}): {} samples, {} support vectors, {} iterations",
                    pos,
                    neg,
                    rows.len(),
                    support_vectors.len(),
                    solution.iterations
                );

                machines.push(BinaryMachine {
                    positive: pos,
                    negative: neg,
                    support_vectors,
                    coefficients,
                    rho: solution.rho,
                });
            }
        }

        Ok(Self {
            kernel,
            classes,
            machines,
        })
    }

    /// Class ordinal chosen by one-vs-one voting; ties go to the earliest class.
    pub fn predict_ordinal(&self, x: &[f64]) -> usize {
        let mut votes = vec![0usize; self.classes.len()];
        for machine in &self.machines {
            let winner = if machine.decision_value(&self.kernel, x) > 0.0 {
                machine.positive
            } else {
                machine.negative
            };
            if let Some(idx) = self.classes.iter().position(|&c| c == winner) {
                votes[idx] += 1;
            }
        }
        let mut best = 0;
        for idx in 1..votes.len() {
            if votes[idx] > votes[best] {
                best = idx;
            }
        }
        self.classes[best]
    }

    pub fn support_vector_count(&self) -> usize {
        self.machines.iter().map(|m| m.support_vectors.len()).sum()
    }
}
