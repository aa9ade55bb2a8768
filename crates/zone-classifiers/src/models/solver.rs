//! Binary C-SVC solver capability.
//!
//! `BinarySolver` is the seam between the training pipeline and the
//! numerical optimizer. `SmoSolver` is the default implementation: sequential
//! minimal optimization over the dual problem
//!
//! ```text
//! min 1/2 a'Qa - e'a   s.t.  0 <= a_i <= C_i,  y'a = 0
//! ```
//!
//! with `Q_ij = y_i y_j K(x_i, x_j)` and a per-sample bound `C_i` taken from
//! the sample's class, which is how penalty weights reach the optimizer.
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::error::{ClassifierError, Result};
use crate::math::Array2;
use crate::models::kernel::Kernel;

/// A two-class problem; `y` holds +1 / -1.
pub struct BinaryProblem<'a> {
    pub x: &'a Array2<f64>,
    pub y: &'a [i8],
    /// Upper bound for alphas of positive samples.
    pub c_positive: f64,
    /// Upper bound for alphas of negative samples.
    pub c_negative: f64,
}

#[derive(Debug, Clone)]
pub struct BinarySolution {
    pub alpha: Vec<f64>,
    pub rho: f64,
    pub iterations: usize,
}

pub trait BinarySolver: Send + Sync {
    fn solve(&self, problem: &BinaryProblem, kernel: &Kernel) -> Result<BinarySolution>;
}

/// SMO with maximal-violating-pair working set selection.
#[derive(Debug, Clone)]
pub struct SmoSolver {
    pub eps: f64,
    pub cache_rows: usize,
    /// Defaults to `max(10_000_000, 100 * n)` when unset.
    pub max_iterations: Option<usize>,
}

impl SmoSolver {
    const TAU: f64 = 1e-12;

    pub fn new(eps: f64, cache_rows: usize) -> Self {
        Self {
            eps,
            cache_rows,
            max_iterations: None,
        }
    }
}

impl Default for SmoSolver {
    fn default() -> Self {
        Self::new(1e-3, 1024)
    }
}

/// Lazily computed rows of Q with a bounded FIFO cache.
struct QMatrix<'a> {
    x: &'a Array2<f64>,
    y: &'a [i8],
    kernel: &'a Kernel,
    diagonal: Vec<f64>,
    rows: HashMap<usize, Rc<[f64]>>,
    order: VecDeque<usize>,
    capacity: usize,
}

impl<'a> QMatrix<'a> {
    fn new(x: &'a Array2<f64>, y: &'a [i8], kernel: &'a Kernel, capacity: usize) -> Self {
        let diagonal = (0..x.nrows())
            .map(|i| kernel.evaluate(x.row_slice(i), x.row_slice(i)))
            .collect();
        Self {
            x,
            y,
            kernel,
            diagonal,
            rows: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(2),
        }
    }

    fn row(&mut self, i: usize) -> Rc<[f64]> {
        if let Some(row) = self.rows.get(&i) {
            return Rc::clone(row);
        }
        let xi = self.x.row_slice(i);
        let yi = self.y[i] as f64;
        let row: Rc<[f64]> = (0..self.x.nrows())
            .map(|j| yi * self.y[j] as f64 * self.kernel.evaluate(xi, self.x.row_slice(j)))
            .collect();
        if self.order.len() >= self.capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.rows.remove(&evicted);
            }
        }
        self.order.push_back(i);
        self.rows.insert(i, Rc::clone(&row));
        row
    }
}

impl BinarySolver for SmoSolver {
    fn solve(&self, problem: &BinaryProblem, kernel: &Kernel) -> Result<BinarySolution> {
        let y = problem.y;
        let n = y.len();
        if n != problem.x.nrows() {
            return Err(ClassifierError::training(format!(
                "{} labels for {} samples",
                n,
                problem.x.nrows()
            )));
        }
        if !y.iter().any(|&v| v > 0) || !y.iter().any(|&v| v < 0) {
            return Err(ClassifierError::training(
                "a binary problem needs samples of both classes",
            ));
        }

        let bound = |i: usize| {
            if y[i] > 0 {
                problem.c_positive
            } else {
                problem.c_negative
            }
        };
        let max_iterations = self
            .max_iterations
            .unwrap_or_else(|| 10_000_000usize.max(n.saturating_mul(100)));

        let mut q = QMatrix::new(problem.x, y, kernel, self.cache_rows);
        let mut alpha = vec![0.0f64; n];
        let mut grad = vec![-1.0f64; n];
        let mut iterations = 0usize;

        loop {
            // Maximal violating pair: i from I_up maximizing -y G, j from I_low minimizing it.
            let mut g_max = f64::NEG_INFINITY;
            let mut g_min = f64::INFINITY;
            let mut i_sel = None;
            let mut j_sel = None;
            for t in 0..n {
                let yt = y[t] as f64;
                let v = -yt * grad[t];
                let in_up = if y[t] > 0 { alpha[t] < bound(t) } else { alpha[t] > 0.0 };
                let in_low = if y[t] > 0 { alpha[t] > 0.0 } else { alpha[t] < bound(t) };
                if in_up && v > g_max {
                    g_max = v;
                    i_sel = Some(t);
                }
                if in_low && v < g_min {
                    g_min = v;
                    j_sel = Some(t);
                }
            }

            let (i, j) = match (i_sel, j_sel) {
                (Some(i), Some(j)) if g_max - g_min >= self.eps => (i, j),
                _ => break,
            };
            if iterations >= max_iterations {
                log::warn!(
                    "[ZoneClassifier::Solver] Reached {} iterations before convergence",
                    max_iterations
                );
                break;
            }
            iterations += 1;

            let q_i = q.row(i);
            let q_j = q.row(j);
            let (c_i, c_j) = (bound(i), bound(j));
            let (old_ai, old_aj) = (alpha[i], alpha[j]);

            if y[i] != y[j] {
                let mut quad = q.diagonal[i] + q.diagonal[j] + 2.0 * q_i[j];
                if quad <= 0.0 {
                    quad = Self::TAU;
                }
                let delta = (-grad[i] - grad[j]) / quad;
                let diff = alpha[i] - alpha[j];
                alpha[i] += delta;
                alpha[j] += delta;
                if diff > 0.0 {
                    if alpha[j] < 0.0 {
                        alpha[j] = 0.0;
                        alpha[i] = diff;
                    }
                } else if alpha[i] < 0.0 {
                    alpha[i] = 0.0;
                    alpha[j] = -diff;
                }
                if diff > c_i - c_j {
                    if alpha[i] > c_i {
                        alpha[i] = c_i;
                        alpha[j] = c_i - diff;
                    }
                } else if alpha[j] > c_j {
                    alpha[j] = c_j;
                    alpha[i] = c_j + diff;
                }
            } else {
                let mut quad = q.diagonal[i] + q.diagonal[j] - 2.0 * q_i[j];
                if quad <= 0.0 {
                    quad = Self::TAU;
                }
                let delta = (grad[i] - grad[j]) / quad;
                let sum = alpha[i] + alpha[j];
                alpha[i] -= delta;
                alpha[j] += delta;
                if sum > c_i {
                    if alpha[i] > c_i {
                        alpha[i] = c_i;
                        alpha[j] = sum - c_i;
                    }
                } else if alpha[j] < 0.0 {
                    alpha[j] = 0.0;
                    alpha[i] = sum;
                }
                if sum > c_j {
                    if alpha[j] > c_j {
                        alpha[j] = c_j;
                        alpha[i] = sum - c_j;
                    }
                } else if alpha[i] < 0.0 {
                    alpha[i] = 0.0;
                    alpha[j] = sum;
                }
            }

            let d_i = alpha[i] - old_ai;
            let d_j = alpha[j] - old_aj;
            for k in 0..n {
                grad[k] += q_i[k] * d_i + q_j[k] * d_j;
            }
            if !grad[i].is_finite() || !grad[j].is_finite() {
                return Err(ClassifierError::training(
                    "solver diverged: non-finite gradient (check kernel parameters)",
                ));
            }
        }

        let rho = compute_rho(y, &alpha, &grad, bound);
        if !rho.is_finite() {
            return Err(ClassifierError::training("solver produced a non-finite bias"));
        }

        Ok(BinarySolution {
            alpha,
            rho,
            iterations,
        })
    }
}

/// Bias from free support vectors, or the midpoint of the feasible interval when none are free.
fn compute_rho(y: &[i8], alpha: &[f64], grad: &[f64], bound: impl Fn(usize) -> f64) -> f64 {
    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    let mut free = 0usize;
    let mut free_sum = 0.0;

    for i in 0..y.len() {
        let yg = y[i] as f64 * grad[i];
        if alpha[i] >= bound(i) {
            if y[i] < 0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else if alpha[i] <= 0.0 {
            if y[i] > 0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else {
            free += 1;
            free_sum += yg;
        }
    }

    if free > 0 {
        free_sum / free as f64
    } else {
        (upper + lower) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KernelType;

    fn linear() -> Kernel {
        Kernel {
            kind: KernelType::Linear,
            gamma: 1.0,
            coef0: 0.0,
            degree: 3,
        }
    }

    fn decision(x: &Array2<f64>, y: &[i8], sol: &BinarySolution, kernel: &Kernel, p: &[f64]) -> f64 {
        (0..y.len())
            .map(|i| sol.alpha[i] * y[i] as f64 * kernel.evaluate(x.row_slice(i), p))
            .sum::<f64>()
            - sol.rho
    }

    #[test]
    fn separates_two_points() {
        let x = Array2::from_rows(&[vec![1.0, 0.0], vec![-1.0, 0.0]], 2).unwrap();
        let y = [1i8, -1];
        let problem = BinaryProblem {
            x: &x,
            y: &y,
            c_positive: 10.0,
            c_negative: 10.0,
        };
        let kernel = linear();
        let sol = SmoSolver::default().solve(&problem, &kernel).unwrap();
        // Hard-margin solution: w = (1, 0), b = 0, alpha = 0.5 each.
        assert!((sol.alpha[0] - 0.5).abs() < 1e-6);
        assert!((sol.alpha[1] - 0.5).abs() < 1e-6);
        assert!(sol.rho.abs() < 1e-6);
        assert!(decision(&x, &y, &sol, &kernel, &[2.0, 5.0]) > 0.0);
        assert!(decision(&x, &y, &sol, &kernel, &[-2.0, 5.0]) < 0.0);
    }

    #[test]
    fn alphas_respect_class_bounds_and_balance() {
        let x = Array2::from_rows(
            &[
                vec![0.0, 0.0],
                vec![0.2, 0.1],
                vec![1.0, 1.0],
                vec![0.9, 0.8],
                vec![0.5, 0.5],
            ],
            2,
        )
        .unwrap();
        let y = [1i8, 1, -1, -1, 1];
        let problem = BinaryProblem {
            x: &x,
            y: &y,
            c_positive: 0.5,
            c_negative: 2.0,
        };
        let sol = SmoSolver::default().solve(&problem, &linear()).unwrap();
        let mut balance = 0.0;
        for i in 0..y.len() {
            let c = if y[i] > 0 { 0.5 } else { 2.0 };
            assert!(sol.alpha[i] >= 0.0 && sol.alpha[i] <= c + 1e-12);
            balance += sol.alpha[i] * y[i] as f64;
        }
        assert!(balance.abs() < 1e-9);
    }

    #[test]
    fn single_class_problem_fails() {
        let x = Array2::from_rows(&[vec![1.0], vec![2.0]], 1).unwrap();
        let y = [1i8, 1];
        let problem = BinaryProblem {
            x: &x,
            y: &y,
            c_positive: 1.0,
            c_negative: 1.0,
        };
        let err = SmoSolver::default().solve(&problem, &linear()).unwrap_err();
        assert!(matches!(err, ClassifierError::Training(_)));
    }

    #[test]
    fn small_cache_gives_the_same_solution() {
        let x = Array2::from_rows(
            &[vec![0.0], vec![0.3], vec![0.6], vec![1.0], vec![1.4], vec![2.0]],
            1,
        )
        .unwrap();
        let y = [1i8, 1, 1, -1, -1, -1];
        let problem = BinaryProblem {
            x: &x,
            y: &y,
            c_positive: 4.0,
            c_negative: 4.0,
        };
        let kernel = Kernel {
            kind: KernelType::Rbf,
            gamma: 1.0,
            coef0: 0.0,
            degree: 3,
        };
        let big = SmoSolver::new(1e-3, 64).solve(&problem, &kernel).unwrap();
        let small = SmoSolver::new(1e-3, 2).solve(&problem, &kernel).unwrap();
        assert_eq!(big.alpha, small.alpha);
        assert_eq!(big.rho, small.rho);
    }
}
