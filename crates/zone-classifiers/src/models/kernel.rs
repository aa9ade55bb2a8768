use serde::{Deserialize, Serialize};

use crate::config::{KernelType, SvmParameters};

/// A kernel function with its hyper-parameters bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    pub kind: KernelType,
    pub gamma: f64,
    pub coef0: f64,
    pub degree: u32,
}

impl Kernel {
    pub fn from_parameters(params: &SvmParameters) -> Self {
        Self {
            kind: params.kernel,
            gamma: params.gamma,
            coef0: params.coef0,
            // Only read by the polynomial kernel, for which validation guarantees a value.
            degree: params.degree.unwrap_or(3),
        }
    }

    pub fn evaluate(&self, a: &[f64], b: &[f64]) -> f64 {
        match self.kind {
            KernelType::Linear => dot(a, b),
            KernelType::Polynomial => (self.gamma * dot(a, b) + self.coef0).powi(self.degree as i32),
            KernelType::Rbf => (-self.gamma * squared_distance(a, b)).exp(),
            KernelType::Sigmoid => (self.gamma * dot(a, b) + self.coef0).tanh(),
        }
    }
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel(kind: KernelType) -> Kernel {
        Kernel {
            kind,
            gamma: 0.5,
            coef0: 1.0,
            degree: 2,
        }
    }

    #[test]
    fn evaluates_each_family() {
        let a = [1.0, 2.0];
        let b = [3.0, -1.0];
        assert_eq!(kernel(KernelType::Linear).evaluate(&a, &b), 1.0);
        assert_eq!(kernel(KernelType::Polynomial).evaluate(&a, &b), 2.25);
        assert!((kernel(KernelType::Rbf).evaluate(&a, &b) - (-6.5f64).exp()).abs() < 1e-12);
        assert!((kernel(KernelType::Sigmoid).evaluate(&a, &b) - 1.5f64.tanh()).abs() < 1e-12);
    }

    #[test]
    fn rbf_self_similarity_is_one() {
        let a = [0.3, 0.7, 0.1];
        assert_eq!(kernel(KernelType::Rbf).evaluate(&a, &a), 1.0);
    }
}
