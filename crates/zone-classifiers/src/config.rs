use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ClassifierError, Result};

/// Kernel families supported by the classifier.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KernelType {
    Linear,
    Polynomial,
    Rbf,
    Sigmoid,
}

impl KernelType {
    /// Numeric kernel codes as used on the command line: 0=linear, 1=polynomial, 2=rbf, 3=sigmoid.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(KernelType::Linear),
            1 => Ok(KernelType::Polynomial),
            2 => Ok(KernelType::Rbf),
            3 => Ok(KernelType::Sigmoid),
            _ => Err(ClassifierError::configuration(format!(
                "Invalid kernel value provided: {} (expected 0=linear, 1=polynomial, 2=rbf, 3=sigmoid)",
                code
            ))),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            KernelType::Linear => 0,
            KernelType::Polynomial => 1,
            KernelType::Rbf => 2,
            KernelType::Sigmoid => 3,
        }
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KernelType::Linear => "linear",
            KernelType::Polynomial => "polynomial",
            KernelType::Rbf => "rbf",
            KernelType::Sigmoid => "sigmoid",
        };
        f.write_str(name)
    }
}

impl FromStr for KernelType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(KernelType::Linear),
            "poly" | "polynomial" => Ok(KernelType::Polynomial),
            "rbf" | "gauss" => Ok(KernelType::Rbf),
            "sigmoid" => Ok(KernelType::Sigmoid),
            _ => Err(format!(
                "Unknown kernel type: {}. Valid options are: linear, polynomial, rbf, sigmoid",
                s
            )),
        }
    }
}

/// Hyper-parameters of a weighted C-SVC.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SvmParameters {
    pub kernel: KernelType,
    pub gamma: f64,
    /// Regularization strength C.
    pub cost: f64,
    /// Polynomial degree; only used, and then required, by the polynomial kernel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<u32>,
    #[serde(default)]
    pub coef0: f64,
    /// Stopping tolerance on the maximal KKT violation.
    #[serde(default = "SvmParameters::default_eps")]
    pub eps: f64,
    /// Number of kernel rows kept in the solver cache.
    #[serde(default = "SvmParameters::default_cache_rows")]
    pub cache_rows: usize,
}

impl SvmParameters {
    fn default_eps() -> f64 {
        1e-3
    }

    fn default_cache_rows() -> usize {
        1024
    }

    pub fn new(kernel: KernelType, gamma: f64, cost: f64, degree: Option<u32>) -> Self {
        Self {
            kernel,
            gamma,
            cost,
            degree,
            ..Self::default()
        }
    }

    /// Check the parameters before any training work is done.
    pub fn validate(&self) -> Result<()> {
        if self.kernel == KernelType::Polynomial {
            match self.degree {
                None => {
                    return Err(ClassifierError::configuration(
                        "Polynomial kernel requires the degree option to be specified",
                    ))
                }
                Some(0) => {
                    return Err(ClassifierError::configuration(
                        "Polynomial kernel degree must be at least 1",
                    ))
                }
                Some(_) => {}
            }
        }
        // The linear kernel never reads gamma.
        if self.kernel != KernelType::Linear && !(self.gamma.is_finite() && self.gamma >= 0.0) {
            return Err(ClassifierError::configuration(format!(
                "gamma must be a non-negative number, got {}",
                self.gamma
            )));
        }
        if !(self.cost.is_finite() && self.cost > 0.0) {
            return Err(ClassifierError::configuration(format!(
                "cost must be a positive number, got {}",
                self.cost
            )));
        }
        if !self.coef0.is_finite() {
            return Err(ClassifierError::configuration("coef0 must be finite"));
        }
        if !(self.eps.is_finite() && self.eps > 0.0) {
            return Err(ClassifierError::configuration(format!(
                "eps must be a positive number, got {}",
                self.eps
            )));
        }
        if self.cache_rows < 2 {
            return Err(ClassifierError::configuration(
                "the kernel cache must hold at least two rows",
            ));
        }
        Ok(())
    }
}

impl Default for SvmParameters {
    fn default() -> Self {
        Self {
            kernel: KernelType::Rbf,
            gamma: 1.0,
            cost: 16.0,
            degree: None,
            coef0: 0.0,
            eps: Self::default_eps(),
            cache_rows: Self::default_cache_rows(),
        }
    }
}
