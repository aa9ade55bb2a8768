//! Training, persistence and prediction of zone classifier models.
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::config::{KernelType, SvmParameters};
use crate::error::{ClassifierError, Result};
use crate::labels::ClassLabel;
use crate::math::Array2;
use crate::models::solver::{BinarySolver, SmoSolver};
use crate::models::svm::{ClassPenalties, MultiClassSvm};
use crate::penalty::{ClassWeight, PenaltyCalculator, PenaltyWeights};
use crate::preprocessing::{fit_scaler, transform_all, FeatureScaler};
use crate::sample::TrainingSample;

pub const MODEL_FORMAT_VERSION: u32 = 1;

/// A trained classifier together with everything needed to reproduce its inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ClassifierModel<L> {
    pub format_version: u32,
    /// Label taxonomy the class ordinals refer to.
    pub taxonomy: String,
    pub trained_at: DateTime<Utc>,
    pub parameters: SvmParameters,
    /// Feature schema, in vector order.
    pub feature_names: Vec<String>,
    /// Penalty weights used at train time.
    pub class_weights: Vec<ClassWeight>,
    pub scaler: FeatureScaler,
    pub machine: MultiClassSvm,
    #[serde(skip)]
    label: PhantomData<fn() -> L>,
}

impl<L: ClassLabel> ClassifierModel<L> {
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn dimensions(&self) -> usize {
        self.feature_names.len()
    }

    pub fn classes(&self) -> Vec<L> {
        self.machine
            .classes
            .iter()
            .filter_map(|&o| L::from_ordinal(o))
            .collect()
    }

    pub fn class_weight(&self, label: L) -> Option<f64> {
        self.class_weights
            .iter()
            .find(|cw| cw.ordinal == label.ordinal())
            .map(|cw| cw.weight)
    }

    /// Predict the label of one feature vector built with the model's schema.
    pub fn predict(&self, features: &[f64]) -> Result<L> {
        if features.len() != self.dimensions() {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.dimensions(),
                found: features.len(),
            });
        }
        let scaled = self.scaler.transform_row(features);
        let ordinal = self.machine.predict_ordinal(&scaled);
        L::from_ordinal(ordinal).ok_or_else(|| ClassifierError::ModelFormat {
            path: PathBuf::new(),
            reason: format!("class ordinal {} is not a {} label", ordinal, L::TAXONOMY),
        })
    }

    /// Write the model as JSON.
    ///
    /// The model is written to a temporary file next to `path` and renamed
    /// into place, so a failed write never leaves a partial model behind.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ClassifierError::io(dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, self)
                .map_err(|e| ClassifierError::io(path, e.into()))?;
            writer.flush().map_err(|e| ClassifierError::io(path, e))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| ClassifierError::io(path, e))?;
        tmp.persist(path)
            .map_err(|e| ClassifierError::io(path, e.error))?;

        log::info!("[ZoneClassifier::Model] Saved model to {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ClassifierError::ModelNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(ClassifierError::io(path, e)),
        };
        let model: Self = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            ClassifierError::ModelFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        model.check(path)?;
        Ok(model)
    }

    /// Structural consistency checks applied to a freshly loaded model.
    fn check(&self, path: &Path) -> Result<()> {
        let fail = |reason: String| ClassifierError::ModelFormat {
            path: path.to_path_buf(),
            reason,
        };

        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(fail(format!(
                "unsupported format version {} (expected {})",
                self.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if self.taxonomy != L::TAXONOMY {
            return Err(fail(format!(
                "model classifies '{}' labels, not '{}' labels",
                self.taxonomy,
                L::TAXONOMY
            )));
        }
        if let Some(&bad) = self
            .machine
            .classes
            .iter()
            .find(|&&o| L::from_ordinal(o).is_none())
        {
            return Err(fail(format!("unknown class ordinal {}", bad)));
        }
        let k = self.machine.classes.len();
        if k < 2 || self.machine.machines.len() != k * (k - 1) / 2 {
            return Err(fail(format!(
                "{} pairwise machines for {} classes",
                self.machine.machines.len(),
                k
            )));
        }
        let dims = self.dimensions();
        if self.scaler.min.len() != dims || self.scaler.max.len() != dims {
            return Err(fail("scaler does not match the feature schema".to_string()));
        }
        for m in &self.machine.machines {
            if m.coefficients.len() != m.support_vectors.len() {
                return Err(fail("support vectors and coefficients differ in count".to_string()));
            }
            if m.support_vectors.iter().any(|sv| sv.len() != dims) {
                return Err(fail("support vector does not match the feature schema".to_string()));
            }
        }
        Ok(())
    }
}

/// Trains `ClassifierModel`s for a fixed feature schema and parameter set.
pub struct ClassifierTrainer<L> {
    params: SvmParameters,
    feature_names: Vec<String>,
    solver: Box<dyn BinarySolver>,
    label: PhantomData<fn() -> L>,
}

impl<L: ClassLabel> ClassifierTrainer<L> {
    /// Validate the parameters and create a trainer using the default SMO solver.
    pub fn new(params: SvmParameters, feature_names: Vec<String>) -> Result<Self> {
        params.validate()?;
        let solver = SmoSolver::new(params.eps, params.cache_rows);
        Ok(Self {
            params,
            feature_names,
            solver: Box::new(solver),
            label: PhantomData,
        })
    }

    /// Replace the solver capability.
    pub fn with_solver(mut self, solver: impl BinarySolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn parameters(&self) -> &SvmParameters {
        &self.params
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Compute penalty weights from the samples and train on them.
    pub fn train_balanced<'a, I>(&self, samples: I) -> Result<ClassifierModel<L>>
    where
        I: IntoIterator<Item = &'a TrainingSample<L>>,
    {
        let samples: Vec<&TrainingSample<L>> = samples.into_iter().collect();
        let weights = PenaltyCalculator::new(samples.iter().copied()).weights();
        self.train(samples, &weights)
    }

    pub fn train<'a, I>(&self, samples: I, weights: &PenaltyWeights<L>) -> Result<ClassifierModel<L>>
    where
        I: IntoIterator<Item = &'a TrainingSample<L>>,
    {
        let samples: Vec<&TrainingSample<L>> = samples.into_iter().collect();
        if samples.is_empty() {
            return Err(ClassifierError::training("no training samples"));
        }

        let dims = self.feature_names.len();
        for (idx, sample) in samples.iter().enumerate() {
            if sample.features().len() != dims {
                return Err(ClassifierError::training(format!(
                    "sample {} has {} features but the schema has {}",
                    idx,
                    sample.features().len(),
                    dims
                )));
            }
            if sample.features().iter().any(|v| !v.is_finite()) {
                return Err(ClassifierError::training(format!(
                    "sample {} contains a non-finite feature value",
                    idx
                )));
            }
            if weights.get(sample.label()).is_none() {
                return Err(ClassifierError::training(format!(
                    "no penalty weight for label {}",
                    sample.label().name()
                )));
            }
        }

        let mut penalties = ClassPenalties::default();
        for (label, weight) in weights.iter() {
            penalties.weight_label.push(label.ordinal());
            penalties.weight.push(weight);
        }

        let rows: Vec<&[f64]> = samples.iter().map(|s| s.features()).collect();
        let x = Array2::from_rows(&rows, dims)
            .map_err(|e| ClassifierError::training(e.to_string()))?;
        let scaler = fit_scaler(&x);
        let x = transform_all(&x, &scaler);
        let targets: Vec<usize> = samples.iter().map(|s| s.label().ordinal()).collect();

        log::info!(
            "[ZoneClassifier::Train] Training {} kernel on {} samples, {} features, {} classes",
            self.params.kernel,
            samples.len(),
            dims,
            weights.len()
        );
        let start_time = std::time::Instant::now();
        let machine = MultiClassSvm::train(
            &x,
            &targets,
            &penalties,
            &self.params,
            self.solver.as_ref(),
        )?;
        log::info!(
            "[ZoneClassifier::Train] Trained {} pairwise machines with {} support vectors in {:.2?}",
            machine.machines.len(),
            machine.support_vector_count(),
            start_time.elapsed()
        );

        let model = ClassifierModel {
            format_version: MODEL_FORMAT_VERSION,
            taxonomy: L::TAXONOMY.to_string(),
            trained_at: Utc::now(),
            parameters: self.params.clone(),
            feature_names: self.feature_names.clone(),
            class_weights: weights.to_class_weights(),
            scaler,
            machine,
            label: PhantomData,
        };
        if self.params.kernel == KernelType::Linear {
            log_linear_weights(&model);
        }
        Ok(model)
    }
}

fn log_linear_weights<L: ClassLabel>(model: &ClassifierModel<L>) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    let name = |o: usize| L::from_ordinal(o).map(|l| l.name()).unwrap_or("?");
    for machine in &model.machine.machines {
        let w = machine.primal_weights(model.dimensions());
        log::debug!(
            "[ZoneClassifier::Train] Feature weights {} vs {}:",
            name(machine.positive),
            name(machine.negative)
        );
        for (feature, weight) in model.feature_names.iter().zip(w.iter()) {
            log::debug!("    {:<24} {:>10.4}", feature, weight);
        }
    }
}
