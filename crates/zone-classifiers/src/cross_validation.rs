//! k-fold cross-validation over pre-partitioned sample groups.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::error::{ClassifierError, Result};
use crate::labels::ClassLabel;
use crate::sample::TrainingSample;
use crate::stats::{evaluate, ConfusionMatrix};
use crate::trainer::ClassifierTrainer;

/// k disjoint groups of samples whose union is the whole training set.
#[derive(Debug, Clone)]
pub struct FoldPartition<L> {
    groups: Vec<Vec<TrainingSample<L>>>,
}

impl<L: ClassLabel> FoldPartition<L> {
    /// At least two groups are required.
    pub fn new(groups: Vec<Vec<TrainingSample<L>>>) -> Result<Self> {
        if groups.len() < 2 {
            return Err(ClassifierError::configuration(format!(
                "cross-validation needs at least 2 folds, got {}",
                groups.len()
            )));
        }
        Ok(Self { groups })
    }

    /// Shuffle with a fixed seed, then deal samples round-robin into `k` groups.
    pub fn shuffled(mut samples: Vec<TrainingSample<L>>, k: usize, seed: u64) -> Result<Self> {
        if k < 2 {
            return Err(ClassifierError::configuration(format!(
                "cross-validation needs at least 2 folds, got {}",
                k
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        samples.shuffle(&mut rng);

        let mut groups: Vec<Vec<TrainingSample<L>>> = (0..k).map(|_| Vec::new()).collect();
        for (idx, sample) in samples.into_iter().enumerate() {
            groups[idx % k].push(sample);
        }
        Self::new(groups)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// The held-out group of fold `i`.
    pub fn group(&self, i: usize) -> &[TrainingSample<L>] {
        &self.groups[i]
    }

    /// Union of every group except `i`, in group order.
    pub fn training_set(&self, i: usize) -> Vec<&TrainingSample<L>> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .flat_map(|(_, group)| group.iter())
            .collect()
    }
}

/// Result of one successfully trained and persisted fold.
#[derive(Debug, Clone)]
pub struct FoldOutcome<L: ClassLabel> {
    pub fold: usize,
    pub path: PathBuf,
    pub training_samples: usize,
    /// Predictions of the fold model on its held-out group.
    pub evaluation: ConfusionMatrix<L>,
}

/// `<prefix>-<fold>`
pub fn fold_path(prefix: &Path, fold: usize) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(format!("-{}", fold));
    PathBuf::from(name)
}

pub struct CrossValidationHarness<'a, L> {
    trainer: &'a ClassifierTrainer<L>,
}

impl<'a, L: ClassLabel> CrossValidationHarness<'a, L> {
    pub fn new(trainer: &'a ClassifierTrainer<L>) -> Self {
        Self { trainer }
    }

    /// Train, persist and evaluate one model per fold.
    ///
    /// Folds run in parallel. A failed fold does not remove the models other
    /// folds wrote; the failures are reported together once all folds finish.
    pub fn run(&self, partition: &FoldPartition<L>, prefix: &Path) -> Result<Vec<FoldOutcome<L>>> {
        let k = partition.len();
        log::info!(
            "[ZoneClassifier::CrossValidation] Running {} folds over {} samples",
            k,
            partition.total()
        );

        let results: Vec<Result<FoldOutcome<L>>> = (0..k)
            .into_par_iter()
            .map(|i| self.run_fold(partition, i, prefix))
            .collect();

        let mut outcomes = Vec::with_capacity(k);
        let mut failures = Vec::new();
        for (i, result) in results.into_iter().enumerate() {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    log::error!("[ZoneClassifier::CrossValidation] Fold {} failed: {}", i, e);
                    failures.push(format!("fold {}: {}", i, e));
                }
            }
        }

        if !failures.is_empty() {
            return Err(ClassifierError::training(format!(
                "{} of {} folds failed ({})",
                failures.len(),
                k,
                failures.join("; ")
            )));
        }

        let correct: usize = outcomes.iter().map(|o| o.evaluation.correct()).sum();
        let total: usize = outcomes.iter().map(|o| o.evaluation.total()).sum();
        if total > 0 {
            log::info!(
                "[ZoneClassifier::CrossValidation] Overall held-out accuracy {:.4} ({}/{})",
                correct as f64 / total as f64,
                correct,
                total
            );
        }
        Ok(outcomes)
    }

    fn run_fold(&self, partition: &FoldPartition<L>, i: usize, prefix: &Path) -> Result<FoldOutcome<L>> {
        let training = partition.training_set(i);
        let training_samples = training.len();
        let model = self.trainer.train_balanced(training)?;

        // A fold that fails writes no model.
        let evaluation = evaluate(&model, partition.group(i))?;
        match evaluation.accuracy() {
            Some(acc) => log::info!(
                "[ZoneClassifier::CrossValidation] Fold {}: accuracy {:.4} on {} held-out samples",
                i,
                acc,
                evaluation.total()
            ),
            None => log::info!(
                "[ZoneClassifier::CrossValidation] Fold {}: no held-out samples",
                i
            ),
        }
        log::debug!("[ZoneClassifier::CrossValidation] Fold {} confusion matrix:\n{}", i, evaluation);

        let path = fold_path(prefix, i);
        model.save(&path)?;

        Ok(FoldOutcome {
            fold: i,
            path,
            training_samples,
            evaluation,
        })
    }
}
