//! Evaluation statistics for held-out samples.
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::Result;
use crate::labels::ClassLabel;
use crate::sample::TrainingSample;
use crate::trainer::ClassifierModel;

/// Counts of (actual, predicted) label pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix<L: ClassLabel> {
    counts: BTreeMap<(L, L), usize>,
    total: usize,
}

impl<L: ClassLabel> Default for ConfusionMatrix<L> {
    fn default() -> Self {
        Self {
            counts: BTreeMap::new(),
            total: 0,
        }
    }
}

impl<L: ClassLabel> ConfusionMatrix<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, actual: L, predicted: L) {
        *self.counts.entry((actual, predicted)).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn count(&self, actual: L, predicted: L) -> usize {
        self.counts.get(&(actual, predicted)).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn correct(&self) -> usize {
        self.counts
            .iter()
            .filter(|((a, p), _)| a == p)
            .map(|(_, n)| n)
            .sum()
    }

    /// Fraction of correct predictions; `None` when nothing was recorded.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct() as f64 / self.total as f64)
        }
    }

    /// Every label seen as actual or predicted, in canonical order.
    pub fn labels(&self) -> Vec<L> {
        let set: BTreeSet<L> = self.counts.keys().flat_map(|&(a, p)| [a, p]).collect();
        set.into_iter().collect()
    }
}

impl<L: ClassLabel> fmt::Display for ConfusionMatrix<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = self.labels();
        write!(f, "{:<20}", "actual \\ predicted")?;
        for l in &labels {
            write!(f, " {:>12}", l.name())?;
        }
        writeln!(f)?;
        for a in &labels {
            write!(f, "{:<20}", a.name())?;
            for p in &labels {
                write!(f, " {:>12}", self.count(*a, *p))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Predict every sample and tally the outcome.
pub fn evaluate<'a, L, I>(model: &ClassifierModel<L>, samples: I) -> Result<ConfusionMatrix<L>>
where
    L: ClassLabel,
    I: IntoIterator<Item = &'a TrainingSample<L>>,
{
    let mut matrix = ConfusionMatrix::new();
    for sample in samples {
        let predicted = model.predict(sample.features())?;
        matrix.record(sample.label(), predicted);
    }
    Ok(matrix)
}
