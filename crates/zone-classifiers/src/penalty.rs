//! Per-class penalty weights that counter class imbalance.
//!
//! Weights use balanced inverse frequency, `w(L) = N / (K * n_L)`, with `N`
//! samples, `K` observed classes and `n_L` samples of class `L`. Weights are
//! strictly positive and never increase with class frequency.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::labels::ClassLabel;
use crate::sample::TrainingSample;

/// Mapping from each observed class to its penalty weight.
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyWeights<L: ClassLabel> {
    weights: BTreeMap<L, f64>,
}

impl<L: ClassLabel> PenaltyWeights<L> {
    pub fn get(&self, label: L) -> Option<f64> {
        self.weights.get(&label).copied()
    }

    /// Classes in canonical order with their weights.
    pub fn iter(&self) -> impl Iterator<Item = (L, f64)> + '_ {
        self.weights.iter().map(|(l, w)| (*l, *w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Serializable view of the weights, as recorded in trained models.
    pub fn to_class_weights(&self) -> Vec<ClassWeight> {
        self.iter()
            .map(|(label, weight)| ClassWeight {
                label: label.name().to_string(),
                ordinal: label.ordinal(),
                weight,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassWeight {
    pub label: String,
    pub ordinal: usize,
    pub weight: f64,
}

pub struct PenaltyCalculator<L: ClassLabel> {
    counts: BTreeMap<L, usize>,
    total: usize,
}

impl<L: ClassLabel> PenaltyCalculator<L> {
    pub fn new<'a, I>(samples: I) -> Self
    where
        I: IntoIterator<Item = &'a TrainingSample<L>>,
    {
        let mut counts = BTreeMap::new();
        let mut total = 0usize;
        for sample in samples {
            *counts.entry(sample.label()).or_insert(0) += 1;
            total += 1;
        }
        Self { counts, total }
    }

    /// Distinct observed labels in canonical (ordinal) order.
    pub fn classes(&self) -> Vec<L> {
        self.counts.keys().copied().collect()
    }

    pub fn count(&self, label: L) -> usize {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// Penalty weight of an observed label, `None` for labels absent from the samples.
    pub fn penalty_weight(&self, label: L) -> Option<f64> {
        let n_label = self.count(label);
        if n_label == 0 {
            return None;
        }
        let n_classes = self.counts.len() as f64;
        Some(self.total as f64 / (n_classes * n_label as f64))
    }

    pub fn weights(&self) -> PenaltyWeights<L> {
        let weights = self
            .counts
            .keys()
            .filter_map(|&label| self.penalty_weight(label).map(|w| (label, w)))
            .collect();
        PenaltyWeights { weights }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::Label;

    fn samples(counts: &[(Label, usize)]) -> Vec<TrainingSample<Label>> {
        counts
            .iter()
            .flat_map(|&(label, n)| {
                (0..n).map(move |i| TrainingSample::new(vec![i as f64], label))
            })
            .collect()
    }

    #[test]
    fn rarer_classes_weigh_more() {
        let data = samples(&[(Label::Title, 5), (Label::Body, 80), (Label::Reference, 15)]);
        let pc = PenaltyCalculator::new(&data);
        let title = pc.penalty_weight(Label::Title).unwrap();
        let body = pc.penalty_weight(Label::Body).unwrap();
        let reference = pc.penalty_weight(Label::Reference).unwrap();
        assert!(title > reference);
        assert!(reference > body);
        assert!(body > 0.0);
    }

    #[test]
    fn classes_follow_declaration_order() {
        let data = samples(&[(Label::Reference, 1), (Label::Title, 1), (Label::Body, 1)]);
        let pc = PenaltyCalculator::new(&data);
        assert_eq!(pc.classes(), vec![Label::Title, Label::Body, Label::Reference]);
    }

    #[test]
    fn weights_ignore_presentation_order() {
        let mut data = samples(&[(Label::Title, 3), (Label::Body, 7), (Label::Footer, 2)]);
        let forward = PenaltyCalculator::new(&data).weights();
        data.reverse();
        let backward = PenaltyCalculator::new(&data).weights();
        assert_eq!(forward, backward);
    }

    #[test]
    fn balanced_classes_get_unit_weight() {
        let data = samples(&[(Label::Title, 4), (Label::Body, 4)]);
        let weights = PenaltyCalculator::new(&data).weights();
        for (_, w) in weights.iter() {
            assert!((w - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn unobserved_label_has_no_weight() {
        let data = samples(&[(Label::Title, 2)]);
        let pc = PenaltyCalculator::new(&data);
        assert_eq!(pc.penalty_weight(Label::Body), None);
        assert_eq!(pc.weights().len(), 1);
    }

    #[test]
    fn monotone_over_many_distributions() {
        // Frequencies 1..=6 over six labels, in several orders.
        let labels = [
            Label::Title,
            Label::Author,
            Label::Abstract,
            Label::Body,
            Label::Reference,
            Label::Footer,
        ];
        for shift in 0..labels.len() {
            let counts: Vec<(Label, usize)> = labels
                .iter()
                .enumerate()
                .map(|(i, &l)| (l, (i + shift) % labels.len() + 1))
                .collect();
            let data = samples(&counts);
            let pc = PenaltyCalculator::new(&data);
            for &(a, fa) in &counts {
                for &(b, fb) in &counts {
                    if fa <= fb {
                        assert!(pc.penalty_weight(a).unwrap() >= pc.penalty_weight(b).unwrap());
                    }
                }
            }
        }
    }
}
