//! Fold partition properties and the cross-validation harness.

use zone_classifiers::config::SvmParameters;
use zone_classifiers::cross_validation::{fold_path, CrossValidationHarness, FoldPartition};
use zone_classifiers::error::ClassifierError;
use zone_classifiers::labels::GeneralLabel;
use zone_classifiers::sample::TrainingSample;
use zone_classifiers::trainer::{ClassifierModel, ClassifierTrainer};

fn sample(x: f64, label: GeneralLabel) -> TrainingSample<GeneralLabel> {
    let y = if label == GeneralLabel::Body { 1.0 } else { 0.0 };
    TrainingSample::new(vec![x, y], label)
}

fn mixed_group(n: usize, offset: usize) -> Vec<TrainingSample<GeneralLabel>> {
    (0..n)
        .map(|i| {
            let label = if i % 3 == 0 {
                GeneralLabel::Metadata
            } else {
                GeneralLabel::Body
            };
            sample((offset + i) as f64 / 100.0, label)
        })
        .collect()
}

fn trainer() -> ClassifierTrainer<GeneralLabel> {
    ClassifierTrainer::new(SvmParameters::default(), vec!["x".into(), "y".into()]).unwrap()
}

#[test]
fn every_sample_is_in_k_minus_one_training_sets() {
    let sizes = [4, 7, 5, 6, 3];
    let mut offset = 0;
    let groups: Vec<_> = sizes
        .iter()
        .map(|&n| {
            let g = mixed_group(n, offset);
            offset += n;
            g
        })
        .collect();
    let partition = FoldPartition::new(groups).unwrap();
    let n: usize = sizes.iter().sum();
    let k = sizes.len();

    for (i, &size) in sizes.iter().enumerate() {
        assert_eq!(partition.training_set(i).len(), n - size);
    }

    for g in 0..k {
        for s in partition.group(g) {
            let memberships = (0..k)
                .filter(|&i| partition.training_set(i).iter().any(|t| std::ptr::eq(*t, s)))
                .count();
            assert_eq!(memberships, k - 1);
        }
    }
}

#[test]
fn harness_writes_one_model_per_fold() {
    let groups = (0..3).map(|i| mixed_group(9, i * 9)).collect();
    let partition = FoldPartition::new(groups).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("zones");

    let trainer = trainer();
    let outcomes = CrossValidationHarness::new(&trainer)
        .run(&partition, &prefix)
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    for (i, outcome) in outcomes.iter().enumerate() {
        assert_eq!(outcome.fold, i);
        assert_eq!(outcome.path, fold_path(&prefix, i));
        assert_eq!(outcome.training_samples, 18);
        assert_eq!(outcome.evaluation.total(), 9);
        assert!(ClassifierModel::<GeneralLabel>::load(&outcome.path).is_ok());
    }

    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["zones-0", "zones-1", "zones-2"]);
}

#[test]
fn failed_fold_keeps_the_other_models() {
    let metadata: Vec<_> = (0..4).map(|i| sample(i as f64, GeneralLabel::Metadata)).collect();
    let body_a: Vec<_> = (0..4).map(|i| sample(i as f64, GeneralLabel::Body)).collect();
    let body_b: Vec<_> = (4..8).map(|i| sample(i as f64, GeneralLabel::Body)).collect();
    // Fold 0 trains on body samples only.
    let partition = FoldPartition::new(vec![metadata, body_a, body_b]).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("zones");

    let trainer = trainer();
    let err = CrossValidationHarness::new(&trainer)
        .run(&partition, &prefix)
        .unwrap_err();

    assert!(matches!(err, ClassifierError::Training(_)));
    assert!(err.to_string().contains("fold 0"));
    assert!(!fold_path(&prefix, 0).exists());
    assert!(fold_path(&prefix, 1).exists());
    assert!(fold_path(&prefix, 2).exists());
}
