use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use zone_classifiers::cross_validation::{CrossValidationHarness, FoldPartition};
use zone_classifiers::features::zone::{
    initial_zone_features, zone_features_with_fonts, ZoneFeatureBuilder,
};
use zone_classifiers::io::corpus::load_corpus;
use zone_classifiers::io::samples::read_samples;
use zone_classifiers::labels::{GeneralLabel, Label};
use zone_classifiers::sample::{zone_training_samples, TrainingSample};
use zone_classifiers::trainer::ClassifierTrainer;

use crate::options::TrainOptions;

/// Run a single training or a cross-validation and return the written model paths.
pub fn run(options: &TrainOptions) -> Result<Vec<PathBuf>> {
    log::info!(
        "[ZoneCli::Train] Effective configuration:\n{}",
        serde_json::to_string_pretty(options)?
    );

    let builder = match &options.fonts {
        Some(path) => zone_features_with_fonts(read_known_fonts(path)?),
        None => initial_zone_features(),
    };
    let trainer = ClassifierTrainer::<GeneralLabel>::new(options.svm.clone(), builder.feature_names())?;

    if options.cross {
        run_cross_validation(options, &builder, &trainer)
    } else {
        run_single(options, &builder, &trainer)
    }
}

fn run_single(
    options: &TrainOptions,
    builder: &ZoneFeatureBuilder,
    trainer: &ClassifierTrainer<GeneralLabel>,
) -> Result<Vec<PathBuf>> {
    let samples = load_samples(&options.input, &options.extension, builder)?;
    let model = trainer
        .train_balanced(&samples)
        .context("Training the zone classifier failed")?;
    model.save(&options.output)?;
    Ok(vec![options.output.clone()])
}

fn run_cross_validation(
    options: &TrainOptions,
    builder: &ZoneFeatureBuilder,
    trainer: &ClassifierTrainer<GeneralLabel>,
) -> Result<Vec<PathBuf>> {
    let groups = (0..options.folds)
        .map(|i| load_samples(&options.input.join(i.to_string()), &options.extension, builder))
        .collect::<Result<Vec<_>>>()?;
    let partition = FoldPartition::new(groups)?;

    let outcomes = CrossValidationHarness::new(trainer).run(&partition, &options.output)?;
    Ok(outcomes.into_iter().map(|o| o.path).collect())
}

/// Samples from a directory of documents or a samples file, coarsened to general labels.
pub fn load_samples(
    path: &Path,
    extension: &str,
    builder: &ZoneFeatureBuilder,
) -> Result<Vec<TrainingSample<GeneralLabel>>> {
    let samples = if path.is_dir() {
        let documents = load_corpus(path, extension)?;
        zone_training_samples(&documents, builder, Label::general)
            .with_context(|| format!("Failed to featurize documents in {}", path.display()))?
    } else if path.is_file() {
        read_samples::<Label, _>(path, builder.len())?
            .into_iter()
            .map(|s| s.map_label(Label::general))
            .collect()
    } else {
        bail!("Input {} does not exist", path.display());
    };

    log::info!(
        "[ZoneCli::Train] {} training samples from {}",
        samples.len(),
        path.display()
    );
    Ok(samples)
}

/// One font name per line, most frequent first. Blank lines and `#` comments are ignored.
pub fn read_known_fonts(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read font list: {}", path.display()))?;
    let fonts: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect();
    log::debug!("[ZoneCli::Train] {} known fonts", fonts.len());
    Ok(fonts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_list_skips_comments_and_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fonts.txt");
        fs::write(&path, "# by frequency\nTimes-Roman\n\n  Helvetica  \n").unwrap();
        assert_eq!(
            read_known_fonts(&path).unwrap(),
            vec!["Times-Roman".to_string(), "Helvetica".to_string()]
        );
    }

    #[test]
    fn samples_file_labels_are_coarsened() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.svm");
        // TITLE, BODY_TABLE, REFERENCE
        fs::write(&path, "0 1:1\n13 2:1\n17 3:1\n").unwrap();
        let samples = load_samples(&path, "cermstr", &initial_zone_features()).unwrap();
        let labels: Vec<_> = samples.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec![GeneralLabel::Metadata, GeneralLabel::Body, GeneralLabel::References]
        );
    }

    #[test]
    fn missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_samples(&dir.path().join("nope"), "cermstr", &initial_zone_features()).is_err());
    }
}
