//! Labeled feature vectors and their extraction from segmented documents.
use crate::error::{ClassifierError, Result};
use crate::features::zone::ZoneFeatureBuilder;
use crate::labels::{ClassLabel, Label};
use crate::structure::Document;

/// An immutable (feature vector, label) pair.
///
/// Samples have no value equality: two samples with the same vector and
/// label are still distinct training points.
#[derive(Debug, Clone)]
pub struct TrainingSample<L> {
    features: Vec<f64>,
    label: L,
}

impl<L: ClassLabel> TrainingSample<L> {
    pub fn new(features: Vec<f64>, label: L) -> Self {
        Self { features, label }
    }

    pub fn features(&self) -> &[f64] {
        &self.features
    }

    pub fn label(&self) -> L {
        self.label
    }

    /// Relabel the sample, e.g. to coarsen a fine label into its general one.
    pub fn map_label<M: ClassLabel>(self, f: impl FnOnce(L) -> M) -> TrainingSample<M> {
        TrainingSample {
            features: self.features,
            label: f(self.label),
        }
    }
}

/// Featurize every labeled zone of the documents.
///
/// Zones without a label are skipped. A feature failure aborts the whole
/// conversion; the error names the document, page and zone.
pub fn zone_training_samples<'a, I, L, F>(
    documents: I,
    builder: &ZoneFeatureBuilder,
    label_map: F,
) -> Result<Vec<TrainingSample<L>>>
where
    I: IntoIterator<Item = &'a Document>,
    L: ClassLabel,
    F: Fn(Label) -> L,
{
    let mut samples = Vec::new();
    let mut unlabeled = 0usize;

    for (doc_idx, document) in documents.into_iter().enumerate() {
        for (page, zone) in document.zones() {
            let label = match zone.label {
                Some(label) => label,
                None => {
                    unlabeled += 1;
                    continue;
                }
            };

            let features = builder.build(zone, page).map_err(|e| {
                let doc = document
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("#{}", doc_idx));
                log::error!(
                    "[ZoneClassifier::Features] Document {} page {}: {}",
                    doc,
                    page.number,
                    e
                );
                match e {
                    ClassifierError::FeatureComputation { feature, reason } => {
                        ClassifierError::FeatureComputation {
                            feature,
                            reason: format!("{} (document {}, page {})", reason, doc, page.number),
                        }
                    }
                    other => other,
                }
            })?;

            samples.push(TrainingSample::new(features, label_map(label)));
        }
    }

    if unlabeled > 0 {
        log::debug!(
            "[ZoneClassifier::Features] Skipped {} unlabeled zones",
            unlabeled
        );
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::zone::initial_zone_features;
    use crate::labels::GeneralLabel;
    use crate::structure::{BoundingBox, Line, Page, Zone};

    fn zone(label: Option<Label>, text: &str) -> Zone {
        Zone::new(
            label,
            BoundingBox::new(10.0, 10.0, 100.0, 20.0),
            vec![Line {
                text: text.to_string(),
                bounds: BoundingBox::new(10.0, 10.0, 100.0, 10.0),
                font_name: Some("Times".to_string()),
                font_size: Some(10.0),
            }],
        )
    }

    fn document(zones: Vec<Zone>) -> Document {
        let mut doc = Document::new(vec![Page::new(
            0,
            BoundingBox::new(0.0, 0.0, 600.0, 800.0),
            zones,
        )]);
        doc.resolve_statistics();
        doc
    }

    #[test]
    fn labeled_zones_become_samples() {
        let doc = document(vec![
            zone(Some(Label::Title), "A Title"),
            zone(None, "stray"),
            zone(Some(Label::Reference), "[1] Ref"),
        ]);
        let builder = initial_zone_features();
        let samples = zone_training_samples([&doc], &builder, |l| l).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].label(), Label::Title);
        assert_eq!(samples[1].label(), Label::Reference);
        assert!(samples.iter().all(|s| s.features().len() == builder.len()));
    }

    #[test]
    fn label_map_coarsens() {
        let doc = document(vec![zone(Some(Label::Author), "Jane Doe")]);
        let samples =
            zone_training_samples([&doc], &initial_zone_features(), Label::general).unwrap();
        assert_eq!(samples[0].label(), GeneralLabel::Metadata);
    }

    #[test]
    fn unresolved_page_aborts_conversion() {
        let mut doc = document(vec![zone(Some(Label::Body), "text")]);
        doc.pages[0].statistics = None;
        let err = zone_training_samples([&doc], &initial_zone_features(), |l| l).unwrap_err();
        assert!(matches!(err, ClassifierError::FeatureComputation { .. }));
    }

    #[test]
    fn map_label_keeps_features() {
        let sample = TrainingSample::new(vec![1.0, 2.0], Label::BodyTable);
        let general = sample.map_label(Label::general);
        assert_eq!(general.label(), GeneralLabel::Body);
        assert_eq!(general.features(), &[1.0, 2.0]);
    }
}
