//! Labeling zones with a trained model.
use crate::error::{ClassifierError, Result};
use crate::features::zone::ZoneFeatureBuilder;
use crate::labels::ClassLabel;
use crate::structure::{Document, Page, Zone};
use crate::trainer::ClassifierModel;

/// A feature builder paired with a model trained on the same schema.
pub struct ZoneClassifier<L> {
    builder: ZoneFeatureBuilder,
    model: ClassifierModel<L>,
}

impl<L: ClassLabel> ZoneClassifier<L> {
    /// Fails with a configuration error when the builder's schema differs from the model's.
    pub fn new(builder: ZoneFeatureBuilder, model: ClassifierModel<L>) -> Result<Self> {
        let names = builder.feature_names();
        if names.as_slice() != model.feature_names() {
            return Err(ClassifierError::configuration(format!(
                "feature schema mismatch: builder has [{}], model expects [{}]",
                names.join(", "),
                model.feature_names().join(", ")
            )));
        }
        Ok(Self { builder, model })
    }

    pub fn model(&self) -> &ClassifierModel<L> {
        &self.model
    }

    pub fn classify(&self, zone: &Zone, page: &Page) -> Result<L> {
        let features = self.builder.build(zone, page)?;
        self.model.predict(&features)
    }

    /// Classify every zone of the document in reading order.
    pub fn classify_document(&self, document: &Document) -> Result<Vec<L>> {
        document
            .zones()
            .map(|(page, zone)| self.classify(zone, page))
            .collect()
    }
}
