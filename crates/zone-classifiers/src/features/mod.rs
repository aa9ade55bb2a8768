//! Pluggable feature extraction.
//!
//! A `FeatureVectorBuilder` holds an ordered list of independent
//! `FeatureCalculator`s. The order is the feature schema: a model trained
//! with one schema cannot be used with vectors built from another.
pub mod zone;

use crate::error::Result;

/// A named, pure function of an object and its context.
pub trait FeatureCalculator<T, C>: Send + Sync {
    fn name(&self) -> &str;

    fn calculate(&self, object: &T, context: &C) -> Result<f64>;
}

/// Adapts a plain function into a `FeatureCalculator`.
pub struct FnFeature<T, C> {
    name: &'static str,
    func: fn(&T, &C) -> Result<f64>,
}

impl<T, C> FnFeature<T, C> {
    pub fn new(name: &'static str, func: fn(&T, &C) -> Result<f64>) -> Self {
        Self { name, func }
    }
}

impl<T, C> FeatureCalculator<T, C> for FnFeature<T, C> {
    fn name(&self) -> &str {
        self.name
    }

    fn calculate(&self, object: &T, context: &C) -> Result<f64> {
        (self.func)(object, context)
    }
}

pub struct FeatureVectorBuilder<T, C> {
    calculators: Vec<Box<dyn FeatureCalculator<T, C>>>,
}

impl<T, C> Default for FeatureVectorBuilder<T, C> {
    fn default() -> Self {
        Self {
            calculators: Vec::new(),
        }
    }
}

impl<T, C> FeatureVectorBuilder<T, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, calculator: impl FeatureCalculator<T, C> + 'static) -> Self {
        self.push(calculator);
        self
    }

    pub fn push(&mut self, calculator: impl FeatureCalculator<T, C> + 'static) {
        self.calculators.push(Box::new(calculator));
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }

    /// Feature names in schema order.
    pub fn feature_names(&self) -> Vec<String> {
        self.calculators.iter().map(|c| c.name().to_string()).collect()
    }

    /// Compute one value per registered calculator, in registration order.
    pub fn build(&self, object: &T, context: &C) -> Result<Vec<f64>> {
        self.calculators
            .iter()
            .map(|c| c.calculate(object, context))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClassifierError;

    struct Constant(&'static str, f64);

    impl FeatureCalculator<String, ()> for Constant {
        fn name(&self) -> &str {
            self.0
        }

        fn calculate(&self, _object: &String, _context: &()) -> Result<f64> {
            Ok(self.1)
        }
    }

    fn text_length(object: &String, _context: &()) -> Result<f64> {
        Ok(object.len() as f64)
    }

    fn always_fails(_object: &String, _context: &()) -> Result<f64> {
        Err(ClassifierError::feature("broken", "missing statistic"))
    }

    #[test]
    fn build_follows_registration_order() {
        let builder = FeatureVectorBuilder::new()
            .with(Constant("one", 1.0))
            .with(FnFeature::new("length", text_length))
            .with(Constant("three", 3.0));

        assert_eq!(builder.len(), 3);
        assert_eq!(builder.feature_names(), vec!["one", "length", "three"]);
        assert_eq!(
            builder.build(&"abcd".to_string(), &()).unwrap(),
            vec![1.0, 4.0, 3.0]
        );
    }

    #[test]
    fn failing_calculator_fails_the_vector() {
        let builder = FeatureVectorBuilder::new()
            .with(Constant("one", 1.0))
            .with(FnFeature::new("broken", always_fails));
        let err = builder.build(&String::new(), &()).unwrap_err();
        assert!(matches!(err, ClassifierError::FeatureComputation { .. }));
    }
}
