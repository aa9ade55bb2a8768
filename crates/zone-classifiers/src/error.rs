use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while building features, training, or persisting zone classifiers.
#[derive(Debug)]
pub enum ClassifierError {
    /// Invalid or missing configuration, detected before any training work starts.
    Configuration(String),
    /// A feature calculator could not produce a value for a zone.
    FeatureComputation { feature: String, reason: String },
    /// The solver rejected the training data or parameters.
    Training(String),
    ModelNotFound(PathBuf),
    ModelFormat { path: PathBuf, reason: String },
    /// Feature vector length does not match the model's feature schema.
    DimensionMismatch { expected: usize, found: usize },
    /// A corpus document or samples file is malformed.
    Corpus { path: PathBuf, reason: String },
    Io { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, ClassifierError>;

impl ClassifierError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        ClassifierError::Configuration(msg.into())
    }

    pub fn training(msg: impl Into<String>) -> Self {
        ClassifierError::Training(msg.into())
    }

    pub fn feature(feature: impl Into<String>, reason: impl Into<String>) -> Self {
        ClassifierError::FeatureComputation {
            feature: feature.into(),
            reason: reason.into(),
        }
    }

    pub fn corpus(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ClassifierError::Corpus {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ClassifierError::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ClassifierError::Configuration(msg) => write!(f, "Invalid configuration: {}", msg),
            ClassifierError::FeatureComputation { feature, reason } => {
                write!(f, "Failed to compute feature '{}': {}", feature, reason)
            }
            ClassifierError::Training(msg) => write!(f, "Training failed: {}", msg),
            ClassifierError::ModelNotFound(path) => {
                write!(f, "Model file not found: {}", path.display())
            }
            ClassifierError::ModelFormat { path, reason } => {
                write!(f, "Malformed model file {}: {}", path.display(), reason)
            }
            ClassifierError::DimensionMismatch { expected, found } => write!(
                f,
                "Feature vector has {} values but the model expects {}",
                found, expected
            ),
            ClassifierError::Corpus { path, reason } => {
                write!(f, "Malformed input {}: {}", path.display(), reason)
            }
            ClassifierError::Io { path, source } => {
                write!(f, "I/O error on {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for ClassifierError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClassifierError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
