use core::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::ModelError;

/// Veracity label. The discriminant is the class index the classifier was
/// trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Label {
    Real = 0,
    Fake = 1,
}

/// Class-index order fixed by training.
pub const LABELS: [Label; 2] = [Label::Real, Label::Fake];

impl Label {
    /// Index 1 is `Fake`; every other index is `Real`.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        if index == Label::Fake as usize {
            Self::Fake
        } else {
            Self::Real
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Real => "Real",
            Self::Fake => "Fake",
        }
    }

    #[must_use]
    pub fn is_fake(self) -> bool {
        matches!(self, Self::Fake)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown label `{0}`")]
pub struct UnknownLabel(pub String);

impl FromStr for Label {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Real" => Ok(Self::Real),
            "Fake" => Ok(Self::Fake),
            other => Err(UnknownLabel(other.to_owned())),
        }
    }
}

/// Check that a classifier's class count matches the fixed label order.
pub fn validate_label_mapping(num_classes: usize) -> Result<(), ModelError> {
    if num_classes == LABELS.len() {
        Ok(())
    } else {
        Err(ModelError::Configuration(format!(
            "classifier has {num_classes} classes, expected {} ({})",
            LABELS.len(),
            LABELS.map(Label::as_str).join(", ")
        )))
    }
}
