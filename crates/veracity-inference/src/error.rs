use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading, validating or persisting a model bundle.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model artifact from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write model artifact to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model artifact is corrupt")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("failed to encode model artifact")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("unsupported model artifact format {found}, expected {expected}")]
    UnsupportedFormat { found: u32, expected: u32 },

    #[error("model configuration error: {0}")]
    Configuration(String),
}

impl ModelError {
    /// The bundle is structurally loadable but inconsistent with itself.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// The bundle could not be obtained at all.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Decode(_) | Self::UnsupportedFormat { .. }
        )
    }
}
