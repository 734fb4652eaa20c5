use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorizerError {
    #[error("vocabulary has {vocab} entries but {idf} idf weights were supplied")]
    IdfLengthMismatch { vocab: usize, idf: usize },

    #[error("vocabulary index {index} is out of range for {vocab} features")]
    IndexOutOfRange { index: usize, vocab: usize },

    #[error("vocabulary index {0} is assigned to more than one term")]
    DuplicateIndex(usize),

    #[error("idf weight at index {0} is not a positive finite number")]
    InvalidIdf(usize),

    #[error("invalid vectorizer parameters: {0}")]
    InvalidParams(String),

    #[cfg(feature = "bincode")]
    #[error("failed to encode vectorizer")]
    Encode(#[from] bincode::error::EncodeError),

    #[cfg(feature = "bincode")]
    #[error("failed to decode vectorizer")]
    Decode(#[from] bincode::error::DecodeError),
}
