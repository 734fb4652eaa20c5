//! Text pre-processing for veracity.
//!
//! Turns raw text into fixed-width TF-IDF feature vectors using a vocabulary
//! fitted once at model-build time.

pub mod pre_processor;

pub use pre_processor::{FeatureVector, TfidfVectorizer, VectorizerError, VectorizerParams};
