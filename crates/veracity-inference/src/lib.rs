//! # veracity-inference
//!
//! Loads the model bundle (a fitted TF-IDF vectorizer plus a pre-trained
//! classifier), runs predictions and resolves them into a `Fake`/`Real` label
//! with a percentage confidence.
//!
//! ```rust
//! use veracity_inference::{resolve, Label};
//!
//! let resolution = resolve(1, &[0.18, 0.82]);
//! assert_eq!(resolution.label, Label::Fake);
//! assert_eq!(resolution.confidence, 82.0);
//! ```

mod bundle;
mod classifier;
mod confidence;
mod error;
mod label;
pub mod pipeline;

pub use bundle::{ARTIFACT_FORMAT_VERSION, ModelBundle};
pub use classifier::{Classifier, LogisticRegression, MultinomialNaiveBayes, Prediction};
pub use confidence::{Resolution, confidence_percent, resolve, round2};
pub use error::ModelError;
pub use label::{LABELS, Label, UnknownLabel, validate_label_mapping};
pub use veracity_pre_processing::{FeatureVector, TfidfVectorizer, VectorizerParams};
