mod count_vectorizer;
mod error;
mod ngrams;
mod params;
mod tfidf_vectorizer;
mod tokenizer;

pub use error::VectorizerError;
pub use params::VectorizerParams;
pub use tfidf_vectorizer::{FeatureVector, TfidfVectorizer};
