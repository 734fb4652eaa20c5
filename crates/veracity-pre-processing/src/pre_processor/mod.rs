mod vectorizer;

pub use vectorizer::{FeatureVector, TfidfVectorizer, VectorizerError, VectorizerParams};
