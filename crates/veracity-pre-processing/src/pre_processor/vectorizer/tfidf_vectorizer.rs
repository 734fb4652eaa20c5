use ahash::HashMap;
use sprs::{CsMat, CsVec};
use tracing::debug;

use super::{count_vectorizer::CountVectorizer, error::VectorizerError, params::VectorizerParams};

/// Sparse TF-IDF row for a single text, `num_features()` wide.
pub type FeatureVector = CsVec<f64>;

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct TfidfVectorizer {
    count_vectorizer: CountVectorizer,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit<T: AsRef<str> + Sync>(
        texts: &[T],
        count_vectorizer_params: VectorizerParams,
    ) -> Self {
        debug!(num_texts = texts.len(), "Fitting TfidfVectorizer");
        let (count_vectorizer, tf_matrix) =
            CountVectorizer::fit_transform(texts, count_vectorizer_params);
        debug!("Calculating IDF values");

        // Smooth IDF: ln((n_docs + 1) / (df + 1)) + 1
        let n_docs = texts.len() as f64;
        let num_features = count_vectorizer.num_features();

        let mut df = vec![0usize; num_features];

        for row_vec in tf_matrix.outer_iterator() {
            for (col_idx, _val) in row_vec.iter() {
                df[col_idx] += 1;
            }
        }
        let idf = df
            .iter()
            .map(|&doc_freq| ((n_docs + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0)
            .collect();
        debug!("IDF calculation complete");

        Self {
            count_vectorizer,
            idf,
        }
    }

    /// Rebuild a vectorizer from an already-fitted vocabulary and its IDF weights.
    ///
    /// Indices must cover `0..vocabulary.len()` exactly once and `idf[i]` is the
    /// weight of the term at index `i`.
    pub fn from_parts(
        params: VectorizerParams,
        vocabulary: impl IntoIterator<Item = (String, usize)>,
        idf: Vec<f64>,
    ) -> Result<Self, VectorizerError> {
        let vocab = vocabulary.into_iter().collect::<HashMap<String, usize>>();
        let vectorizer = Self {
            count_vectorizer: CountVectorizer::from_vocabulary(params, vocab),
            idf,
        };
        vectorizer.validate()?;
        Ok(vectorizer)
    }

    /// Internal consistency: usable params, one positive finite IDF weight per
    /// term, and vocabulary indices covering `0..num_features()` exactly once.
    ///
    /// A vectorizer that passes never panics in [`Self::transform`].
    pub fn validate(&self) -> Result<(), VectorizerError> {
        self.params().validate()?;

        let vocab = self.vocabulary();
        if vocab.len() != self.idf.len() {
            return Err(VectorizerError::IdfLengthMismatch {
                vocab: vocab.len(),
                idf: self.idf.len(),
            });
        }
        if let Some(index) = self.idf.iter().position(|w| !(w.is_finite() && *w > 0.0)) {
            return Err(VectorizerError::InvalidIdf(index));
        }

        let mut seen = vec![false; vocab.len()];
        for &index in vocab.values() {
            let slot = seen.get_mut(index).ok_or(VectorizerError::IndexOutOfRange {
                index,
                vocab: vocab.len(),
            })?;
            if *slot {
                return Err(VectorizerError::DuplicateIndex(index));
            }
            *slot = true;
        }
        Ok(())
    }

    /// One TF-IDF row per text. Rows are L2-normalised; a text with no
    /// in-vocabulary n-grams yields an all-zero row.
    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using TfidfVectorizer"
        );
        let mut tf_matrix = self.count_vectorizer.transform(texts);
        let sublinear = self.count_vectorizer.params().sublinear_tf();

        for mut row_vec in tf_matrix.outer_iterator_mut() {
            for (col_idx, val) in row_vec.iter_mut() {
                if sublinear {
                    *val = 1.0 + val.ln();
                }
                *val *= self.idf[col_idx];
            }
            let norm = row_vec.iter().map(|(_, &v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, val) in row_vec.iter_mut() {
                    *val /= norm;
                }
            }
        }
        tf_matrix
    }

    /// Feature vector for a single text.
    pub fn extract(&self, text: &str) -> FeatureVector {
        let (_, indices, data) = self.transform(&[text]).into_raw_storage();
        CsVec::new(self.num_features(), indices, data)
    }

    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        count_vectorizer_params: VectorizerParams,
    ) -> (Self, CsMat<f64>) {
        let vectorizer = Self::fit(texts, count_vectorizer_params);
        let transformed = vectorizer.transform(texts);
        (vectorizer, transformed)
    }

    pub fn num_features(&self) -> usize {
        self.count_vectorizer.num_features()
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        self.count_vectorizer.vocabulary()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn params(&self) -> &VectorizerParams {
        self.count_vectorizer.params()
    }
}

#[cfg(feature = "bincode")]
impl TfidfVectorizer {
    pub fn to_bytes(&self) -> Result<Vec<u8>, VectorizerError> {
        Ok(bincode::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VectorizerError> {
        let (vectorizer, _) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(vectorizer)
    }
}
