use std::ops::RangeInclusive;

use super::error::VectorizerError;

/// Fitting and weighting options for [`super::TfidfVectorizer`].
///
/// Document-frequency cut-offs below 1.0 are fractions of the corpus, values
/// at or above 1.0 are document counts (`max_df == 1.0` means "all documents").
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VectorizerParams {
    /// Smallest and largest word n-gram length, both inclusive.
    ngram_range: (usize, usize),
    min_df: f64,
    max_df: f64,
    /// Weight term counts as `1 + ln(tf)`.
    sublinear_tf: bool,
}

impl VectorizerParams {
    pub fn new(
        ngram_range: impl Into<RangeInclusive<usize>>,
        min_df: f64,
        max_df: f64,
        sublinear_tf: bool,
    ) -> Self {
        let params = Self {
            ngram_range: ngram_range.into().into_inner(),
            min_df,
            max_df,
            sublinear_tf,
        };
        if let Err(err) = params.validate() {
            panic!("{err}");
        }
        params
    }

    /// Checks that hold for any usable parameter set, including ones decoded
    /// from an artifact.
    pub fn validate(&self) -> Result<(), VectorizerError> {
        let (shortest, longest) = self.ngram_range;
        if shortest == 0 {
            return Err(VectorizerError::InvalidParams(
                "ngram_range cannot include zero-length grams".to_string(),
            ));
        }
        if shortest > longest {
            return Err(VectorizerError::InvalidParams(format!(
                "ngram_range is empty: {shortest}..={longest}"
            )));
        }
        for (name, value) in [("min_df", self.min_df), ("max_df", self.max_df)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(VectorizerError::InvalidParams(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn ngram_range(&self) -> (usize, usize) {
        self.ngram_range
    }

    #[must_use]
    pub fn min_df(&self) -> f64 {
        self.min_df
    }

    #[must_use]
    pub fn max_df(&self) -> f64 {
        self.max_df
    }

    #[must_use]
    pub fn sublinear_tf(&self) -> bool {
        self.sublinear_tf
    }

    /// Inclusive document-count window a term must fall in to enter the vocabulary.
    #[must_use]
    pub fn document_count_bounds(&self, n_docs: usize) -> (f64, f64) {
        let corpus = n_docs as f64;
        let lower = if self.min_df < 1.0 { self.min_df * corpus } else { self.min_df };
        let upper = if self.max_df <= 1.0 { self.max_df * corpus } else { self.max_df };
        (lower, upper)
    }
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            ngram_range: (1, 1),
            min_df: 1.0,
            max_df: 1.0,
            sublinear_tf: false,
        }
    }
}
