use ahash::{AHashMap, HashMap};
use sprs::CsMat;
use tracing::debug;

use super::{
    ngrams::{self, NgramKey},
    params::VectorizerParams,
    tokenizer,
};

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct CountVectorizer {
    params: VectorizerParams,
    /// N-gram to column index, dense in `0..vocab.len()`.
    vocab: HashMap<NgramKey, usize>,
}

impl CountVectorizer {
    pub(super) fn from_vocabulary(params: VectorizerParams, vocab: HashMap<NgramKey, usize>) -> Self {
        Self { params, vocab }
    }

    /// Keep the n-grams whose document frequency falls inside the configured
    /// window and number them in lexical order.
    fn from_document_frequency(
        document_frequency: impl IntoIterator<Item = (NgramKey, usize)>,
        n_docs: usize,
        params: VectorizerParams,
    ) -> Self {
        let (lower, upper) = params.document_count_bounds(n_docs);
        let mut seen = 0usize;
        let mut kept = document_frequency
            .into_iter()
            .inspect(|_| seen += 1)
            .filter_map(|(ngram, df)| (lower..=upper).contains(&(df as f64)).then_some(ngram))
            .collect::<Vec<_>>();
        kept.sort_unstable();
        debug!(seen, kept = kept.len(), lower, upper, "Vocabulary filtered by document frequency");

        let vocab = kept
            .into_iter()
            .enumerate()
            .map(|(index, ngram)| (ngram, index))
            .collect::<HashMap<_, _>>();
        Self { params, vocab }
    }

    fn count_documents<T: AsRef<str> + Sync>(&self, texts: &[T]) -> Vec<AHashMap<NgramKey, usize>> {
        count_all(texts, self.params.ngram_range())
    }

    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(documents = texts.len(), "Counting n-grams");
        let counts = self.count_documents(texts);
        self.counts_to_matrix(&counts)
    }

    /// One CSR row per document. N-grams outside the vocabulary are dropped.
    fn counts_to_matrix(&self, counts: &[AHashMap<NgramKey, usize>]) -> CsMat<f64> {
        let mut indptr = Vec::with_capacity(counts.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for document in counts {
            let mut row = document
                .iter()
                .filter_map(|(ngram, &count)| self.vocab.get(ngram).map(|&col| (col, count as f64)))
                .collect::<Vec<_>>();
            row.sort_unstable_by_key(|&(col, _)| col);
            let (cols, values): (Vec<_>, Vec<_>) = row.into_iter().unzip();
            indices.extend(cols);
            data.extend(values);
            indptr.push(indices.len());
        }

        debug!(rows = counts.len(), non_zero = data.len(), "Count matrix built");
        CsMat::new((counts.len(), self.num_features()), indptr, indices, data)
    }

    /// Fit on `texts` and return their count matrix, tokenizing the corpus once.
    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        params: VectorizerParams,
    ) -> (Self, CsMat<f64>) {
        debug!(documents = texts.len(), "Fitting count vectorizer");
        let counts = count_all(texts, params.ngram_range());
        let document_frequency = ngrams::document_frequency(&counts);
        let vectorizer = Self::from_document_frequency(document_frequency, counts.len(), params);
        let matrix = vectorizer.counts_to_matrix(&counts);
        (vectorizer, matrix)
    }

    pub fn num_features(&self) -> usize {
        self.vocab.len()
    }

    pub fn vocabulary(&self) -> &HashMap<NgramKey, usize> {
        &self.vocab
    }

    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }
}

fn count_all<T: AsRef<str> + Sync>(texts: &[T], ngram_range: (usize, usize)) -> Vec<AHashMap<NgramKey, usize>> {
    tokenizer::tokenize(texts)
        .iter()
        .map(|tokens| ngrams::count_ngrams(tokens, ngram_range))
        .collect()
}
