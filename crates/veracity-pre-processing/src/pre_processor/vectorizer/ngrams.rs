use ahash::AHashMap as HashMap;
use dashmap::DashMap;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

/// Space-joined word n-gram, e.g. `"breaking news"`.
pub type NgramKey = String;

pub fn count_ngrams(tokens: &[String], ngram_range: (usize, usize)) -> HashMap<NgramKey, usize> {
    let mut ngram_counter = HashMap::new();

    for n in ngram_range.0..=ngram_range.1 {
        for window in tokens.windows(n) {
            *ngram_counter.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    ngram_counter
}

/// Number of documents each n-gram occurs in, given per-document counts.
pub fn document_frequency(
    counts: &[HashMap<NgramKey, usize>],
) -> DashMap<NgramKey, usize, ahash::RandomState> {
    let df = DashMap::with_hasher(ahash::RandomState::default());

    counts.par_iter().progress().for_each(|document| {
        for ngram in document.keys() {
            *df.entry(ngram.clone()).or_insert(0usize) += 1;
        }
    });
    df
}
