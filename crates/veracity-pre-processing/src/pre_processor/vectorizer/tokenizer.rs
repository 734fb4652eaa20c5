use std::{borrow::Cow, sync::LazyLock};

use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use regex::Regex;
use tracing::debug;

/// Minimum number of texts to consider parallelization
const MIN_TEXTS_FOR_PARALLEL: usize = 100;

/// Minimum total character count to consider parallelization
const MIN_CHARS_FOR_PARALLEL: usize = 10_000;

/// Words of two or more word characters, matching the default token pattern
/// of the vectorizers the bundled models are exported from.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"));

fn progress_bar_setup(len: usize, message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message);
    pb
}

/// Lowercase `text` and split it into word tokens.
pub fn tokenize_one(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_owned())
        .collect()
}

fn tokenize_texts_par<T: AsRef<str> + Sync>(texts: &[T]) -> Vec<Vec<String>> {
    debug!(num_texts = texts.len(), "Using parallel tokenization");
    let pb = progress_bar_setup(texts.len(), "Tokenizing texts in parallel");
    let result = texts
        .par_iter()
        .progress_with(pb.clone())
        .map(|text| tokenize_one(text.as_ref()))
        .collect();
    pb.finish_with_message("Parallel tokenization complete");
    result
}

fn tokenize_texts<T: AsRef<str>>(texts: &[T]) -> Vec<Vec<String>> {
    debug!(num_texts = texts.len(), "Using sequential tokenization");
    texts.iter().map(|text| tokenize_one(text.as_ref())).collect()
}

/// Parallelize when there are many texts or the total workload is large.
#[inline]
fn should_use_parallel<T: AsRef<str>>(texts: &[T]) -> bool {
    let num_texts = texts.len();

    if num_texts >= MIN_TEXTS_FOR_PARALLEL {
        return true;
    }

    let total_chars: usize = texts.iter().map(|s| s.as_ref().len()).sum();
    total_chars >= MIN_CHARS_FOR_PARALLEL
}

pub fn tokenize<T: AsRef<str> + Sync>(texts: &[T]) -> Vec<Vec<String>> {
    if should_use_parallel(texts) {
        tokenize_texts_par(texts)
    } else {
        tokenize_texts(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_drops_single_characters() {
        let tokens = tokenize_one("A Senator said: I WILL resign!");
        assert_eq!(tokens, vec!["senator", "said", "will", "resign"]);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(tokenize_one("").is_empty());
        assert!(tokenize_one("  ? ! a ").is_empty());
    }

    #[test]
    fn unicode_words_are_kept() {
        assert_eq!(tokenize_one("Café crème"), vec!["café", "crème"]);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let texts: Vec<String> = (0..150).map(|i| format!("story number {i} breaking")).collect();
        assert!(should_use_parallel(&texts));
        assert_eq!(tokenize_texts_par(&texts), tokenize_texts(&texts));
    }
}
