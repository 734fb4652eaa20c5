use core::fmt;

use sprs::CsMat;
use veracity_pre_processing::FeatureVector;

use crate::ModelError;

/// Winning class index and the per-class probability distribution, ordered
/// by class index.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    label_index: usize,
    probabilities: Vec<f64>,
}

impl Prediction {
    /// Build a prediction from a probability distribution. The label is the
    /// most probable class; ties go to the lowest index.
    #[must_use]
    pub fn from_probabilities(probabilities: Vec<f64>) -> Self {
        debug_assert!(
            (probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-6,
            "Probabilities must sum to 1.0"
        );
        Self {
            label_index: argmax(&probabilities),
            probabilities,
        }
    }

    #[must_use]
    pub fn label_index(&self) -> usize {
        self.label_index
    }

    #[must_use]
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class={} P=[", self.label_index)?;
        for (i, p) in self.probabilities.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{p:.3}")?;
        }
        f.write_str("]")
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = idx;
        }
    }
    best
}

/// Binary logistic regression: P(class 1) = sigmoid(coef · x + intercept).
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode, serde::Serialize, serde::Deserialize)]
pub struct LogisticRegression {
    coef: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    #[must_use]
    pub fn new(coef: Vec<f64>, intercept: f64) -> Self {
        Self { coef, intercept }
    }

    fn decision<I: Iterator<Item = (usize, f64)>>(&self, features: I) -> f64 {
        features
            .map(|(j, v)| v * self.coef.get(j).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.intercept
    }

    fn predict_entries<I: Iterator<Item = (usize, f64)>>(&self, features: I) -> Prediction {
        let positive = sigmoid(self.decision(features));
        Prediction::from_probabilities(vec![1.0 - positive, positive])
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn ensure_finite<'a>(model: &str, weights: impl Iterator<Item = &'a f64>) -> Result<(), ModelError> {
    match weights.copied().find(|w| !w.is_finite()) {
        Some(weight) => Err(ModelError::Configuration(format!(
            "{model} has a non-finite weight ({weight})"
        ))),
        None => Ok(()),
    }
}

/// Multinomial naive Bayes over TF-IDF weights.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode, serde::Serialize, serde::Deserialize)]
pub struct MultinomialNaiveBayes {
    class_log_prior: Vec<f64>,
    /// One row per class, one column per feature.
    feature_log_prob: Vec<Vec<f64>>,
}

impl MultinomialNaiveBayes {
    pub fn new(class_log_prior: Vec<f64>, feature_log_prob: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        let model = Self {
            class_log_prior,
            feature_log_prob,
        };
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.class_log_prior.len() != self.feature_log_prob.len() {
            return Err(ModelError::Configuration(format!(
                "naive Bayes has {} class priors but {} feature rows",
                self.class_log_prior.len(),
                self.feature_log_prob.len()
            )));
        }
        let width = self.num_features();
        if let Some(row) = self.feature_log_prob.iter().find(|row| row.len() != width) {
            return Err(ModelError::Configuration(format!(
                "naive Bayes feature rows differ in width ({} vs {width})",
                row.len()
            )));
        }
        ensure_finite(
            "naive Bayes",
            self.class_log_prior.iter().chain(self.feature_log_prob.iter().flatten()),
        )
    }

    fn num_features(&self) -> usize {
        self.feature_log_prob.first().map_or(0, Vec::len)
    }

    fn predict_entries<I: Iterator<Item = (usize, f64)>>(&self, features: I) -> Prediction {
        let features = features.collect::<Vec<_>>();
        let joint = self
            .class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, row)| {
                prior
                    + features
                        .iter()
                        .map(|&(j, v)| v * row.get(j).copied().unwrap_or(0.0))
                        .sum::<f64>()
            })
            .collect::<Vec<_>>();

        let max = joint.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let log_norm = max + joint.iter().map(|l| (l - max).exp()).sum::<f64>().ln();
        Prediction::from_probabilities(joint.iter().map(|l| (l - log_norm).exp()).collect())
    }
}

/// Pre-trained decision function over TF-IDF feature vectors.
#[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode, serde::Serialize, serde::Deserialize)]
pub enum Classifier {
    LogisticRegression(LogisticRegression),
    MultinomialNaiveBayes(MultinomialNaiveBayes),
}

impl Classifier {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression(_) => "logistic-regression",
            Self::MultinomialNaiveBayes(_) => "multinomial-naive-bayes",
        }
    }

    /// Input dimensionality the classifier was trained on.
    #[must_use]
    pub fn num_features(&self) -> usize {
        match self {
            Self::LogisticRegression(model) => model.coef.len(),
            Self::MultinomialNaiveBayes(model) => model.num_features(),
        }
    }

    #[must_use]
    pub fn num_classes(&self) -> usize {
        match self {
            Self::LogisticRegression(_) => 2,
            Self::MultinomialNaiveBayes(model) => model.class_log_prior.len(),
        }
    }

    /// Internal consistency of the trained parameters. Every weight must be finite.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            Self::LogisticRegression(model) => {
                ensure_finite("logistic regression", model.coef.iter().chain([&model.intercept]))
            }
            Self::MultinomialNaiveBayes(model) => model.validate(),
        }
    }

    #[must_use]
    pub fn predict(&self, features: &FeatureVector) -> Prediction {
        self.predict_entries(features.iter().map(|(j, &v)| (j, v)))
    }

    /// One prediction per row of `features`.
    #[must_use]
    pub fn predict_batch(&self, features: &CsMat<f64>) -> Vec<Prediction> {
        features
            .outer_iterator()
            .map(|row| self.predict_entries(row.iter().map(|(j, &v)| (j, v))))
            .collect()
    }

    fn predict_entries<I: Iterator<Item = (usize, f64)>>(&self, features: I) -> Prediction {
        match self {
            Self::LogisticRegression(model) => model.predict_entries(features),
            Self::MultinomialNaiveBayes(model) => model.predict_entries(features),
        }
    }
}

impl From<LogisticRegression> for Classifier {
    fn from(model: LogisticRegression) -> Self {
        Self::LogisticRegression(model)
    }
}

impl From<MultinomialNaiveBayes> for Classifier {
    fn from(model: MultinomialNaiveBayes) -> Self {
        Self::MultinomialNaiveBayes(model)
    }
}
