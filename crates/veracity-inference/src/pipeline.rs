use tracing::debug;

use crate::{ModelBundle, Prediction, Resolution};

/// Extract features for `text` and run the classifier on them.
pub fn predict(bundle: &ModelBundle, text: &str) -> Prediction {
    let features = bundle.extract(text);
    debug!(non_zero = features.nnz(), "Features extracted");
    let prediction = bundle.classifier().predict(&features);
    debug!(%prediction, "Classifier prediction");
    prediction
}

/// Predictions for many texts, vectorized as one matrix.
pub fn predict_batch<T: AsRef<str> + Sync>(bundle: &ModelBundle, texts: &[T]) -> Vec<Prediction> {
    let features = bundle.vectorizer().transform(texts);
    debug!(rows = features.rows(), non_zero = features.nnz(), "Batch features extracted");
    bundle.classifier().predict_batch(&features)
}

/// Label and confidence for `text`.
pub fn detect(bundle: &ModelBundle, text: &str) -> Resolution {
    Resolution::from(&predict(bundle, text))
}

#[cfg(test)]
mod tests {
    use veracity_pre_processing::{TfidfVectorizer, VectorizerParams};

    use super::*;
    use crate::{Label, LogisticRegression};

    fn bundle() -> ModelBundle {
        let vectorizer = TfidfVectorizer::from_parts(
            VectorizerParams::default(),
            [
                ("shocking".to_string(), 0),
                ("miracle".to_string(), 1),
                ("ministry".to_string(), 2),
                ("report".to_string(), 3),
            ],
            vec![1.0; 4],
        )
        .unwrap();
        ModelBundle::new(
            "pipeline-test",
            vectorizer,
            LogisticRegression::new(vec![3.0, 3.0, -3.0, -3.0], 0.0).into(),
        )
        .unwrap()
    }

    const TEST_TEXT: &str = "This is a sample text for testing the inference pipeline.";

    #[test]
    fn probabilities_form_a_distribution() {
        let prediction = predict(&bundle(), TEST_TEXT);
        assert_eq!(prediction.probabilities().len(), 2);
        assert!((prediction.probabilities().iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sensational_text_is_fake() {
        let resolution = detect(&bundle(), "SHOCKING miracle!");
        assert_eq!(resolution.label, Label::Fake);
        assert!(resolution.confidence > 50.0);
    }

    #[test]
    fn sober_text_is_real() {
        let resolution = detect(&bundle(), "The ministry published its report");
        assert_eq!(resolution.label, Label::Real);
        assert!(resolution.confidence > 50.0);
    }

    #[test]
    fn empty_text_is_still_classified() {
        let resolution = detect(&bundle(), "");
        // No features: decision is the zero intercept, a coin flip that ties to Real.
        assert_eq!(resolution.label, Label::Real);
        assert_eq!(resolution.confidence, 50.0);
    }

    #[test]
    fn batch_predictions_match_single() {
        let bundle = bundle();
        let texts = ["Shocking report", "miracle miracle", "", "ministry"];
        let batch = predict_batch(&bundle, &texts);
        assert_eq!(batch.len(), texts.len());
        for (text, prediction) in texts.iter().zip(&batch) {
            assert_eq!(&predict(&bundle, text), prediction);
        }
    }
}
