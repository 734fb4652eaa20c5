use std::{fs, path::Path};

use tracing::{debug, info};
use veracity_pre_processing::{FeatureVector, TfidfVectorizer};

use crate::{Classifier, ModelError, label::validate_label_mapping};

/// Version of the on-disk artifact layout written by [`ModelBundle::to_bytes`].
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Upper bound on decoded artifact size so a corrupt length prefix cannot
/// trigger an unbounded allocation.
const ARTIFACT_SIZE_LIMIT: usize = 1 << 30;

fn artifact_config() -> impl bincode::config::Config {
    bincode::config::standard().with_limit::<ARTIFACT_SIZE_LIMIT>()
}

#[derive(bincode::Encode, bincode::Decode)]
struct ModelArtifact {
    format_version: u32,
    model_version: String,
    vectorizer: TfidfVectorizer,
    classifier: Classifier,
}

/// A fitted vectorizer paired with the classifier trained on its output.
///
/// Built once at startup and shared read-only afterwards. Construction fails
/// if the vectorizer width differs from the classifier's input width or the
/// classifier does not have exactly the `Real`/`Fake` classes.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    model_version: String,
    vectorizer: TfidfVectorizer,
    classifier: Classifier,
}

impl ModelBundle {
    pub fn new(
        model_version: impl Into<String>,
        vectorizer: TfidfVectorizer,
        classifier: Classifier,
    ) -> Result<Self, ModelError> {
        let bundle = Self {
            model_version: model_version.into(),
            vectorizer,
            classifier,
        };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Every check a bundle must pass before it serves requests: each part is
    /// internally consistent, the widths agree and the classes map onto
    /// `Real`/`Fake`.
    pub fn validate(&self) -> Result<(), ModelError> {
        self.vectorizer
            .validate()
            .map_err(|err| ModelError::Configuration(format!("vectorizer: {err}")))?;
        self.classifier.validate()?;
        if self.vectorizer.num_features() != self.classifier.num_features() {
            return Err(ModelError::Configuration(format!(
                "vectorizer produces {} features but {} classifier expects {}",
                self.vectorizer.num_features(),
                self.classifier.kind(),
                self.classifier.num_features()
            )));
        }
        validate_label_mapping(self.classifier.num_classes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ModelError> {
        let (artifact, _): (ModelArtifact, usize) =
            bincode::decode_from_slice(bytes, artifact_config())?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::UnsupportedFormat {
                found: artifact.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        Self::new(artifact.model_version, artifact.vectorizer, artifact.classifier)
    }

    /// Read and validate a bundle from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading model bundle");
        let bytes = fs::read(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let bundle = Self::from_bytes(&bytes)?;
        info!(
            model_version = %bundle.model_version,
            classifier = bundle.classifier.kind(),
            num_features = bundle.num_features(),
            "Model bundle loaded"
        );
        Ok(bundle)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        let artifact = ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            model_version: self.model_version.clone(),
            vectorizer: self.vectorizer.clone(),
            classifier: self.classifier.clone(),
        };
        Ok(bincode::encode_to_vec(&artifact, artifact_config())?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes()?).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    #[must_use]
    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    #[must_use]
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    #[must_use]
    pub fn num_features(&self) -> usize {
        self.vectorizer.num_features()
    }

    #[must_use]
    pub fn extract(&self, text: &str) -> FeatureVector {
        self.vectorizer.extract(text)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use veracity_pre_processing::VectorizerParams;

    use super::*;
    use crate::{LogisticRegression, MultinomialNaiveBayes};

    fn vectorizer() -> TfidfVectorizer {
        TfidfVectorizer::from_parts(
            VectorizerParams::default(),
            [
                ("shocking".to_string(), 0),
                ("miracle".to_string(), 1),
                ("ministry".to_string(), 2),
            ],
            vec![1.2, 1.5, 1.1],
        )
        .unwrap()
    }

    fn bundle() -> ModelBundle {
        ModelBundle::new(
            "test-1",
            vectorizer(),
            LogisticRegression::new(vec![1.5, 2.0, -1.8], 0.0).into(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_dimension_mismatch() {
        let err = ModelBundle::new(
            "bad",
            vectorizer(),
            LogisticRegression::new(vec![1.0, 2.0], 0.0).into(),
        )
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("3 features"));
    }

    #[test]
    fn rejects_wrong_class_count() {
        let three_class =
            MultinomialNaiveBayes::new(vec![0.0; 3], vec![vec![0.0; 3], vec![0.0; 3], vec![0.0; 3]])
                .unwrap();
        let err = ModelBundle::new("bad", vectorizer(), three_class.into()).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn save_and_load_through_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.bin");
        let original = bundle();
        original.save(&path).unwrap();

        let loaded = ModelBundle::load(&path).unwrap();
        assert_eq!(loaded.model_version(), "test-1");
        assert_eq!(loaded.classifier(), original.classifier());
        let text = "Shocking miracle at the ministry";
        assert_eq!(loaded.extract(text), original.extract(text));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelBundle::load(dir.path().join("absent.bin")).unwrap_err();
        assert!(err.is_unavailable());
        assert!(matches!(err, ModelError::Read { .. }));
    }

    #[test]
    fn garbage_bytes_are_unavailable() {
        let err = ModelBundle::from_bytes(b"definitely not a model").unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn unknown_format_version_is_rejected() {
        let original = bundle();
        let artifact = ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION + 1,
            model_version: "future".to_string(),
            vectorizer: original.vectorizer.clone(),
            classifier: original.classifier.clone(),
        };
        let bytes = bincode::encode_to_vec(&artifact, artifact_config()).unwrap();
        let err = ModelBundle::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat { found: 2, expected: 1 }));
    }

    // Same field order as `ModelArtifact`, with the vectorizer spelled out so
    // tests can write states `TfidfVectorizer` cannot construct.
    #[derive(bincode::Encode)]
    struct RawArtifact {
        format_version: u32,
        model_version: String,
        ngram_range: (usize, usize),
        min_df: f64,
        max_df: f64,
        sublinear_tf: bool,
        vocab: HashMap<String, usize>,
        idf: Vec<f64>,
        classifier: Classifier,
    }

    impl RawArtifact {
        fn single_term() -> Self {
            Self {
                format_version: ARTIFACT_FORMAT_VERSION,
                model_version: "raw".to_string(),
                ngram_range: (1, 1),
                min_df: 1.0,
                max_df: 1.0,
                sublinear_tf: false,
                vocab: HashMap::from([("fake".to_string(), 0)]),
                idf: vec![1.0],
                classifier: LogisticRegression::new(vec![1.0], 0.0).into(),
            }
        }

        fn decode(&self) -> Result<ModelBundle, ModelError> {
            ModelBundle::from_bytes(&bincode::encode_to_vec(self, artifact_config()).unwrap())
        }
    }

    #[test]
    fn well_formed_raw_artifact_loads() {
        let bundle = RawArtifact::single_term().decode().unwrap();
        assert_eq!(bundle.extract("fake fake").nnz(), 1);
    }

    #[test]
    fn vocabulary_index_past_the_end_is_rejected_at_load() {
        let raw = RawArtifact {
            vocab: HashMap::from([("fake".to_string(), 7)]),
            ..RawArtifact::single_term()
        };
        let err = raw.decode().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("vectorizer"));
    }

    #[test]
    fn idf_length_mismatch_is_rejected_at_load() {
        let raw = RawArtifact {
            idf: vec![1.0, 1.0],
            ..RawArtifact::single_term()
        };
        assert!(raw.decode().unwrap_err().is_configuration());
    }

    #[test]
    fn unusable_ngram_range_is_rejected_at_load() {
        for ngram_range in [(0, 1), (3, 2)] {
            let raw = RawArtifact {
                ngram_range,
                ..RawArtifact::single_term()
            };
            assert!(raw.decode().unwrap_err().is_configuration());
        }
    }

    #[test]
    fn non_finite_weights_are_rejected_at_load() {
        let raw = RawArtifact {
            classifier: LogisticRegression::new(vec![f64::NAN], 0.0).into(),
            ..RawArtifact::single_term()
        };
        assert!(raw.decode().unwrap_err().is_configuration());

        let raw = RawArtifact {
            classifier: LogisticRegression::new(vec![1.0], f64::INFINITY).into(),
            ..RawArtifact::single_term()
        };
        assert!(raw.decode().unwrap_err().is_configuration());
    }
}
