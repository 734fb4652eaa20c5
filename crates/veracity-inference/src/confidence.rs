//! Turns a class distribution into a label and a percentage confidence.
//!
//! Confidence is the probability mass of the *winning* class scaled to a
//! percentage and rounded to two decimals, half away from zero
//! (`f64::round`). For example 0.876543 resolves to 87.65.

use core::fmt;

use crate::{Label, Prediction};

/// Label and confidence for a single classification.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    pub label: Label,
    /// Percentage in [0, 100], two decimals.
    pub confidence: f64,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}%)", self.label, self.confidence)
    }
}

/// Round to two decimal places, half away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `100 * max(probabilities)`, rounded and clamped to [0, 100].
#[must_use]
pub fn confidence_percent(probabilities: &[f64]) -> f64 {
    let max = probabilities.iter().copied().fold(0.0, f64::max);
    round2(max * 100.0).clamp(0.0, 100.0)
}

/// Map a winning class index and its distribution to a [`Resolution`].
///
/// The class count is checked once at bundle load, not here.
#[must_use]
pub fn resolve(label_index: usize, probabilities: &[f64]) -> Resolution {
    Resolution {
        label: Label::from_index(label_index),
        confidence: confidence_percent(probabilities),
    }
}

impl From<&Prediction> for Resolution {
    fn from(prediction: &Prediction) -> Self {
        resolve(prediction.label_index(), prediction.probabilities())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_at_eighty_two_percent() {
        let resolution = resolve(1, &[0.18, 0.82]);
        assert_eq!(resolution.label, Label::Fake);
        assert_eq!(resolution.confidence, 82.0);
    }

    #[test]
    fn confidence_follows_winning_class_not_fake() {
        let resolution = resolve(0, &[0.7, 0.3]);
        assert_eq!(resolution.label, Label::Real);
        assert_eq!(resolution.confidence, 70.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(confidence_percent(&[0.123457, 0.876543]), 87.65);
        assert_eq!(confidence_percent(&[0.66667, 0.33333]), 66.67);
        assert_eq!(round2(12.3449), 12.34);
        assert_eq!(round2(0.5), 0.5);
    }

    #[test]
    fn stays_within_bounds() {
        assert_eq!(confidence_percent(&[0.0, 1.0]), 100.0);
        assert_eq!(confidence_percent(&[0.5, 0.5]), 50.0);
        assert_eq!(confidence_percent(&[]), 0.0);
        for step in 0..=100 {
            let p = f64::from(step) / 100.0;
            let c = confidence_percent(&[p, 1.0 - p]);
            assert!((0.0..=100.0).contains(&c));
            assert!(c >= 50.0);
        }
    }

    #[test]
    fn from_prediction_uses_winning_index() {
        let prediction = Prediction::from_probabilities(vec![0.4, 0.6]);
        let resolution = Resolution::from(&prediction);
        assert_eq!(resolution.label, Label::Fake);
        assert_eq!(resolution.confidence, 60.0);
        assert_eq!(resolution.to_string(), "Fake (60.00%)");
    }
}
