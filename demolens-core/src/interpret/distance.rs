//! How far a perturbed output moved from the baseline output.

use crate::prediction::Prediction;

fn indicator(baseline: &Prediction, perturbed: &Prediction) -> f64 {
    if baseline.label() == perturbed.label() { 0.0 } else { 1.0 }
}

/// Distance used by leave-one-out scoring: `baseline - perturbed`.
///
/// Confidence outputs measure the drop in the baseline label's confidence.
/// Outputs that both read as numbers are subtracted, anything else scores 1
/// when the outputs differ and 0 when they match.
pub fn quantify_difference(baseline: &Prediction, perturbed: &Prediction) -> f64 {
    if let (Prediction::Confidences(_), Some(label)) = (baseline, baseline.label()) {
        let before = baseline.confidence_of(&label).unwrap_or(0.0);
        let after = perturbed.confidence_of(&label).unwrap_or(0.0);
        return before - after;
    }
    match (baseline.as_number(), perturbed.as_number()) {
        (Some(before), Some(after)) => before - after,
        _ => indicator(baseline, perturbed),
    }
}

/// Value of a coalition for Shapley attribution.
///
/// Confidence outputs use the perturbed confidence of the baseline label
/// (missing or NaN counts as 0). Numeric outputs use `perturbed - baseline`,
/// anything else the same indicator as [`quantify_difference`].
pub fn coalition_value(baseline: &Prediction, perturbed: &Prediction) -> f64 {
    if let (Prediction::Confidences(_), Some(label)) = (baseline, baseline.label()) {
        return perturbed
            .confidence_of(&label)
            .filter(|c| !c.is_nan())
            .unwrap_or(0.0);
    }
    match (baseline.as_number(), perturbed.as_number()) {
        (Some(before), Some(after)) => after - before,
        _ => indicator(baseline, perturbed),
    }
}
