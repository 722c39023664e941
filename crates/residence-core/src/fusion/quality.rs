//! Confidence helpers shared by the fusion rules

use crate::evidence::{AddressQuality, Evidence, Origin};

/// Clamp a confidence into 0.0..=1.0. NaN maps to 0.0.
pub fn clamp(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Weight of an address for the address bonus.
///
/// An explicit quality hint from the normalizer wins. Without one the
/// weight falls back to a per-source heuristic: claims addresses come
/// standardized (0.7), text-inference addresses are extracted text (0.5),
/// and a missing address weighs nothing.
pub fn quality_weight(hint: Option<AddressQuality>, evidence: Option<&Evidence>) -> f64 {
    if let Some(quality) = hint {
        return quality.weight();
    }

    let Some(evidence) = evidence else {
        return 0.0;
    };
    if evidence.address_text().is_none() {
        return 0.0;
    }

    match evidence.origin {
        Origin::ClaimsSystem => 0.7,
        Origin::TextInference => 0.5,
        // Registry addresses never feed the bonus; treat like extracted text
        Origin::AuthoritativeRegistry => 0.5,
    }
}
