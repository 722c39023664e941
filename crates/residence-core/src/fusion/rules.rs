//! Deceased and alive decision rules
//!
//! Both rules are pure: same evidence, hints and policy give the same
//! decision, with no I/O and no logging.

use crate::evidence::{AddressQuality, Evidence, InternalDecision, Origin, RulePath};
use crate::policy::Policy;

use super::error::{DecisionPath, FusionError, FusionResult};
use super::quality::{clamp, quality_weight};

/// Address quality reported by the normalizer for each alive-path source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QualityHints {
    pub claims: Option<AddressQuality>,
    pub text: Option<AddressQuality>,
}

/// Deceased path: the authoritative registry decides.
///
/// Requires a comuna code; a missing address applies the multiplicative
/// penalty to the base confidence.
pub fn decide_deceased(
    registry: Option<&Evidence>,
    policy: &Policy,
) -> FusionResult<InternalDecision> {
    let path = DecisionPath::Deceased;
    let Some(evidence) = registry else {
        return Err(insufficient(path, "no registry evidence"));
    };
    let Some(comuna_code) = evidence.comuna() else {
        return Err(insufficient(path, "registry evidence has no comuna code"));
    };

    let weights = &policy.weights;
    let address = evidence.address_text();
    let raw = match address {
        Some(_) => weights.dco_base_conf,
        None => weights.dco_base_conf * weights.dco_no_address_penalty,
    };

    Ok(InternalDecision {
        comuna_code: comuna_code.to_string(),
        address: address.unwrap_or_default().to_string(),
        confidence: clamp(raw),
        sources: vec![Origin::AuthoritativeRegistry],
        rule_path: RulePath::DeceasedRegistry,
        tie_break_reason: None,
    })
}

/// Alive path: prefer the comuna inferred from text, take the address from
/// the claims system when both agree, fall back to claims alone.
pub fn decide_alive(
    text: Option<&Evidence>,
    claims: Option<&Evidence>,
    hints: QualityHints,
    policy: &Policy,
) -> FusionResult<InternalDecision> {
    let weights = &policy.weights;

    if let Some((text_ev, text_comuna)) = text.and_then(|ev| ev.comuna().map(|c| (ev, c))) {
        let claims_comuna = claims.and_then(Evidence::comuna);
        let agree = claims_comuna == Some(text_comuna);

        let (address, address_bonus, sources, rule_path, tie_break_reason) = if agree {
            (
                claims.and_then(Evidence::address_text).unwrap_or_default(),
                weights.addr_bonus_claims * quality_weight(hints.claims, claims),
                vec![Origin::TextInference, Origin::ClaimsSystem],
                RulePath::AliveTextAgreesClaims,
                None,
            )
        } else {
            let reason = match (claims, claims_comuna) {
                (None, _) => "claims_absent",
                (Some(_), None) => "claims_without_comuna",
                (Some(_), Some(_)) => "claims_disagree",
            };
            (
                text_ev.address_text().unwrap_or_default(),
                weights.addr_bonus_nlp * quality_weight(hints.text, Some(text_ev)),
                vec![Origin::TextInference],
                RulePath::AliveTextDisagrees,
                Some(reason.to_string()),
            )
        };

        let probability = text_ev.model_probability.unwrap_or(weights.nlp_p_default);
        let boost = if agree { weights.boost_agree } else { 0.0 };
        let confidence = clamp(weights.w_nlp * probability + boost + address_bonus);

        return Ok(InternalDecision {
            comuna_code: text_comuna.to_string(),
            address: address.to_string(),
            confidence,
            sources,
            rule_path,
            tie_break_reason,
        });
    }

    if let Some((claims_ev, claims_comuna)) = claims.and_then(|ev| ev.comuna().map(|c| (ev, c))) {
        let quality = quality_weight(hints.claims, Some(claims_ev));
        let address_bonus = weights.addr_bonus_claims * quality;
        let reason = if text.is_some() {
            "text_without_comuna"
        } else {
            "text_absent"
        };

        return Ok(InternalDecision {
            comuna_code: claims_comuna.to_string(),
            address: claims_ev.address_text().unwrap_or_default().to_string(),
            confidence: clamp(weights.claims_only_base + address_bonus),
            sources: vec![Origin::ClaimsSystem],
            rule_path: RulePath::AliveClaimsOnly,
            tie_break_reason: Some(reason.to_string()),
        });
    }

    Err(insufficient(
        DecisionPath::Alive,
        "no comuna from text inference or claims system",
    ))
}

fn insufficient(path: DecisionPath, detail: &'static str) -> FusionError {
    FusionError::InsufficientEvidence { path, detail }
}
