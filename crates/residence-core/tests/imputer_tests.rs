//! End-to-end tests for ResidenceImputer over in-memory collaborators

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use residence_core::catalog::MemoryCatalog;
use residence_core::contract::{ErrorCode, ErrorResponse, ImputeRequest};
use residence_core::normalize::RuleNormalizer;
use residence_core::policy::{Policy, PolicyHandle, TimeBudgets};
use residence_core::ports::{
    AddressNormalizer, AuthoritativeRegistryReader, CatalogError, ClaimsSystemReader,
    ConnectorError, ConnectorResult, TextInferenceEngine,
};
use residence_core::sources::{MemorySource, ScriptedFailure, SourceRecord};
use residence_core::{
    AddressQuality, Evidence, FinalDecision, ImputeError, ImputerOptions, Origin, ResidenceImputer,
    RulePath, VitalStatus,
};

const EPS: f64 = 1e-9;
const RUT: &str = "12345678";
const DV: &str = "K";

const CATALOG: &str = r#"{
    "regions": [
        {"code": "05", "name": "Valparaíso"},
        {"code": "13", "name": "Metropolitana de Santiago"}
    ],
    "comunas": [
        {"code": "05101", "name": "Valparaíso", "region_code": "05"},
        {"code": "05109", "name": "Viña del Mar", "region_code": "05"},
        {"code": "13101", "name": "Santiago", "region_code": "13"},
        {"code": "13120", "name": "Ñuñoa", "region_code": "13"}
    ]
}"#;

type Outcome = Result<FinalDecision, ImputeError>;

/// Text engine returning a fixed result and recording each call's deadline
struct ScriptedText {
    result: ConnectorResult<Evidence>,
    deadlines: Mutex<Vec<u64>>,
}

impl ScriptedText {
    fn returning(result: ConnectorResult<Evidence>) -> Arc<Self> {
        Arc::new(Self {
            result,
            deadlines: Mutex::new(Vec::new()),
        })
    }

    fn comuna(code: &str, probability: f64) -> Arc<Self> {
        let evidence = Evidence::new(Origin::TextInference)
            .with_comuna(code)
            .with_model(probability, "test-1");
        Self::returning(Ok(evidence))
    }

    fn calls(&self) -> usize {
        self.deadlines.lock().len()
    }
}

impl TextInferenceEngine for ScriptedText {
    fn infer(&self, _texts: &[String], deadline_ms: u64) -> ConnectorResult<Evidence> {
        self.deadlines.lock().push(deadline_ms);
        self.result.clone()
    }
}

/// Claims reader that takes its time before answering
struct SlowClaims {
    delay: Duration,
    deadlines: Mutex<Vec<u64>>,
}

impl ClaimsSystemReader for SlowClaims {
    fn fetch(
        &self,
        _identifier: &str,
        _check_digit: &str,
        deadline_ms: u64,
    ) -> ConnectorResult<Evidence> {
        self.deadlines.lock().push(deadline_ms);
        std::thread::sleep(self.delay);
        let evidence = Evidence::new(Origin::ClaimsSystem)
            .with_comuna("13101")
            .with_address("Calle Moneda 975");
        Ok(evidence)
    }
}

/// Registry that counts calls and always fails
struct CountingRegistry {
    calls: AtomicUsize,
}

impl AuthoritativeRegistryReader for CountingRegistry {
    fn fetch(
        &self,
        _identifier: &str,
        _check_digit: &str,
        _deadline_ms: u64,
    ) -> ConnectorResult<Evidence> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ConnectorError::Auth("should not be called".to_string()))
    }
}

/// Normalizer that rejects every address
struct RejectingNormalizer;

impl AddressNormalizer for RejectingNormalizer {
    fn normalize(&self, raw: &str) -> ConnectorResult<(String, AddressQuality)> {
        let detail = format!("unparseable {:?}", raw);
        Err(ConnectorError::DataQuality(detail))
    }
}

fn catalog() -> Arc<MemoryCatalog> {
    Arc::new(MemoryCatalog::from_json(CATALOG).unwrap())
}

fn registry_with(record: SourceRecord) -> MemorySource {
    MemorySource::registry().with_record(RUT, DV, record)
}

fn claims_with(record: SourceRecord) -> MemorySource {
    MemorySource::claims().with_record(RUT, DV, record)
}

fn imputer(
    registry: MemorySource,
    claims: MemorySource,
    text: Arc<ScriptedText>,
) -> ResidenceImputer {
    ResidenceImputer::builder()
        .registry(Arc::new(registry))
        .claims(Arc::new(claims))
        .text_inference(text)
        .catalog(catalog())
        .build()
        .unwrap()
}

fn normalizing_imputer(
    registry: MemorySource,
    claims: MemorySource,
    text: Arc<ScriptedText>,
    normalizer: Arc<dyn AddressNormalizer + Send + Sync>,
) -> ResidenceImputer {
    ResidenceImputer::builder()
        .registry(Arc::new(registry))
        .claims(Arc::new(claims))
        .text_inference(text)
        .catalog(catalog())
        .normalizer(normalizer)
        .build()
        .unwrap()
}

fn alive(imputer: &ResidenceImputer, text: Option<&str>) -> Outcome {
    imputer.decide(RUT, DV, VitalStatus::Alive, text, None, "audit-alive")
}

fn deceased(imputer: &ResidenceImputer) -> Outcome {
    imputer.decide(RUT, DV, VitalStatus::Deceased, None, None, "audit-dco")
}

#[test]
fn test_deceased_registry_decides() {
    let record = SourceRecord::found(Some("05101"), Some("Av. Brasil 1234"));
    let text = ScriptedText::comuna("13101", 0.9);
    let imputer = imputer(registry_with(record), MemorySource::claims(), text.clone());

    let text_hint = Some("vive en Santiago");
    let decision = imputer
        .decide(RUT, DV, VitalStatus::Deceased, text_hint, None, "req-42")
        .unwrap();

    assert_eq!(decision.comuna_code, "05101");
    assert_eq!(decision.comuna, "Valparaíso");
    assert_eq!(decision.region_code, "05");
    assert_eq!(decision.region, "Valparaíso");
    assert_eq!(decision.address, "Av. Brasil 1234");
    assert_eq!(decision.confidence, 0.98);
    assert_eq!(decision.sources, vec![Origin::AuthoritativeRegistry]);
    assert_eq!(decision.rule_path, RulePath::DeceasedRegistry);
    assert_eq!(decision.audit_id, "req-42");
    assert_eq!(text.calls(), 0);

    let json = serde_json::to_value(&decision).unwrap();
    assert_eq!(json["sources"], serde_json::json!(["DCO"]));
    assert!(json.get("rule_path").is_none());
    assert!(json.get("policy_version").is_none());
}

#[test]
fn test_deceased_address_is_standardized() {
    let record = SourceRecord::found(Some("05101"), Some("Av. Brasil N° 1234"));
    let normalizer = Arc::new(RuleNormalizer::new());
    let text = ScriptedText::comuna("13101", 0.9);
    let claims = MemorySource::claims();
    let imputer = normalizing_imputer(registry_with(record), claims, text, normalizer);

    let decision = deceased(&imputer).unwrap();
    assert_eq!(decision.address, "Avenida Brasil 1234");
    assert_eq!(decision.comuna_code, "05101");
    assert_eq!(decision.confidence, 0.98);
    assert_eq!(decision.rule_path, RulePath::DeceasedRegistry);
}

#[test]
fn test_deceased_normalizer_failure_is_fatal() {
    let record = SourceRecord::found(Some("05101"), Some("@@@"));
    let text = ScriptedText::comuna("13101", 0.9);
    let claims = MemorySource::claims();
    let rejecting = Arc::new(RejectingNormalizer);
    let imputer = normalizing_imputer(registry_with(record), claims, text, rejecting);

    let err = deceased(&imputer).unwrap_err();
    assert!(matches!(
        err,
        ImputeError::Normalization(ConnectorError::DataQuality(_))
    ));
    assert!(!err.is_insufficient_evidence());
    assert_eq!(ErrorCode::from(&err), ErrorCode::ServiceUnavailable);

    // Nothing to standardize without an address
    let record = SourceRecord::found(Some("05101"), None);
    let text = ScriptedText::comuna("13101", 0.9);
    let claims = MemorySource::claims();
    let rejecting = Arc::new(RejectingNormalizer);
    let imputer = normalizing_imputer(registry_with(record), claims, text, rejecting);

    let decision = deceased(&imputer).unwrap();
    assert_eq!(decision.address, "");
    assert!((decision.confidence - 0.98 * 0.92).abs() < EPS);
}

#[test]
fn test_deceased_registry_failures_are_fatal() {
    let cases = [
        (ScriptedFailure::NotFound, "not_found"),
        (ScriptedFailure::DataQuality, "data_quality"),
        (ScriptedFailure::Auth, "auth"),
        (ScriptedFailure::Timeout, "timeout"),
    ];

    for (failure, kind) in cases {
        let registry = registry_with(SourceRecord::failing(failure));
        let claims = claims_with(SourceRecord::found(Some("13101"), Some("Calle 1 1")));
        let imputer = imputer(registry, claims, ScriptedText::comuna("13101", 0.9));

        let err = deceased(&imputer).unwrap_err();
        match &err {
            ImputeError::RegistryFailed(e) => assert_eq!(e.kind(), kind),
            other => panic!("expected registry failure for {}, got {:?}", kind, other),
        }
        assert!(err.is_insufficient_evidence());
    }
}

#[test]
fn test_deceased_without_comuna_is_insufficient() {
    let registry = registry_with(SourceRecord::found(None, Some("Calle 1 1")));
    let text = ScriptedText::comuna("13101", 0.9);
    let imputer = imputer(registry, MemorySource::claims(), text);

    let err = deceased(&imputer).unwrap_err();
    assert!(matches!(err, ImputeError::Fusion(_)));
}

#[test]
fn test_alive_claims_timeout_text_succeeds() {
    let record = SourceRecord::found(Some("13101"), Some("Calle Moneda 975"));
    // Latency beyond the 200ms claims budget
    let claims = claims_with(record).with_latency(500);
    let text = ScriptedText::comuna("13120", 0.8);
    let imputer = imputer(MemorySource::registry(), claims, text);

    let decision = alive(&imputer, Some("vive en Ñuñoa")).unwrap();
    assert_eq!(decision.comuna_code, "13120");
    assert_eq!(decision.region_code, "13");
    assert_eq!(decision.sources, vec![Origin::TextInference]);
    assert_eq!(decision.rule_path, RulePath::AliveTextDisagrees);
    assert_eq!(decision.address, "");
    assert!((decision.confidence - 0.72).abs() < EPS);
}

#[test]
fn test_alive_text_failure_falls_back_to_claims() {
    let record = SourceRecord::found(Some("13101"), Some("Calle Moneda 975"));
    let text = ScriptedText::returning(Err(ConnectorError::DataQuality("garbled".to_string())));
    let imputer = imputer(MemorySource::registry(), claims_with(record), text.clone());

    let decision = alive(&imputer, Some("texto ilegible")).unwrap();
    assert_eq!(text.calls(), 1);
    assert_eq!(decision.comuna_code, "13101");
    assert_eq!(decision.comuna, "Santiago");
    assert_eq!(decision.address, "Calle Moneda 975");
    assert_eq!(decision.sources, vec![Origin::ClaimsSystem]);
    assert_eq!(decision.rule_path, RulePath::AliveClaimsOnly);
    assert!((decision.confidence - 0.685).abs() < EPS);
}

#[test]
fn test_alive_text_address_quality_hint() {
    let evidence = Evidence::new(Origin::TextInference)
        .with_comuna("13120")
        .with_address("Psje. Los Aromos 44")
        .with_model(0.8, "test-1");
    let text = ScriptedText::returning(Ok(evidence));
    let registry = MemorySource::registry();
    let claims = MemorySource::claims();
    let normalizer = Arc::new(RuleNormalizer::new());
    let normalizing = normalizing_imputer(registry, claims, text.clone(), normalizer);

    let decision = alive(&normalizing, Some("vive en Ñuñoa")).unwrap();
    assert_eq!(decision.address, "Pasaje Los Aromos 44");
    assert_eq!(decision.rule_path, RulePath::AliveTextDisagrees);
    // 0.90 * 0.8 + 0.03 * 1.0 (exact address)
    assert!((decision.confidence - 0.75).abs() < EPS);

    // Without a normalizer the text address gets the 0.5 heuristic
    let plain = imputer(MemorySource::registry(), MemorySource::claims(), text);
    let decision = alive(&plain, Some("vive en Ñuñoa")).unwrap();
    assert_eq!(decision.address, "Psje. Los Aromos 44");
    assert!((decision.confidence - 0.735).abs() < EPS);
}

#[test]
fn test_alive_normalizer_failure_drops_source() {
    let record = SourceRecord::found(Some("13101"), Some("@@@"));
    let missing = ConnectorError::NotFound("no comuna".to_string());
    let text = ScriptedText::returning(Err(missing));
    let registry = MemorySource::registry();
    let rejecting = Arc::new(RejectingNormalizer);
    let imputer = normalizing_imputer(registry, claims_with(record), text, rejecting);

    let err = alive(&imputer, Some("sin datos")).unwrap_err();
    assert!(matches!(err, ImputeError::Fusion(_)));
    assert!(err.is_insufficient_evidence());

    // Claims is dropped, so the text comuna stands alone
    let record = SourceRecord::found(Some("13101"), Some("@@@"));
    let text = ScriptedText::comuna("13101", 0.8);
    let registry = MemorySource::registry();
    let rejecting = Arc::new(RejectingNormalizer);
    let imputer = normalizing_imputer(registry, claims_with(record), text, rejecting);

    let decision = alive(&imputer, Some("Santiago")).unwrap();
    assert_eq!(decision.sources, vec![Origin::TextInference]);
    assert_eq!(decision.rule_path, RulePath::AliveTextDisagrees);
    assert_eq!(decision.address, "");
    assert!((decision.confidence - 0.72).abs() < EPS);
}

#[test]
fn test_alive_without_text_skips_inference() {
    let claims = claims_with(SourceRecord::found(Some("05109"), None));
    let text = ScriptedText::comuna("13101", 0.9);
    let imputer = imputer(MemorySource::registry(), claims, text.clone());

    let decision = imputer
        .decide(RUT, DV, VitalStatus::Alive, None, Some(""), "a")
        .unwrap();
    assert_eq!(text.calls(), 0);
    assert_eq!(decision.comuna_code, "05109");
    assert_eq!(decision.comuna, "Viña del Mar");
    assert!((decision.confidence - 0.65).abs() < EPS);
}

#[test]
fn test_alive_whitespace_text_reaches_inference() {
    let claims = claims_with(SourceRecord::found(Some("05109"), None));
    let text = ScriptedText::comuna("13101", 0.9);
    let imputer = imputer(MemorySource::registry(), claims, text.clone());

    let decision = imputer
        .decide(RUT, DV, VitalStatus::Alive, Some("  "), None, "a")
        .unwrap();
    assert_eq!(text.calls(), 1);
    assert_eq!(decision.comuna_code, "13101");
}

#[test]
fn test_alive_agreement_uses_normalized_claims_address() {
    let record = SourceRecord::found(Some("13120"), Some("Av. Grecia N° 2001"));
    let text = ScriptedText::comuna("13120", 0.8);
    let registry = MemorySource::registry();
    let normalizer = Arc::new(RuleNormalizer::new());
    let imputer = normalizing_imputer(registry, claims_with(record), text, normalizer);

    let decision = alive(&imputer, Some("domicilio en Ñuñoa")).unwrap();
    assert_eq!(decision.address, "Avenida Grecia 2001");
    assert_eq!(
        decision.sources,
        vec![Origin::TextInference, Origin::ClaimsSystem]
    );
    assert_eq!(decision.rule_path, RulePath::AliveTextAgreesClaims);
    // 0.90 * 0.8 + 0.15 + 0.05 * 1.0 (exact address)
    assert!((decision.confidence - 0.92).abs() < EPS);
}

#[test]
fn test_alive_no_evidence_is_insufficient() {
    let text = ScriptedText::returning(Err(ConnectorError::NotFound("nothing".to_string())));
    let imputer = imputer(MemorySource::registry(), MemorySource::claims(), text);

    let err = alive(&imputer, Some("sin datos")).unwrap_err();
    assert!(matches!(err, ImputeError::Fusion(_)));
    assert!(err.is_insufficient_evidence());

    let response = ErrorResponse::from_impute(&err, "audit-alive");
    assert_eq!(response.error, ErrorCode::ValidationError);
    assert_eq!(response.audit_id, "audit-alive");
}

#[test]
fn test_alive_never_touches_registry() {
    let registry = Arc::new(CountingRegistry {
        calls: AtomicUsize::new(0),
    });
    let claims = claims_with(SourceRecord::found(Some("13101"), None));
    let imputer = ResidenceImputer::builder()
        .registry(registry.clone())
        .claims(Arc::new(claims))
        .text_inference(ScriptedText::comuna("13101", 0.9))
        .catalog(catalog())
        .build()
        .unwrap();

    alive(&imputer, Some("Santiago")).unwrap();
    assert_eq!(registry.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unknown_comuna_is_catalog_error() {
    let imputer = imputer(
        MemorySource::registry(),
        MemorySource::claims(),
        ScriptedText::comuna("99999", 0.9),
    );

    let err = alive(&imputer, Some("lejos")).unwrap_err();
    assert_eq!(
        err,
        ImputeError::Catalog(CatalogError::UnknownComuna("99999".to_string()))
    );
    assert!(!err.is_insufficient_evidence());
    assert_eq!(ErrorCode::from(&err), ErrorCode::ServiceUnavailable);
}

#[test]
fn test_connector_deadlines_respect_budgets() {
    let text = ScriptedText::comuna("13101", 0.9);
    let slow = Arc::new(SlowClaims {
        delay: Duration::ZERO,
        deadlines: Mutex::new(Vec::new()),
    });
    let imputer = ResidenceImputer::builder()
        .registry(Arc::new(MemorySource::registry()))
        .claims(slow.clone())
        .text_inference(text.clone())
        .catalog(catalog())
        .build()
        .unwrap();

    alive(&imputer, Some("Santiago")).unwrap();

    let budgets = TimeBudgets::default();
    let claims_deadline = slow.deadlines.lock()[0];
    let text_deadline = text.deadlines.lock()[0];
    assert!((1..=budgets.claims_ms).contains(&claims_deadline));
    assert!((1..=budgets.text_inference_ms).contains(&text_deadline));
}

fn tight_policy() -> PolicyHandle {
    PolicyHandle::new(Policy {
        budgets: TimeBudgets {
            global_soft_ms: 20,
            ..TimeBudgets::default()
        },
        ..Policy::default()
    })
    .unwrap()
}

fn slow_claims_imputer(text: Arc<ScriptedText>, options: ImputerOptions) -> ResidenceImputer {
    ResidenceImputer::builder()
        .registry(Arc::new(MemorySource::registry()))
        .claims(Arc::new(SlowClaims {
            delay: Duration::from_millis(60),
            deadlines: Mutex::new(Vec::new()),
        }))
        .text_inference(text)
        .catalog(catalog())
        .policy(tight_policy())
        .options(options)
        .build()
        .unwrap()
}

#[test]
fn test_exhausted_budget_still_calls_with_zero_deadline() {
    let text = ScriptedText::comuna("13120", 0.9);
    let imputer = slow_claims_imputer(text.clone(), ImputerOptions::default());

    let decision = alive(&imputer, Some("Ñuñoa")).unwrap();
    assert_eq!(text.deadlines.lock().as_slice(), &[0]);
    // The scripted engine ignores its deadline, so text still disagrees with claims
    assert_eq!(decision.comuna_code, "13120");
}

#[test]
fn test_exhausted_budget_skips_optional_sources() {
    let text = ScriptedText::comuna("13120", 0.9);
    let options = ImputerOptions {
        skip_on_exhausted_budget: true,
    };
    let imputer = slow_claims_imputer(text.clone(), options);

    let decision = alive(&imputer, Some("Ñuñoa")).unwrap();
    assert_eq!(text.calls(), 0);
    assert_eq!(decision.comuna_code, "13101");
    assert_eq!(decision.rule_path, RulePath::AliveClaimsOnly);
}

#[test]
fn test_policy_swap_applies_to_next_decision() {
    let registry = registry_with(SourceRecord::found(Some("13101"), Some("Calle 1 1")));
    let handle = PolicyHandle::default();
    let imputer = ResidenceImputer::builder()
        .registry(Arc::new(registry))
        .claims(Arc::new(MemorySource::claims()))
        .text_inference(ScriptedText::comuna("13101", 0.9))
        .catalog(catalog())
        .policy(handle.clone())
        .build()
        .unwrap();

    let before = deceased(&imputer).unwrap();
    assert_eq!(before.confidence, 0.98);

    let mut next = Policy::default();
    next.version = "2025-09-01-test".to_string();
    next.weights.dco_base_conf = 0.9;
    handle.swap(next).unwrap();

    let after = deceased(&imputer).unwrap();
    assert_eq!(after.confidence, 0.9);
    assert_eq!(after.policy_version, "2025-09-01-test");
}

#[test]
fn test_concurrent_decisions_agree() {
    let claims = claims_with(SourceRecord::found(Some("13120"), Some("Calle 2 2")));
    let text = ScriptedText::comuna("13120", 0.7);
    let imputer = imputer(MemorySource::registry(), claims, text);
    let expected = alive(&imputer, Some("Ñuñoa")).unwrap();

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| alive(&imputer, Some("Ñuñoa")).unwrap()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn test_request_contract_flow() {
    let raw = r#"{"rut": "12345678", "dv": "k", "vital_status": 2, "audit_id": "ext-1"}"#;
    let request: ImputeRequest = serde_json::from_str(raw).unwrap();
    let valid = request.validate().unwrap();

    let registry = registry_with(SourceRecord::found(Some("05109"), None));
    let text = ScriptedText::comuna("13101", 0.9);
    let imputer = imputer(registry, MemorySource::claims(), text);

    let audit_id = request.audit_id.as_deref().unwrap_or_default();
    let decision = imputer
        .decide(
            &valid.rut,
            &valid.dv,
            valid.vital_status,
            valid.ges_text.as_deref(),
            valid.noges_text.as_deref(),
            audit_id,
        )
        .unwrap();
    assert_eq!(decision.audit_id, "ext-1");
    assert!((decision.confidence - 0.98 * 0.92).abs() < EPS);
}
