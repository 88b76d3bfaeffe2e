//! Audit engine and repair controller tests

mod common;

use std::sync::Arc;

use tokio_test::{assert_err, assert_ok};

use common::{audit_answer, fenced_html, FakeGenerator};
use sketchpress::audit::{AuditEngine, AuditPolicy};
use sketchpress::errors::{AuditError, GeneratorError, RepairError};
use sketchpress::generator::GenerationTuning;
use sketchpress::models::{DeployableContent, FailingFinding, LiveDeploymentHandle, RepositoryRef};
use sketchpress::repair::{finding_lines, RepairController, RepairOutcome};

const LIVE_URL: &str = "https://alice.github.io/site/";

fn page() -> DeployableContent {
    DeployableContent::from_text("<html><body><button>Go</button></body></html>")
}

fn live_handle(content: &DeployableContent) -> LiveDeploymentHandle {
    LiveDeploymentHandle::new(
        LIVE_URL.to_string(),
        RepositoryRef::parse("alice/site").unwrap(),
        content.clone(),
        None,
    )
}

fn engine(generator: &Arc<FakeGenerator>, policy: AuditPolicy) -> AuditEngine {
    AuditEngine::new(generator.clone(), policy, GenerationTuning::default())
}

#[tokio::test]
async fn test_aria_finding_drives_repair_and_stales_handle() {
    let generator = Arc::new(
        FakeGenerator::new()
            .reply(audit_answer(&[
                ("Semantic HTML5", "Passed", true),
                ("ARIA", "Missing labels", false),
            ]))
            .reply(fenced_html(
                "<html><body><button aria-label=\"Go\">Go</button></body></html>",
            )),
    );
    let content = page();
    let mut handle = live_handle(&content);

    let findings = assert_ok!(
        engine(&generator, AuditPolicy::FailOpen)
            .audit(LIVE_URL, &content)
            .await
    );
    let failing = findings.failing();
    assert_eq!(finding_lines(&failing), vec!["ARIA: Missing labels"]);

    let controller = RepairController::new(generator.clone(), GenerationTuning::default());
    let outcome = assert_ok!(controller.repair(&content, &failing).await);
    assert!(outcome.is_repaired());
    outcome.apply_to(Some(&mut handle));

    // The repair prompt lists exactly the failing finding
    let requests = generator.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].prompt.contains("ARIA: Missing labels"));
    assert!(!requests[1].prompt.contains("Semantic HTML5"));

    let repaired = outcome.into_content();
    assert_ne!(repaired, content);
    assert!(repaired.as_text().contains("aria-label"));
    assert!(handle.is_stale());
    assert_eq!(handle.url(), None);
}

#[tokio::test]
async fn test_repair_without_findings_is_a_no_op() {
    let generator = Arc::new(FakeGenerator::new());
    let controller = RepairController::new(generator.clone(), GenerationTuning::default());
    let content = page();
    let mut handle = live_handle(&content);

    let outcome = assert_ok!(controller.repair(&content, &[]).await);

    assert!(matches!(outcome, RepairOutcome::NothingToRepair(_)));
    assert_eq!(outcome.content(), &content);
    assert_eq!(generator.calls(), 0);

    outcome.apply_to(Some(&mut handle));
    assert!(!handle.is_stale());
}

#[tokio::test]
async fn test_repair_keeps_finding_order() {
    let generator = Arc::new(FakeGenerator::new().reply(fenced_html("<html></html>")));
    let controller = RepairController::new(generator.clone(), GenerationTuning::default());
    let failing = vec![
        FailingFinding::new("Contrast", "Too low"),
        FailingFinding::new("ARIA", "Missing labels"),
    ];

    let _ = assert_ok!(controller.repair(&page(), &failing).await);

    let prompt = &generator.requests()[0].prompt;
    let contrast = prompt.find("Contrast: Too low").unwrap();
    let aria = prompt.find("ARIA: Missing labels").unwrap();
    assert!(contrast < aria);
}

#[tokio::test]
async fn test_repair_generator_failure_propagates() {
    let generator = Arc::new(
        FakeGenerator::new().reply_err(GeneratorError::Unauthorized("API key not valid".to_string())),
    );
    let controller = RepairController::new(generator, GenerationTuning::default());

    let err = assert_err!(
        controller
            .repair(&page(), &[FailingFinding::new("ARIA", "Missing labels")])
            .await
    );
    assert!(matches!(err, RepairError::Generator(GeneratorError::Unauthorized(_))));
}

#[tokio::test]
async fn test_repair_rejects_blank_answer() {
    let generator = Arc::new(FakeGenerator::new().reply("```html\n\n```"));
    let controller = RepairController::new(generator, GenerationTuning::default());

    let err = assert_err!(
        controller
            .repair(&page(), &[FailingFinding::new("ARIA", "Missing labels")])
            .await
    );
    assert!(matches!(err, RepairError::Generator(GeneratorError::EmptyResponse)));
}

#[tokio::test]
async fn test_audit_request_carries_url_and_schema() {
    let generator = Arc::new(FakeGenerator::new().reply(audit_answer(&[("Responsive", "Passed", true)])));

    let findings = assert_ok!(
        engine(&generator, AuditPolicy::FailOpen)
            .audit(LIVE_URL, &page())
            .await
    );
    assert!(!findings.has_failures());

    let request = &generator.requests()[0];
    assert!(request.system_instruction.contains(LIVE_URL));
    assert!(request.prompt.contains("<button>Go</button>"));
    let schema = request.response_schema.as_ref().unwrap();
    assert!(schema["properties"]["checkpoints"].is_object());
}

#[tokio::test]
async fn test_malformed_audit_fails_open_by_default() {
    let generator = Arc::new(FakeGenerator::new().reply("I could not review this page."));

    let findings = assert_ok!(
        engine(&generator, AuditPolicy::FailOpen)
            .audit(LIVE_URL, &page())
            .await
    );
    assert!(findings.is_empty());
}

#[tokio::test]
async fn test_malformed_audit_is_an_error_when_strict() {
    let generator = Arc::new(FakeGenerator::new().reply(r#"{"checkpoints": "none"}"#));

    let err = assert_err!(
        engine(&generator, AuditPolicy::Strict)
            .audit(LIVE_URL, &page())
            .await
    );
    assert!(matches!(err, AuditError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_audit_generator_failure_is_not_swallowed() {
    let generator = Arc::new(
        FakeGenerator::new().reply_err(GeneratorError::Transient("503 Service Unavailable".to_string())),
    );

    let err = assert_err!(
        engine(&generator, AuditPolicy::FailOpen)
            .audit(LIVE_URL, &page())
            .await
    );
    assert!(matches!(err, AuditError::Generator(GeneratorError::Transient(_))));
}
