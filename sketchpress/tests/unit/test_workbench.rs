//! Workbench session tests: generate, deploy, audit, repair

mod common;

use std::sync::Arc;

use tokio_test::{assert_err, assert_ok};

use common::{audit_answer, fast_settings, fenced_html, Fault, FakeGenerator, FakeHost, Op};
use sketchpress::app::options::AppOptions;
use sketchpress::app::workbench::Workbench;
use sketchpress::deploy::cancel::CancelSignal;
use sketchpress::errors::{AppError, DeployError};
use sketchpress::generator::sketch::SketchImage;
use sketchpress::models::{DeployableContent, RepositoryRef};
use sketchpress::progress::sinks::RecordingSink;

const FIRST: &str = "<html><body><button>Go</button></body></html>";
const REPAIRED: &str = "<html><body><button aria-label=\"Go\">Go</button></body></html>";
const URL: &str = "https://alice.github.io/site/";

fn options() -> AppOptions {
    AppOptions {
        orchestrator: fast_settings(),
        ..Default::default()
    }
}

fn workbench(host: &Arc<FakeHost>, generator: &Arc<FakeGenerator>) -> Workbench {
    Workbench::new(host.clone(), generator.clone(), &options())
}

fn repo() -> RepositoryRef {
    RepositoryRef::parse("alice/site").unwrap()
}

fn sketch() -> SketchImage {
    SketchImage::from_bytes(b"\x89PNG fake sketch", "image/png")
}

fn aria_failure() -> String {
    audit_answer(&[("Semantic HTML5", "Passed", true), ("ARIA", "Missing labels", false)])
}

#[tokio::test]
async fn test_repair_invalidates_live_deployment_until_redeploy() {
    let host = Arc::new(FakeHost::new("alice"));
    let generator = Arc::new(
        FakeGenerator::new()
            .reply(fenced_html(FIRST))
            .reply(aria_failure())
            .reply(fenced_html(REPAIRED))
            .reply(audit_answer(&[("ARIA", "Passed", true)])),
    );
    let mut bench = workbench(&host, &generator);
    let sink = RecordingSink::new();

    let content = assert_ok!(bench.generate_from_sketch(&sketch()).await);
    assert_eq!(content.as_text(), FIRST);
    assert_eq!(generator.requests()[0].attachments.len(), 1);

    assert_ok!(bench.deploy(&repo(), &sink, &CancelSignal::never()).await);
    assert_eq!(bench.live_url(), Some(URL));

    let findings = assert_ok!(bench.audit().await);
    assert_eq!(findings.failing().len(), 1);

    let outcome = assert_ok!(bench.repair().await);
    assert!(outcome.is_repaired());
    assert_eq!(bench.content().unwrap().as_text(), REPAIRED);
    assert!(bench.live().unwrap().is_stale());
    assert_eq!(bench.live_url(), None);
    assert!(bench.last_findings().is_none());

    // The stale URL no longer shows the current page
    let err = assert_err!(bench.audit().await);
    assert!(matches!(err, AppError::NoLiveDeployment));

    assert_ok!(bench.deploy(&repo(), &sink, &CancelSignal::never()).await);
    assert_eq!(host.file("alice/site", "index.html").unwrap(), REPAIRED.as_bytes());
    assert_eq!(bench.live_url(), Some(URL));

    let findings = assert_ok!(bench.audit().await);
    assert!(!findings.has_failures());
}

#[tokio::test]
async fn test_cycle_repairs_and_redeploys_until_audit_passes() {
    let host = Arc::new(FakeHost::new("alice"));
    let generator = Arc::new(
        FakeGenerator::new()
            .reply(aria_failure())
            .reply(fenced_html(REPAIRED))
            .reply(audit_answer(&[("ARIA", "Passed", true)])),
    );
    let mut bench = workbench(&host, &generator);
    bench.set_content(DeployableContent::from_text(FIRST));
    let sink = RecordingSink::new();

    let report = assert_ok!(bench.cycle(&repo(), 3, &sink, &CancelSignal::never()).await);

    assert_eq!(report.rounds, 2);
    assert!(report.remaining.is_empty());
    assert_eq!(report.url, URL);
    assert_eq!(host.count(Op::PutFile), 2);
    assert_eq!(host.file("alice/site", "index.html").unwrap(), REPAIRED.as_bytes());
}

#[tokio::test]
async fn test_cycle_stops_at_round_limit() {
    let host = Arc::new(FakeHost::new("alice"));
    let generator = Arc::new(FakeGenerator::new().reply(aria_failure()));
    let mut bench = workbench(&host, &generator);
    bench.set_content(DeployableContent::from_text(FIRST));
    let sink = RecordingSink::new();

    let report = assert_ok!(bench.cycle(&repo(), 1, &sink, &CancelSignal::never()).await);

    assert_eq!(report.rounds, 1);
    assert_eq!(report.remaining.len(), 1);
    assert_eq!(report.remaining[0].line(), "ARIA: Missing labels");
    // No repair after the last round
    assert_eq!(generator.calls(), 1);
    assert_eq!(host.count(Op::PutFile), 1);
}

#[tokio::test]
async fn test_set_content_invalidates_only_on_change() {
    let host = Arc::new(FakeHost::new("alice"));
    let generator = Arc::new(FakeGenerator::new());
    let mut bench = workbench(&host, &generator);
    let sink = RecordingSink::new();

    bench.set_content(DeployableContent::from_text(FIRST));
    assert_ok!(bench.deploy(&repo(), &sink, &CancelSignal::never()).await);

    bench.set_content(DeployableContent::from_text(FIRST));
    assert_eq!(bench.live_url(), Some(URL));

    bench.set_content(DeployableContent::from_text(REPAIRED));
    assert_eq!(bench.live_url(), None);
    assert_eq!(bench.live().unwrap().last_known_url(), URL);
}

#[tokio::test]
async fn test_actions_require_their_inputs() {
    let host = Arc::new(FakeHost::new("alice"));
    let generator = Arc::new(FakeGenerator::new());
    let mut bench = workbench(&host, &generator);
    let sink = RecordingSink::new();

    let err = assert_err!(bench.deploy(&repo(), &sink, &CancelSignal::never()).await);
    assert!(matches!(err, AppError::NoContent));

    bench.set_content(DeployableContent::from_text(FIRST));
    let err = assert_err!(bench.audit().await);
    assert!(matches!(err, AppError::NoLiveDeployment));

    let err = assert_err!(bench.repair().await);
    assert!(matches!(err, AppError::NoFindings));

    assert!(host.calls().is_empty());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_failed_deploy_keeps_previous_state() {
    let host = Arc::new(FakeHost::new("alice").fail(Op::GetRepository, Fault::Unauthorized));
    let generator = Arc::new(FakeGenerator::new());
    let mut bench = workbench(&host, &generator);
    bench.set_content(DeployableContent::from_text(FIRST));
    let sink = RecordingSink::new();

    let err = assert_err!(bench.deploy(&repo(), &sink, &CancelSignal::never()).await);

    assert!(matches!(err, AppError::Deploy(DeployError::Unauthorized(_))));
    assert!(bench.live().is_none());
    assert!(sink.last().unwrap().error.is_some());
}
