//! Deployment orchestrator tests against the in-memory host

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use common::{fast_settings, Call, FakeHost, Fault, Op};
use sketchpress::deploy::cancel::{CancelHandle, CancelSignal};
use sketchpress::deploy::orchestrator::{Orchestrator, OrchestratorSettings, SettleStrategy};
use sketchpress::errors::{DeployError, FailureKind};
use sketchpress::models::{DeployableContent, RepositoryRef};
use sketchpress::progress::sinks::RecordingSink;
use sketchpress::progress::{DeployStep, ProgressEvent};
use sketchpress::utils::PollBackoff;

fn alice_site() -> RepositoryRef {
    RepositoryRef::parse("alice/site").unwrap()
}

fn page() -> DeployableContent {
    DeployableContent::from_text("<!DOCTYPE html><html><body><h1>Hello</h1></body></html>")
}

#[tokio::test]
async fn test_absent_repo_goes_through_every_step() {
    let host = Arc::new(FakeHost::new("alice"));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let sink = RecordingSink::new();

    let handle = assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &sink, &CancelSignal::never())
            .await
    );

    assert_eq!(
        sink.steps(),
        vec![
            DeployStep::CheckingRepo,
            DeployStep::CreatingRepo,
            DeployStep::UploadingContent,
            DeployStep::EnablingHosting,
            DeployStep::Complete,
        ]
    );
    assert_eq!(handle.url(), Some("https://alice.github.io/site/"));
    assert!(sink.last().unwrap().is_terminal());

    assert!(host.has_repo("alice/site"));
    assert!(host.has_pages("alice/site"));
    assert_eq!(host.file("alice/site", "index.html").unwrap(), page().bytes());
    assert!(host.calls().contains(&Call::EnableHosting {
        repo: "alice/site".to_string(),
        branch: "main".to_string(),
        path: "/".to_string(),
    }));
}

#[tokio::test]
async fn test_existing_repo_skips_creation() {
    let host = Arc::new(FakeHost::new("alice").with_repo("alice/site"));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let sink = RecordingSink::new();

    assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &sink, &CancelSignal::never())
            .await
    );

    assert!(!sink.steps().contains(&DeployStep::CreatingRepo));
    assert_eq!(host.count(Op::CreateRepository), 0);
}

#[tokio::test]
async fn test_deploy_twice_is_idempotent() {
    let host = Arc::new(FakeHost::new("alice"));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let cancel = CancelSignal::never();

    let first = assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &RecordingSink::new(), &cancel)
            .await
    );
    let sink = RecordingSink::new();
    let second = assert_ok!(orchestrator.deploy(&alice_site(), &page(), &sink, &cancel).await);

    assert_eq!(first.url(), second.url());
    assert_eq!(sink.last().unwrap().step, DeployStep::Complete);

    // Second run finds the repository, the identical file and hosting already on
    assert_eq!(host.count(Op::CreateRepository), 1);
    assert_eq!(host.count(Op::PutFile), 1);
    assert_eq!(host.count(Op::EnableHosting), 2);
    assert_eq!(first.revision(), second.revision());
}

#[tokio::test]
async fn test_missing_file_is_written_without_precondition() {
    let host = Arc::new(FakeHost::new("alice").with_repo("alice/site"));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());

    assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &RecordingSink::new(), &CancelSignal::never())
            .await
    );

    assert_eq!(host.puts(), vec![None]);
}

#[tokio::test]
async fn test_existing_file_is_written_against_its_revision() {
    let host = Arc::new(
        FakeHost::new("alice")
            .with_repo("alice/site")
            .with_file("alice/site", "index.html", b"<p>old</p>"),
    );
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());

    let handle = assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &RecordingSink::new(), &CancelSignal::never())
            .await
    );

    assert_eq!(host.puts(), vec![Some("rev-1".to_string())]);
    assert_eq!(handle.revision().map(|r| r.as_str()), Some("rev-2"));
}

#[tokio::test]
async fn test_single_conflict_is_retried_once() {
    let host = Arc::new(
        FakeHost::new("alice")
            .with_repo("alice/site")
            .with_file("alice/site", "index.html", b"<p>old</p>")
            .conflict_next_puts(1),
    );
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());

    assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &RecordingSink::new(), &CancelSignal::never())
            .await
    );

    // The tag is re-read before the second write
    assert_eq!(host.count(Op::GetFile), 2);
    assert_eq!(host.count(Op::PutFile), 2);
    assert_eq!(host.file("alice/site", "index.html").unwrap(), page().bytes());
}

#[tokio::test]
async fn test_repeated_conflicts_fail_after_two_writes() {
    let host = Arc::new(
        FakeHost::new("alice")
            .with_repo("alice/site")
            .conflict_next_puts(3),
    );
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let sink = RecordingSink::new();

    let err = assert_err!(
        orchestrator
            .deploy(&alice_site(), &page(), &sink, &CancelSignal::never())
            .await
    );

    assert_eq!(err.kind(), FailureKind::Conflict);
    assert_eq!(host.count(Op::PutFile), 2);
    assert_eq!(host.count(Op::EnableHosting), 0);

    let last = sink.last().unwrap();
    assert!(last.is_terminal());
    assert_eq!(last.error.as_deref(), Some(err.user_message().as_str()));
}

#[tokio::test]
async fn test_hosting_already_enabled_is_success() {
    let host = Arc::new(
        FakeHost::new("alice")
            .with_repo("alice/site")
            .with_pages("alice/site"),
    );
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let sink = RecordingSink::new();

    let handle = assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &sink, &CancelSignal::never())
            .await
    );

    assert_eq!(handle.url(), Some("https://alice.github.io/site/"));
    assert_eq!(sink.last().unwrap().step, DeployStep::Complete);
}

#[tokio::test]
async fn test_repository_lookup_timeout_is_transient() {
    let host = Arc::new(FakeHost::new("alice").delay(Op::GetRepository, Duration::from_millis(500)));
    let settings = OrchestratorSettings {
        call_timeout: Duration::from_millis(50),
        ..fast_settings()
    };
    let orchestrator = Orchestrator::new(host.clone(), settings);
    let sink = RecordingSink::new();

    let err = assert_err!(
        orchestrator
            .deploy(&alice_site(), &page(), &sink, &CancelSignal::never())
            .await
    );

    assert_eq!(err.kind(), FailureKind::Transient);
    assert_eq!(host.count(Op::CreateRepository), 0);
    assert_eq!(sink.last().unwrap().step, DeployStep::Idle);
}

#[tokio::test]
async fn test_server_error_is_not_shown_verbatim() {
    let host = Arc::new(FakeHost::new("alice").fail(Op::GetRepository, Fault::Transient));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let sink = RecordingSink::new();

    let err = assert_err!(
        orchestrator
            .deploy(&alice_site(), &page(), &sink, &CancelSignal::never())
            .await
    );

    assert_eq!(err.kind(), FailureKind::Transient);
    for event in sink.events() {
        assert!(!event.message.contains("502"));
        assert!(!event.error.unwrap_or_default().contains("Bad Gateway"));
    }
}

#[tokio::test]
async fn test_unauthorized_is_surfaced_distinctly() {
    let host = Arc::new(
        FakeHost::new("alice")
            .with_repo("alice/site")
            .fail(Op::PutFile, Fault::Unauthorized),
    );
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());

    let err = assert_err!(
        orchestrator
            .deploy(&alice_site(), &page(), &RecordingSink::new(), &CancelSignal::never())
            .await
    );

    assert!(matches!(err, DeployError::Unauthorized(_)));
    // Never retried
    assert_eq!(host.count(Op::PutFile), 1);
}

#[tokio::test]
async fn test_create_conflict_means_repository_exists() {
    let host = Arc::new(FakeHost::new("alice").fail(Op::CreateRepository, Fault::Conflict));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());

    assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &RecordingSink::new(), &CancelSignal::never())
            .await
    );
    assert_eq!(host.count(Op::PutFile), 1);
}

#[tokio::test]
async fn test_malformed_path_fails_before_any_remote_call() {
    // A valid repository that a URL-mangled path could otherwise reach
    let host = Arc::new(FakeHost::new("alice").with_repo("alice/site"));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());

    for path in [
        "alice",
        "alice/",
        "/site",
        "a/b/c",
        "alice/my site",
        "alice/site?x=1",
        "alice/site#frag",
        "alice/a%2Fb",
        "alice/..",
    ] {
        let sink = RecordingSink::new();
        let err = assert_err!(
            orchestrator
                .deploy_path(path, &page(), &sink, &CancelSignal::never())
                .await
        );
        assert_eq!(err.kind(), FailureKind::Validation, "{}", path);
        assert!(sink.last().unwrap().error.is_some());
    }

    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_empty_content_is_rejected() {
    let host = Arc::new(FakeHost::new("alice"));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());

    let err = assert_err!(
        orchestrator
            .deploy(
                &alice_site(),
                &DeployableContent::new(Vec::new()),
                &RecordingSink::new(),
                &CancelSignal::never()
            )
            .await
    );
    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(host.calls().is_empty());
}

#[tokio::test]
async fn test_progress_is_emitted_before_each_remote_call() {
    let host = Arc::new(FakeHost::new("alice"));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());

    let seen: Mutex<Vec<(DeployStep, usize)>> = Mutex::new(Vec::new());
    let observer = host.clone();
    let sink = |event: &ProgressEvent| {
        seen.lock().unwrap().push((event.step, observer.calls().len()));
    };

    assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &sink, &CancelSignal::never())
            .await
    );

    // (step, host calls made before the event)
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (DeployStep::CheckingRepo, 0),
            (DeployStep::CreatingRepo, 1),
            (DeployStep::UploadingContent, 2),
            (DeployStep::EnablingHosting, 4),
            (DeployStep::Complete, 5),
        ]
    );
}

#[tokio::test]
async fn test_concurrent_deploy_of_same_repo_is_rejected() {
    let host = Arc::new(
        FakeHost::new("alice")
            .with_repo("alice/site")
            .delay(Op::GetRepository, Duration::from_millis(100)),
    );
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let cancel = CancelSignal::never();
    let (first_sink, second_sink) = (RecordingSink::new(), RecordingSink::new());

    let (repo, content) = (alice_site(), page());
    let (first, second) = tokio::join!(
        orchestrator.deploy(&repo, &content, &first_sink, &cancel),
        orchestrator.deploy(&repo, &content, &second_sink, &cancel),
    );

    assert_ok!(first);
    let err = assert_err!(second);
    assert_eq!(err.kind(), FailureKind::AlreadyInFlight);
    assert_eq!(second_sink.events().len(), 1);
    assert_eq!(host.count(Op::GetRepository), 1);

    // Released once the first run ended
    assert!(!orchestrator.is_deploying(&alice_site()));
    assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &RecordingSink::new(), &cancel)
            .await
    );
}

#[tokio::test]
async fn test_same_repo_in_other_case_is_rejected() {
    let host = Arc::new(
        FakeHost::new("alice")
            .with_repo("alice/site")
            .delay(Op::GetRepository, Duration::from_millis(100)),
    );
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let cancel = CancelSignal::never();
    let (first_sink, second_sink) = (RecordingSink::new(), RecordingSink::new());
    let (lower, mixed) = (alice_site(), RepositoryRef::parse("Alice/Site").unwrap());
    let content = page();

    let (first, second) = tokio::join!(
        orchestrator.deploy(&lower, &content, &first_sink, &cancel),
        orchestrator.deploy(&mixed, &content, &second_sink, &cancel),
    );

    assert_ok!(first);
    assert_eq!(assert_err!(second).kind(), FailureKind::AlreadyInFlight);
    assert_eq!(host.count(Op::GetRepository), 1);
}

#[tokio::test]
async fn test_different_repos_deploy_concurrently() {
    let host = Arc::new(
        FakeHost::new("alice")
            .with_repo("alice/site")
            .with_repo("alice/blog")
            .delay(Op::GetRepository, Duration::from_millis(20)),
    );
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let cancel = CancelSignal::never();
    let repos = [alice_site(), RepositoryRef::parse("alice/blog").unwrap()];
    let sinks = [RecordingSink::new(), RecordingSink::new()];
    let content = page();

    let results = futures::future::join_all(
        repos
            .iter()
            .zip(sinks.iter())
            .map(|(repo, sink)| orchestrator.deploy(repo, &content, sink, &cancel)),
    )
    .await;

    for result in results {
        assert_ok!(result);
    }
    assert!(host.has_pages("alice/site"));
    assert!(host.has_pages("alice/blog"));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let host = Arc::new(FakeHost::new("alice"));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let handle = CancelHandle::new();
    handle.cancel();
    let sink = RecordingSink::new();

    let err = assert_err!(
        orchestrator
            .deploy(&alice_site(), &page(), &sink, &handle.signal())
            .await
    );

    assert!(matches!(err, DeployError::Cancelled));
    assert!(host.calls().is_empty());
    assert_eq!(sink.events().len(), 1);
}

#[tokio::test]
async fn test_cancel_stops_before_next_remote_call() {
    let host = Arc::new(FakeHost::new("alice").with_repo("alice/site"));
    let orchestrator = Orchestrator::new(host.clone(), fast_settings());
    let handle = CancelHandle::new();
    let signal = handle.signal();

    let steps = Mutex::new(Vec::new());
    let sink = |event: &ProgressEvent| {
        steps.lock().unwrap().push(event.step);
        if event.step == DeployStep::UploadingContent {
            handle.cancel();
        }
    };

    let err = assert_err!(orchestrator.deploy(&alice_site(), &page(), &sink, &signal).await);

    assert_eq!(err.kind(), FailureKind::Cancelled);
    assert_eq!(host.count(Op::GetFile), 0);
    assert_eq!(host.count(Op::PutFile), 0);
    assert_eq!(steps.lock().unwrap().last(), Some(&DeployStep::Idle));
}

#[tokio::test]
async fn test_cancel_interrupts_settle_wait() {
    let host = Arc::new(FakeHost::new("alice"));
    let settings = OrchestratorSettings {
        settle: SettleStrategy::Fixed(Duration::from_secs(60)),
        ..fast_settings()
    };
    let orchestrator = Orchestrator::new(host.clone(), settings);
    let handle = CancelHandle::new();
    let signal = handle.signal();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.deploy(&alice_site(), &page(), &RecordingSink::new(), &signal),
    )
    .await
    .expect("settle wait was not interrupted");

    assert!(matches!(result, Err(DeployError::Cancelled)));
    assert_eq!(host.count(Op::CreateRepository), 1);
    assert_eq!(host.count(Op::PutFile), 0);
}

#[tokio::test]
async fn test_poll_settle_checks_repository_again() {
    let host = Arc::new(FakeHost::new("alice"));
    let settings = OrchestratorSettings {
        settle: SettleStrategy::Poll {
            attempts: 3,
            backoff: PollBackoff {
                initial: Duration::from_millis(1),
                max: Duration::from_millis(5),
            },
        },
        ..fast_settings()
    };
    let orchestrator = Orchestrator::new(host.clone(), settings);

    assert_ok!(
        orchestrator
            .deploy(&alice_site(), &page(), &RecordingSink::new(), &CancelSignal::never())
            .await
    );

    // Initial lookup plus one poll that finds the new repository
    assert_eq!(host.count(Op::GetRepository), 2);
}
