//! End-to-end synchronisation cycles against a fake proxy binary.

use ingress_reloader::sync::SyncOutcome;
use ingress_reloader::SyncError;
use tempfile::TempDir;

mod common;

use common::{single_server_state, Harness};

#[tokio::test]
async fn first_sync_commits_and_reloads_once() {
    let h = Harness::new();
    let state = single_server_state("x.com", "app");

    let outcome = h.controller.synchronize(&state).await.unwrap();

    assert!(outcome.reloaded());
    let rendered = String::from_utf8(outcome.config().to_vec()).unwrap();
    assert!(rendered.contains("server_name x.com;"));
    assert!(rendered.contains("server 10.0.0.4:8080"));

    assert_eq!(h.fake.check_count(), 1);
    assert_eq!(h.fake.reload_count(), 1);
    assert_eq!(h.fake.last_checked().as_deref(), Some(outcome.config()));
    assert_eq!(h.committed().as_deref(), Some(outcome.config()));
    assert_eq!(h.leftover_artifacts(), 0);
}

#[tokio::test]
async fn identical_state_does_not_reload_again() {
    let h = Harness::new();
    let state = single_server_state("x.com", "app");

    h.controller.synchronize(&state).await.unwrap();
    let committed = h.committed().unwrap();

    let second = h.controller.synchronize(&state).await.unwrap();

    assert!(matches!(second, SyncOutcome::Unchanged { .. }));
    assert_eq!(h.fake.reload_count(), 1);
    assert_eq!(h.committed().unwrap(), committed);
}

#[tokio::test]
async fn changed_state_reloads_again() {
    let h = Harness::new();

    h.controller
        .synchronize(&single_server_state("x.com", "app"))
        .await
        .unwrap();
    let outcome = h
        .controller
        .synchronize(&single_server_state("y.com", "app"))
        .await
        .unwrap();

    assert!(outcome.reloaded());
    assert_eq!(h.fake.reload_count(), 2);
    let committed = String::from_utf8(h.committed().unwrap()).unwrap();
    assert!(committed.contains("server_name y.com;"));
    assert!(!committed.contains("server_name x.com;"));
}

#[tokio::test]
async fn invalid_candidate_leaves_committed_config_untouched() {
    let h = Harness::new();
    h.controller
        .synchronize(&single_server_state("x.com", "app"))
        .await
        .unwrap();
    let before = h.committed().unwrap();

    h.fake.reject_configs(true);
    let err = h
        .controller
        .synchronize(&single_server_state("y.com", "app"))
        .await
        .unwrap_err();

    match &err {
        SyncError::Validation {
            checker,
            diagnostics,
        } => {
            assert_eq!(checker, "fake-nginx");
            assert!(diagnostics.contains("unknown directive"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(err.kind(), "invalid");
    assert_eq!(h.committed().unwrap(), before);
    assert_eq!(h.fake.reload_count(), 1);
    assert_eq!(h.leftover_artifacts(), 0);
}

#[tokio::test]
async fn invalid_first_candidate_creates_nothing() {
    let h = Harness::new();
    h.fake.reject_configs(true);

    let err = h
        .controller
        .synchronize(&single_server_state("x.com", "app"))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Validation { .. }));
    assert!(h.committed().is_none());
    assert_eq!(h.fake.reload_count(), 0);
}

#[tokio::test]
async fn failed_reload_signal_keeps_persisted_config() {
    let h = Harness::new();
    h.fake.fail_reloads(true);

    let err = h
        .controller
        .synchronize(&single_server_state("x.com", "app"))
        .await
        .unwrap_err();

    match &err {
        SyncError::ReloadSignal { reason } => assert!(reason.contains("exit status 1")),
        other => panic!("expected reload signal error, got {other:?}"),
    }
    let committed = String::from_utf8(h.committed().unwrap()).unwrap();
    assert!(committed.contains("server_name x.com;"));

    // Same bytes, but the proxy never applied them: the retry signals again.
    h.fake.fail_reloads(false);
    let retry = h
        .controller
        .synchronize(&single_server_state("x.com", "app"))
        .await
        .unwrap();
    assert!(retry.reloaded());
    assert_eq!(h.fake.reload_count(), 2);

    let settled = h
        .controller
        .synchronize(&single_server_state("x.com", "app"))
        .await
        .unwrap();
    assert!(!settled.reloaded());
    assert_eq!(h.fake.reload_count(), 2);
}

#[tokio::test]
async fn failed_signal_is_retried_until_it_succeeds() {
    let h = Harness::new();
    h.fake.fail_reloads(true);
    let state = single_server_state("x.com", "app");

    assert!(h.controller.synchronize(&state).await.is_err());
    assert!(h.controller.synchronize(&state).await.is_err());
    assert_eq!(h.fake.reload_count(), 2);

    h.fake.fail_reloads(false);
    assert!(h.controller.synchronize(&state).await.unwrap().reloaded());
    assert_eq!(h.fake.reload_count(), 3);
}

#[tokio::test]
async fn hash_sizing_never_shrinks() {
    let h = Harness::new();
    let long_host = format!("{}.example.com", "a".repeat(100));

    h.controller
        .synchronize(&single_server_state(&long_host, "app"))
        .await
        .unwrap();
    let raised = h.controller.sizing_floor();
    assert_eq!(raised.bucket_size, 128);

    let outcome = h
        .controller
        .synchronize(&single_server_state("x.com", "app"))
        .await
        .unwrap();

    let rendered = String::from_utf8(outcome.config().to_vec()).unwrap();
    assert!(rendered.contains("server_names_hash_bucket_size 128;"));
    assert!(h.controller.sizing_floor().bucket_size >= raised.bucket_size);
    assert!(h.controller.sizing_floor().max_size >= raised.max_size);
}

#[tokio::test]
async fn seed_commits_without_signalling() {
    let h = Harness::new();

    h.controller
        .seed(&single_server_state("x.com", "app"))
        .await
        .unwrap();

    assert!(h.committed().is_some());
    assert_eq!(h.fake.check_count(), 1);
    assert_eq!(h.fake.reload_count(), 0);
}

#[tokio::test]
async fn broken_template_reload_keeps_previous_renderer() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("nginx.tmpl");
    std::fs::write(
        &template,
        "{% for s in servers %}server_name {{ s.hostname }};\n{% endfor %}",
    )
    .unwrap();
    let h = Harness::with_template(dir, &template);

    std::fs::write(&template, "{% for s in servers %}server_name {{ s.hostname }};").unwrap();
    assert!(h.templates.reload().is_err());
    assert_eq!(h.templates.generation(), 1);

    let outcome = h
        .controller
        .synchronize(&single_server_state("x.com", "app"))
        .await
        .unwrap();
    assert_eq!(outcome.config(), b"server_name x.com;\n");

    std::fs::write(&template, "# {{ servers | length }} servers\n").unwrap();
    assert_eq!(h.templates.reload().unwrap(), 2);

    let outcome = h
        .controller
        .synchronize(&single_server_state("x.com", "app"))
        .await
        .unwrap();
    assert_eq!(outcome.config(), b"# 1 servers\n");
    assert_eq!(h.fake.reload_count(), 2);
}
