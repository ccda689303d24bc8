//! Supervisor lifecycle: handle uniqueness, rehydration, stop latency and
//! credential auto-deactivation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use autoposter::autopost::{Supervisor, TaskKey};

use common::{accounts_store, seed_account, test_setup, wait_until, StubGateway};

#[tokio::test]
async fn start_twice_yields_exactly_one_handle() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    let gateway = Arc::new(StubGateway::new());
    // Long interval so the loop stays parked in its delay.
    seed_account(&store, "42", Some("tok"), vec![("daily", test_setup("c1", 60.0, false))]).await;

    let supervisor = Supervisor::new(store.clone(), gateway.clone());
    supervisor.start("42", "daily").await.unwrap();
    supervisor.start("42", "daily").await.unwrap();

    assert_eq!(supervisor.running_keys().await.len(), 1);
    assert!(supervisor.is_running(&TaskKey::new("42", "daily")).await);

    // Only the single live loop delivers.
    assert!(wait_until(|| async { gateway.sends() >= 1 }).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(gateway.sends(), 1);
}

#[tokio::test]
async fn rehydrate_starts_running_setups_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    let gateway = Arc::new(StubGateway::new());
    seed_account(
        &store,
        "42",
        Some("tok"),
        vec![
            ("a", test_setup("c1", 60.0, true)),
            ("b", test_setup("c2", 60.0, true)),
            ("idle", test_setup("c3", 60.0, false)),
        ],
    )
    .await;

    let supervisor = Supervisor::new(store, gateway);
    let started = supervisor.rehydrate().await.unwrap();
    assert_eq!(started, 2);
    assert_eq!(supervisor.running_keys().await.len(), 2);

    // Second run finds the live handles and starts nothing.
    let started_again = supervisor.rehydrate().await.unwrap();
    assert_eq!(started_again, 0);
    assert_eq!(supervisor.running_keys().await.len(), 2);
}

#[tokio::test]
async fn rehydrate_skips_accounts_without_token() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    seed_account(&store, "orphan", None, vec![("a", test_setup("c1", 60.0, true))]).await;

    let supervisor = Supervisor::new(store, Arc::new(StubGateway::new()));
    assert_eq!(supervisor.rehydrate().await.unwrap(), 0);
    assert!(supervisor.running_keys().await.is_empty());
}

#[tokio::test]
async fn start_with_invalid_token_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    let gateway = Arc::new(StubGateway::new());
    gateway.set_valid(false);
    seed_account(&store, "42", Some("tok"), vec![("daily", test_setup("c1", 60.0, false))]).await;

    let supervisor = Supervisor::new(store.clone(), gateway);
    assert!(matches!(
        supervisor.start("42", "daily").await,
        Err(autoposter::Error::InvalidToken)
    ));

    // Nothing was spawned and the flag was never flipped.
    assert!(supervisor.running_keys().await.is_empty());
    let doc = store.load().await.unwrap();
    assert!(!doc.setup("42", "daily").unwrap().running);
}

#[tokio::test]
async fn stop_flips_flag_and_loop_exits_at_cycle_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    let gateway = Arc::new(StubGateway::new());
    // Near-zero cycle so the flag is observed quickly.
    seed_account(&store, "42", Some("tok"), vec![("fast", test_setup("c1", 0.01, false))]).await;

    let supervisor = Supervisor::new(store.clone(), gateway);
    supervisor.start("42", "fast").await.unwrap();
    assert!(supervisor.is_running(&TaskKey::new("42", "fast")).await);

    supervisor.stop("42", "fast").await.unwrap();
    let doc = store.load().await.unwrap();
    assert!(!doc.setup("42", "fast").unwrap().running);

    let supervisor2 = supervisor.clone();
    assert!(
        wait_until(|| {
            let s = supervisor2.clone();
            async move { !s.is_running(&TaskKey::new("42", "fast")).await }
        })
        .await,
        "loop should exit shortly after observing running=false"
    );
}

#[tokio::test]
async fn invalid_token_autodeactivates_rehydrated_setup() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    let gateway = Arc::new(StubGateway::new());
    gateway.set_valid(false);
    seed_account(&store, "42", Some("dead"), vec![("daily", test_setup("c1", 60.0, true))]).await;

    let supervisor = Supervisor::new(store.clone(), gateway.clone());
    assert_eq!(supervisor.rehydrate().await.unwrap(), 1);

    let store2 = store.clone();
    assert!(
        wait_until(|| {
            let s = store2.clone();
            async move {
                s.load()
                    .await
                    .map(|doc| !doc.setup("42", "daily").unwrap().running)
                    .unwrap_or(false)
            }
        })
        .await,
        "running flag should be persisted false after the failed validation"
    );
    assert!(
        wait_until(|| {
            let s = supervisor.clone();
            async move { s.running_keys().await.is_empty() }
        })
        .await
    );
    assert_eq!(gateway.sends(), 0);
}

#[tokio::test]
async fn stop_all_flips_every_flag() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    seed_account(
        &store,
        "42",
        Some("tok"),
        vec![
            ("a", test_setup("c1", 60.0, true)),
            ("b", test_setup("c2", 60.0, true)),
        ],
    )
    .await;

    let supervisor = Supervisor::new(store.clone(), Arc::new(StubGateway::new()));
    assert_eq!(supervisor.stop_all("42").await.unwrap(), 2);

    let doc = store.load().await.unwrap();
    assert!(doc.accounts["42"].setups.values().all(|s| !s.running));
}

#[tokio::test]
async fn start_all_spawns_every_setup() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    seed_account(
        &store,
        "42",
        Some("tok"),
        vec![
            ("a", test_setup("c1", 60.0, false)),
            ("b", test_setup("c2", 60.0, false)),
        ],
    )
    .await;

    let supervisor = Supervisor::new(store.clone(), Arc::new(StubGateway::new()));
    assert_eq!(supervisor.start_all("42").await.unwrap(), 2);
    assert_eq!(supervisor.running_keys().await.len(), 2);

    let doc = store.load().await.unwrap();
    assert!(doc.accounts["42"].setups.values().all(|s| s.running));
}

#[tokio::test]
async fn unknown_setup_and_account_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    seed_account(&store, "42", Some("tok"), vec![]).await;

    let supervisor = Supervisor::new(store, Arc::new(StubGateway::new()));
    assert!(matches!(
        supervisor.start("42", "missing").await,
        Err(autoposter::Error::SetupNotFound(_))
    ));
    assert!(matches!(
        supervisor.start("99", "missing").await,
        Err(autoposter::Error::AccountNotFound(_))
    ));
    assert!(matches!(
        supervisor.stop("42", "missing").await,
        Err(autoposter::Error::SetupNotFound(_))
    ));
}
