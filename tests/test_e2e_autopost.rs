//! End-to-end posting scenarios under tokio's paused clock: virtual time
//! auto-advances across the loop delays, so multi-cycle behavior is checked
//! without real waiting.

mod common;

use std::sync::Arc;
use std::time::Duration;

use autoposter::autopost::{Supervisor, TaskKey};

use common::{accounts_store, seed_account, test_setup, StubGateway};

#[tokio::test(start_paused = true)]
async fn two_sends_within_six_seconds() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    let gateway = Arc::new(StubGateway::new());
    // 0.1 min = 6 s base interval, no jitter.
    seed_account(&store, "42", Some("tok"), vec![("fast", test_setup("123", 0.1, false))]).await;

    let supervisor = Supervisor::new(store, gateway.clone());
    supervisor.start("42", "fast").await.unwrap();

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert!(
        gateway.sends() >= 2,
        "expected at least 2 sends in 6s, got {}",
        gateway.sends()
    );
}

#[tokio::test(start_paused = true)]
async fn send_failures_do_not_stop_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    let gateway = Arc::new(StubGateway::new());
    gateway.set_send_ok(false);
    seed_account(&store, "42", Some("tok"), vec![("fast", test_setup("123", 0.1, false))]).await;

    let supervisor = Supervisor::new(store.clone(), gateway.clone());
    supervisor.start("42", "fast").await.unwrap();

    tokio::time::sleep(Duration::from_secs(13)).await;
    assert!(gateway.sends() >= 2, "loop must keep cycling through failures");
    assert!(supervisor.is_running(&TaskKey::new("42", "fast")).await);
    let doc = store.load().await.unwrap();
    assert!(doc.setup("42", "fast").unwrap().running);
}

#[tokio::test(start_paused = true)]
async fn empty_channel_terminates_the_loop_without_clearing_the_flag() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    let gateway = Arc::new(StubGateway::new());
    seed_account(&store, "42", Some("tok"), vec![("broken", test_setup("", 0.1, true))]).await;

    let supervisor = Supervisor::new(store.clone(), gateway.clone());
    assert_eq!(supervisor.rehydrate().await.unwrap(), 1);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(supervisor.running_keys().await.is_empty());
    assert_eq!(gateway.sends(), 0);

    // Misconfiguration is terminal but not auto-repaired.
    let doc = store.load().await.unwrap();
    assert!(doc.setup("42", "broken").unwrap().running);
}

#[tokio::test(start_paused = true)]
async fn corrupt_store_pauses_the_loop_and_posting_resumes_after_repair() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    let gateway = Arc::new(StubGateway::new());
    seed_account(&store, "42", Some("tok"), vec![("fast", test_setup("123", 0.1, false))]).await;

    let supervisor = Supervisor::new(store.clone(), gateway.clone());
    supervisor.start("42", "fast").await.unwrap();

    // Clobber the accounts file under the running loop, keeping the good
    // bytes around to restore later.
    let path = dir.path().join("accounts.json");
    let good = std::fs::read(&path).unwrap();
    std::fs::write(&path, b"{ not json").unwrap();

    // The next flag read fails; the loop must pause instead of dying.
    tokio::time::sleep(Duration::from_secs(10)).await;
    let sends_during_outage = gateway.sends();
    assert!(supervisor.is_running(&TaskKey::new("42", "fast")).await);

    std::fs::write(&path, good).unwrap();

    // Longest recovery path: 60 s pause, then a fresh cycle.
    tokio::time::sleep(Duration::from_secs(70)).await;
    assert!(
        gateway.sends() > sends_during_outage,
        "loop must resume sending once the store reads again"
    );
    assert!(supervisor.is_running(&TaskKey::new("42", "fast")).await);
}

#[tokio::test(start_paused = true)]
async fn deleted_setup_reads_as_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let store = accounts_store(&dir);
    let gateway = Arc::new(StubGateway::new());
    seed_account(&store, "42", Some("tok"), vec![("gone", test_setup("123", 0.1, false))]).await;

    let supervisor = Supervisor::new(store.clone(), gateway);
    supervisor.start("42", "gone").await.unwrap();

    autoposter::setups::delete_setup(&store, "42", "gone").await.unwrap();

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert!(supervisor.running_keys().await.is_empty());
}
