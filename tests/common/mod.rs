//! Shared test infrastructure: stub gateway and store seeding helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use autoposter::gateway::Gateway;
use autoposter::store::{Account, AccountsStore, Setup, SubscriptionsStore};

/// Gateway stub with scriptable validation/delivery results and call counters.
pub struct StubGateway {
    valid: AtomicBool,
    send_ok: AtomicBool,
    sends: AtomicUsize,
    validations: AtomicUsize,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            valid: AtomicBool::new(true),
            send_ok: AtomicBool::new(true),
            sends: AtomicUsize::new(0),
            validations: AtomicUsize::new(0),
        }
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }

    pub fn set_send_ok(&self, ok: bool) {
        self.send_ok.store(ok, Ordering::SeqCst);
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn validations(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Gateway for StubGateway {
    async fn validate_token(&self, _token: &str) -> bool {
        self.validations.fetch_add(1, Ordering::SeqCst);
        self.valid.load(Ordering::SeqCst)
    }

    async fn send_message(&self, _token: &str, _channel_id: &str, _content: &str) -> bool {
        self.sends.fetch_add(1, Ordering::SeqCst);
        self.send_ok.load(Ordering::SeqCst)
    }
}

pub fn accounts_store(dir: &tempfile::TempDir) -> AccountsStore {
    AccountsStore::new(dir.path().join("accounts.json"))
}

pub fn subscriptions_store(dir: &tempfile::TempDir) -> SubscriptionsStore {
    SubscriptionsStore::new(dir.path().join("subscriptions.json"))
}

/// A setup for loop tests: one-shot friendly intervals, running flag chosen
/// by the caller.
pub fn test_setup(channel: &str, interval_min: f64, running: bool) -> Setup {
    Setup {
        channel: channel.into(),
        message: "ping".into(),
        interval: interval_min,
        random_interval: 0.0,
        running,
        ..Setup::default()
    }
}

/// Seed an account with a token and named setups.
pub async fn seed_account(
    store: &AccountsStore,
    user_id: &str,
    token: Option<&str>,
    setups: Vec<(&str, Setup)>,
) {
    let user = user_id.to_string();
    let token = token.map(str::to_string);
    let setups: Vec<(String, Setup)> = setups
        .into_iter()
        .map(|(n, s)| (n.to_string(), s))
        .collect();
    store
        .update(move |doc| {
            let account = doc.accounts.entry(user).or_insert_with(Account::default);
            account.token = token;
            for (name, setup) in setups {
                account.setups.insert(name, setup);
            }
        })
        .await
        .unwrap();
}

/// Poll a condition until it holds or the attempt budget runs out.
pub async fn wait_until<F, Fut>(mut cond: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..200 {
        if cond().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
