//! Supervisor: owns the set of live posting loops.
//!
//! The handle map is only touched through supervisor methods; loop bodies
//! unregister themselves via [`Supervisor::unregister`] on every exit path.
//! At most one loop exists per `(user, setup)` key at any time.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::autopost::runner::run_setup_loop;
use crate::autopost::TaskKey;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::store::{AccountsStore, Setup};

#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

struct Inner {
    accounts: AccountsStore,
    gateway: Arc<dyn Gateway>,
    tasks: Mutex<HashMap<TaskKey, JoinHandle<()>>>,
}

impl Supervisor {
    pub fn new(accounts: AccountsStore, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            inner: Arc::new(Inner {
                accounts,
                gateway,
                tasks: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn accounts(&self) -> AccountsStore {
        self.inner.accounts.clone()
    }

    pub(crate) fn gateway(&self) -> Arc<dyn Gateway> {
        Arc::clone(&self.inner.gateway)
    }

    /// Restart every setup persisted as running. Called once at process
    /// startup. Setups whose account has no token are left alone and logged;
    /// keys that already have a live loop are skipped, so calling this again
    /// starts nothing new.
    pub async fn rehydrate(&self) -> Result<usize> {
        let doc = self.inner.accounts.load().await?;
        let mut started = 0;

        for (user_id, account) in &doc.accounts {
            let token = match &account.token {
                Some(t) => t.clone(),
                None => {
                    for (name, setup) in &account.setups {
                        if setup.running {
                            error!(
                                user_id,
                                setup = %name,
                                "setup marked running but account has no token, skipping"
                            );
                        }
                    }
                    continue;
                }
            };

            for (name, setup) in &account.setups {
                if !setup.running {
                    continue;
                }
                let key = TaskKey::new(user_id.clone(), name.clone());
                if self.spawn_if_absent(key.clone(), setup.clone(), token.clone()).await {
                    info!(task = %key, "rehydrated running setup");
                    started += 1;
                }
            }
        }

        info!(started, "rehydration complete");
        Ok(started)
    }

    /// Start one setup: validate the token eagerly, persist `running=true`,
    /// spawn the loop. A key with a live loop is a no-op.
    pub async fn start(&self, user_id: &str, setup_name: &str) -> Result<()> {
        let doc = self.inner.accounts.load().await?;
        let account = doc
            .accounts
            .get(user_id)
            .ok_or_else(|| Error::AccountNotFound(user_id.into()))?;
        let token = account
            .token
            .clone()
            .ok_or_else(|| Error::MissingToken(user_id.into()))?;
        if !account.setups.contains_key(setup_name) {
            return Err(Error::SetupNotFound(setup_name.into()));
        }

        if !self.inner.gateway.validate_token(&token).await {
            return Err(Error::InvalidToken);
        }

        let key = TaskKey::new(user_id, setup_name);
        if self.is_running(&key).await {
            debug!(task = %key, "already running, start is a no-op");
            return Ok(());
        }

        // Persist the flag first so a restart rehydrates this setup, then
        // snapshot the setup as started.
        let snapshot = self
            .inner
            .accounts
            .update(|doc| {
                doc.setup_mut(user_id, setup_name).map(|s| {
                    s.running = true;
                    s.clone()
                })
            })
            .await?
            .ok_or_else(|| Error::SetupNotFound(setup_name.into()))?;

        self.spawn_if_absent(key.clone(), snapshot, token).await;
        info!(task = %key, "setup started");
        Ok(())
    }

    /// Flip the persisted flag off. The loop observes it at its next
    /// iteration boundary; worst case latency is one full cycle wait.
    pub async fn stop(&self, user_id: &str, setup_name: &str) -> Result<()> {
        let found = self
            .inner
            .accounts
            .update(|doc| match doc.setup_mut(user_id, setup_name) {
                Some(s) => {
                    s.running = false;
                    true
                }
                None => false,
            })
            .await?;
        if !found {
            return Err(Error::SetupNotFound(setup_name.into()));
        }
        info!(user_id, setup_name, "setup stop requested");
        Ok(())
    }

    /// Start every setup under an account. Returns how many were started;
    /// setups already running count as started no-ops.
    pub async fn start_all(&self, user_id: &str) -> Result<usize> {
        let doc = self.inner.accounts.load().await?;
        let account = doc
            .accounts
            .get(user_id)
            .ok_or_else(|| Error::AccountNotFound(user_id.into()))?;
        let names: Vec<String> = account.setups.keys().cloned().collect();

        let mut started = 0;
        for name in names {
            self.start(user_id, &name).await?;
            started += 1;
        }
        Ok(started)
    }

    /// Flip every setup flag under an account off in one store write.
    pub async fn stop_all(&self, user_id: &str) -> Result<usize> {
        let stopped = self
            .inner
            .accounts
            .update(|doc| match doc.accounts.get_mut(user_id) {
                Some(account) => {
                    let mut n = 0;
                    for setup in account.setups.values_mut() {
                        if setup.running {
                            n += 1;
                        }
                        setup.running = false;
                    }
                    Some(n)
                }
                None => None,
            })
            .await?
            .ok_or_else(|| Error::AccountNotFound(user_id.into()))?;
        info!(user_id, stopped, "all setups stopped");
        Ok(stopped)
    }

    /// Whether a live loop exists for the key.
    pub async fn is_running(&self, key: &TaskKey) -> bool {
        let mut tasks = self.inner.tasks.lock().await;
        tasks.retain(|_, h| !h.is_finished());
        tasks.contains_key(key)
    }

    /// Keys of all live loops.
    pub async fn running_keys(&self) -> Vec<TaskKey> {
        let mut tasks = self.inner.tasks.lock().await;
        tasks.retain(|_, h| !h.is_finished());
        tasks.keys().cloned().collect()
    }

    /// Spawn and register a loop unless the key already holds a live one.
    /// Returns whether a new loop was spawned.
    async fn spawn_if_absent(&self, key: TaskKey, setup: Setup, token: String) -> bool {
        let mut tasks = self.inner.tasks.lock().await;
        tasks.retain(|_, h| !h.is_finished());
        if tasks.contains_key(&key) {
            return false;
        }
        let handle = tokio::spawn(run_setup_loop(
            self.clone(),
            key.clone(),
            setup,
            token,
        ));
        tasks.insert(key, handle);
        true
    }

    /// Remove a loop's handle. Called by the loop itself on exit.
    pub(crate) async fn unregister(&self, key: &TaskKey) {
        let mut tasks = self.inner.tasks.lock().await;
        if tasks.remove(key).is_some() {
            debug!(task = %key, "loop unregistered");
        }
    }
}
