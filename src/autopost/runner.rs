//! The per-setup posting loop.
//!
//! One loop per `(user, setup)` pair, spawned and registered by the
//! [`Supervisor`](super::Supervisor). The loop runs until the persisted
//! `running` flag reads false, the setup is misconfigured, or the token
//! stops validating. Channel, message and intervals come from the snapshot
//! taken at start time; only the `running` flag is re-read each cycle, so
//! edits to the other fields take effect after a stop/start.

use std::time::Duration;
use tracing::{debug, error, info};

use crate::autopost::{cycle_wait, Supervisor, TaskKey};
use crate::store::Setup;

/// Pause after an unexpected internal error before the loop continues.
const INTERNAL_ERROR_PAUSE: Duration = Duration::from_secs(60);

pub(crate) async fn run_setup_loop(supervisor: Supervisor, key: TaskKey, setup: Setup, token: String) {
    let store = supervisor.accounts();
    let gateway = supervisor.gateway();

    loop {
        // Fresh read of the running flag; a deleted setup reads as stopped.
        let running = match store.load().await {
            Ok(doc) => doc
                .setup(&key.user_id, &key.setup_name)
                .map(|s| s.running)
                .unwrap_or(false),
            Err(e) => {
                error!(task = %key, error = %e, "store read failed, pausing before retry");
                tokio::time::sleep(INTERNAL_ERROR_PAUSE).await;
                continue;
            }
        };
        if !running {
            info!(task = %key, "setup stopped");
            break;
        }

        let channel = setup.channel.trim();
        if channel.is_empty() {
            error!(task = %key, "setup has no channel configured, terminating loop");
            break;
        }

        // Auto-deactivate on a dead token; the owner must restart explicitly.
        if !gateway.validate_token(&token).await {
            error!(task = %key, "token no longer valid, deactivating setup");
            let deactivate = store
                .update(|doc| {
                    if let Some(s) = doc.setup_mut(&key.user_id, &key.setup_name) {
                        s.running = false;
                    }
                })
                .await;
            if let Err(e) = deactivate {
                error!(task = %key, error = %e, "failed to persist deactivation");
            }
            break;
        }

        info!(task = %key, channel, "sending message");
        if !gateway.send_message(&token, channel, &setup.message).await {
            error!(task = %key, channel, "send failed, continuing to next cycle");
        }

        let wait = cycle_wait(setup.interval, setup.random_interval);
        debug!(task = %key, wait_secs = wait.as_secs(), "waiting before next cycle");
        tokio::time::sleep(wait).await;
    }

    supervisor.unregister(&key).await;
}
