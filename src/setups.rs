//! Setup CRUD over the accounts document.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::store::{AccountsStore, Setup};

fn validate_intervals(interval: f64, random_interval: f64) -> Result<()> {
    if !(interval > 0.0) {
        return Err(Error::InvalidInterval(interval));
    }
    if random_interval < 0.0 {
        return Err(Error::InvalidRandomInterval(random_interval));
    }
    Ok(())
}

/// Create a setup with defaults: empty channel, placeholder message,
/// 1 minute interval, 5 minutes jitter, not running.
pub async fn create_setup(store: &AccountsStore, user_id: &str, name: &str) -> Result<Setup> {
    let user = user_id.to_string();
    let name_owned = name.to_string();
    store
        .update(move |doc| {
            let account = doc
                .accounts
                .get_mut(&user)
                .ok_or_else(|| Error::AccountNotFound(user.clone()))?;
            if account.setups.contains_key(&name_owned) {
                return Err(Error::SetupExists(name_owned.clone()));
            }
            let setup = Setup::default();
            account.setups.insert(name_owned, setup.clone());
            Ok(setup)
        })
        .await?
}

/// Replace channel, message and both intervals. The running flag is
/// preserved; `last_updated` is refreshed.
pub async fn edit_setup(
    store: &AccountsStore,
    user_id: &str,
    name: &str,
    channel: &str,
    message: &str,
    interval: f64,
    random_interval: f64,
) -> Result<Setup> {
    validate_intervals(interval, random_interval)?;
    let user = user_id.to_string();
    let name_owned = name.to_string();
    let channel = channel.to_string();
    let message = message.to_string();
    store
        .update(move |doc| {
            let setup = doc
                .setup_mut(&user, &name_owned)
                .ok_or_else(|| Error::SetupNotFound(name_owned.clone()))?;
            setup.channel = channel;
            setup.message = message;
            setup.interval = interval;
            setup.random_interval = random_interval;
            setup.last_updated = Utc::now();
            Ok(setup.clone())
        })
        .await?
}

pub async fn delete_setup(store: &AccountsStore, user_id: &str, name: &str) -> Result<()> {
    let user = user_id.to_string();
    let name_owned = name.to_string();
    store
        .update(move |doc| {
            let account = doc
                .accounts
                .get_mut(&user)
                .ok_or_else(|| Error::AccountNotFound(user.clone()))?;
            account
                .setups
                .remove(&name_owned)
                .map(|_| ())
                .ok_or(Error::SetupNotFound(name_owned.clone()))
        })
        .await?
}

/// All setups of an account, name-sorted.
pub async fn list_setups(store: &AccountsStore, user_id: &str) -> Result<Vec<(String, Setup)>> {
    let doc = store.load().await?;
    let account = doc
        .accounts
        .get(user_id)
        .ok_or_else(|| Error::AccountNotFound(user_id.into()))?;
    let mut setups: Vec<_> = account
        .setups
        .iter()
        .map(|(n, s)| (n.clone(), s.clone()))
        .collect();
    setups.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(setups)
}
