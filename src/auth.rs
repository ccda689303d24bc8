//! Login / logout over the accounts document.
//!
//! Logging in requires a valid subscription and a token that passes the live
//! platform check; both are persisted on the account. Logging out strips
//! them, and removes the account entirely when no setups remain.

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::store::{AccountsStore, Subscription, SubscriptionsStore};
use crate::subscription;

pub async fn login(
    accounts: &AccountsStore,
    subscriptions: &SubscriptionsStore,
    gateway: &dyn Gateway,
    user_id: &str,
    token: &str,
    subscription_id: &str,
) -> Result<()> {
    subscription::validate_subscription(subscriptions, subscription_id, user_id).await?;

    if !gateway.validate_token(token).await {
        return Err(Error::InvalidToken);
    }

    let user = user_id.to_string();
    let token = token.to_string();
    let sub_id = subscription_id.to_string();
    accounts
        .update(move |doc| {
            let account = doc.accounts.entry(user).or_default();
            account.token = Some(token);
            account.subscription_id = Some(sub_id);
        })
        .await?;
    Ok(())
}

pub async fn logout(accounts: &AccountsStore, user_id: &str) -> Result<()> {
    let user = user_id.to_string();
    accounts
        .update(move |doc| {
            if let Some(account) = doc.accounts.get_mut(&user) {
                account.token = None;
                account.subscription_id = None;
                if account.setups.is_empty() {
                    doc.accounts.remove(&user);
                }
            }
        })
        .await?;
    Ok(())
}

/// Logged in = token set and the bound subscription still validates.
pub async fn is_logged_in(
    accounts: &AccountsStore,
    subscriptions: &SubscriptionsStore,
    user_id: &str,
) -> Result<bool> {
    let doc = accounts.load().await?;
    let Some(account) = doc.accounts.get(user_id) else {
        return Ok(false);
    };
    let (Some(_), Some(sub_id)) = (&account.token, &account.subscription_id) else {
        return Ok(false);
    };
    Ok(
        subscription::validate_subscription(subscriptions, sub_id, user_id)
            .await
            .is_ok(),
    )
}

/// The subscription attached to an account, as `(id, subscription)`.
pub async fn subscription_info(
    accounts: &AccountsStore,
    subscriptions: &SubscriptionsStore,
    user_id: &str,
) -> Result<Option<(String, Subscription)>> {
    let doc = accounts.load().await?;
    let Some(sub_id) = doc
        .accounts
        .get(user_id)
        .and_then(|a| a.subscription_id.clone())
    else {
        return Ok(None);
    };
    Ok(subscription::get_subscription(subscriptions, &sub_id)
        .await?
        .map(|s| (sub_id, s)))
}
