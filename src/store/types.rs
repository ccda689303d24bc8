//! Persisted document types.
//!
//! Two independent documents, each a whole JSON file: the accounts document
//! (accounts with their setups, plus admin records) and the subscriptions
//! document (subscription id -> subscription).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root of the accounts document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccountsDoc {
    #[serde(default)]
    pub accounts: HashMap<String, Account>,
    #[serde(default)]
    pub admins: HashMap<String, Admin>,
}

impl AccountsDoc {
    /// Look up a setup by `(user, name)`.
    pub fn setup(&self, user_id: &str, name: &str) -> Option<&Setup> {
        self.accounts.get(user_id).and_then(|a| a.setups.get(name))
    }

    pub fn setup_mut(&mut self, user_id: &str, name: &str) -> Option<&mut Setup> {
        self.accounts
            .get_mut(user_id)
            .and_then(|a| a.setups.get_mut(name))
    }
}

/// One user account: an optional user token plus named setups.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Account {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub setups: HashMap<String, Setup>,
}

/// A named recurring-post configuration.
///
/// `interval` and `random_interval` are in minutes; each cycle waits
/// `interval * 60` seconds plus a random 0..=`random_interval * 60` seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setup {
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_interval")]
    pub interval: f64,
    #[serde(default = "default_random_interval")]
    pub random_interval: f64,
    #[serde(default)]
    pub running: bool,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

fn default_interval() -> f64 {
    1.0
}

fn default_random_interval() -> f64 {
    5.0
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            channel: String::new(),
            message: "Your message here".into(),
            interval: default_interval(),
            random_interval: default_random_interval(),
            running: false,
            last_updated: Utc::now(),
        }
    }
}

/// Admin record, keyed by user id in the accounts document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub is_admin: bool,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// One subscription entry, keyed by its 8-char uppercase id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    pub package_type: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub active: bool,
    pub discord_user_id: Option<String>,
}

/// Root of the subscriptions document.
pub type SubscriptionsDoc = HashMap<String, Subscription>;
