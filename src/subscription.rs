//! Subscription bookkeeping: 8-char uppercase IDs, package catalog,
//! expiry checks and user binding.

use chrono::{Duration as ChronoDuration, Utc};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::{Subscription, SubscriptionsStore};

/// A purchasable access package.
#[derive(Debug, Clone, Copy)]
pub struct Package {
    pub id: &'static str,
    pub name: &'static str,
    pub days: i64,
}

pub const PACKAGES: [Package; 3] = [
    Package {
        id: "weekly",
        name: "1 Week",
        days: 7,
    },
    Package {
        id: "monthly",
        name: "1 Month",
        days: 30,
    },
    Package {
        id: "quarterly",
        name: "3 Months",
        days: 90,
    },
];

pub fn package(id: &str) -> Option<&'static Package> {
    PACKAGES.iter().find(|p| p.id == id)
}

/// First 8 hex chars of a v4 uuid, uppercased.
fn new_subscription_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

/// Create a subscription for a user and return its id. The subscription is
/// unbound until the first login consumes it.
pub async fn create_subscription(
    store: &SubscriptionsStore,
    user_id: &str,
    package_type: &str,
) -> Result<String> {
    let pkg = package(package_type).ok_or_else(|| Error::UnknownPackage(package_type.into()))?;
    let id = new_subscription_id();
    let now = Utc::now();
    let sub = Subscription {
        user_id: user_id.into(),
        package_type: pkg.id.into(),
        start_date: now,
        end_date: now + ChronoDuration::days(pkg.days),
        active: true,
        discord_user_id: None,
    };
    let id_for_doc = id.clone();
    store
        .update(move |subs| {
            subs.insert(id_for_doc, sub);
        })
        .await?;
    Ok(id)
}

/// Validate a subscription for a user. An expired subscription is
/// deactivated in place; the first successful use binds the subscription to
/// the user, and a bound subscription rejects every other user.
pub async fn validate_subscription(
    store: &SubscriptionsStore,
    subscription_id: &str,
    user_id: &str,
) -> Result<()> {
    let sub_id = subscription_id.to_string();
    let user = user_id.to_string();
    store
        .update(move |subs| {
            let sub = subs
                .get_mut(&sub_id)
                .ok_or_else(|| Error::SubscriptionNotFound(sub_id.clone()))?;

            if Utc::now() > sub.end_date {
                sub.active = false;
                return Err(Error::SubscriptionInactive(sub_id.clone()));
            }
            if !sub.active {
                return Err(Error::SubscriptionInactive(sub_id.clone()));
            }
            match &sub.discord_user_id {
                Some(bound) if bound != &user => Err(Error::SubscriptionBound(sub_id.clone())),
                Some(_) => Ok(()),
                None => {
                    sub.discord_user_id = Some(user);
                    Ok(())
                }
            }
        })
        .await?
}

pub async fn get_subscription(
    store: &SubscriptionsStore,
    subscription_id: &str,
) -> Result<Option<Subscription>> {
    Ok(store.load().await?.get(subscription_id).cloned())
}

/// Subscription bound to a user, if any, as `(id, subscription)`.
pub async fn get_user_subscription(
    store: &SubscriptionsStore,
    user_id: &str,
) -> Result<Option<(String, Subscription)>> {
    let subs = store.load().await?;
    Ok(subs
        .iter()
        .find(|(_, s)| s.discord_user_id.as_deref() == Some(user_id))
        .map(|(id, s)| (id.clone(), s.clone())))
}

/// Push the end date out and reactivate.
pub async fn extend_subscription(
    store: &SubscriptionsStore,
    subscription_id: &str,
    additional_days: i64,
) -> Result<()> {
    let sub_id = subscription_id.to_string();
    store
        .update(move |subs| {
            let sub = subs
                .get_mut(&sub_id)
                .ok_or_else(|| Error::SubscriptionNotFound(sub_id.clone()))?;
            sub.end_date = sub.end_date + ChronoDuration::days(additional_days);
            sub.active = true;
            Ok(())
        })
        .await?
}
