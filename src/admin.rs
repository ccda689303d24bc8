//! Admin records in the accounts document.
//!
//! Passwords are stored in the clear, matching the persisted document
//! format; hashing is a known gap.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::store::{AccountsStore, Admin};

/// Add an admin. Refuses to overwrite an existing record.
pub async fn add_admin(store: &AccountsStore, user_id: &str, password: &str) -> Result<()> {
    let user = user_id.to_string();
    let password = password.to_string();
    store
        .update(move |doc| {
            if doc.admins.contains_key(&user) {
                return Err(Error::AdminExists(user));
            }
            doc.admins.insert(
                user,
                Admin {
                    is_admin: true,
                    password,
                    created_at: Utc::now(),
                },
            );
            Ok(())
        })
        .await?
}

pub async fn verify_admin(store: &AccountsStore, user_id: &str, password: &str) -> Result<bool> {
    let doc = store.load().await?;
    Ok(doc
        .admins
        .get(user_id)
        .map(|a| a.password == password)
        .unwrap_or(false))
}

pub async fn is_admin(store: &AccountsStore, user_id: &str) -> Result<bool> {
    let doc = store.load().await?;
    Ok(doc
        .admins
        .get(user_id)
        .map(|a| a.is_admin)
        .unwrap_or(false))
}
