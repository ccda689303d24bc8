//! Flat-file JSON store.
//!
//! Each document is one UTF-8 JSON file, read and written whole. A missing
//! file reads as the empty document. All read-modify-write cycles go through
//! [`Store::update`], which holds a process-wide async lock for the duration
//! of load + mutate + save, so in-process writers cannot lose updates to one
//! another. There are no cross-process guarantees.

pub mod types;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

pub use types::{Account, AccountsDoc, Admin, Setup, Subscription, SubscriptionsDoc};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Handle to one persisted JSON document.
///
/// Cloning is cheap; all clones share the same writer lock.
pub struct Store<T> {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    _doc: PhantomData<fn() -> T>,
}

pub type AccountsStore = Store<AccountsDoc>;
pub type SubscriptionsStore = Store<SubscriptionsDoc>;

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock: Arc::clone(&self.lock),
            _doc: PhantomData,
        }
    }
}

impl<T> Store<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document. Missing file yields `T::default()`.
    pub async fn load(&self) -> Result<T, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_document()
    }

    /// Load, mutate in memory, save. The lock is held across all three steps.
    pub async fn update<F, R>(&self, mutate: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut T) -> R,
    {
        let _guard = self.lock.lock().await;
        let mut doc = self.read_document()?;
        let out = mutate(&mut doc);
        self.write_document(&doc)?;
        Ok(out)
    }

    fn read_document(&self) -> Result<T, StoreError> {
        if !self.path.exists() {
            return Ok(T::default());
        }
        let text = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn write_document(&self, doc: &T) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
