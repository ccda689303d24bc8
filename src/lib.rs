//! # autoposter
//!
//! Subscription-gated auto-posting daemon for Discord channels.
//!
//! Each account owns named *setups* — a channel, a message, and a posting
//! interval with random jitter. A [`autopost::Supervisor`] runs one posting
//! loop per active setup, rehydrates them from the persisted flat-file state
//! at startup, and stops them cooperatively via the persisted `running`
//! flag. Delivery is best-effort with bounded retry and rate-limit handling.
//!
//! ## Modules
//!
//! - [`autopost`] - posting loops and their supervisor
//! - [`gateway`] - Discord REST client with retry/backoff
//! - [`store`] - flat-file JSON documents (accounts, subscriptions)
//! - [`auth`] / [`subscription`] / [`admin`] - account bookkeeping
//! - [`setups`] - setup CRUD
//! - [`cli`] / [`config`] / [`logging`] - application shell

pub mod admin;
pub mod auth;
pub mod autopost;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod setups;
pub mod store;
pub mod subscription;

pub use error::{Error, Result};
