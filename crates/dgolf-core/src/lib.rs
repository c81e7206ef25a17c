//! Core library for DGolf, the golf-travel booking client.
//!
//! The interesting machinery lives in three places:
//!
//! - [`cache`]: the offline cache controller - a single versioned store,
//!   cache-first/network-first routing, and the update lifecycle
//! - [`auth`]: the session lifecycle - token persistence, restore-by-whoami,
//!   atomic invalidation on auth rejection
//! - [`device`]: pure device classification selecting between the mobile
//!   and desktop UI compositions
//!
//! Around them: the REST [`api`] client, serde [`models`], resolved-once
//! [`config`], and the offline inquiry [`sync`] outbox.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod device;
pub mod models;
pub mod sync;
