//! Dependency-aware mod collections for a game server.
//!
//! Three snapshots feed everything here: addons installed on disk, the
//! server's enabled load order, and the user's curated collection.
//! [`core::resolver`] walks the workshop catalog for dependency closures,
//! [`core::reconciler`] folds them into the collection without touching user
//! edits, and [`core::service`] persists the result.

pub mod config;
pub mod core;
pub mod models;
pub mod utils;
