//! Minimal user-to-user messaging backend.
//!
//! Users register and authenticate with username/password; authenticated
//! users exchange text messages with read receipts. A message is visible
//! only to its sender and recipient, and only the recipient may mark it
//! read.

pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod routes;
