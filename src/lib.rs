//! # App Access API Library
//!
//! This library provides the core functionality for the App Access service:
//! API key issuance and verification, the per-application connection
//! lifecycle against the OAuth broker, the static action allow-list with
//! per-agent scope overrides, and external account linking.

pub mod allowlist;
pub mod auth;
pub mod broker;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod lifecycle;
pub mod linking;
pub mod models;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
