//! Food Order Core - Shared types library.
//!
//! This crate provides common types used across the food ordering backend:
//! - `server` - HTTP API consumed by the mobile/web client
//! - `cli` - Operator tooling for migrations and menu seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, queue numbers and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
