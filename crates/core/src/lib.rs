//! Pizza Café Core - Shared types library.
//!
//! This crate provides common types used across all Pizza Café components:
//! - `app` - Ordering services, collaborators and per-screen view state
//! - `cli` - Command-line tools for migrations, menu seeding and ordering
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for document IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
