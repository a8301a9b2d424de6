//! Pizza Café ordering library.
//!
//! Everything a client needs to sign in, browse the menu, fill a cart, place
//! orders and pay, expressed over two collaborators: a hierarchical document
//! store and an email/password auth provider.
//!
//! # Modules
//!
//! - [`store`] - `DocumentStore` trait, in-memory and `PostgreSQL` backends
//! - [`auth`] - `AuthProvider` trait, in-memory and `PostgreSQL` backends
//! - [`session`] - Session holder with change subscription
//! - [`services`] - Menu, cart, order and payment operations
//! - [`views`] - Per-screen state and alerts
//! - [`state`] - `AppContext` passed to every view

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
#[cfg(feature = "postgres")]
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
pub mod token_cache;
pub mod views;

pub use error::{Alert, AppError};
pub use session::{SessionHolder, SessionState};
pub use state::AppContext;
