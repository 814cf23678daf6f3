//! Cartwheel Core - Shared types library.
//!
//! This crate provides the types used across all Cartwheel components:
//! - `client` - Session/cart store and REST client for the storefront backend
//! - `cli` - Command-line front end driving the store
//!
//! # Architecture
//!
//! The core crate contains only types and records - no I/O, no HTTP clients.
//! Records mirror the JSON documents the storefront backend returns, so they
//! deserialize directly from response bodies.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, statuses, roles, and sign-in credentials
//! - [`models`] - Product, cart, order, review, and user records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
