//! Core types for Cartwheel.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credentials;
pub mod id;
pub mod price;
pub mod status;

pub use credentials::{Credentials, CredentialsError, SignUpForm};
pub use id::*;
pub use price::Price;
pub use status::*;
