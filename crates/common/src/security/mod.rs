//! Security primitives
//!
//! Secrets (access and refresh tokens) live in the platform keychain.

pub mod keychain;

pub use keychain::{KeychainError, KeychainProvider};
