//! Durable plain (non-secret) state
//!
//! Device id, access-token expiry and the offline session queue live here as
//! JSON values keyed by string. [`JsonFileStateStore`] keeps them in a single
//! JSON document on disk, rewritten atomically on every mutation.

pub mod error;
pub mod state;

pub use error::{StorageError, StorageResult};
pub use state::{JsonFileStateStore, StateStore};
