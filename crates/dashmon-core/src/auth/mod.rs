//! Token storage for authenticated sessions.
//!
//! This module provides:
//! - `TokenStore`: the get/set/remove key-value seam used by `ApiClient`
//! - `KeyringStore`: OS-level storage via keyring
//! - `FileStore`: JSON file in the cache directory
//! - `MemoryStore`: process-local storage for tests and ephemeral runs
//!
//! Only two keys are ever written: the access token and the refresh token.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::KeyringStore;
pub use session::FileStore;
pub use store::{MemoryStore, StoreError, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
