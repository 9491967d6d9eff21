//! dashmon core library.
//!
//! Everything the dashboard needs to talk to the monitoring API:
//!
//! - `api`: the authenticated request client with transparent token refresh
//! - `auth`: persistent token storage (keychain, file, memory)
//! - `models`: users, devices, cameras, alerts
//! - `config`: on-disk configuration and directory layout
//! - `utils`: display formatting helpers

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiResponse, RequestOptions};
pub use auth::{FileStore, KeyringStore, MemoryStore, StoreError, TokenStore};
pub use config::{Config, StoreKind};
pub use reqwest::Method;
