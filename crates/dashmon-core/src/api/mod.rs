//! REST API client module for the monitoring backend.
//!
//! This module provides the `ApiClient` for talking to the dashboard API:
//! users, devices, cameras, alerts and settings.
//!
//! The API uses JWT bearer tokens. An expired access token is renewed
//! with the stored refresh token and the failed call is re-sent once.

pub mod client;
pub mod error;
pub mod query;
pub mod transport;

pub use client::{ApiClient, ApiResponse, RequestOptions};
pub use error::ApiError;
pub use query::{QueryParams, QueryValue};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
