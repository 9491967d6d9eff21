//! Data models for monitoring API resources.
//!
//! - `UserProfile`: dashboard accounts and roles
//! - `Device`, `Camera`: monitored equipment
//! - `Alert`, `AlertPage`, `AlertsSummary`: alerting data
//!
//! Every field the backend may omit is optional, and unknown fields are
//! ignored, so newer servers keep decoding.

pub mod alert;
pub mod device;
pub mod user;

pub use alert::{Alert, AlertPage, AlertsSummary, Pagination};
pub use device::{Camera, Device};
pub use user::UserProfile;
