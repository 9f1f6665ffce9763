//! # apiprobe-client -- Session client for the API under test
//!
//! Signs in once with email/password against a cookie-session auth service
//! and issues authenticated JSON calls, returning the raw status and body.
//!
//! ## Flow
//!
//! 1. [`SessionClient::sign_in`] posts the credentials with
//!    `st-auth-mode: cookie` and keeps the issued `Set-Cookie` pairs.
//! 2. [`SessionClient::call`] sends them back with a fresh
//!    `st-last-access-token-update` timestamp cookie.
//!
//! There are no retries. Failures are returned as [`ClientError`]; callers
//! decide whether they are fatal.

pub mod config;
pub mod error;
pub mod session;

pub use config::{ConfigError, SessionConfig};
pub use error::ClientError;
pub use reqwest::Method;
pub use session::{ApiResponse, SessionClient, SessionCredential};
