//! # Authentication Module
//!
//! Supplies bearer credentials for remote playlist calls.
//!
//! ## Overview
//!
//! Two kinds of credential flow through the core:
//!
//! - A [`Session`] carries the signed-in user's id and access token. It is
//!   passed explicitly to every user-scoped operation.
//! - A [`CredentialProvider`] mints tokens for reads that are made on behalf
//!   of the app itself. [`RefreshTokenProvider`] exchanges a long-lived
//!   refresh token at the accounts service and caches the result until shortly
//!   before it expires. [`StaticCredentialProvider`] hands out a fixed token.
//!
//! Token values never appear in `Debug` output.

pub mod credentials;
pub mod error;
pub mod types;

pub use credentials::{CredentialProvider, RefreshTokenProvider, StaticCredentialProvider};
pub use error::{AuthError, Result};
pub use types::{AccessToken, Session};
