//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the playlist tagging core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the validated configuration
//! (remote endpoints, app credentials, pagination bounds, timeouts) that the
//! service layer is assembled from.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
