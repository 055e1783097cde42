//! Shared library for SIONPO Lambda functions.
//!
//! This crate provides the error taxonomy, secret resolution, database
//! helpers, and response shaping used across all Lambda functions.

pub mod cognito;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod secrets;

pub use config::Config;
pub use error::{Error, Result};
pub use secrets::{classify_secret_error, resolve_secret, CognitoSecret, DatabaseSecret};
