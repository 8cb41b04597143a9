//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for passwords in lifecycle requests
//! and for the token signing key held in configuration.
//!
//! `SecretString` implements `Debug` with redaction, so request structs that
//! derive `Debug` can be logged with `{:?}` without leaking the password.
//! Values are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginRequest {
//!     username: String,
//!     password: SecretString,
//! }
//!
//! let req = LoginRequest {
//!     username: "bobsmith".to_string(),
//!     password: SecretString::from("Test123!"),
//! };
//!
//! assert!(!format!("{req:?}").contains("Test123!"));
//! assert_eq!(req.password.expose_secret(), "Test123!");
//! ```
//!
//! # Usage Guidelines
//!
//! Use `SecretString` for:
//! - User passwords (registration and login requests)
//! - The token signing key
//!
//! Activation codes are not secrets in this sense: they are returned to the
//! caller in the registration response and travel in activation links.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
