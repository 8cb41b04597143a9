//! Common utilities and types shared across AuthN components.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for identity token claims and verification
pub mod jwt;
