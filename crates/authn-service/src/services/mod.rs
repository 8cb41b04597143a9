//! Identity lifecycle orchestration: register, activate, log in.
//!
//! Each operation validates first, then talks to the repository, and maps
//! every failure onto [`AuthnError`](crate::errors::AuthnError).

pub mod activation_service;
pub mod login_service;
pub mod registration_service;
pub mod token_service;
