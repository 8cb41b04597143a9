//! Legacy identity lifecycle service.
//!
//! Registers identities with a salted password digest, activates them with a
//! time-limited code, and exchanges a password login for a signed token.
//!
//! # Modules
//!
//! - `config` - Environment configuration and validation thresholds
//! - `crypto` - Password digests, salts, activation codes, token signing
//! - `errors` - Error type and HTTP mapping
//! - `handlers` / `routes` / `middleware` - HTTP boundary
//! - `models` - Identity record and request/response types
//! - `observability` - Log correlation hashing and metrics
//! - `repositories` - Identity storage (Postgres and in-memory)
//! - `services` - Register, activate and login orchestration, token issuer
//! - `validation` - Declarative rule sets

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod validation;
