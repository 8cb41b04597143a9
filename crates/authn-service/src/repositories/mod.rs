//! Identity storage.
//!
//! The lifecycle services only see [`IdentityRepository`]. Two
//! implementations ship with the crate: [`identities::PgIdentityRepository`]
//! for Postgres and [`memory::InMemoryIdentityRepository`] for tests and
//! local runs.

pub mod identities;
pub mod memory;

use crate::errors::AuthnError;
use crate::models::Identity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

pub use identities::PgIdentityRepository;
pub use memory::InMemoryIdentityRepository;

/// Column protected by a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Username => write!(f, "username"),
            UniqueField::Email => write!(f, "email"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write.
    #[error("Unique constraint violated on {field}")]
    Conflict { field: UniqueField },

    #[error("Identity not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<RepositoryError> for AuthnError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { field } => {
                AuthnError::IdentityConflict(format!("This {} is taken", field))
            }
            RepositoryError::NotFound => AuthnError::not_found(),
            RepositoryError::Database(message) => AuthnError::Database(message),
        }
    }
}

/// Persistence for identities.
///
/// Implementations must enforce uniqueness of username and registered email
/// and report violations as [`RepositoryError::Conflict`], distinct from any
/// other failure.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Persist a new pending identity together with its entitlement tags.
    async fn add_identity(&self, identity: &Identity) -> Result<(), RepositoryError>;

    /// Mark the identity with this username active at `activated_on`.
    ///
    /// Idempotent: an existing activation timestamp is kept.
    async fn activate_identity(
        &self,
        username: &str,
        activated_on: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RepositoryError>;

    /// Cheap connectivity probe used by `/ready`.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
