//! In-memory identity repository.
//!
//! Enforces the same uniqueness rules as the Postgres schema. Used by unit
//! tests, the HTTP test harness, and local runs without a database.

use super::{IdentityRepository, RepositoryError, UniqueField};
use crate::models::Identity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryIdentityRepository {
    identities: RwLock<Vec<Identity>>,
    /// Every operation fails with `Database`.
    failing: AtomicBool,
    /// Lookups report nothing, as if another request inserted the record
    /// after this one checked.
    stale_reads: AtomicBool,
    /// Number of successful mutations.
    write_count: AtomicUsize,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identities(identities: Vec<Identity>) -> Self {
        Self {
            identities: RwLock::new(identities),
            ..Self::default()
        }
    }

    /// Make every subsequent call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make subsequent lookups miss while writes still see stored rows.
    pub fn set_stale_reads(&self, stale: bool) {
        self.stale_reads.store(stale, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Copy of every stored identity, in insertion order.
    pub async fn snapshot(&self) -> Vec<Identity> {
        self.identities.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.identities.read().await.is_empty()
    }

    fn check_failing(&self) -> Result<(), RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(
                "Injected repository failure".to_string(),
            ));
        }
        Ok(())
    }

    async fn find_where<F>(&self, predicate: F) -> Result<Option<Identity>, RepositoryError>
    where
        F: Fn(&Identity) -> bool + Send,
    {
        self.check_failing()?;
        if self.stale_reads.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let identities = self.identities.read().await;
        Ok(identities.iter().find(|i| predicate(i)).cloned())
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn add_identity(&self, identity: &Identity) -> Result<(), RepositoryError> {
        self.check_failing()?;
        let mut identities = self.identities.write().await;

        if let Some(username) = &identity.username {
            if identities
                .iter()
                .any(|i| i.username.as_deref() == Some(username.as_str()))
            {
                return Err(RepositoryError::Conflict {
                    field: UniqueField::Username,
                });
            }
        }
        if identities
            .iter()
            .any(|i| i.registered_email == identity.registered_email)
        {
            return Err(RepositoryError::Conflict {
                field: UniqueField::Email,
            });
        }

        identities.push(identity.clone());
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn activate_identity(
        &self,
        username: &str,
        activated_on: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        self.check_failing()?;
        let mut identities = self.identities.write().await;

        let identity = identities
            .iter_mut()
            .find(|i| i.username.as_deref() == Some(username))
            .ok_or(RepositoryError::NotFound)?;

        identity.activated_on.get_or_insert(activated_on);
        self.write_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, RepositoryError> {
        self.find_where(|i| i.username.as_deref() == Some(username))
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RepositoryError> {
        self.find_where(|i| i.registered_email == email).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.check_failing()
    }
}
