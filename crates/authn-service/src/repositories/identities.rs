//! Postgres-backed identity repository.

use super::{IdentityRepository, RepositoryError, UniqueField};
use crate::models::Identity;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const USERNAME_CONSTRAINT: &str = "identities_username_key";
const EMAIL_CONSTRAINT: &str = "identities_email_key";
const UNIQUE_VIOLATION: &str = "23505";

/// Row shape of the identity lookup query.
#[derive(sqlx::FromRow)]
struct IdentityRow {
    identity_id: Uuid,
    username: Option<String>,
    registered_email: String,
    password_salt: Option<String>,
    password_hash: Option<String>,
    forename: String,
    surname: String,
    federated_id: Option<String>,
    created_on: DateTime<Utc>,
    activated_on: Option<DateTime<Utc>>,
    activation_code: Option<Uuid>,
    activation_code_issued_on: Option<DateTime<Utc>>,
    entitlements: Vec<String>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Self {
            identity_id: row.identity_id,
            username: row.username,
            registered_email: row.registered_email,
            password_salt: row.password_salt,
            password_hash: row.password_hash,
            forename: row.forename,
            surname: row.surname,
            federated_id: row.federated_id,
            created_on: row.created_on,
            activated_on: row.activated_on,
            activation_code: row.activation_code,
            activation_code_issued_on: row.activation_code_issued_on,
            entitlements: row.entitlements,
        }
    }
}

const SELECT_IDENTITY: &str = r#"
    SELECT
        i.identity_id, i.username, i.registered_email, i.password_salt,
        i.password_hash, i.forename, i.surname, i.federated_id, i.created_on,
        i.activated_on, i.activation_code, i.activation_code_issued_on,
        COALESCE(
            array_agg(e.tag ORDER BY e.tag) FILTER (WHERE e.tag IS NOT NULL),
            '{}'
        ) AS entitlements
    FROM identities i
    LEFT JOIN identity_entitlements e ON e.identity_id = i.identity_id
"#;

/// Translate a sqlx error, recognising unique-constraint violations.
fn map_write_error(err: sqlx::Error, context: &str) -> RepositoryError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let field = match db_err.constraint() {
                Some(USERNAME_CONSTRAINT) => Some(UniqueField::Username),
                Some(EMAIL_CONSTRAINT) => Some(UniqueField::Email),
                _ => None,
            };
            if let Some(field) = field {
                return RepositoryError::Conflict { field };
            }
        }
    }
    RepositoryError::Database(format!("{}: {}", context, err))
}

pub struct PgIdentityRepository {
    pool: PgPool,
}

impl PgIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<Identity>, RepositoryError> {
        let query = format!(
            "{} WHERE i.{} = $1 GROUP BY i.identity_id",
            SELECT_IDENTITY, column
        );

        let row = sqlx::query_as::<_, IdentityRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                RepositoryError::Database(format!("Failed to fetch identity by {}: {}", column, e))
            })?;

        Ok(row.map(Identity::from))
    }
}

#[async_trait]
impl IdentityRepository for PgIdentityRepository {
    async fn add_identity(&self, identity: &Identity) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO identities (
                identity_id, username, registered_email, password_salt,
                password_hash, forename, surname, federated_id, created_on,
                activated_on, activation_code, activation_code_issued_on
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(identity.identity_id)
        .bind(&identity.username)
        .bind(&identity.registered_email)
        .bind(&identity.password_salt)
        .bind(&identity.password_hash)
        .bind(&identity.forename)
        .bind(&identity.surname)
        .bind(&identity.federated_id)
        .bind(identity.created_on)
        .bind(identity.activated_on)
        .bind(identity.activation_code)
        .bind(identity.activation_code_issued_on)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Failed to insert identity"))?;

        for tag in &identity.entitlements {
            sqlx::query("INSERT INTO identity_entitlements (identity_id, tag) VALUES ($1, $2)")
                .bind(identity.identity_id)
                .bind(tag)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_write_error(e, "Failed to insert entitlement"))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_write_error(e, "Failed to commit identity"))?;

        Ok(())
    }

    async fn activate_identity(
        &self,
        username: &str,
        activated_on: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE identities
            SET activated_on = COALESCE(activated_on, $2)
            WHERE username = $1
            "#,
        )
        .bind(username)
        .bind(activated_on)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to activate identity: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, RepositoryError> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, RepositoryError> {
        self.find_one("registered_email", email).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Database ping failed: {}", e)))?;
        Ok(())
    }
}
