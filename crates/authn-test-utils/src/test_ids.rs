//! Fixed test data for deterministic tests
//!
//! Identity IDs are fixed UUIDs so that stored fixtures compare equal across
//! runs. Activation codes and salts are still random when produced by the
//! service itself.

use uuid::Uuid;

// Identity IDs (100-199)
pub const TEST_IDENTITY_BOB: Uuid = Uuid::from_u128(101);
pub const TEST_IDENTITY_ALICE: Uuid = Uuid::from_u128(102);
pub const TEST_IDENTITY_FEDERATED: Uuid = Uuid::from_u128(103);

// Primary test user
pub const TEST_USERNAME: &str = "bobsmith";
pub const TEST_EMAIL: &str = "bob@test.co";
pub const TEST_PASSWORD: &str = "Test123!";
pub const TEST_FORENAME: &str = "Bob";
pub const TEST_SURNAME: &str = "Smith";

// Second user, for uniqueness tests
pub const TEST_USERNAME_ALICE: &str = "alicejones";
pub const TEST_EMAIL_ALICE: &str = "alice@test.co";

pub const TEST_FEDERATED_ID: &str = "fb-1234567890";

// Token settings
pub const TEST_ISSUER: &str = "https://authn.test";
pub const TEST_SIGNING_KEY: &str = "test-signing-key-do-not-use-in-production";
pub const TEST_DATABASE_URL: &str = "postgresql://unused/authn_test";

// Entitlement tags
pub const ENTITLEMENT_LIST_USERS: &str = "list-users";
pub const ENTITLEMENT_DELETE_USER: &str = "delete-user";
