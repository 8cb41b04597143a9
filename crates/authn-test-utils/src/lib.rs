//! # AuthN Test Utilities
//!
//! Shared test utilities for the identity service.
//!
//! This crate provides:
//! - Fixed test identities and token settings
//! - Identity and request builders (TestIdentityBuilder, request bodies)
//! - Server test harness (TestAuthServer for E2E tests)
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use authn_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestAuthServer::spawn().await?;
//!
//!     let issued = server.register_activate_and_login(&bob()).await?;
//!
//!     issued.token
//!         .assert_valid_jwt()
//!         .assert_for_subject(TEST_USERNAME)
//!         .assert_verifies_with(TEST_SIGNING_KEY, TEST_ISSUER);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod identity_builders;
pub mod server_harness;
pub mod test_ids;

// Re-export commonly used items
pub use assertions::*;
pub use identity_builders::*;
pub use server_harness::*;
pub use test_ids::*;
