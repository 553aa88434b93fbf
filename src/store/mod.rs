use axum::async_trait;

use crate::waitlist::repo_types::SignupRecord;

pub mod postgres;
pub mod rest;

pub use postgres::PgSignupStore;
pub use rest::RestSignupStore;

/// Table holding one row per signup, unique on `email`.
pub const SIGNUPS_TABLE: &str = "waitlist_signups";

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The store answered and refused the write.
    #[error("store rejected the write: {0}")]
    Rejected(String),
    /// The store could not be reached or the exchange broke down.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SignupStore: Send + Sync {
    /// Insert the record, or overwrite every non-key column of the row with the same email.
    async fn upsert_signup(&self, record: &SignupRecord) -> Result<(), PersistenceError>;
}
