use axum::async_trait;
use sqlx::PgPool;

use super::{PersistenceError, SignupStore};
use crate::waitlist::repo_types::SignupRecord;

/// Upserts straight into Postgres.
#[derive(Clone)]
pub struct PgSignupStore {
    db: PgPool,
    upsert_sql: String,
}

impl PgSignupStore {
    pub fn new(db: PgPool, table: &str) -> Self {
        let upsert_sql = format!(
            r#"
            INSERT INTO {table} (
                email, referrer, user_agent,
                utm_source, utm_medium, utm_campaign, utm_term, utm_content,
                ip_hash
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (email) DO UPDATE SET
                referrer = EXCLUDED.referrer,
                user_agent = EXCLUDED.user_agent,
                utm_source = EXCLUDED.utm_source,
                utm_medium = EXCLUDED.utm_medium,
                utm_campaign = EXCLUDED.utm_campaign,
                utm_term = EXCLUDED.utm_term,
                utm_content = EXCLUDED.utm_content,
                ip_hash = EXCLUDED.ip_hash,
                updated_at = now()
            "#
        );
        Self { db, upsert_sql }
    }
}

fn classify(err: sqlx::Error) -> PersistenceError {
    match err {
        sqlx::Error::Database(db) => PersistenceError::Rejected(db.to_string()),
        other => PersistenceError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl SignupStore for PgSignupStore {
    async fn upsert_signup(&self, record: &SignupRecord) -> Result<(), PersistenceError> {
        sqlx::query(&self.upsert_sql)
            .bind(&record.email)
            .bind(&record.referrer)
            .bind(&record.user_agent)
            .bind(&record.utm_source)
            .bind(&record.utm_medium)
            .bind(&record.utm_campaign)
            .bind(&record.utm_term)
            .bind(&record.utm_content)
            .bind(&record.ip_hash)
            .execute(&self.db)
            .await
            .map_err(classify)?;
        Ok(())
    }
}
