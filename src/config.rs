use std::fmt;

use anyhow::Context;

/// Credentials for the persistence collaborator.
#[derive(Clone)]
pub enum StoreConfig {
    /// PostgREST-style endpoint of a managed Postgres platform.
    Rest {
        url: String,
        service_role_key: String,
    },
    /// Direct connection to the Postgres database holding the signups table.
    Postgres { database_url: String },
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreConfig::Rest { url, .. } => f
                .debug_struct("Rest")
                .field("url", url)
                .field("service_role_key", &"<redacted>")
                .finish(),
            StoreConfig::Postgres { .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` when no credentials are set; signups then answer "Server not configured".
    pub store: Option<StoreConfig>,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values are treated the same as unset ones.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = match (var("SUPABASE_URL"), var("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(service_role_key)) => Some(StoreConfig::Rest {
                url,
                service_role_key,
            }),
            _ => var("DATABASE_URL").map(|database_url| StoreConfig::Postgres { database_url }),
        };

        let host = var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match var("APP_PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a valid port: {v}"))?,
            None => 8080,
        };

        Ok(Self { store, host, port })
    }
}
