use serde::Serialize;

/// One row of the signups table, keyed by `email`.
///
/// Absent optionals serialize as `null` so an upsert clears stale values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupRecord {
    pub email: String,                // trimmed, as submitted
    pub referrer: String,             // <= 500 chars
    pub user_agent: String,           // <= 500 chars
    pub utm_source: Option<String>,   // <= 200 chars each
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub ip_hash: Option<String>,      // hex SHA-256 of the client IP, never the IP itself
}
