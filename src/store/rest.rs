use axum::async_trait;
use tracing::debug;

use super::{PersistenceError, SignupStore};
use crate::waitlist::repo_types::SignupRecord;

/// Upserts through the PostgREST interface of a managed Postgres platform.
#[derive(Clone)]
pub struct RestSignupStore {
    client: reqwest::Client,
    endpoint: String,
    service_role_key: String,
}

impl RestSignupStore {
    pub fn new(base_url: &str, service_role_key: &str, table: &str) -> Self {
        let endpoint = format!(
            "{}/rest/v1/{}?on_conflict=email",
            base_url.trim_end_matches('/'),
            table
        );
        Self {
            client: reqwest::Client::new(),
            endpoint,
            service_role_key: service_role_key.to_string(),
        }
    }
}

#[async_trait]
impl SignupStore for RestSignupStore {
    async fn upsert_signup(&self, record: &SignupRecord) -> Result<(), PersistenceError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| PersistenceError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PersistenceError::Rejected(format!("{status}: {body}")));
        }

        debug!(%status, "rest upsert accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{RawQuery, State},
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::Value;

    use super::*;

    #[derive(Debug, Clone)]
    struct Captured {
        query: Option<String>,
        headers: HeaderMap,
        body: Value,
    }

    type Inbox = Arc<Mutex<Vec<Captured>>>;

    /// Serves `/rest/v1/waitlist_signups` on an ephemeral port, answering `reply` to every call.
    async fn spawn_backend(reply: StatusCode) -> (String, Inbox) {
        let inbox: Inbox = Arc::default();

        async fn capture(
            State((inbox, reply)): State<(Inbox, StatusCode)>,
            RawQuery(query): RawQuery,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> (StatusCode, &'static str) {
            inbox.lock().unwrap().push(Captured {
                query,
                headers,
                body,
            });
            let text = if reply.is_success() {
                ""
            } else {
                r#"{"message":"duplicate key value violates unique constraint"}"#
            };
            (reply, text)
        }

        let app = Router::new()
            .route("/rest/v1/waitlist_signups", post(capture))
            .with_state((inbox.clone(), reply));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/"), inbox)
    }

    fn record() -> SignupRecord {
        SignupRecord {
            email: "alice@example.com".into(),
            referrer: "https://ref.example.com/".into(),
            user_agent: "curl/8.0".into(),
            utm_source: Some("newsletter".into()),
            utm_medium: None,
            utm_campaign: None,
            utm_term: None,
            utm_content: None,
            ip_hash: None,
        }
    }

    #[tokio::test]
    async fn sends_upsert_with_conflict_target_and_credentials() {
        let (base, inbox) = spawn_backend(StatusCode::CREATED).await;
        let store = RestSignupStore::new(&base, "service-key", "waitlist_signups");

        store.upsert_signup(&record()).await.expect("upsert ok");

        let calls = inbox.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.query.as_deref(), Some("on_conflict=email"));
        assert_eq!(call.headers["apikey"], "service-key");
        assert_eq!(call.headers["authorization"], "Bearer service-key");
        assert!(call.headers["prefer"]
            .to_str()
            .unwrap()
            .contains("resolution=merge-duplicates"));
        assert_eq!(call.body["email"], "alice@example.com");
        assert_eq!(call.body["utm_source"], "newsletter");
        // absent values go out as explicit nulls so an overwrite clears them
        assert_eq!(call.body["utm_medium"], Value::Null);
        assert_eq!(call.body["ip_hash"], Value::Null);
    }

    #[tokio::test]
    async fn error_status_is_a_rejection() {
        let (base, _inbox) = spawn_backend(StatusCode::CONFLICT).await;
        let store = RestSignupStore::new(&base, "service-key", "waitlist_signups");

        let err = store.upsert_signup(&record()).await.unwrap_err();
        match err {
            PersistenceError::Rejected(msg) => assert!(msg.contains("409")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_unavailable() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = RestSignupStore::new(&format!("http://{addr}"), "k", "waitlist_signups");
        let err = store.upsert_signup(&record()).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Unavailable(_)));
    }
}
