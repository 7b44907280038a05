//! API route handlers.
//!
//! Each submodule defines routes for a feature area:
//! - `bookings`: Record and list bookings (POST/GET /book)
//! - `author`: Last author of a file line (GET /author)

pub mod author;
pub mod bookings;

use axum::Router;

use crate::store::SharedStore;

pub use author::{AuthorDefaults, AuthorState};

pub fn create_router(store: SharedStore, author: AuthorState) -> Router {
    Router::new()
        .merge(bookings::routes(store))
        .merge(author::routes(author))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blame::{BlameResolver, ResolverOptions};
    use crate::history::{HistoryProvider, LocalGitProvider, ProviderError};
    use crate::models::{CommitPage, CommitRecord};
    use crate::store::InMemoryBookingStore;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Provider that records calls and always fails.
    #[derive(Default)]
    struct UnreachableProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HistoryProvider for UnreachableProvider {
        async fn list_commits(
            &self,
            _: &str,
            _: &str,
            _: &str,
            _: u32,
        ) -> Result<CommitPage, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Transport("connection refused".to_string()))
        }

        async fn get_commit(
            &self,
            _: &str,
            _: &str,
            _: &str,
        ) -> Result<CommitRecord, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Transport("connection refused".to_string()))
        }

        fn name(&self) -> &'static str {
            "unreachable"
        }
    }

    fn defaults() -> Arc<AuthorDefaults> {
        Arc::new(AuthorDefaults {
            owner: "acme".to_string(),
            repo: "hotel".to_string(),
            path: "main.go".to_string(),
            line: 42,
        })
    }

    fn app_with(provider: Arc<dyn HistoryProvider>) -> Router {
        let author = AuthorState {
            resolver: BlameResolver::new(provider, ResolverOptions::default()),
            defaults: defaults(),
        };
        create_router(Arc::new(InMemoryBookingStore::new()), author)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header("content-type", "application/json");
        }
        let request = request
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_create_and_list_bookings() {
        let app = app_with(Arc::new(UnreachableProvider::default()));

        let (status, created) = send(
            &app,
            Method::POST,
            "/book",
            Some(r#"{"id": 99, "customer": "Ada", "room": 101}"#),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["customer"], "Ada");

        send(&app, Method::POST, "/book", Some(r#"{"customer": "Grace", "room": 7}"#)).await;

        let (status, listed) = send(&app, Method::GET, "/book", None).await;
        assert_eq!(status, StatusCode::OK);
        let rooms: Vec<_> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["room"].as_u64().unwrap())
            .collect();
        assert_eq!(rooms, vec![101, 7]);
    }

    #[tokio::test]
    async fn test_invalid_booking_body() {
        let app = app_with(Arc::new(UnreachableProvider::default()));

        let (status, body) = send(&app, Method::POST, "/book", Some(r#"{"customer": "Ada""#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

        let negative_room = r#"{"customer": "Ada", "room": -1}"#;
        let (status, _) = send(&app, Method::POST, "/book", Some(negative_room)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_wrong_method_on_book() {
        let app = app_with(Arc::new(UnreachableProvider::default()));
        let (status, _) = send(&app, Method::DELETE, "/book", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_author_rejects_bad_line_without_lookup() {
        let provider = Arc::new(UnreachableProvider::default());
        let app = app_with(provider.clone());

        let (status, _) = send(&app, Method::GET, "/author?line=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/author?line=abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_author_provider_failure_is_bad_gateway() {
        let provider = Arc::new(UnreachableProvider::default());
        let app = app_with(provider.clone());

        let (status, body) = send(&app, Method::GET, "/author", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("list_commits"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_author_from_local_repository() {
        let (dir, [_alice, bob, _carol]) = crate::history::local::tests::fixture_repo();
        let app = app_with(Arc::new(LocalGitProvider::open(dir.path(), 100).unwrap()));

        let (status, body) = send(&app, Method::GET, "/author?line=5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["author"], "bob");
        assert_eq!(body["commit"], bob.to_string());
        assert_eq!(body["path"], "main.go");

        let (status, body) = send(&app, Method::GET, "/author?path=main.go&line=1000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No commit found for file main.go at line 1000");
    }
}
