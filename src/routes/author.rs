//! Author lookup endpoint.
//!
//! GET /author?owner=&repo=&path=&line=
//!
//! Returns the author of the newest commit whose patch covers the line.
//! Every parameter is optional and falls back to the configured default
//! target. A line below 1 is rejected before the history provider is asked.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::blame::{BlameError, BlameResolver};
use crate::error::Result;
use crate::models::{BlameQuery, BlameResponse};

/// Lookup target used when the request leaves a parameter out.
#[derive(Debug, Clone)]
pub struct AuthorDefaults {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub line: i64,
}

#[derive(Clone)]
pub struct AuthorState {
    pub resolver: BlameResolver,
    pub defaults: Arc<AuthorDefaults>,
}

pub fn routes(state: AuthorState) -> Router {
    Router::new()
        .route("/author", get(get_author))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AuthorQuery {
    owner: Option<String>,
    repo: Option<String>,
    path: Option<String>,
    line: Option<i64>,
}

impl AuthorQuery {
    fn into_blame_query(self, defaults: &AuthorDefaults) -> BlameQuery {
        BlameQuery {
            owner: self.owner.unwrap_or_else(|| defaults.owner.clone()),
            repo: self.repo.unwrap_or_else(|| defaults.repo.clone()),
            path: self.path.unwrap_or_else(|| defaults.path.clone()),
            line: self.line.unwrap_or(defaults.line),
        }
    }
}

async fn get_author(
    State(state): State<AuthorState>,
    query: std::result::Result<Query<AuthorQuery>, QueryRejection>,
) -> Result<Json<BlameResponse>> {
    let Query(query) = query.map_err(|e| BlameError::InvalidQuery(e.body_text()))?;
    let query = query.into_blame_query(&state.defaults);

    let found = state.resolver.resolve(&query).await?;
    Ok(Json(BlameResponse::from_match(found, chrono::Utc::now())))
}
