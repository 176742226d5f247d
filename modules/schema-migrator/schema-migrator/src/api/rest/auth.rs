//! Bearer authentication middleware and the `Authz` extractor.

use std::sync::Arc;

use api_errors::{Problem, finalize};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tenant_security::SecurityContext;

use crate::domain::ports::AuthnResolver;

use super::error::unauthenticated_problem;

/// Caller identity placed on the request by [`authenticate`].
#[derive(Debug, Clone)]
pub struct Authz(pub SecurityContext);

impl<S> FromRequestParts<S> for Authz
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SecurityContext>()
            .cloned()
            .map(Authz)
            .ok_or_else(|| {
                finalize(
                    unauthenticated_problem("no security context on request"),
                    parts.uri.path(),
                    None,
                )
            })
    }
}

/// Resolve the bearer token and attach the caller's [`SecurityContext`].
/// Missing or unknown tokens end the request with 401.
pub async fn authenticate(
    State(resolver): State<Arc<dyn AuthnResolver>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let Some(token) = extract_bearer_token(request.headers()) else {
        return finalize(unauthenticated_problem("missing bearer token"), &path, None)
            .into_response();
    };

    match resolver.resolve(token).await {
        Some(ctx) => {
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        None => {
            tracing::debug!(%path, "Rejected unknown bearer token");
            finalize(unauthenticated_problem("unknown bearer token"), &path, None).into_response()
        }
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
