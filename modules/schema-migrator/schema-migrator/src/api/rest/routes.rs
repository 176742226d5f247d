use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router, middleware};

use crate::domain::ports::AuthnResolver;
use crate::domain::service::Service;

use super::{auth, handlers};

pub const BASE_PATH: &str = "/schema-migrator/v1";

/// Every `/schema-migrator/v1` route requires a bearer token; `/health` does not.
pub fn router(service: Arc<Service>, authn: Arc<dyn AuthnResolver>) -> Router {
    let api = Router::new()
        .route(&format!("{BASE_PATH}/db-config"), post(handlers::save_config))
        .route(&format!("{BASE_PATH}/generate"), post(handlers::preview_migration))
        .route(&format!("{BASE_PATH}/migrate"), post(handlers::run_migration))
        .route(&format!("{BASE_PATH}/rollback"), post(handlers::rollback_migration))
        .route_layer(middleware::from_fn_with_state(authn, auth::authenticate))
        .layer(Extension(service));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt as _;
    use uuid::Uuid;

    use crate::config::TokenGrant;
    use crate::domain::service::ServiceConfig;
    use crate::domain::test_support::{InMemoryConfigStore, MockDriver};
    use crate::infra::authn::StaticTokenResolver;

    fn app() -> Router {
        let service = Arc::new(Service::new(
            Arc::new(InMemoryConfigStore::default()),
            Arc::new(MockDriver::default()),
            &ServiceConfig::default(),
        ));
        let authn = Arc::new(StaticTokenResolver::new(HashMap::from([(
            "tok".to_owned(),
            TokenGrant {
                tenant_id: Uuid::from_u128(1),
                subject_id: Uuid::nil(),
            },
        )])));
        router(service, authn)
    }

    fn generate(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/schema-migrator/v1/generate")
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder
            .body(Body::from(
                r#"{"table":"widgets","columns":[{"name":"title","type":"string"}]}"#,
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn api_routes_require_a_known_token() {
        let response = app().oneshot(generate(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()["content-type"],
            api_errors::APPLICATION_PROBLEM_JSON
        );

        let response = app().oneshot(generate(Some("other"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app().oneshot(generate(Some("tok"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/schema-migrator/v1/nope")
                    .header("authorization", "Bearer tok")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
