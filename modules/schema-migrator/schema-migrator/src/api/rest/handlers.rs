use std::sync::Arc;

use api_errors::Problem;
use axum::Json;
use axum::extract::Extension;
use axum::extract::rejection::JsonRejection;
use axum::http::Uri;
use schema_migrator_sdk::{MigrationOutcome, MigrationPreview};
use serde_json::Value;

use crate::domain::error::DomainError;
use crate::domain::service::{ConfigRequest, Service, TableRequest};

use super::auth::Authz;
use super::dto::{HealthResponse, SaveConfigResponse};
use super::error::domain_error_to_problem;

type ApiResult<T> = Result<Json<T>, Problem>;

/// Bodies are taken as raw JSON so the validator can report every bad field,
/// not just the first one serde trips over.
fn body(uri: &Uri, payload: Result<Json<Value>, JsonRejection>) -> Result<Value, Problem> {
    payload.map(|Json(v)| v).map_err(|rejection| {
        domain_error_to_problem(
            &DomainError::validation("body", rejection.body_text()),
            uri.path(),
        )
    })
}

pub async fn save_config(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<SaveConfigResponse> {
    let body = body(&uri, payload)?;
    let saved = svc
        .save_config(&ctx, ConfigRequest::Body(&body))
        .await
        .map_err(|e| domain_error_to_problem(&e, uri.path()))?;
    Ok(Json(saved.into()))
}

#[allow(clippy::unused_async)] // axum handler
pub async fn preview_migration(
    Authz(_ctx): Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<MigrationPreview> {
    let body = body(&uri, payload)?;
    svc.preview_migration(TableRequest::Body(&body))
        .map(Json)
        .map_err(|e| domain_error_to_problem(&e, uri.path()))
}

pub async fn run_migration(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<MigrationOutcome> {
    let body = body(&uri, payload)?;
    svc.run_migration(&ctx, TableRequest::Body(&body))
        .await
        .map(Json)
        .map_err(|e| domain_error_to_problem(&e, uri.path()))
}

pub async fn rollback_migration(
    Authz(ctx): Authz,
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<MigrationOutcome> {
    let body = body(&uri, payload)?;
    let Some(table) = body.get("table").and_then(Value::as_str) else {
        return Err(domain_error_to_problem(
            &DomainError::validation("table", "is required and must be a string"),
            uri.path(),
        ));
    };
    svc.rollback_migration(&ctx, table)
        .await
        .map(Json)
        .map_err(|e| domain_error_to_problem(&e, uri.path()))
}

#[allow(clippy::unused_async)] // axum handler
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
    })
}
