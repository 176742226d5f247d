use api_errors::{ErrDef, Problem, ValidationViolation, finalize};

use crate::domain::error::DomainError;

pub const VALIDATION_FAILED: ErrDef =
    ErrDef::new(422, "Validation Failed", "SCHEMA_MIGRATOR_VALIDATION_FAILED");
pub const PROTECTED_TABLE: ErrDef =
    ErrDef::new(403, "Protected Table", "SCHEMA_MIGRATOR_PROTECTED_TABLE");
pub const TABLE_EXISTS: ErrDef = ErrDef::new(409, "Table Exists", "SCHEMA_MIGRATOR_TABLE_EXISTS");
pub const TABLE_NOT_FOUND: ErrDef =
    ErrDef::new(404, "Table Not Found", "SCHEMA_MIGRATOR_TABLE_NOT_FOUND");
pub const CONFIG_UNAVAILABLE: ErrDef = ErrDef::new(
    412,
    "Connection Config Unavailable",
    "SCHEMA_MIGRATOR_CONFIG_UNAVAILABLE",
);
pub const CONNECTION_FAILED: ErrDef =
    ErrDef::new(502, "Connection Failed", "SCHEMA_MIGRATOR_CONNECTION_FAILED");
pub const INTERNAL: ErrDef = ErrDef::new(500, "Internal Error", "SCHEMA_MIGRATOR_INTERNAL");
pub const UNAUTHENTICATED: ErrDef =
    ErrDef::new(401, "Unauthenticated", "SCHEMA_MIGRATOR_UNAUTHENTICATED");

fn current_trace_id() -> Option<String> {
    tracing::Span::current()
        .id()
        .map(|id| id.into_u64().to_string())
}

/// Map a domain error to an RFC 9457 problem for the request at `instance`.
pub fn domain_error_to_problem(e: &DomainError, instance: &str) -> Problem {
    let problem = match e {
        DomainError::Validation(violations) => VALIDATION_FAILED
            .as_problem(format!("the request has {} invalid field(s)", violations.len()))
            .with_errors(
                violations
                    .iter()
                    .map(|v| ValidationViolation::new(&v.field, &v.message))
                    .collect(),
            ),
        DomainError::ProtectedTable(_) => PROTECTED_TABLE.as_problem(e.to_string()),
        DomainError::TableExists(_) => TABLE_EXISTS.as_problem(e.to_string()),
        DomainError::TableNotFound(_) => TABLE_NOT_FOUND.as_problem(e.to_string()),
        DomainError::ConfigMissing(_) | DomainError::ConfigCorrupt(_) => {
            tracing::error!(error = %e, "Tenant connection config unavailable");
            CONFIG_UNAVAILABLE.as_problem(e.to_string())
        }
        DomainError::Connection(_) => {
            tracing::error!(error = %e, "Tenant database unreachable");
            CONNECTION_FAILED.as_problem(e.to_string())
        }
        DomainError::Execution(_) | DomainError::Internal(_) => {
            tracing::error!(error = %e, "Schema operation failed");
            INTERNAL.as_problem(e.to_string())
        }
        DomainError::Unauthenticated => unauthenticated_problem("no tenant identity on request"),
    };
    finalize(problem, instance, current_trace_id())
}

pub fn unauthenticated_problem(detail: &str) -> Problem {
    UNAUTHENTICATED.as_problem(detail)
}
