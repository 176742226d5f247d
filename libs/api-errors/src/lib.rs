//! HTTP error model shared by the schema migrator services.
//!
//! - RFC 9457 Problem Details (`Problem`) with per-field violations
//! - Static catalog entries (`ErrDef`) mapping a stable code to status and title
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod catalog;
pub mod problem;

pub use catalog::ErrDef;
pub use problem::{APPLICATION_PROBLEM_JSON, Problem, ValidationViolation};

/// Attach the request path and trace id to a problem before it leaves the service.
pub fn finalize(mut p: Problem, instance: &str, trace_id: Option<String>) -> Problem {
    p = p.with_instance(instance);
    if let Some(tid) = trace_id {
        p = p.with_trace_id(tid);
    }
    p
}
