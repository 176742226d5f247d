//! Static error definitions.

use crate::problem::Problem;
use http::StatusCode;

/// Base URL under which every catalog code is documented.
pub const ERROR_TYPE_BASE: &str = "https://errors.cyberfabric.io/schema-migrator";

/// One catalog entry: a stable machine code bound to an HTTP status and title.
#[derive(Debug, Clone, Copy)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
}

impl ErrDef {
    #[must_use]
    pub const fn new(status: u16, title: &'static str, code: &'static str) -> Self {
        Self {
            status,
            title,
            code,
        }
    }

    /// Documentation URL for this code.
    #[must_use]
    pub fn type_url(&self) -> String {
        format!("{ERROR_TYPE_BASE}/{}", self.code)
    }

    /// Build a `Problem` for this entry with the given occurrence detail.
    #[inline]
    pub fn as_problem(&self, detail: impl Into<String>) -> Problem {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Problem::new(status, self.title, detail.into())
            .with_code(self.code)
            .with_type(self.type_url())
    }
}
