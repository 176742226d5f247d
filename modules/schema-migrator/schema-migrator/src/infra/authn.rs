//! Bearer tokens configured up front, each bound to one tenant.

use std::collections::HashMap;

use async_trait::async_trait;
use tenant_security::SecurityContext;

use crate::config::TokenGrant;
use crate::domain::ports::AuthnResolver;

pub struct StaticTokenResolver {
    tokens: HashMap<String, TokenGrant>,
}

impl StaticTokenResolver {
    #[must_use]
    pub fn new(tokens: HashMap<String, TokenGrant>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl AuthnResolver for StaticTokenResolver {
    async fn resolve(&self, token: &str) -> Option<SecurityContext> {
        let grant = self.tokens.get(token)?;
        if grant.tenant_id.is_nil() {
            tracing::warn!("Static token grants the nil tenant; ignoring it");
            return None;
        }
        Some(
            SecurityContext::for_tenant(grant.tenant_id)
                .with_subject(grant.subject_id, "static_token"),
        )
    }
}
