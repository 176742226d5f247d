use uuid::Uuid;

/// Identity of the caller on whose behalf an operation runs.
///
/// The tenant id selects the stored connection config and therefore the
/// database every schema change lands in.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SecurityContext {
    tenant_id: Uuid,
    #[serde(default)]
    subject_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject_type: Option<String>,
}

impl SecurityContext {
    /// Acting for `tenant_id` with no known subject.
    #[must_use]
    pub fn for_tenant(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            subject_id: Uuid::nil(),
            subject_type: None,
        }
    }

    #[must_use]
    pub fn anonymous() -> Self {
        Self::for_tenant(Uuid::nil())
    }

    /// Attach the authenticated subject, e.g. a user or a service token.
    #[must_use]
    pub fn with_subject(mut self, subject_id: Uuid, subject_type: impl Into<String>) -> Self {
        self.subject_id = subject_id;
        self.subject_type = Some(subject_type.into());
        self
    }

    #[must_use]
    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    #[must_use]
    pub fn subject_id(&self) -> Uuid {
        self.subject_id
    }

    #[must_use]
    pub fn subject_type(&self) -> Option<&str> {
        self.subject_type.as_deref()
    }

    /// No tenant was resolved.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.tenant_id.is_nil()
    }
}
