//! Schema migrator module configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, bail};
use serde::{Deserialize, Serialize};
use tenant_security::SecretString;
use uuid::Uuid;

use crate::infra::crypto::ChaChaConfigCipher;

/// Module configuration, read from the `schema_migrator` section.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaMigratorConfig {
    /// Directory holding one `<database>.sqlite` file per SQLite tenant database.
    pub tenant_sqlite_dir: PathBuf,
    /// Base64-encoded 32-byte key sealing stored tenant configs. `${VAR}` is expanded.
    pub encryption_key: SecretString,
    /// Upper bound on acquiring a tenant connection.
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Pool size of each short-lived tenant connection.
    pub max_connections: u32,
    /// Length of `string` columns declared without `length`.
    pub default_string_length: u32,
    /// Static bearer tokens accepted by the built-in authenticator.
    pub tokens: HashMap<String, TokenGrant>,
}

impl Default for SchemaMigratorConfig {
    fn default() -> Self {
        Self {
            tenant_sqlite_dir: PathBuf::from("tenants"),
            encryption_key: SecretString::default(),
            connect_timeout: Duration::from_secs(10),
            max_connections: 2,
            default_string_length: 255,
            tokens: HashMap::new(),
        }
    }
}

impl SchemaMigratorConfig {
    /// Checks the settings `init` would otherwise trip over at startup.
    ///
    /// # Errors
    /// Fails if the encryption key is unusable or the pool size is zero.
    pub fn validate(&self) -> anyhow::Result<()> {
        ChaChaConfigCipher::from_base64_key(&self.encryption_key)
            .context("schema_migrator.encryption_key")?;
        if self.max_connections == 0 {
            bail!("schema_migrator.max_connections must be at least 1");
        }
        if self.default_string_length == 0 {
            bail!("schema_migrator.default_string_length must be at least 1");
        }
        Ok(())
    }
}

impl std::fmt::Debug for SchemaMigratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaMigratorConfig")
            .field("tenant_sqlite_dir", &self.tenant_sqlite_dir)
            .field("encryption_key", &self.encryption_key)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_connections", &self.max_connections)
            .field("default_string_length", &self.default_string_length)
            .field("tokens", &format_args!("<{} token(s)>", self.tokens.len()))
            .finish()
    }
}

/// Identity a static token stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenGrant {
    pub tenant_id: Uuid,
    #[serde(default)]
    pub subject_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let cfg: SchemaMigratorConfig = serde_json::from_value(json!({
            "connect_timeout": "3s",
            "tokens": {
                "t-1": { "tenant_id": "6f1c1c2e-8a4b-4c43-9f0e-1b9f1f6b2a10" }
            }
        }))
        .unwrap();
        assert_eq!(cfg.connect_timeout, Duration::from_secs(3));
        assert_eq!(cfg.default_string_length, 255);
        assert_eq!(cfg.tenant_sqlite_dir, PathBuf::from("tenants"));
        assert!(cfg.tokens["t-1"].subject_id.is_nil());
    }

    #[test]
    fn debug_hides_key_and_tokens() {
        let mut cfg = SchemaMigratorConfig {
            encryption_key: SecretString::new("c2VjcmV0"),
            ..Default::default()
        };
        cfg.tokens.insert(
            "very-secret-token".to_owned(),
            TokenGrant {
                tenant_id: Uuid::new_v4(),
                subject_id: Uuid::nil(),
            },
        );
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("c2VjcmV0"), "{dbg}");
        assert!(!dbg.contains("very-secret-token"), "{dbg}");
        assert!(dbg.contains("<1 token(s)>"));
    }

    #[test]
    fn validate_requires_a_usable_key() {
        let mut cfg = SchemaMigratorConfig::default();
        assert!(cfg.validate().is_err());

        cfg.encryption_key = SecretString::new("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=");
        cfg.validate().unwrap();

        cfg.max_connections = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let res = serde_json::from_value::<SchemaMigratorConfig>(json!({ "tenant_dir": "x" }));
        assert!(res.is_err());
    }
}
