use schema_migrator_sdk::SavedConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveConfigResponse {
    pub message: String,
    pub config: SavedConfig,
}

impl From<SavedConfig> for SaveConfigResponse {
    fn from(config: SavedConfig) -> Self {
        Self {
            message: "DB config saved.".to_owned(),
            config,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
