//! Backend configuration as exposed by `GET /api/config`.
//!
//! Every section and field is optional on the wire; the backend omits
//! sections it was started without.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub import: ImportSection,
    #[serde(default)]
    pub classification: ClassificationSection,
    #[serde(default)]
    pub healpix: HealpixSection,
    #[serde(default)]
    pub web: WebSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSection {
    #[serde(default)]
    pub threads: Option<u32>,
    #[serde(default)]
    pub vgroups: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSection {
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
    #[serde(default)]
    pub update_database: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealpixSection {
    #[serde(default)]
    pub nside: Option<u32>,
    #[serde(default)]
    pub scheme: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebSection {
    #[serde(default)]
    pub port: Option<u16>,
}

impl BackendConfig {
    /// Database name with empty strings treated as unset.
    pub fn database_name(&self) -> Option<&str> {
        self.database.name.as_deref().filter(|n| !n.is_empty())
    }
}

/// Body of `POST /api/config`.
///
/// `threads` and `vgroups` are left out when applying a config, since the
/// backend keeps its current import settings in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub db_name: String,
    pub db_host: String,
    pub db_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vgroups: Option<u32>,
    pub confidence_threshold: f64,
}
