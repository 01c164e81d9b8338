//! Configuration types.

use crate::types::EntityClass;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub cmdb: CmdbConfig,
}

impl Config {
    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.store.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Target store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("license-import/cmdb.db")
}

/// How the backup extract is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Marker for an absent value, compared case-insensitively after trimming.
    #[serde(default = "default_null_marker")]
    pub null_marker: String,

    /// Skip the first line of the file.
    #[serde(default)]
    pub has_header: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            null_marker: default_null_marker(),
            has_header: false,
        }
    }
}

fn default_delimiter() -> char {
    ';'
}

fn default_null_marker() -> String {
    "null".to_string()
}

/// Identifiers of the target CMDB's catalog entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmdbConfig {
    #[serde(default = "ClassConfig::contract")]
    pub contract: ClassConfig,

    #[serde(default = "ClassConfig::license")]
    pub license: ClassConfig,

    #[serde(default)]
    pub fields: FieldIds,

    #[serde(default)]
    pub defaults: RecordDefaults,
}

impl Default for CmdbConfig {
    fn default() -> Self {
        Self {
            contract: ClassConfig::contract(),
            license: ClassConfig::license(),
            fields: FieldIds::default(),
            defaults: RecordDefaults::default(),
        }
    }
}

impl CmdbConfig {
    /// Settings for one entity class.
    pub fn class(&self, class: EntityClass) -> &ClassConfig {
        match class {
            EntityClass::Contract => &self.contract,
            EntityClass::License => &self.license,
        }
    }
}

/// Per-class catalog settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Catalog class id stored on the item header.
    pub class_id: i64,

    /// Definition id stored on each version.
    pub definition_id: i64,

    /// Sequence seed used when the store holds no item of this class.
    pub number_base: u64,
}

impl ClassConfig {
    fn contract() -> Self {
        Self {
            class_id: 48,
            definition_id: 36,
            number_base: 48_000_000,
        }
    }

    fn license() -> Self {
        Self {
            class_id: 55,
            definition_id: 52,
            number_base: 55_000_000,
        }
    }
}

/// Attached-field ids for License attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldIds {
    #[serde(default = "default_license_key")]
    pub license_key: i64,

    #[serde(default = "default_license_quantity")]
    pub license_quantity: i64,

    #[serde(default = "default_license_end")]
    pub license_end: i64,
}

impl Default for FieldIds {
    fn default() -> Self {
        Self {
            license_key: default_license_key(),
            license_quantity: default_license_quantity(),
            license_end: default_license_end(),
        }
    }
}

fn default_license_key() -> i64 {
    89
}

fn default_license_quantity() -> i64 {
    143
}

fn default_license_end() -> i64 {
    58
}

/// Values written on every record the importer creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDefaults {
    #[serde(default = "default_deployment_state")]
    pub deployment_state_id: i64,

    #[serde(default = "default_incident_state")]
    pub incident_state_id: i64,

    /// User recorded as creator/changer.
    #[serde(default = "default_user_id")]
    pub user_id: i64,

    /// Link type ("connected to").
    #[serde(default = "default_link_type")]
    pub link_type_id: i64,

    /// Link object class for configuration items.
    #[serde(default = "default_link_object")]
    pub link_object_id: i64,

    #[serde(default = "default_link_state")]
    pub link_state_id: i64,

    /// History entry type for "link added".
    #[serde(default = "default_history_type")]
    pub history_type_id: i64,
}

impl Default for RecordDefaults {
    fn default() -> Self {
        Self {
            deployment_state_id: default_deployment_state(),
            incident_state_id: default_incident_state(),
            user_id: default_user_id(),
            link_type_id: default_link_type(),
            link_object_id: default_link_object(),
            link_state_id: default_link_state(),
            history_type_id: default_history_type(),
        }
    }
}

fn default_deployment_state() -> i64 {
    27
}

fn default_incident_state() -> i64 {
    1
}

fn default_user_id() -> i64 {
    2
}

fn default_link_type() -> i64 {
    6
}

fn default_link_object() -> i64 {
    3
}

fn default_link_state() -> i64 {
    1
}

fn default_history_type() -> i64 {
    3
}
