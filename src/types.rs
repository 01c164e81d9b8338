//! Core types for the contract/license import.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of a rendered sequence number (`48000001` -> `0048000001`).
pub const SEQUENCE_WIDTH: usize = 10;

/// Kind tag written into history entries to identify the linked item type.
pub const LINK_OBJECT_TAG: &str = "ITSMConfigItem";

/// Top-level entity category with its own identifier sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityClass {
    Contract,
    License,
}

impl EntityClass {
    pub const ALL: [EntityClass; 2] = [EntityClass::Contract, EntityClass::License];
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityClass::Contract => write!(f, "Contract"),
            EntityClass::License => write!(f, "License"),
        }
    }
}

/// Render an allocator value as a stored sequence number.
pub fn render_sequence_number(value: u64) -> String {
    format!("{:0width$}", value, width = SEQUENCE_WIDTH)
}

/// A Contract as created by the importer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Item id in the target store.
    pub id: i64,
    /// Id of the version row holding name and description.
    pub version_id: i64,
    pub sequence_number: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// A License as created (and possibly extended) by the importer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub id: i64,
    pub version_id: i64,
    pub sequence_number: String,
    pub name: String,
    /// Full rendered description, template included.
    pub description: String,
    pub expiry_date: Option<NaiveDateTime>,
    pub key: Option<String>,
    pub quantity: Option<String>,
    pub created_at: NaiveDateTime,
    pub changed_at: NaiveDateTime,
}

/// Header and first version of a Contract to persist.
#[derive(Debug, Clone)]
pub struct NewContract {
    pub sequence_number: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// Header, first version and attached attributes of a License to persist.
#[derive(Debug, Clone)]
pub struct NewLicense {
    pub sequence_number: String,
    pub name: String,
    pub description: String,
    pub expiry_date: Option<NaiveDateTime>,
    pub key: Option<String>,
    pub quantity: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Undirected "connected to" relationship between two items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub source_id: i64,
    pub target_id: i64,
    pub kind: String,
}

impl Association {
    pub const CONNECTED_TO: &'static str = "connected-to";
}

/// Audit note attached to one endpoint of an association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub item_id: i64,
    pub content: String,
}

impl HistoryEntry {
    /// Content recorded on one endpoint, pointing at the other.
    pub fn link_content(other_id: i64) -> String {
        format!("{}%%{}", other_id, LINK_OBJECT_TAG)
    }
}
