//! Store statistics for the `status` command.

use super::Database;
use crate::error::StoreResult;
use crate::types::EntityClass;
use rusqlite::params;
use serde::Serialize;

/// Per-class numbers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ClassStats {
    pub class: EntityClass,
    pub items: i64,
    /// Highest stored sequence number (`None` when the class is empty).
    pub highest_sequence: Option<u64>,
    /// Persisted counter (`None` when never incremented).
    pub counter: Option<u64>,
}

/// Snapshot of what the target store holds.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub classes: Vec<ClassStats>,
    pub associations: i64,
    pub history_entries: i64,
}

impl Database {
    /// Collect item, association and history counts.
    pub fn get_stats(&self) -> StoreResult<StoreStats> {
        let mut classes = Vec::with_capacity(EntityClass::ALL.len());
        for class in EntityClass::ALL {
            let class_id = self.settings().class(class).class_id;
            let items: i64 = self.with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM configitem WHERE class_id = ?1",
                    params![class_id],
                    |row| row.get(0),
                )?)
            })?;
            classes.push(ClassStats {
                class,
                items,
                highest_sequence: self.highest_sequence_number(class)?,
                counter: self.counter_value(class)?,
            });
        }

        let (associations, history_entries) = self.with_conn(|conn| {
            let associations: i64 =
                conn.query_row("SELECT COUNT(*) FROM configitem_link", [], |row| row.get(0))?;
            let history: i64 =
                conn.query_row("SELECT COUNT(*) FROM configitem_history", [], |row| row.get(0))?;
            Ok((associations, history))
        })?;

        Ok(StoreStats {
            classes,
            associations,
            history_entries,
        })
    }
}
