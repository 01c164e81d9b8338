//! Per-class sequence lookups and persisted counters.

use super::Database;
use crate::error::{StorageError, StoreResult};
use crate::types::EntityClass;
use rusqlite::{OptionalExtension, params};

const COUNTER_TYPE: &str = "AutoIncrement";

fn parse_number(raw: &str, what: &str) -> StoreResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| StorageError::Corrupt(format!("{} '{}'", what, raw)))
}

impl Database {
    /// Highest item number stored for the class.
    ///
    /// Numbers are fixed-width, so the textual maximum is the numeric one.
    pub fn highest_sequence_number(&self, class: EntityClass) -> StoreResult<Option<u64>> {
        let class_id = self.settings().class(class).class_id;
        self.with_conn(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT configitem_number FROM configitem
                     WHERE class_id = ?1
                     ORDER BY configitem_number DESC
                     LIMIT 1",
                    params![class_id],
                    |row| row.get(0),
                )
                .optional()?;

            raw.map(|value| parse_number(&value, "sequence number"))
                .transpose()
        })
    }

    /// Increment the class counter, creating it on first use, and return the new value.
    pub fn increment_counter(&self, class: EntityClass) -> StoreResult<u64> {
        let class_id = self.settings().class(class).class_id;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO configitem_counter (class_id, counter_type, counter)
                 VALUES (?1, ?2, '1')
                 ON CONFLICT(class_id) DO UPDATE
                 SET counter = CAST(CAST(counter AS INTEGER) + 1 AS TEXT)",
                params![class_id, COUNTER_TYPE],
            )?;

            let raw: String = conn.query_row(
                "SELECT counter FROM configitem_counter WHERE class_id = ?1",
                params![class_id],
                |row| row.get(0),
            )?;
            parse_number(&raw, "counter")
        })
    }

    /// Current persisted counter of the class, if it exists.
    pub fn counter_value(&self, class: EntityClass) -> StoreResult<Option<u64>> {
        let class_id = self.settings().class(class).class_id;
        self.with_conn(|conn| {
            let raw: Option<String> = conn
                .query_row(
                    "SELECT counter FROM configitem_counter WHERE class_id = ?1",
                    params![class_id],
                    |row| row.get(0),
                )
                .optional()?;

            raw.map(|value| parse_number(&value, "counter")).transpose()
        })
    }
}
