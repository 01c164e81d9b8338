//! Associations between items and their audit history.

use super::{Database, format_time, now_timestamp};
use crate::error::StoreResult;
use crate::types::{Association, HistoryEntry};
use rusqlite::params;

impl Database {
    /// Record a "connected to" association as a link relation plus a directed item link.
    pub fn create_association(&self, source_id: i64, target_id: i64) -> StoreResult<Association> {
        let defaults = self.settings().defaults.clone();
        let at = format_time(&now_timestamp());
        self.with_conn_mut(|conn| {
            let sp = conn.savepoint()?;
            sp.execute(
                "INSERT INTO link_relation (source_object_id, source_key, target_object_id,
                                            target_key, type_id, state_id, create_time, create_by)
                 VALUES (?1, ?2, ?1, ?3, ?4, ?5, ?6, ?7)",
                params![
                    defaults.link_object_id.to_string(),
                    source_id.to_string(),
                    target_id.to_string(),
                    defaults.link_type_id.to_string(),
                    defaults.link_state_id.to_string(),
                    at,
                    defaults.user_id.to_string()
                ],
            )?;
            sp.execute(
                "INSERT INTO configitem_link (link_type_id, source_configitem_id,
                                              target_configitem_id, create_time, create_by)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![defaults.link_type_id, source_id, target_id, at, defaults.user_id],
            )?;
            sp.commit()?;

            Ok(Association {
                source_id,
                target_id,
                kind: Association::CONNECTED_TO.to_string(),
            })
        })
    }

    /// Attach an audit note to an item.
    pub fn create_history_entry(&self, item_id: i64, content: &str) -> StoreResult<HistoryEntry> {
        let defaults = self.settings().defaults.clone();
        let at = format_time(&now_timestamp());
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO configitem_history (configitem_id, content, create_by, create_time, type_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![item_id, content, defaults.user_id, at, defaults.history_type_id],
            )?;
            Ok(HistoryEntry {
                id: conn.last_insert_rowid(),
                item_id,
                content: content.to_string(),
            })
        })
    }

    /// Associations where the item is either endpoint, oldest first.
    pub fn associations_for(&self, item_id: i64) -> StoreResult<Vec<Association>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT source_configitem_id, target_configitem_id FROM configitem_link
                 WHERE source_configitem_id = ?1 OR target_configitem_id = ?1
                 ORDER BY id",
            )?;
            let links = stmt
                .query_map(params![item_id], |row| {
                    Ok(Association {
                        source_id: row.get(0)?,
                        target_id: row.get(1)?,
                        kind: Association::CONNECTED_TO.to_string(),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(links)
        })
    }

    /// History entries of an item, oldest first.
    pub fn history_for(&self, item_id: i64) -> StoreResult<Vec<HistoryEntry>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, configitem_id, content FROM configitem_history
                 WHERE configitem_id = ?1 ORDER BY id",
            )?;
            let entries = stmt
                .query_map(params![item_id], |row| {
                    Ok(HistoryEntry {
                        id: row.get(0)?,
                        item_id: row.get(1)?,
                        content: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewContract, NewLicense};

    fn seed_pair(db: &Database) -> (i64, i64) {
        let contract = db
            .create_contract(&NewContract {
                sequence_number: "0048000001".into(),
                name: "Adobe Creative Cloud".into(),
                created_at: now_timestamp(),
            })
            .unwrap();
        let license = db
            .create_license(&NewLicense {
                sequence_number: "0055000001".into(),
                name: "Adobe Acrobat Pro".into(),
                description: String::new(),
                expiry_date: None,
                key: None,
                quantity: None,
                created_at: now_timestamp(),
            })
            .unwrap();
        (contract.id, license.id)
    }

    #[test]
    fn test_association_visible_from_both_endpoints() {
        let db = Database::open_in_memory().unwrap();
        let (contract, license) = seed_pair(&db);

        let assoc = db.create_association(contract, license).unwrap();
        assert_eq!(assoc.kind, "connected-to");
        assert_eq!(db.associations_for(contract).unwrap(), vec![assoc.clone()]);
        assert_eq!(db.associations_for(license).unwrap(), vec![assoc]);

        let relations: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM link_relation WHERE source_key = ?1 AND target_key = ?2",
                    params![contract.to_string(), license.to_string()],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(relations, 1);
    }

    #[test]
    fn test_association_to_missing_item_fails() {
        let db = Database::open_in_memory().unwrap();
        let (contract, _) = seed_pair(&db);
        assert!(db.create_association(contract, 999).is_err());
        // The link relation half was rolled back with the savepoint
        let relations: i64 = db
            .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM link_relation", [], |r| r.get(0))?))
            .unwrap();
        assert_eq!(relations, 0);
    }

    #[test]
    fn test_history_entries_in_order() {
        let db = Database::open_in_memory().unwrap();
        let (contract, license) = seed_pair(&db);

        db.create_history_entry(contract, &HistoryEntry::link_content(license))
            .unwrap();
        db.create_history_entry(contract, "second").unwrap();

        let entries = db.history_for(contract).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, format!("{}%%ITSMConfigItem", license));
        assert_eq!(entries[1].content, "second");
        assert!(db.history_for(license).unwrap().is_empty());
    }
}
