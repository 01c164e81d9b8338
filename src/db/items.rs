//! Contract and License item persistence.

use super::{Database, format_time, parse_time};
use crate::config::{ClassConfig, RecordDefaults};
use crate::error::{StorageError, StoreResult};
use crate::types::{Contract, EntityClass, License, NewContract, NewLicense};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};

/// Insert an item header plus its first version and point the header at it.
///
/// Returns `(item_id, version_id)`.
fn insert_item(
    conn: &Connection,
    class: &ClassConfig,
    defaults: &RecordDefaults,
    number: &str,
    name: &str,
    description: &str,
    at: &NaiveDateTime,
) -> StoreResult<(i64, i64)> {
    let at = format_time(at);

    conn.execute(
        "INSERT INTO configitem (configitem_number, class_id, last_version_id,
                                 cur_depl_state_id, cur_inci_state_id,
                                 create_time, create_by, change_time, change_by)
         VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?5, ?6)",
        params![
            number,
            class.class_id,
            defaults.deployment_state_id,
            defaults.incident_state_id,
            at,
            defaults.user_id
        ],
    )?;
    let item_id = conn.last_insert_rowid();

    conn.execute(
        "INSERT INTO configitem_version (configitem_id, name, definition_id,
                                         depl_state_id, inci_state_id, description,
                                         create_time, create_by, change_time, change_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?7, ?8)",
        params![
            item_id,
            name,
            class.definition_id,
            defaults.deployment_state_id,
            defaults.incident_state_id,
            description,
            at,
            defaults.user_id
        ],
    )?;
    let version_id = conn.last_insert_rowid();

    conn.execute(
        "UPDATE configitem SET last_version_id = ?1 WHERE id = ?2",
        params![version_id, item_id],
    )?;

    Ok((item_id, version_id))
}

fn insert_text_field(conn: &Connection, field_id: i64, object_id: i64, value: &str) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO dynamic_field_value (field_id, object_id, value_text) VALUES (?1, ?2, ?3)",
        params![field_id, object_id, value],
    )?;
    Ok(())
}

fn insert_date_field(
    conn: &Connection,
    field_id: i64,
    object_id: i64,
    value: &NaiveDateTime,
) -> StoreResult<()> {
    conn.execute(
        "INSERT INTO dynamic_field_value (field_id, object_id, value_date) VALUES (?1, ?2, ?3)",
        params![field_id, object_id, format_time(value)],
    )?;
    Ok(())
}

fn get_text_field(conn: &Connection, field_id: i64, object_id: i64) -> StoreResult<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT value_text FROM dynamic_field_value
             WHERE field_id = ?1 AND object_id = ?2
             ORDER BY id LIMIT 1",
            params![field_id, object_id],
            |row| row.get(0),
        )
        .optional()?
        .flatten())
}

impl Database {
    /// Create a Contract header and first version.
    pub fn create_contract(&self, contract: &NewContract) -> StoreResult<Contract> {
        let settings = self.settings().clone();
        self.with_conn_mut(|conn| {
            let sp = conn.savepoint()?;
            let (id, version_id) = insert_item(
                &sp,
                &settings.contract,
                &settings.defaults,
                &contract.sequence_number,
                &contract.name,
                "",
                &contract.created_at,
            )?;
            sp.commit()?;

            Ok(Contract {
                id,
                version_id,
                sequence_number: contract.sequence_number.clone(),
                name: contract.name.clone(),
                created_at: contract.created_at,
            })
        })
    }

    /// Create a License header, first version and its present attributes.
    pub fn create_license(&self, license: &NewLicense) -> StoreResult<License> {
        let settings = self.settings().clone();
        self.with_conn_mut(|conn| {
            let sp = conn.savepoint()?;
            let (id, version_id) = insert_item(
                &sp,
                &settings.license,
                &settings.defaults,
                &license.sequence_number,
                &license.name,
                &license.description,
                &license.created_at,
            )?;

            let fields = &settings.fields;
            if let Some(ref expiry) = license.expiry_date {
                insert_date_field(&sp, fields.license_end, id, expiry)?;
            }
            if let Some(ref key) = license.key {
                insert_text_field(&sp, fields.license_key, id, key)?;
            }
            if let Some(ref quantity) = license.quantity {
                insert_text_field(&sp, fields.license_quantity, id, quantity)?;
            }
            sp.commit()?;

            Ok(License {
                id,
                version_id,
                sequence_number: license.sequence_number.clone(),
                name: license.name.clone(),
                description: license.description.clone(),
                expiry_date: license.expiry_date,
                key: license.key.clone(),
                quantity: license.quantity.clone(),
                created_at: license.created_at,
                changed_at: license.created_at,
            })
        })
    }

    /// Overwrite the description of a License version and touch both change times.
    pub fn update_license_description(
        &self,
        item_id: i64,
        version_id: i64,
        description: &str,
        changed_at: NaiveDateTime,
    ) -> StoreResult<()> {
        let at = format_time(&changed_at);
        self.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE configitem_version SET description = ?1, change_time = ?2
                 WHERE id = ?3 AND configitem_id = ?4",
                params![description, at, version_id, item_id],
            )?;
            if updated != 1 {
                return Err(StorageError::Corrupt(format!(
                    "version {} of item {} not found",
                    version_id, item_id
                )));
            }
            conn.execute(
                "UPDATE configitem SET change_time = ?1 WHERE id = ?2",
                params![at, item_id],
            )?;
            Ok(())
        })
    }

    /// Load a Contract by item id.
    pub fn get_contract(&self, id: i64) -> StoreResult<Option<Contract>> {
        let class_id = self.settings().class(EntityClass::Contract).class_id;
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT i.id, v.id, i.configitem_number, v.name, i.create_time
                     FROM configitem i
                     JOIN configitem_version v ON v.id = i.last_version_id
                     WHERE i.id = ?1 AND i.class_id = ?2",
                    params![id, class_id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                )
                .optional()?;

            match row {
                Some((id, version_id, sequence_number, name, created)) => Ok(Some(Contract {
                    id,
                    version_id,
                    sequence_number,
                    name,
                    created_at: parse_time(&created)?,
                })),
                None => Ok(None),
            }
        })
    }

    /// Load a License by item id, attributes included.
    pub fn get_license(&self, id: i64) -> StoreResult<Option<License>> {
        let settings = self.settings().clone();
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT i.id, v.id, i.configitem_number, v.name, v.description,
                            i.create_time, i.change_time
                     FROM configitem i
                     JOIN configitem_version v ON v.id = i.last_version_id
                     WHERE i.id = ?1 AND i.class_id = ?2",
                    params![id, settings.license.class_id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, String>(5)?,
                            row.get::<_, String>(6)?,
                        ))
                    },
                )
                .optional()?;

            let Some((id, version_id, sequence_number, name, description, created, changed)) = row
            else {
                return Ok(None);
            };

            let fields = &settings.fields;
            let expiry: Option<String> = conn
                .query_row(
                    "SELECT value_date FROM dynamic_field_value
                     WHERE field_id = ?1 AND object_id = ?2
                     ORDER BY id LIMIT 1",
                    params![fields.license_end, id],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();

            Ok(Some(License {
                id,
                version_id,
                sequence_number,
                name,
                description,
                expiry_date: expiry.as_deref().map(parse_time).transpose()?,
                key: get_text_field(conn, fields.license_key, id)?,
                quantity: get_text_field(conn, fields.license_quantity, id)?,
                created_at: parse_time(&created)?,
                changed_at: parse_time(&changed)?,
            }))
        })
    }

    /// Item ids of a class in creation order.
    pub fn list_item_ids(&self, class: EntityClass) -> StoreResult<Vec<i64>> {
        let class_id = self.settings().class(class).class_id;
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM configitem WHERE class_id = ?1 ORDER BY id")?;
            let ids = stmt
                .query_map(params![class_id], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::now_timestamp;

    fn new_license(number: &str, name: &str) -> NewLicense {
        NewLicense {
            sequence_number: number.to_string(),
            name: name.to_string(),
            description: "<p>first</p>".to_string(),
            expiry_date: None,
            key: None,
            quantity: None,
            created_at: now_timestamp(),
        }
    }

    #[test]
    fn test_create_contract_links_last_version() {
        let db = Database::open_in_memory().unwrap();
        let created = db
            .create_contract(&NewContract {
                sequence_number: "0048000001".to_string(),
                name: "Office365".to_string(),
                created_at: now_timestamp(),
            })
            .unwrap();

        let loaded = db.get_contract(created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
        assert_eq!(
            db.highest_sequence_number(EntityClass::Contract).unwrap(),
            Some(48_000_001)
        );
    }

    #[test]
    fn test_create_license_stores_only_present_attributes() {
        let db = Database::open_in_memory().unwrap();
        let mut new = new_license("0055000001", "Adobe Acrobat Pro");
        new.key = Some("AAAA-BBBB".to_string());

        let created = db.create_license(&new).unwrap();
        let loaded = db.get_license(created.id).unwrap().unwrap();

        assert_eq!(loaded.key.as_deref(), Some("AAAA-BBBB"));
        assert_eq!(loaded.quantity, None);
        assert_eq!(loaded.expiry_date, None);

        let field_rows: i64 = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM dynamic_field_value WHERE object_id = ?1",
                    params![created.id],
                    |row| row.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(field_rows, 1);
    }

    #[test]
    fn test_get_contract_ignores_other_class() {
        let db = Database::open_in_memory().unwrap();
        let license = db.create_license(&new_license("0055000001", "Visio")).unwrap();
        assert!(db.get_contract(license.id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_sequence_number_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_license(&new_license("0055000001", "A")).unwrap();
        let err = db.create_license(&new_license("0055000001", "B")).unwrap_err();
        assert!(matches!(err, StorageError::Sqlite(_)));

        // The failed insert left nothing behind
        assert_eq!(db.list_item_ids(EntityClass::License).unwrap().len(), 1);
    }

    #[test]
    fn test_update_unknown_version_is_corrupt() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .update_license_description(99, 99, "x", now_timestamp())
            .unwrap_err();
        assert!(matches!(err, StorageError::Corrupt(_)));
    }
}
