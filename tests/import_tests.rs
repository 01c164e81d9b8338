//! Integration tests for the import state machine.
//!
//! Rows are fed through `Importer` against an in-memory SQLite store and
//! the results are checked through the database API.

use chrono::NaiveDateTime;
use license_import::config::CmdbConfig;
use license_import::db::{Database, Gateway};
use license_import::error::{ImportError, StorageError, StoreResult};
use license_import::import::description::DescriptionTemplate;
use license_import::import::linker::LinkRule;
use license_import::import::row::RowNormalizer;
use license_import::import::{ImportSummary, Importer};
use license_import::types::{
    Association, Contract, EntityClass, HistoryEntry, License, NewContract, NewLicense,
};
use std::cell::Cell;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn numbered(rows: &[&str]) -> Vec<std::io::Result<(usize, String)>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| Ok((i + 1, row.to_string())))
        .collect()
}

fn import_rows<G: Gateway + ?Sized>(
    gateway: &G,
    rows: &[&str],
) -> Result<ImportSummary, ImportError> {
    Importer::seeded(gateway, RowNormalizer::default())?
        .run(numbered(rows))
}

fn contracts(db: &Database) -> Vec<Contract> {
    db.list_item_ids(EntityClass::Contract)
        .unwrap()
        .into_iter()
        .map(|id| db.get_contract(id).unwrap().unwrap())
        .collect()
}

fn licenses(db: &Database) -> Vec<License> {
    db.list_item_ids(EntityClass::License)
        .unwrap()
        .into_iter()
        .map(|id| db.get_license(id).unwrap().unwrap())
        .collect()
}

fn body(license: &License) -> String {
    DescriptionTemplate::default()
        .parse(&license.sequence_number, &license.description)
        .unwrap()
        .to_string()
}

mod grouping_tests {
    use super::*;

    #[test]
    fn contract_per_run_of_equal_names() {
        let db = setup_db();
        let summary = import_rows(
            &db,
            &[
                "Office365;null;null;null;null;null",
                "Office365;null;null;null;null;null",
                "null;null;null;null;null;null",
                "Office365;null;null;null;null;null",
                "Adobe;null;null;null;null;null",
                "Office365;null;null;null;null;null",
            ],
        )
        .unwrap();

        assert_eq!(summary.contracts_created, 3);
        let names: Vec<_> = contracts(&db).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Office365", "Adobe", "Office365"]);
    }

    #[test]
    fn license_per_run_of_equal_names() {
        let db = setup_db();
        let summary = import_rows(
            &db,
            &[
                "null;Visio;K1;1;null;alice",
                "null;Visio;K1;1;null;bob",
                "null;Project;K2;1;null;carol",
                "null;Visio;K1;1;null;dave",
            ],
        )
        .unwrap();

        assert_eq!(summary.licenses_created, 3);
        assert_eq!(summary.fragments_appended, 1);
        assert_eq!(summary.rows_read, 4);
    }

    #[test]
    fn names_compare_case_sensitively() {
        let db = setup_db();
        let summary = import_rows(
            &db,
            &[
                "null;Visio;null;null;null;null",
                "null;visio;null;null;null;null",
            ],
        )
        .unwrap();
        assert_eq!(summary.licenses_created, 2);
    }
}

mod sequence_tests {
    use super::*;

    #[test]
    fn numbers_start_after_class_base_on_empty_store() {
        let db = setup_db();
        import_rows(
            &db,
            &[
                "A;L1;null;null;null;null",
                "B;L2;null;null;null;null",
            ],
        )
        .unwrap();

        let numbers: Vec<_> = contracts(&db).into_iter().map(|c| c.sequence_number).collect();
        assert_eq!(numbers, vec!["0048000001", "0048000002"]);
        let numbers: Vec<_> = licenses(&db).into_iter().map(|l| l.sequence_number).collect();
        assert_eq!(numbers, vec!["0055000001", "0055000002"]);
    }

    #[test]
    fn numbers_continue_from_existing_high_water_mark() {
        let db = setup_db();
        db.create_contract(&NewContract {
            sequence_number: "0048000007".into(),
            name: "Legacy".into(),
            created_at: license_import::db::now_timestamp(),
        })
        .unwrap();

        let summary = import_rows(
            &db,
            &[
                "A;null;null;null;null;null",
                "B;null;null;null;null;null",
            ],
        )
        .unwrap();

        let numbers: Vec<_> = contracts(&db)
            .into_iter()
            .skip(1)
            .map(|c| c.sequence_number)
            .collect();
        assert_eq!(numbers, vec!["0048000008", "0048000009"]);

        let seq = summary.sequences[&EntityClass::Contract];
        assert_eq!(seq.seed, 48_000_007);
        assert_eq!(seq.current, 48_000_009);
        assert_eq!(seq.counter, Some(2));
    }

    #[test]
    fn counters_advance_once_per_entity() {
        let db = setup_db();
        import_rows(
            &db,
            &[
                "A;L1;null;null;null;null",
                "A;L1;null;null;null;null",
                "A;L2;null;null;null;null",
            ],
        )
        .unwrap();

        assert_eq!(db.counter_value(EntityClass::Contract).unwrap(), Some(1));
        assert_eq!(db.counter_value(EntityClass::License).unwrap(), Some(2));
    }
}

mod description_tests {
    use super::*;

    #[test]
    fn fragments_accumulate_in_order() {
        let db = setup_db();
        import_rows(
            &db,
            &[
                "null;Visio;KEY-1;5;null;alice",
                "null;Visio;KEY-1;null;null;bob",
                "null;Visio;null;null;null;carol",
            ],
        )
        .unwrap();

        let all = licenses(&db);
        assert_eq!(all.len(), 1);
        assert_eq!(
            body(&all[0]),
            "<p>KEY-1<br> Quantity 5 User: alice</p>\n<p> User: bob</p>\n<p> User: carol</p>"
        );
    }

    #[test]
    fn changed_key_is_written_again() {
        let db = setup_db();
        import_rows(
            &db,
            &[
                "null;Visio;KEY-1;null;null;null",
                "null;Visio;KEY-2;null;null;null",
                "null;Project;KEY-2;null;null;null",
            ],
        )
        .unwrap();

        let all = licenses(&db);
        assert_eq!(body(&all[0]), "<p>KEY-1<br></p>\n<p>KEY-2<br></p>");
        // The key is remembered across License groups
        assert_eq!(body(&all[1]), "<p></p>");
        // The attached attribute is still the row's own key
        assert_eq!(all[1].key.as_deref(), Some("KEY-2"));
    }

    #[test]
    fn markup_in_row_values_survives_appends() {
        let db = setup_db();
        import_rows(
            &db,
            &[
                "null;Visio;null;null;null;a</body>b",
                "null;Visio;null;null;null;second",
            ],
        )
        .unwrap();

        assert_eq!(
            body(&licenses(&db)[0]),
            "<p> User: a</body>b</p>\n<p> User: second</p>"
        );
    }

    #[test]
    fn closed_license_is_not_touched_again() {
        let db = setup_db();
        import_rows(
            &db,
            &[
                "null;Visio;null;null;null;alice",
                "null;Project;null;null;null;bob",
            ],
        )
        .unwrap();

        let all = licenses(&db);
        assert_eq!(body(&all[0]), "<p> User: alice</p>");
        assert_eq!(body(&all[1]), "<p> User: bob</p>");
    }

    #[test]
    fn expiry_and_quantity_attached_on_creation() {
        let db = setup_db();
        import_rows(&db, &["null;Visio;null;25;2026-03-11 00:00:00.0000000;null"]).unwrap();

        let license = &licenses(&db)[0];
        assert_eq!(license.quantity.as_deref(), Some("25"));
        assert_eq!(
            license.expiry_date,
            Some(NaiveDateTime::parse_from_str("2026-03-11 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap())
        );
        assert_eq!(license.key, None);
    }
}

mod link_tests {
    use super::*;

    #[test]
    fn same_row_rule_takes_precedence() {
        let db = setup_db();
        let summary = import_rows(&db, &["Office365;Office365 E3;null;null;null;null"]).unwrap();

        assert_eq!(summary.associations.get(&LinkRule::SameRow), Some(&1));
        assert_eq!(summary.associations.get(&LinkRule::NameContainment), None);

        let contract = &contracts(&db)[0];
        let license = &licenses(&db)[0];
        let links = db.associations_for(license.id).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].source_id, contract.id);
        assert_eq!(links[0].target_id, license.id);
    }

    #[test]
    fn name_containment_links_contract_in_scope() {
        let db = setup_db();
        let summary = import_rows(
            &db,
            &[
                "Adobe Creative Cloud;null;null;null;null;null",
                "null;Adobe Acrobat Pro;null;null;null;null",
            ],
        )
        .unwrap();

        assert_eq!(summary.associations.get(&LinkRule::NameContainment), Some(&1));

        let contract = &contracts(&db)[0];
        let license = &licenses(&db)[0];
        let contract_history = db.history_for(contract.id).unwrap();
        let license_history = db.history_for(license.id).unwrap();
        assert_eq!(contract_history.len(), 1);
        assert_eq!(license_history.len(), 1);
        assert_eq!(contract_history[0].content, format!("{}%%ITSMConfigItem", license.id));
        assert_eq!(license_history[0].content, format!("{}%%ITSMConfigItem", contract.id));
    }

    #[test]
    fn unrelated_name_is_not_linked() {
        let db = setup_db();
        let summary = import_rows(
            &db,
            &[
                "Adobe Creative Cloud;null;null;null;null;null",
                "null;Visio;null;null;null;null",
            ],
        )
        .unwrap();

        assert_eq!(summary.associations_created(), 0);
        assert_eq!(db.get_stats().unwrap().history_entries, 0);
    }

    #[test]
    fn no_contract_in_scope_means_no_link() {
        let db = setup_db();
        let summary = import_rows(&db, &["null;Adobe Acrobat Pro;null;null;null;null"]).unwrap();

        assert_eq!(summary.licenses_created, 1);
        assert_eq!(summary.associations_created(), 0);
    }

    #[test]
    fn continued_license_is_not_linked_again() {
        let db = setup_db();
        let summary = import_rows(
            &db,
            &[
                "Office365;Office365 E3;null;null;null;null",
                "Office365;Office365 E3;null;null;null;bob",
            ],
        )
        .unwrap();

        assert_eq!(summary.associations_created(), 1);
        assert_eq!(summary.fragments_appended, 1);
    }

    #[test]
    fn reimport_creates_duplicate_entities_and_links() {
        let db = setup_db();
        let rows = ["Office365;Office365 E3;null;null;null;null"];
        import_rows(&db, &rows).unwrap();
        import_rows(&db, &rows).unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.classes[0].items, 2);
        assert_eq!(stats.classes[0].highest_sequence, Some(48_000_002));
        assert_eq!(stats.associations, 2);
        assert_eq!(stats.history_entries, 4);
    }
}

mod failure_tests {
    use super::*;

    #[test]
    fn malformed_row_aborts_before_its_entities() {
        let db = setup_db();
        let err = import_rows(
            &db,
            &[
                "Office365;Office365 E3;null;null;null;null",
                "Adobe;Acrobat;null;null;null",
                "Visio;Visio;null;null;null;null",
            ],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ImportError::MalformedRow { line: 2, expected: 6, found: 5 }
        ));
        // Only the first row was committed
        assert_eq!(contracts(&db).len(), 1);
        assert_eq!(licenses(&db).len(), 1);
        assert_eq!(db.counter_value(EntityClass::Contract).unwrap(), Some(1));
    }

    #[test]
    fn too_many_fields_is_malformed() {
        let db = setup_db();
        let err = import_rows(&db, &["a;b;c;d;e;f;g"]).unwrap_err();
        assert!(matches!(err, ImportError::MalformedRow { found: 7, .. }));
        assert!(contracts(&db).is_empty());
    }

    #[test]
    fn invalid_date_aborts_before_row_writes() {
        let db = setup_db();
        let err = import_rows(&db, &["Adobe;Acrobat;null;null;31.12.2024;null"]).unwrap_err();

        assert!(matches!(err, ImportError::InvalidDate { line: 1, .. }));
        assert!(contracts(&db).is_empty());
        assert_eq!(db.counter_value(EntityClass::Contract).unwrap(), None);
    }

    #[test]
    fn read_error_stops_after_committed_rows() {
        let db = setup_db();
        let lines = vec![
            Ok((1, "Office365;null;null;null;null;null".to_string())),
            Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "stream did not contain valid UTF-8",
            )),
            Ok((3, "Adobe;null;null;null;null;null".to_string())),
        ];

        let err = Importer::seeded(&db, RowNormalizer::default())
            .unwrap()
            .run(lines)
            .unwrap_err();

        assert!(matches!(err, ImportError::Io(_)));
        assert_eq!(err.line(), None);
        let names: Vec<_> = contracts(&db).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Office365"]);
    }

    #[test]
    fn date_on_row_without_license_is_ignored() {
        let db = setup_db();
        let summary = import_rows(&db, &["Adobe;null;null;null;garbage;null"]).unwrap();
        assert_eq!(summary.contracts_created, 1);
    }
}

/// Gateway that behaves like the wrapped database until told otherwise.
struct FaultyGateway {
    db: Database,
    fail_associations: bool,
    plain_descriptions: bool,
    associations: Cell<usize>,
}

impl FaultyGateway {
    fn new(db: Database) -> Self {
        Self {
            db,
            fail_associations: false,
            plain_descriptions: false,
            associations: Cell::new(0),
        }
    }
}

impl Gateway for FaultyGateway {
    fn settings(&self) -> &CmdbConfig {
        Gateway::settings(&self.db)
    }

    fn highest_sequence_number(&self, class: EntityClass) -> StoreResult<Option<u64>> {
        self.db.highest_sequence_number(class)
    }

    fn increment_counter(&self, class: EntityClass) -> StoreResult<u64> {
        self.db.increment_counter(class)
    }

    fn create_contract(&self, contract: &NewContract) -> StoreResult<Contract> {
        self.db.create_contract(contract)
    }

    fn create_license(&self, license: &NewLicense) -> StoreResult<License> {
        let mut created = self.db.create_license(license)?;
        if self.plain_descriptions {
            created.description = "<p>edited outside the template</p>".to_string();
        }
        Ok(created)
    }

    fn update_description(
        &self,
        license: &License,
        description: &str,
        changed_at: NaiveDateTime,
    ) -> StoreResult<()> {
        Gateway::update_description(&self.db, license, description, changed_at)
    }

    fn create_association(&self, source_id: i64, target_id: i64) -> StoreResult<Association> {
        if self.fail_associations {
            return Err(StorageError::Corrupt("link table unavailable".into()));
        }
        self.associations.set(self.associations.get() + 1);
        self.db.create_association(source_id, target_id)
    }

    fn create_history_entry(&self, item_id: i64, content: &str) -> StoreResult<HistoryEntry> {
        self.db.create_history_entry(item_id, content)
    }
}

mod gateway_fault_tests {
    use super::*;

    #[test]
    fn storage_error_keeps_committed_rows() {
        let db = setup_db();
        let mut gateway = FaultyGateway::new(db.clone());
        gateway.fail_associations = true;

        let err = import_rows(
            &gateway,
            &[
                "null;Visio;null;null;null;null",
                "Office365;Office365 E3;null;null;null;null",
            ],
        )
        .unwrap_err();

        assert!(matches!(err, ImportError::Storage(StorageError::Corrupt(_))));
        // Row 1 and the entities of row 2 stay; nothing is rolled back
        assert_eq!(licenses(&db).len(), 2);
        assert_eq!(contracts(&db).len(), 1);
        assert_eq!(db.counter_value(EntityClass::License).unwrap(), Some(2));
    }

    #[test]
    fn description_without_markers_is_a_template_mismatch() {
        let db = setup_db();
        let mut gateway = FaultyGateway::new(db.clone());
        gateway.plain_descriptions = true;

        let err = import_rows(
            &gateway,
            &[
                "null;Visio;null;null;null;alice",
                "null;Visio;null;null;null;bob",
            ],
        )
        .unwrap_err();

        match err {
            ImportError::TemplateMismatch { license, marker } => {
                assert_eq!(license, "0055000001");
                assert_eq!(marker, r#"<body class="ck-content">"#);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn gateway_sees_one_association_per_linking_decision() {
        let gateway = FaultyGateway::new(setup_db());
        import_rows(
            &gateway,
            &[
                "Adobe Creative Cloud;Adobe Photoshop;null;null;null;null",
                "null;Adobe Acrobat;null;null;null;null",
                "null;Adobe Acrobat;null;null;null;bob",
                "null;Visio;null;null;null;null",
            ],
        )
        .unwrap();
        assert_eq!(gateway.associations.get(), 2);
    }
}
