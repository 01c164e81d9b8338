//! Persistence gateway the import core depends on.

use super::Database;
use crate::config::CmdbConfig;
use crate::error::StoreResult;
use crate::types::{Association, Contract, EntityClass, HistoryEntry, License, NewContract, NewLicense};
use chrono::NaiveDateTime;

/// Operations the import state machine needs from the target store.
///
/// The import assumes it is the only writer for the duration of a run;
/// implementations are not expected to guard against concurrent imports.
pub trait Gateway {
    /// Catalog ids and number bases the store was opened with.
    fn settings(&self) -> &CmdbConfig;

    /// Highest stored sequence number of the class, `None` when the class is empty.
    fn highest_sequence_number(&self, class: EntityClass) -> StoreResult<Option<u64>>;

    /// Increment the persisted counter of the class and return its new value.
    fn increment_counter(&self, class: EntityClass) -> StoreResult<u64>;

    /// Persist a Contract header and its first version.
    fn create_contract(&self, contract: &NewContract) -> StoreResult<Contract>;

    /// Persist a License header, its first version and any present attributes.
    fn create_license(&self, license: &NewLicense) -> StoreResult<License>;

    /// Replace a License's description and bump its change time.
    fn update_description(
        &self,
        license: &License,
        description: &str,
        changed_at: NaiveDateTime,
    ) -> StoreResult<()>;

    /// Persist a "connected to" association from `source_id` to `target_id`.
    fn create_association(&self, source_id: i64, target_id: i64) -> StoreResult<Association>;

    /// Attach an audit note to an item.
    fn create_history_entry(&self, item_id: i64, content: &str) -> StoreResult<HistoryEntry>;
}

impl Gateway for Database {
    fn settings(&self) -> &CmdbConfig {
        Database::settings(self)
    }

    fn highest_sequence_number(&self, class: EntityClass) -> StoreResult<Option<u64>> {
        Database::highest_sequence_number(self, class)
    }

    fn increment_counter(&self, class: EntityClass) -> StoreResult<u64> {
        Database::increment_counter(self, class)
    }

    fn create_contract(&self, contract: &NewContract) -> StoreResult<Contract> {
        Database::create_contract(self, contract)
    }

    fn create_license(&self, license: &NewLicense) -> StoreResult<License> {
        Database::create_license(self, license)
    }

    fn update_description(
        &self,
        license: &License,
        description: &str,
        changed_at: NaiveDateTime,
    ) -> StoreResult<()> {
        Database::update_license_description(self, license.id, license.version_id, description, changed_at)
    }

    fn create_association(&self, source_id: i64, target_id: i64) -> StoreResult<Association> {
        Database::create_association(self, source_id, target_id)
    }

    fn create_history_entry(&self, item_id: i64, content: &str) -> StoreResult<HistoryEntry> {
        Database::create_history_entry(self, item_id, content)
    }
}
