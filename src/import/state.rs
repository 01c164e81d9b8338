//! State carried from one row to the next.

use crate::types::{Contract, License};

/// What the previous rows left in scope.
///
/// Group names are the names of the entities in scope, so a group can
/// never be open without its entity.
#[derive(Debug, Clone, Default)]
pub struct ImportState {
    current_contract: Option<Contract>,
    current_license: Option<License>,
    /// Last non-absent key written into a fragment.
    pub last_seen_key: Option<String>,
}

impl ImportState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_contract(&self) -> Option<&Contract> {
        self.current_contract.as_ref()
    }

    pub fn current_license_mut(&mut self) -> Option<&mut License> {
        self.current_license.as_mut()
    }

    pub fn contract_group(&self) -> Option<&str> {
        self.current_contract.as_ref().map(|c| c.name.as_str())
    }

    pub fn license_group(&self) -> Option<&str> {
        self.current_license.as_ref().map(|l| l.name.as_str())
    }

    /// A new Contract group begins.
    pub fn start_contract(&mut self, contract: Contract) {
        self.current_contract = Some(contract);
    }

    /// A new License group begins; the previous License is closed.
    pub fn start_license(&mut self, license: License) {
        self.current_license = Some(license);
    }
}
