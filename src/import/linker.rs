//! Deciding whether a new License belongs to the Contract in scope.

use crate::db::Gateway;
use crate::error::ImportResult;
use crate::types::{Association, Contract, HistoryEntry, License};
use serde::Serialize;
use tracing::info;

/// Which heuristic produced an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRule {
    /// Contract and License named on the same row.
    SameRow,
    /// First word of the License name appears in the Contract name.
    NameContainment,
}

/// Pick the rule that links `license_name` to `contract_name`, if any.
///
/// Same-row co-occurrence wins; the name check is only consulted without it.
/// The name check is a plain lower-cased substring test with no word
/// boundaries, so short first words match generously.
pub fn link_rule(contract_name: &str, license_name: &str, same_row: bool) -> Option<LinkRule> {
    if same_row {
        return Some(LinkRule::SameRow);
    }
    let first_word = license_name.split_whitespace().next()?.to_lowercase();
    if contract_name.to_lowercase().contains(&first_word) {
        Some(LinkRule::NameContainment)
    } else {
        None
    }
}

/// Creates Contract/License associations and their audit entries.
pub struct LinkResolver<'a, G: Gateway + ?Sized> {
    gateway: &'a G,
}

impl<'a, G: Gateway + ?Sized> LinkResolver<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Link `license` to `contract` when a rule applies.
    ///
    /// Nothing is linked without a Contract in scope. Existing associations
    /// are not consulted, so re-importing the same pair links it again.
    pub fn maybe_link(
        &self,
        contract: Option<&Contract>,
        license: &License,
        same_row: bool,
    ) -> ImportResult<Option<(Association, LinkRule)>> {
        let Some(contract) = contract else {
            return Ok(None);
        };
        let Some(rule) = link_rule(&contract.name, &license.name, same_row) else {
            return Ok(None);
        };

        let association = self.gateway.create_association(contract.id, license.id)?;
        self.gateway
            .create_history_entry(contract.id, &HistoryEntry::link_content(license.id))?;
        self.gateway
            .create_history_entry(license.id, &HistoryEntry::link_content(contract.id))?;

        info!(
            contract = %contract.sequence_number,
            license = %license.sequence_number,
            rule = ?rule,
            "Linked License to Contract"
        );
        Ok(Some((association, rule)))
    }
}
