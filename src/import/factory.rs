//! Creation of new Contract and License aggregates.

use crate::db::{Gateway, now_timestamp};
use crate::error::ImportResult;
use crate::import::description::DescriptionTemplate;
use crate::import::sequence::SequenceAllocator;
use crate::types::{
    Contract, EntityClass, License, NewContract, NewLicense, render_sequence_number,
};
use chrono::NaiveDateTime;
use tracing::info;

/// Optional attributes a License is created with.
#[derive(Debug, Clone, Default)]
pub struct LicenseAttributes {
    pub expiry_date: Option<NaiveDateTime>,
    pub key: Option<String>,
    pub quantity: Option<String>,
}

pub struct RecordFactory<'a, G: Gateway + ?Sized> {
    gateway: &'a G,
    template: &'a DescriptionTemplate,
}

impl<'a, G: Gateway + ?Sized> RecordFactory<'a, G> {
    pub fn new(gateway: &'a G, template: &'a DescriptionTemplate) -> Self {
        Self { gateway, template }
    }

    /// Allocate a Contract number and persist header plus first version.
    pub fn new_contract(
        &self,
        allocator: &mut SequenceAllocator,
        name: &str,
    ) -> ImportResult<Contract> {
        let number = allocator.next(self.gateway, EntityClass::Contract)?;
        let contract = self.gateway.create_contract(&NewContract {
            sequence_number: render_sequence_number(number),
            name: name.to_string(),
            created_at: now_timestamp(),
        })?;

        info!(number = %contract.sequence_number, name = %contract.name, "Created Contract");
        Ok(contract)
    }

    /// Allocate a License number and persist header, first description and attributes.
    pub fn new_license(
        &self,
        allocator: &mut SequenceAllocator,
        name: &str,
        fragment: &str,
        attributes: LicenseAttributes,
    ) -> ImportResult<License> {
        let number = allocator.next(self.gateway, EntityClass::License)?;
        let license = self.gateway.create_license(&NewLicense {
            sequence_number: render_sequence_number(number),
            name: name.to_string(),
            description: self.template.render(fragment),
            expiry_date: attributes.expiry_date,
            key: attributes.key,
            quantity: attributes.quantity,
            created_at: now_timestamp(),
        })?;

        info!(
            number = %license.sequence_number,
            name = %license.name,
            fragment,
            expiry = ?license.expiry_date,
            "Created License"
        );
        Ok(license)
    }
}
