//! Contract/License import state machine.
//!
//! Rows are processed strictly in file order. Each row runs two tracks,
//! Contract first, then License:
//! - Contract track: a named Contract that differs from the one in scope
//!   starts a new Contract.
//! - License track: a named License builds a description fragment; the
//!   same name as the License in scope appends the fragment, any other
//!   name creates a new License and tries to link it to the Contract in
//!   scope.
//!
//! Every row's writes are committed before the next row is read. A fatal
//! error stops the run and leaves earlier rows in place.

pub mod description;
pub mod factory;
pub mod grouping;
pub mod linker;
pub mod row;
pub mod sequence;
pub mod source;
pub mod state;

use crate::config::InputConfig;
use crate::db::Gateway;
use crate::error::{ImportError, ImportResult};
use crate::types::EntityClass;
use description::{DescriptionAccumulator, DescriptionTemplate, build_fragment};
use factory::{LicenseAttributes, RecordFactory};
use grouping::{Continuation, detect};
use linker::{LinkResolver, LinkRule};
use row::{RowNormalizer, SourceRow, parse_expiry};
use sequence::{ClassSequence, SequenceAllocator};
use serde::Serialize;
use state::ImportState;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info};

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    /// Rows fully processed.
    pub rows_read: usize,
    pub contracts_created: usize,
    pub licenses_created: usize,
    pub fragments_appended: usize,
    /// Associations created, per rule.
    pub associations: BTreeMap<LinkRule, usize>,
    /// Final sequence state per class.
    pub sequences: BTreeMap<EntityClass, ClassSequence>,
    /// Writes were rolled back.
    pub dry_run: bool,
}

impl ImportSummary {
    pub fn associations_created(&self) -> usize {
        self.associations.values().sum()
    }
}

/// Drives rows through the import components, threading [`ImportState`].
pub struct Importer<'g, G: Gateway + ?Sized> {
    gateway: &'g G,
    normalizer: RowNormalizer,
    template: DescriptionTemplate,
    allocator: SequenceAllocator,
    state: ImportState,
    summary: ImportSummary,
}

impl<'g, G: Gateway + ?Sized> Importer<'g, G> {
    /// Create an importer with an already seeded allocator.
    pub fn new(gateway: &'g G, allocator: SequenceAllocator, normalizer: RowNormalizer) -> Self {
        Self {
            gateway,
            normalizer,
            template: DescriptionTemplate::default(),
            allocator,
            state: ImportState::new(),
            summary: ImportSummary::default(),
        }
    }

    /// Create an importer whose sequences continue from the store's high-water marks.
    ///
    /// An empty class starts from the number base in the gateway's settings.
    pub fn seeded(gateway: &'g G, normalizer: RowNormalizer) -> ImportResult<Self> {
        let mut allocator = SequenceAllocator::new();
        for class in EntityClass::ALL {
            let base = gateway.settings().class(class).number_base;
            allocator.seed_from_store(gateway, class, base)?;
        }
        Ok(Self::new(gateway, allocator, normalizer))
    }

    /// Normalize and process one raw line.
    pub fn process_line(&mut self, line: usize, raw: &str) -> ImportResult<()> {
        let row = self.normalizer.normalize(line, raw)?;
        self.process_row(&row)
    }

    /// Apply one row's Contract and License transitions.
    pub fn process_row(&mut self, row: &SourceRow) -> ImportResult<()> {
        // Validate before the first write so a bad date leaves the row untouched.
        let expiry_date = match (&row.license, &row.expiry) {
            (Some(_), Some(raw)) => Some(parse_expiry(row.line, raw)?),
            _ => None,
        };

        if let Some(name) = row.contract.as_deref() {
            if detect(Some(name), self.state.contract_group()) == Continuation::New {
                let contract = RecordFactory::new(self.gateway, &self.template)
                    .new_contract(&mut self.allocator, name)?;
                self.state.start_contract(contract);
                self.summary.contracts_created += 1;
            }
        }

        if let Some(name) = row.license.as_deref() {
            let fragment = build_fragment(row, &mut self.state.last_seen_key);

            match detect(Some(name), self.state.license_group()) {
                Continuation::Continue => {
                    let accumulator = DescriptionAccumulator::new(self.gateway, &self.template);
                    if let Some(license) = self.state.current_license_mut() {
                        accumulator.append(license, &fragment)?;
                        self.summary.fragments_appended += 1;
                    }
                }
                Continuation::New => {
                    let attributes = LicenseAttributes {
                        expiry_date,
                        key: row.key.clone(),
                        quantity: row.quantity.clone(),
                    };
                    let license = RecordFactory::new(self.gateway, &self.template).new_license(
                        &mut self.allocator,
                        name,
                        &fragment,
                        attributes,
                    )?;

                    let linked = LinkResolver::new(self.gateway).maybe_link(
                        self.state.current_contract(),
                        &license,
                        row.has_contract_and_license(),
                    )?;
                    if let Some((_, rule)) = linked {
                        *self.summary.associations.entry(rule).or_default() += 1;
                    }

                    self.state.start_license(license);
                    self.summary.licenses_created += 1;
                }
            }
        }

        self.summary.rows_read += 1;
        Ok(())
    }

    /// Process numbered lines until the input ends or a row fails.
    pub fn run<I>(mut self, lines: I) -> ImportResult<ImportSummary>
    where
        I: IntoIterator<Item = std::io::Result<(usize, String)>>,
    {
        for item in lines {
            let result = item
                .map_err(ImportError::Io)
                .and_then(|(line, raw)| self.process_line(line, &raw));
            if let Err(err) = result {
                error!(
                    line = ?err.line(),
                    rows_committed = self.summary.rows_read,
                    "Import aborted: {}",
                    err
                );
                return Err(err);
            }
        }
        Ok(self.finish())
    }

    /// Close the run and report final counts and sequences.
    pub fn finish(mut self) -> ImportSummary {
        self.summary.sequences = self.allocator.snapshot();
        info!(
            contracts = self.summary.contracts_created,
            licenses = self.summary.licenses_created,
            associations = self.summary.associations_created(),
            "Import finished"
        );
        self.summary
    }
}

/// Import a backup file into the store.
pub fn import_file<G: Gateway + ?Sized>(
    gateway: &G,
    input: &InputConfig,
    path: &Path,
) -> ImportResult<ImportSummary> {
    let reader = source::open_lines(path).map_err(ImportError::Io)?;
    let normalizer = RowNormalizer::new(input.delimiter, &input.null_marker);
    info!(file = %path.display(), "Importing contracts and licenses");
    Importer::seeded(gateway, normalizer)?.run(source::numbered_lines(reader, input.has_header))
}
