//! Output formatting for command results.

use crate::db::stats::StoreStats;
use crate::import::ImportSummary;
use crate::import::linker::LinkRule;
use crate::types::render_sequence_number;
use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Render any serializable result as pretty JSON.
pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

fn rule_label(rule: LinkRule) -> &'static str {
    match rule {
        LinkRule::SameRow => "same row",
        LinkRule::NameContainment => "name containment",
    }
}

/// Format an import summary as text.
pub fn format_summary_text(summary: &ImportSummary) -> String {
    let mut out = String::new();

    if summary.dry_run {
        out.push_str("Dry run results (nothing was written):\n");
    } else {
        out.push_str("Import complete:\n");
    }
    out.push_str(&format!("  Rows processed: {}\n", summary.rows_read));
    out.push_str(&format!("  Contracts created: {}\n", summary.contracts_created));
    out.push_str(&format!("  Licenses created: {}\n", summary.licenses_created));
    out.push_str(&format!("  Fragments appended: {}\n", summary.fragments_appended));
    out.push_str(&format!(
        "  Associations created: {}\n",
        summary.associations_created()
    ));
    for (rule, count) in &summary.associations {
        out.push_str(&format!("    {}: {}\n", rule_label(*rule), count));
    }

    if !summary.sequences.is_empty() {
        out.push_str("  Sequences:\n");
        for (class, seq) in &summary.sequences {
            let counter = seq
                .counter
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unchanged".to_string());
            out.push_str(&format!(
                "    {}: last {} (counter {})\n",
                class,
                render_sequence_number(seq.current),
                counter
            ));
        }
    }

    out
}

/// Format store statistics as text.
pub fn format_stats_text(stats: &StoreStats) -> String {
    let mut out = String::from("Store status:\n");
    for class in &stats.classes {
        let highest = class
            .highest_sequence
            .map(render_sequence_number)
            .unwrap_or_else(|| "-".to_string());
        let counter = class
            .counter
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {}: {} items, highest {}, counter {}\n",
            class.class, class.items, highest, counter
        ));
    }
    out.push_str(&format!("  Associations: {}\n", stats.associations));
    out.push_str(&format!("  History entries: {}\n", stats.history_entries));
    out
}
