use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::ChartKind;

// ---------------------------------------------------------------------------
// Table name classification
// ---------------------------------------------------------------------------

/// System tables that are never measurements and are skipped by default.
pub const DEFAULT_OMIT: &[&str] = &["DeviceID_IID", "SystemFrequency"];

/// The three recognised suffix shapes, tried in order. The lazy prefix
/// capture keeps an optional trailing `_<digits>` run out of the prefix.
static SUFFIX_PATTERNS: Lazy<[(Regex, ChartKind); 3]> = Lazy::new(|| {
    [
        (
            Regex::new(r"(?i)^(.*?)_Spectrum_Hz_?\d*$").expect("valid pattern"),
            ChartKind::SpectrumHz,
        ),
        (
            Regex::new(r"(?i)^(.*?)_Spectrum_Order_?\d*$").expect("valid pattern"),
            ChartKind::SpectrumOrder,
        ),
        (
            Regex::new(r"(?i)^(.*?)_Waveform_?\d*$").expect("valid pattern"),
            ChartKind::Waveform,
        ),
    ]
});

/// A table name that matched one of the suffix patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedTable {
    pub name: String,
    pub kind: ChartKind,
    /// The shared measurement prefix, e.g. `Cable_RMU1` for
    /// `Cable_RMU1_Spectrum_Hz_13600`.
    pub prefix: String,
}

/// Classify a single table name. First matching pattern wins; names that
/// match none of the suffix shapes return `None` and land in the "other"
/// bucket of [`sorted_table_list`].
pub fn classify(table_name: &str) -> Option<ClassifiedTable> {
    for (pattern, kind) in SUFFIX_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(table_name) {
            return Some(ClassifiedTable {
                name: table_name.to_string(),
                kind: *kind,
                prefix: caps[1].to_string(),
            });
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Deterministic display ordering
// ---------------------------------------------------------------------------

/// Order table names for sequential processing and display.
///
/// Names matching a suffix pattern are grouped by prefix; prefix groups are
/// emitted in ascending lexicographic order, and within a group entries
/// follow the fixed kind priority (Hz spectrum, order spectrum, waveform).
/// Unmatched names are appended afterwards in their original relative
/// order. Names in `omit` (case-insensitive) are dropped entirely, and a
/// duplicated name is emitted at most once.
///
/// If grouping and the other-bucket both come out empty (the omission set
/// swallowed every input), the original unfiltered input is returned
/// verbatim so the caller can see that nothing survived classification.
pub fn sorted_table_list(table_names: &[String], omit: &[String]) -> Vec<String> {
    let omit_lower: HashSet<String> = omit.iter().map(|n| n.to_lowercase()).collect();

    // prefix → (priority, name), filled in input order. BTreeMap keeps the
    // prefixes lexicographically sorted.
    let mut grouped: BTreeMap<String, Vec<(u8, String)>> = BTreeMap::new();
    let mut processed: HashSet<String> = HashSet::new();
    let mut other_tables: Vec<String> = Vec::new();

    for name in table_names {
        if omit_lower.contains(&name.to_lowercase()) {
            continue;
        }
        match classify(name) {
            Some(classified) => {
                if processed.insert(name.clone()) {
                    grouped
                        .entry(classified.prefix)
                        .or_default()
                        .push((classified.kind.sort_priority(), name.clone()));
                }
            }
            None => {
                if !processed.contains(name) {
                    other_tables.push(name.clone());
                }
            }
        }
    }

    // Stable sort: two entries of the same kind keep their input order.
    for entries in grouped.values_mut() {
        entries.sort_by_key(|(priority, _)| *priority);
    }

    let mut ordered: Vec<String> = grouped
        .into_values()
        .flatten()
        .map(|(_, name)| name)
        .collect();

    for name in other_tables {
        if !ordered.contains(&name) {
            ordered.push(name);
        }
    }

    if ordered.is_empty() {
        return table_names.to_vec();
    }
    ordered
}
