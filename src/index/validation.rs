//! Compact membership index over all known routing codes.

use hashbrown::HashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use crate::models::RoutingCode;
use crate::snapshot::{self, SnapshotError};

/// Maps each 3-digit prefix to the sorted, deduplicated suffixes that exist
/// under it. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct ValidationIndex {
    suffixes: HashMap<u16, Box<[u16]>>,
    codes: usize,
}

impl ValidationIndex {
    /// An index that validates nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the prefix -> suffix-list snapshot.
    ///
    /// A missing or unreadable snapshot yields an empty index.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(index) => index,
            Err(e) => {
                warn!("Validation snapshot unavailable, no code will validate: {}", e);
                Self::empty()
            }
        }
    }

    /// Load the snapshot, reporting why it could not be used
    pub fn try_load(path: &Path) -> Result<Self, SnapshotError> {
        info!("Loading validation snapshot from {}", path.display());

        // Keep raw values so that one bad entry does not reject the file
        let raw: BTreeMap<String, Value> = snapshot::read_json(path)?;

        let mut skipped = 0usize;
        let mut entries = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            let values = match value {
                Value::Array(values) => values,
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let Some(prefix) = parse_prefix(&key) else {
                skipped += values.len();
                continue;
            };
            let suffixes: Vec<u16> = values
                .iter()
                .filter_map(|v| match v.as_u64() {
                    Some(s) if s <= 999 => Some(s as u16),
                    _ => {
                        skipped += 1;
                        None
                    }
                })
                .collect();
            entries.push((prefix, suffixes));
        }

        if skipped > 0 {
            warn!(
                "Skipped {} malformed entries in validation snapshot {}",
                skipped,
                path.display()
            );
        }

        let index = Self::from_entries(entries);
        info!(
            "Loaded {} codes across {} prefixes",
            index.len(),
            index.prefix_count()
        );
        Ok(index)
    }

    /// Build from (prefix, suffixes) pairs. Suffix lists are sorted and
    /// deduplicated here; entries out of the 0..=999 range are dropped.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u16, S)>,
        S: IntoIterator<Item = u16>,
    {
        let mut grouped: HashMap<u16, Vec<u16>> = HashMap::new();
        for (prefix, suffixes) in entries {
            if prefix > 999 {
                continue;
            }
            grouped
                .entry(prefix)
                .or_default()
                .extend(suffixes.into_iter().filter(|s| *s <= 999));
        }

        let mut codes = 0;
        let suffixes = grouped
            .into_iter()
            .filter_map(|(prefix, mut list)| {
                list.sort_unstable();
                list.dedup();
                if list.is_empty() {
                    return None;
                }
                codes += list.len();
                Some((prefix, list.into_boxed_slice()))
            })
            .collect();

        Self { suffixes, codes }
    }

    /// Build from a set of codes
    pub fn from_codes<I: IntoIterator<Item = RoutingCode>>(codes: I) -> Self {
        Self::from_entries(codes.into_iter().map(|c| {
            let (prefix, suffix) = c.split();
            (prefix, [suffix])
        }))
    }

    /// Membership test by binary search within the prefix bucket
    pub fn contains(&self, prefix: u16, suffix: u16) -> bool {
        self.suffixes
            .get(&prefix)
            .map_or(false, |list| list.binary_search(&suffix).is_ok())
    }

    pub fn contains_code(&self, code: &RoutingCode) -> bool {
        let (prefix, suffix) = code.split();
        self.contains(prefix, suffix)
    }

    /// Known suffixes for a prefix, ascending
    pub fn suffixes(&self, prefix: u16) -> &[u16] {
        self.suffixes.get(&prefix).map_or(&[][..], |list| &list[..])
    }

    /// Total number of codes
    pub fn len(&self) -> usize {
        self.codes
    }

    pub fn is_empty(&self) -> bool {
        self.codes == 0
    }

    pub fn prefix_count(&self) -> usize {
        self.suffixes.len()
    }
}

fn parse_prefix(key: &str) -> Option<u16> {
    if key.len() != 3 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}
