//! Transaction-aware filtering for ACID table listings.
//!
//! Files of a transactional table live under directories whose names
//! encode a write-id range:
//!
//! ```text
//! base_<writeId>[_v<visibilityTxnId>]
//! delta_<minWriteId>_<maxWriteId>[_<statementId>][_v<visibilityTxnId>]
//! delete_delta_<minWriteId>_<maxWriteId>[_<statementId>][_v<visibilityTxnId>]
//! ```
//!
//! A `_v` suffix on a delta marks it as the output of minor compaction;
//! base directories are always compaction (or initial-load) results. The
//! filter first drops files whose range is not fully committed according
//! to the reader's validity snapshot, then excludes files that a compacted
//! directory supersedes, counting the latter into the load's stats.
//!
//! Directory names that merely resemble the grammar but fail to parse are
//! treated as not covered by any valid range: their files are excluded,
//! never crashed on.

use std::collections::BTreeSet;
use tracing::warn;

use strata_core::error::{Error, Result};

use crate::diff::RawFileStat;

/// Snapshot of committed write ids visible to the current reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidWriteIdList {
    table_name: String,
    high_watermark: i64,
    invalid: BTreeSet<i64>,
}

impl ValidWriteIdList {
    /// Creates a snapshot where every id up to `high_watermark` is valid
    /// except the explicitly `invalid` (open or aborted) ones.
    #[must_use]
    pub fn new(
        table_name: impl Into<String>,
        high_watermark: i64,
        invalid: impl IntoIterator<Item = i64>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            high_watermark,
            invalid: invalid.into_iter().collect(),
        }
    }

    /// Parses the metastore summary encoding
    /// `<table>:<highWatermark>:<minOpenWriteId>:<openIds>:<abortedIds>`
    /// where the id lists are comma-separated and may be empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the summary does not follow
    /// the encoding.
    pub fn parse(summary: &str) -> Result<Self> {
        let parts: Vec<&str> = summary.split(':').collect();
        if parts.len() != 5 {
            return Err(Error::InvalidInput(format!(
                "expected 5 colon-separated fields in write-id summary, got {}: {summary}",
                parts.len()
            )));
        }
        let high_watermark: i64 = parts[1]
            .parse()
            .map_err(|_| Error::InvalidInput(format!("bad high watermark: {}", parts[1])))?;

        let parse_ids = |field: &str| -> Result<Vec<i64>> {
            field
                .split(',')
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse()
                        .map_err(|_| Error::InvalidInput(format!("bad write id: {s}")))
                })
                .collect()
        };
        let mut invalid = parse_ids(parts[3])?;
        invalid.extend(parse_ids(parts[4])?);

        Ok(Self::new(parts[0], high_watermark, invalid))
    }

    /// Table the snapshot was taken for.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns true when `id` is committed and visible.
    #[must_use]
    pub fn is_valid(&self, id: i64) -> bool {
        id > 0 && id <= self.high_watermark && !self.invalid.contains(&id)
    }

    /// Returns true when every id in `[min, max]` is committed and visible.
    #[must_use]
    pub fn covers(&self, min: i64, max: i64) -> bool {
        min > 0
            && max <= self.high_watermark
            && min <= max
            && self.invalid.range(min..=max).next().is_none()
    }
}

/// A parsed ACID directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcidDirectory {
    /// A base directory: the full table (or partition) state up to and
    /// including `write_id`.
    Base {
        /// Terminal write id the base covers.
        write_id: i64,
    },
    /// A delta (or delete-delta) directory covering `[min, max]`.
    Delta {
        /// Lower bound of the covered write-id range.
        min: i64,
        /// Upper bound of the covered write-id range.
        max: i64,
        /// True when the directory is the output of minor compaction
        /// (carries a `_v<txn>` suffix).
        compacted: bool,
        /// True for `delete_delta` directories.
        delete: bool,
    },
}

impl AcidDirectory {
    /// Parses one directory-name component. Returns `None` for names that
    /// are not (valid) ACID directories.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if let Some(rest) = name.strip_prefix("base_") {
            let mut tokens = rest.split('_');
            let write_id: i64 = tokens.next()?.parse().ok()?;
            // Optional visibility suffix: base_5_v123.
            match tokens.next() {
                None => {}
                Some(v) if v.strip_prefix('v').is_some_and(|t| t.parse::<i64>().is_ok()) => {}
                Some(_) => return None,
            }
            if tokens.next().is_some() || write_id <= 0 {
                return None;
            }
            return Some(Self::Base { write_id });
        }

        let (rest, delete) = match name.strip_prefix("delete_delta_") {
            Some(rest) => (rest, true),
            None => (name.strip_prefix("delta_")?, false),
        };
        let mut tokens = rest.split('_');
        let min: i64 = tokens.next()?.parse().ok()?;
        let max: i64 = tokens.next()?.parse().ok()?;
        if min <= 0 || max < min {
            return None;
        }
        let mut compacted = false;
        for token in tokens {
            if let Some(txn) = token.strip_prefix('v') {
                if txn.parse::<i64>().is_err() {
                    return None;
                }
                compacted = true;
            } else if token.parse::<i64>().is_err() {
                // Statement id.
                return None;
            }
        }
        Some(Self::Delta {
            min,
            max,
            compacted,
            delete,
        })
    }

    /// The write-id range the directory covers. Bases cover `[1, write_id]`.
    #[must_use]
    pub fn range(&self) -> (i64, i64) {
        match *self {
            Self::Base { write_id } => (1, write_id),
            Self::Delta { min, max, .. } => (min, max),
        }
    }

    /// True for directories produced by compaction, which supersede the
    /// directories whose ranges they subsume.
    #[must_use]
    pub fn is_compacted(&self) -> bool {
        match *self {
            Self::Base { .. } => true,
            Self::Delta { compacted, .. } => compacted,
        }
    }
}

/// Result of filtering a raw listing against a validity snapshot.
#[derive(Debug)]
pub struct AcidFilterOutcome {
    /// Files that remain visible and proceed to diffing.
    pub files: Vec<RawFileStat>,
    /// Number of files excluded because a compacted directory supersedes
    /// them.
    pub superseded: u64,
}

/// Returns the ACID directory component enclosing a file, parsed.
///
/// The enclosing directory is the last directory component of the
/// relative path; files sitting directly under the table root have none.
fn enclosing_directory(stat: &RawFileStat) -> Option<(&str, AcidDirectory)> {
    let (dir_path, _) = stat.relative_path.rsplit_once('/')?;
    let dir_name = dir_path.rsplit('/').next().unwrap_or(dir_path);
    AcidDirectory::parse(dir_name).map(|parsed| (dir_name, parsed))
}

/// Filters a raw listing down to the files visible under `write_ids`.
///
/// Files in open or aborted ranges are dropped silently; files superseded
/// by compaction are dropped and counted. See the module docs for the
/// directory-name grammar.
#[must_use]
pub fn filter_acid_files(files: Vec<RawFileStat>, write_ids: &ValidWriteIdList) -> AcidFilterOutcome {
    // Parse and validity-filter first. Unparsable enclosing directories
    // mean the file is not covered by any valid range.
    let mut candidates: Vec<(RawFileStat, AcidDirectory)> = Vec::new();
    for stat in files {
        let Some((_, dir)) = enclosing_directory(&stat) else {
            continue;
        };
        let (min, max) = dir.range();
        let valid = match dir {
            // A base only requires its terminal write id to be visible;
            // everything below it was rewritten by the compactor.
            AcidDirectory::Base { write_id } => write_ids.is_valid(write_id),
            AcidDirectory::Delta { .. } => write_ids.covers(min, max),
        };
        if valid {
            candidates.push((stat, dir));
        }
    }

    // Compacted coverage among valid directories.
    let best_base: Option<i64> = candidates
        .iter()
        .filter_map(|(_, dir)| match dir {
            AcidDirectory::Base { write_id } => Some(*write_id),
            AcidDirectory::Delta { .. } => None,
        })
        .max();
    // Data deltas and delete deltas are compacted independently, so each
    // population only supersedes its own kind; a base supersedes both.
    let compacted_ranges_for = |want_delete: bool| -> BTreeSet<(i64, i64)> {
        candidates
            .iter()
            .filter_map(|(_, dir)| match dir {
                AcidDirectory::Delta {
                    min,
                    max,
                    compacted: true,
                    delete,
                } if *delete == want_delete => Some((*min, *max)),
                _ => None,
            })
            .collect()
    };
    let compacted_data = compacted_ranges_for(false);
    let compacted_delete = compacted_ranges_for(true);

    for ranges in [&compacted_data, &compacted_delete] {
        for &(min, max) in ranges.iter() {
            let overlapping = ranges.iter().any(|&(a, b)| {
                (a, b) != (min, max)
                    && a <= max
                    && min <= b
                    && !(a <= min && max <= b)
                    && !(min <= a && b <= max)
            });
            if overlapping {
                // Should not occur under correct writer behavior; resolved by
                // preferring the larger upper bound below.
                warn!(min, max, "overlapping compacted write-id ranges detected");
            }
        }
    }

    let superseded_by = |dir: &AcidDirectory| -> bool {
        let (min, max) = dir.range();
        if let Some(base_id) = best_base {
            match dir {
                AcidDirectory::Base { write_id } => {
                    if *write_id < base_id {
                        return true;
                    }
                }
                AcidDirectory::Delta { .. } => {
                    if max <= base_id {
                        return true;
                    }
                }
            }
        }
        let ranges = match dir {
            AcidDirectory::Delta { delete: true, .. } => &compacted_delete,
            _ => &compacted_data,
        };
        ranges.iter().any(|&(a, b)| {
            a <= min
                && max <= b
                && ((a, b) != (min, max)
                    // A compacted delta replaces non-compacted deltas of the
                    // exact same range.
                    || !dir.is_compacted())
        })
    };

    let mut kept = Vec::with_capacity(candidates.len());
    let mut superseded: u64 = 0;
    for (stat, dir) in candidates {
        if superseded_by(&dir) {
            superseded += 1;
        } else {
            kept.push(stat);
        }
    }

    AcidFilterOutcome {
        files: kept,
        superseded,
    }
}
