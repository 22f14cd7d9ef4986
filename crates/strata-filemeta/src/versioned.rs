//! Latest-version selection for Hudi-style layouts.
//!
//! A Hudi copy-on-write table keeps several physical versions of one file
//! group on disk; the filename embeds the commit instant:
//!
//! ```text
//! <fileGroupId>_<writeToken>_<commitInstant>.parquet
//! ```
//!
//! Only the version with the greatest commit instant is live. Selection
//! runs before diffing, so discarded older versions never consume a
//! load/skip slot in the stats.

use std::collections::HashMap;

use crate::diff::RawFileStat;

/// Grouping key and commit instant parsed from one filename.
fn parse_version(relative_path: &str) -> Option<(String, u64)> {
    let (dir, name) = match relative_path.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", relative_path),
    };
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let (_, instant) = stem.rsplit_once('_')?;
    let instant: u64 = instant.parse().ok()?;
    let (file_group, _) = name.split_once('_')?;
    Some((format!("{dir}/{file_group}"), instant))
}

/// Reduces a listing to the latest physical version of each file group.
///
/// Files whose names do not follow the version grammar are kept
/// unconditionally, each forming its own group.
#[must_use]
pub fn select_latest_versions(files: Vec<RawFileStat>) -> Vec<RawFileStat> {
    // Group index -> (best instant, index into `files`).
    let mut best: HashMap<String, (u64, usize)> = HashMap::new();
    let mut unversioned: Vec<usize> = Vec::new();

    for (idx, stat) in files.iter().enumerate() {
        match parse_version(&stat.relative_path) {
            Some((group, instant)) => {
                best.entry(group)
                    .and_modify(|entry| {
                        if instant > entry.0 {
                            *entry = (instant, idx);
                        }
                    })
                    .or_insert((instant, idx));
            }
            None => unversioned.push(idx),
        }
    }

    let mut keep: Vec<usize> = best.into_values().map(|(_, idx)| idx).collect();
    keep.extend(unversioned);
    keep.sort_unstable();

    let mut keep_iter = keep.into_iter().peekable();
    files
        .into_iter()
        .enumerate()
        .filter_map(|(idx, stat)| {
            if keep_iter.peek() == Some(&idx) {
                keep_iter.next();
                Some(stat)
            } else {
                None
            }
        })
        .collect()
}
