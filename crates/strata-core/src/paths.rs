//! URI path helpers for table and file locations.
//!
//! Locations are URI-style strings (`scheme://authority/path/to/dir`).
//! These helpers avoid pulling in a full URL parser for what is a
//! deliberately narrow grammar: storage clients hand us already-resolved
//! paths, so we only need to split, join, and relativize them.

/// Returns the scheme portion of a location (`hdfs` in `hdfs://nn:8020/w`).
///
/// Returns `None` when the location carries no `://` separator.
#[must_use]
pub fn scheme_of(location: &str) -> Option<&str> {
    location.split_once("://").map(|(scheme, _)| scheme)
}

/// Returns the authority portion of a location (`nn:8020` in `hdfs://nn:8020/w`).
#[must_use]
pub fn authority_of(location: &str) -> Option<&str> {
    let (_, rest) = location.split_once("://")?;
    let authority = rest.split('/').next().unwrap_or(rest);
    if authority.is_empty() {
        None
    } else {
        Some(authority)
    }
}

/// Returns the path portion of a location, without scheme and authority.
///
/// `hdfs://nn:8020/warehouse/t` yields `/warehouse/t`. A location without
/// a scheme is returned unchanged.
#[must_use]
pub fn path_of(location: &str) -> &str {
    match location.split_once("://") {
        Some((_, rest)) => match rest.find('/') {
            Some(idx) => &rest[idx..],
            None => "",
        },
        None => location,
    }
}

/// Joins a child name onto a directory location.
#[must_use]
pub fn join(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    format!("{dir}/{name}")
}

/// Returns the final path component of a location.
#[must_use]
pub fn file_name(location: &str) -> &str {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(location)
}

/// Returns the directory containing a location, or `None` at a root.
///
/// Never ascends past `scheme://authority`.
#[must_use]
pub fn parent(location: &str) -> Option<&str> {
    let trimmed = location.trim_end_matches('/');
    let floor = match trimmed.find("://") {
        Some(i) => {
            let after = i + 3;
            let auth_len = trimmed[after..].find('/').unwrap_or(trimmed.len() - after);
            after + auth_len
        }
        None => 0,
    };
    let idx = trimmed.rfind('/')?;
    if idx < floor {
        return None;
    }
    Some(&trimmed[..idx])
}

/// Computes `location`'s path relative to `root`.
///
/// Returns `None` when `location` does not reside under `root`. Matching
/// is component-wise: `/warehouse/t2` is not under `/warehouse/t`.
#[must_use]
pub fn relativize<'a>(root: &str, location: &'a str) -> Option<&'a str> {
    let root = root.trim_end_matches('/');
    let rest = location.strip_prefix(root)?;
    rest.strip_prefix('/').filter(|r| !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_and_authority() {
        assert_eq!(scheme_of("hdfs://nn:8020/warehouse"), Some("hdfs"));
        assert_eq!(authority_of("hdfs://nn:8020/warehouse"), Some("nn:8020"));
        assert_eq!(scheme_of("/local/path"), None);
        assert_eq!(authority_of("/local/path"), None);
    }

    #[test]
    fn relativize_under_root() {
        assert_eq!(
            relativize("mem://a/warehouse/t/", "mem://a/warehouse/t/year=2009/f.txt"),
            Some("year=2009/f.txt")
        );
        assert_eq!(relativize("mem://a/warehouse/t", "mem://a/warehouse/t"), None);
    }

    #[test]
    fn relativize_rejects_sibling_prefix() {
        // "/warehouse/t2" shares a string prefix with "/warehouse/t" but is
        // a different directory.
        assert_eq!(relativize("mem://a/warehouse/t", "mem://a/warehouse/t2/f"), None);
    }

    #[test]
    fn join_and_split() {
        let p = join("mem://a/warehouse/t/", "part-0.parquet");
        assert_eq!(p, "mem://a/warehouse/t/part-0.parquet");
        assert_eq!(file_name(&p), "part-0.parquet");
        assert_eq!(parent(&p), Some("mem://a/warehouse/t"));
        assert_eq!(parent("mem://a"), None);
    }
}
