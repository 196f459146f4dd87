//! Image URL normalization and matching
//!
//! Generated images are referenced by URLs that drift between records:
//! signed query strings change on every read and the same object can be
//! served from different hosts or folders. Two URLs name the same image when
//! any of these tiers agree, in decreasing order of confidence:
//!
//! 1. raw string equality
//! 2. canonical URL equality (query string and fragment stripped, trimmed)
//! 3. filename equality (last path segment of the canonical URL)

/// Which tier matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Exact,
    Canonical,
    FileName,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Canonical => "canonical",
            MatchTier::FileName => "filename",
        }
    }
}

/// URL with query string and fragment removed, trimmed
pub fn canonical_url(url: &str) -> &str {
    let url = url.trim();
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].trim()
}

/// Last path segment of the canonical URL
///
/// Object-storage URLs often encode the object path into one segment
/// (`o/stores%2Fs1%2Flook.png`); an encoded slash is treated as a separator.
pub fn file_name(url: &str) -> &str {
    let canonical = canonical_url(url).trim_end_matches('/');
    let mut start = canonical.rfind('/').map(|i| i + 1).unwrap_or(0);

    let bytes = canonical.as_bytes();
    let mut i = start;
    while i + 3 <= bytes.len() {
        if bytes[i] == b'%' && bytes[i + 1] == b'2' && (bytes[i + 2] == b'F' || bytes[i + 2] == b'f') {
            start = i + 3;
            i += 3;
        } else {
            i += 1;
        }
    }

    &canonical[start..]
}

/// Compare two image references; `None` when they are not the same image
///
/// Blank references never match anything.
pub fn match_image(a: &str, b: &str) -> Option<MatchTier> {
    let (a_trim, b_trim) = (a.trim(), b.trim());
    if a_trim.is_empty() || b_trim.is_empty() {
        return None;
    }

    if a == b {
        return Some(MatchTier::Exact);
    }

    let (a_canon, b_canon) = (canonical_url(a), canonical_url(b));
    if !a_canon.is_empty() && a_canon == b_canon {
        return Some(MatchTier::Canonical);
    }

    let (a_file, b_file) = (file_name(a), file_name(b));
    if !a_file.is_empty() && a_file == b_file {
        return Some(MatchTier::FileName);
    }

    None
}

/// Best tier across every candidate URL of a record
pub fn best_match<'a, I>(hint: &str, candidates: I) -> Option<MatchTier>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .filter_map(|candidate| match_image(hint, candidate))
        .min()
}
