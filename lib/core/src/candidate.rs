use ahash::AHashSet;
use serde::{Serialize, Serializer};

/// Trim whitespace and byte-order marks from both ends of a code
#[inline]
pub(crate) fn trim_code(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
}

/// Deduplicated set of candidate codes derived from one raw input.
///
/// Every member is trimmed and non-empty. Membership is all that matters for
/// matching and equality; discovery order is kept only so that
/// [`CandidateSet::first`] returns the seed (the trimmed input).
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    values: Vec<String>,
    seen: AHashSet<String>,
}

impl CandidateSet {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trim and add a value. Returns false if it was empty or already present.
    pub fn insert(&mut self, value: impl AsRef<str>) -> bool {
        let value = trim_code(value.as_ref());
        if value.is_empty() || !self.seen.insert(value.to_string()) {
            return false;
        }
        self.values.push(value.to_string());
        true
    }

    #[inline]
    pub fn contains(&self, value: &str) -> bool {
        self.seen.contains(value)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The first candidate discovered, used as the "searched code" in reports
    #[inline]
    pub fn first(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }
}

impl PartialEq for CandidateSet {
    fn eq(&self, other: &Self) -> bool {
        self.seen == other.seen
    }
}

impl Eq for CandidateSet {}

impl<S: AsRef<str>> FromIterator<S> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = CandidateSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<S: AsRef<str>> Extend<S> for CandidateSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl Serialize for CandidateSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl IntoIterator for CandidateSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
