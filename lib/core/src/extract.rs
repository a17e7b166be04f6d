//! Candidate extraction.
//!
//! A raw scan may be the bare code, the code percent-encoded, the code glued
//! to other fields by delimiters, or a URL that carries the code in its path
//! or query string. Rather than guess, every plausible representation is
//! surfaced as a candidate and the matcher decides.

use crate::candidate::trim_code;
use crate::CandidateSet;
use ahash::AHashSet;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Structured product code: `F` followed by six or more digits
static STRUCTURED_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"F[0-9]{6,}").unwrap());

/// Runs of whitespace, byte-order marks, comma, semicolon or pipe
static DELIMITER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\x{FEFF},;|]+").unwrap());

/// A well-formed percent escape
static ESCAPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%[0-9A-Fa-f]{2}").unwrap());

/// Which expansion steps the extractor runs after seeding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub percent_decode: bool,
    pub structured_codes: bool,
    pub split_delimiters: bool,
    pub url_components: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            percent_decode: true,
            structured_codes: true,
            split_delimiters: true,
            url_components: true,
        }
    }
}

impl ExtractorConfig {
    /// Exact-match variant: the only candidate is the trimmed input
    pub fn seed_only() -> Self {
        Self {
            percent_decode: false,
            structured_codes: false,
            split_delimiters: false,
            url_components: false,
        }
    }
}

/// Turns one raw input into a [`CandidateSet`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn seed_only() -> Self {
        Self::new(ExtractorConfig::seed_only())
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract every plausible code from `raw`.
    ///
    /// Empty or whitespace-only input yields an empty set. Each step runs over
    /// all strings found so far and only adds to them; transforms that do not
    /// apply (bad escapes, strings that are not URLs) contribute nothing.
    pub fn extract(&self, raw: &str) -> CandidateSet {
        let seed = trim_code(raw);
        if seed.is_empty() {
            return CandidateSet::new();
        }

        let mut found = Discovered::seeded(seed);
        if self.config.percent_decode {
            found.expand(percent_decoded);
        }
        if self.config.structured_codes {
            found.expand(structured_codes);
        }
        if self.config.split_delimiters {
            found.expand(delimited_segments);
        }
        if self.config.url_components {
            found.expand(url_components);
        }

        let candidates: CandidateSet = found.values.into_iter().collect();
        tracing::trace!(raw, candidates = candidates.len(), "extracted candidates");
        candidates
    }
}

/// Untrimmed working set; trimming happens once when it becomes a CandidateSet
struct Discovered {
    values: Vec<String>,
    seen: AHashSet<String>,
}

impl Discovered {
    fn seeded(seed: &str) -> Self {
        Self {
            values: vec![seed.to_string()],
            seen: AHashSet::from_iter([seed.to_string()]),
        }
    }

    fn add(&mut self, value: String) {
        if !value.is_empty() && self.seen.insert(value.clone()) {
            self.values.push(value);
        }
    }

    /// Apply `transform` to every value present before the call
    fn expand<F, I>(&mut self, transform: F)
    where
        F: Fn(&str) -> I,
        I: IntoIterator<Item = String>,
    {
        let current = self.values.len();
        for index in 0..current {
            let derived: Vec<String> = transform(&self.values[index]).into_iter().collect();
            for value in derived {
                self.add(value);
            }
        }
    }
}

/// Percent-decode, or nothing if an escape is malformed or the bytes are not UTF-8
fn percent_decoded(value: &str) -> Option<String> {
    if ESCAPE_RE.find_iter(value).count() != value.matches('%').count() {
        return None;
    }
    urlencoding::decode(value).ok().map(|decoded| decoded.into_owned())
}

fn structured_codes(value: &str) -> Vec<String> {
    let upper = value.to_uppercase();
    STRUCTURED_CODE_RE
        .find_iter(&upper)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn delimited_segments(value: &str) -> Vec<String> {
    DELIMITER_RE
        .split(value)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Non-empty path segments and query values of an absolute URL
fn url_components(value: &str) -> Vec<String> {
    let Ok(url) = Url::parse(value) else {
        return Vec::new();
    };

    let mut parts: Vec<String> = url
        .path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();
    parts.extend(
        url.query_pairs()
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty()),
    );
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extract(raw: &str) -> CandidateSet {
        Extractor::default().extract(raw)
    }

    fn set(values: &[&str]) -> CandidateSet {
        values.iter().collect()
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(extract("").is_empty());
        assert!(extract("   ").is_empty());
        assert!(extract("\t\r\n").is_empty());
    }

    #[test]
    fn test_seed_is_trimmed_and_first() {
        let candidates = extract("  7501234567890 ");
        assert_eq!(candidates.first(), Some("7501234567890"));
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn test_structured_code_is_case_folded() {
        assert!(extract("F123456").contains("F123456"));
        assert!(extract("f123456").contains("F123456"));
        assert!(extract("lote-f1234567-x").contains("F1234567"));
    }

    #[test]
    fn test_structured_code_needs_six_digits() {
        let candidates = extract("F12345");
        assert_eq!(candidates, set(&["F12345"]));
    }

    #[test]
    fn test_structured_code_matches_do_not_overlap() {
        let candidates = extract("xF123456F7654321y");
        assert!(candidates.contains("F123456"));
        assert!(candidates.contains("F7654321"));
    }

    #[test]
    fn test_split_on_delimiters() {
        let candidates = extract("8412345678901;OTHER");
        assert!(candidates.contains("8412345678901"));
        assert!(candidates.contains("OTHER"));

        let candidates = extract("a, b|c ;; d");
        for part in ["a", "b", "c", "d"] {
            assert!(candidates.contains(part), "missing {part}");
        }
    }

    #[test]
    fn test_url_path_and_query() {
        let candidates = extract("https://shop.example/p/8412345678901?ref=home&empty=");
        assert!(candidates.contains("8412345678901"));
        assert!(candidates.contains("p"));
        assert!(candidates.contains("home"));
        assert!(!candidates.contains(""));
    }

    #[test]
    fn test_url_query_values_are_decoded() {
        let candidates = extract("https://shop.example/item?code=F%20123456");
        assert!(candidates.contains("F 123456"));
    }

    #[test]
    fn test_percent_encoded_digits() {
        let candidates = extract("%38%34%31%32%33%34%35%36%37%38%39%30%31");
        assert!(candidates.contains("8412345678901"));
    }

    #[test]
    fn test_percent_encoded_url_is_decomposed() {
        let candidates = extract("https%3A%2F%2Fshop.example%2Fp%2F7501234567890");
        assert!(candidates.contains("7501234567890"));
    }

    #[test]
    fn test_malformed_escape_is_skipped() {
        let candidates = extract("100%");
        assert_eq!(candidates, set(&["100%"]));

        let candidates = extract("%ZZ750");
        assert_eq!(candidates, set(&["%ZZ750"]));
    }

    #[test]
    fn test_invalid_utf8_escape_is_skipped() {
        let candidates = extract("%FF%FE");
        assert_eq!(candidates, set(&["%FF%FE"]));
    }

    #[test]
    fn test_non_url_is_not_decomposed() {
        let candidates = extract("7501234567890");
        assert_eq!(candidates, set(&["7501234567890"]));
    }

    #[test]
    fn test_url_inside_delimited_input() {
        let candidates = extract("scan: https://shop.example/p/F0001234");
        assert!(candidates.contains("F0001234"));
    }

    #[test]
    fn test_extract_is_idempotent() {
        let raw = "https://shop.example/p/F123456?x=1;2|3";
        assert_eq!(extract(raw), extract(raw));
    }

    #[test]
    fn test_seed_only_config() {
        let extractor = Extractor::seed_only();
        let candidates = extractor.extract(" https://shop.example/p/F123456;x ");
        assert_eq!(candidates, set(&["https://shop.example/p/F123456;x"]));
        assert!(extractor.extract("  ").is_empty());
    }

    #[test]
    fn test_single_step_configs() {
        let only_split = Extractor::new(ExtractorConfig {
            split_delimiters: true,
            ..ExtractorConfig::seed_only()
        });
        let candidates = only_split.extract("f123456;%41");
        assert!(candidates.contains("f123456"));
        assert!(candidates.contains("%41"));
        assert!(!candidates.contains("F123456"));
        assert!(!candidates.contains("A"));
    }

    #[test]
    fn test_byte_order_mark_is_trimmed_and_splits() {
        assert_eq!(extract("\u{FEFF}7501234567890"), set(&["7501234567890"]));

        let candidates = extract("lot\u{FEFF}7501234567890");
        assert!(candidates.contains("7501234567890"));
        assert!(candidates.contains("lot"));
    }

    #[test]
    fn test_many_delimited_segments_stay_linear() {
        let raw = (0..40_000)
            .map(|i| format!("c{}", i))
            .collect::<Vec<_>>()
            .join(";");

        let start = std::time::Instant::now();
        let candidates = extract(&raw);
        let elapsed = start.elapsed();

        assert_eq!(candidates.len(), 40_001);
        assert_eq!(candidates.first(), Some(raw.as_str()));
        assert!(elapsed < std::time::Duration::from_secs(2), "took {:?}", elapsed);
    }
}
