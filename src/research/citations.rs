//! Citation normalization for the compiled report.
//!
//! Inline `[src_xxxxxxxx]` markers are rewritten into sequential display
//! numbers and a fresh reference list is appended. Numbering is a pure
//! function of the set of cited identifiers (ascending lexical order, from
//! 1), independent of where they first appear in the text, so recompiling
//! the same findings yields the same numbers.

use crate::types::SourceMetadata;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(src_[A-Za-z0-9]+)\]").expect("marker pattern is valid"));

static REFERENCES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\n+##?\s*references?\s*\n.*$").expect("references pattern is valid")
});

/// Rewrite inline citation markers into display numbers and append a
/// reference list. Markers without a catalogue entry become a literal `[?]`
/// and are omitted from the list. Idempotent: text without markers is
/// returned unchanged.
pub fn normalize_citations(report: &str, sources: &[SourceMetadata]) -> String {
    let cited: BTreeSet<&str> = MARKER_RE
        .captures_iter(report)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str())
        .collect();

    if cited.is_empty() {
        return report.to_string();
    }

    let catalogue: HashMap<&str, &SourceMetadata> =
        sources.iter().map(|s| (s.id.as_str(), s)).collect();

    // Display numbers go only to resolvable identifiers so the reference
    // list stays gapless; the rest render as a visible placeholder.
    let numbered: HashMap<&str, usize> = cited
        .iter()
        .filter(|id| catalogue.contains_key(*id))
        .enumerate()
        .map(|(index, id)| (*id, index + 1))
        .collect();

    let unresolved = cited.len() - numbered.len();
    if unresolved > 0 {
        tracing::warn!(unresolved, "citation markers without a catalogue entry");
    }

    let rewritten = MARKER_RE.replace_all(report, |caps: &regex::Captures<'_>| {
        match numbered.get(&caps[1]) {
            Some(number) => format!("[{number}]"),
            None => "[?]".to_string(),
        }
    });

    // Drop whatever reference section generation may have produced; we
    // append the authoritative one.
    let mut output = REFERENCES_RE.replace(&rewritten, "").into_owned();

    if !numbered.is_empty() {
        let mut entries: Vec<(usize, &str)> =
            numbered.iter().map(|(id, number)| (*number, *id)).collect();
        entries.sort_unstable();

        output.push_str("\n\n## References\n\n");
        for (number, id) in entries {
            if let Some(source) = catalogue.get(id) {
                output.push_str(&format!("[{number}] {} ({})\n", source.title, source.url));
            }
        }
    }

    output
}
