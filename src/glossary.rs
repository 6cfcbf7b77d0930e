//! Metric-term glossary and free-text annotation.
//!
//! The annotator scans prose for glossary terms so the presentation layer
//! can attach tooltip definitions. Matching is case-insensitive and prefers
//! the longest term at any given position ("WIP limit" wins over "WIP").

use std::sync::LazyLock;

use regex::Regex;

pub const GLOSSARY: &[(&str, &str)] = &[
    (
        "carryover rate",
        "Share of a cycle's scope left incomplete at cycle end and carried into the next one. \
         High values point at estimation or scope-management problems.",
    ),
    (
        "scope creep",
        "Growth in a cycle's scope (issues or points) after the cycle starts; how much work \
         was added beyond the original plan.",
    ),
    (
        "WIP limit",
        "Upper bound on issues in progress at once. A common guideline is twice the team \
         size; exceeding it drives context switching and slows delivery.",
    ),
    (
        "WIP",
        "Work in progress: the number of issues currently in a started state. Too many at \
         once reduces throughput.",
    ),
    (
        "cycle time",
        "Business days from when work starts on an issue until it is completed. Shorter \
         means faster execution.",
    ),
    (
        "lead time",
        "Business days from issue creation to completion. Includes backlog wait, so it is \
         never shorter than cycle time.",
    ),
    (
        "throughput",
        "Issues completed within a fixed window; a measure of team processing capacity.",
    ),
    (
        "velocity",
        "Story points completed per cycle; used to gauge how much a team can take on.",
    ),
    (
        "burndown",
        "Remaining work over the course of a cycle, compared against an ideal straight-line \
         ramp to zero to make schedule slip visible.",
    ),
    (
        "burnup",
        "Cumulative completed work over a cycle shown against total scope, so scope changes \
         and progress stay visible at the same time.",
    ),
    (
        "cumulative flow diagram",
        "Stacked time series of issue counts per workflow state. Parallel bands mean stable \
         flow; a widening band marks a bottleneck.",
    ),
    (
        "dwell time",
        "Average days issues spend in a given workflow state. Unusually long dwell marks \
         that state as a bottleneck.",
    ),
    (
        "completion rate",
        "Completed share of the current cycle's total scope; how far along the cycle is.",
    ),
    (
        "percentile",
        "Value below which the given share of observations falls; the 85th percentile \
         bounds 85% of the data.",
    ),
];

static TERM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let mut terms: Vec<&str> = GLOSSARY.iter().map(|(term, _)| *term).collect();
    terms.sort_by_key(|t| std::cmp::Reverse(t.len()));
    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)({alternation})")).unwrap()
});

/// Case-insensitive definition lookup.
pub fn definition(term: &str) -> Option<&'static str> {
    GLOSSARY
        .iter()
        .find(|(t, _)| t.eq_ignore_ascii_case(term))
        .map(|(_, d)| *d)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Term {
        term: String,
        definition: &'static str,
    },
}

/// Split free text into plain runs and recognized glossary terms.
pub fn annotate(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for found in TERM_REGEX.find_iter(text) {
        if found.start() > last {
            segments.push(Segment::Text(text[last..found.start()].to_string()));
        }
        if let Some(def) = definition(found.as_str()) {
            segments.push(Segment::Term {
                term: found.as_str().to_string(),
                definition: def,
            });
        }
        last = found.end();
    }

    if last < text.len() {
        segments.push(Segment::Text(text[last..].to_string()));
    }
    segments
}
