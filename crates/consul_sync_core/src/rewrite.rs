//! Prefix filter and rewrite engine.
//!
//! Decides, per exported key, whether it is imported and which key it is
//! written to. Selection happens first: a record whose key does not start
//! with the `from` prefix never reaches the rewrite step. Selected keys have
//! `from` stripped and `to` (minus leading separators) prepended.
//!
//! ## Invariants
//!
//! - Matching is literal, case-sensitive and byte-wise
//! - An empty `from` selects every key and strips nothing
//! - An empty `to` prepends nothing
//! - No destination key ever starts with `/`
//! - No destination key is ever empty
//! - [`PrefixRewrite::rewrite`] is pure and total

use crate::record::Record;
use std::fmt;

const SEPARATOR: char = '/';

/// Why a selected record is not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Stripping and prepending left nothing.
    EmptyDestination,
    /// The destination consisted only of separators and normalized to nothing.
    SeparatorOnly,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyDestination => f.write_str("it becomes an empty key"),
            SkipReason::SeparatorOnly => f.write_str("it becomes a key made only of separators"),
        }
    }
}

/// Outcome of rewriting one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteDecision {
    /// Write the record under this key.
    Selected(String),
    /// Do not write the record.
    Skipped(SkipReason),
}

impl RewriteDecision {
    /// Returns the destination key if the record is selected.
    pub fn destination(&self) -> Option<&str> {
        match self {
            RewriteDecision::Selected(key) => Some(key),
            RewriteDecision::Skipped(_) => None,
        }
    }
}

/// A `from` → `to` prefix relocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixRewrite {
    from: String,
    to: String,
}

impl PrefixRewrite {
    /// Creates a rewrite that selects keys under `from` and moves them under `to`.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// A rewrite that selects everything and changes nothing.
    pub fn identity() -> Self {
        Self::default()
    }

    /// The selection prefix.
    pub fn from_prefix(&self) -> &str {
        &self.from
    }

    /// The destination prefix, as given.
    pub fn to_prefix(&self) -> &str {
        &self.to
    }

    /// Returns true if `key` is in scope for import.
    pub fn selects(&self, key: &str) -> bool {
        self.from.is_empty() || key.starts_with(&self.from)
    }

    /// Computes the destination for `key`.
    ///
    /// Does not assume `key` was selected: a key outside `from` keeps its
    /// full name and only receives the `to` prefix.
    pub fn rewrite(&self, key: &str) -> RewriteDecision {
        let remainder = if self.from.is_empty() {
            key
        } else {
            key.strip_prefix(self.from.as_str()).unwrap_or(key)
        };

        let mut destination = String::with_capacity(self.to.len() + remainder.len());
        if !self.to.is_empty() {
            destination.push_str(self.to.trim_start_matches(SEPARATOR));
        }
        destination.push_str(remainder);

        if destination.is_empty() {
            return RewriteDecision::Skipped(SkipReason::EmptyDestination);
        }

        let normalized = destination.trim_start_matches(SEPARATOR);
        if normalized.is_empty() {
            return RewriteDecision::Skipped(SkipReason::SeparatorOnly);
        }

        RewriteDecision::Selected(normalized.to_owned())
    }

    /// Selects and rewrites `records` in order.
    ///
    /// Records outside the `from` prefix are dropped; every other record is
    /// yielded with its 1-based position within the selection.
    pub fn plan<'a>(&'a self, records: &'a [Record]) -> Plan<'a> {
        let selected: Vec<&Record> = records.iter().filter(|r| self.selects(&r.key)).collect();
        Plan {
            rewrite: self,
            total: selected.len(),
            selected: selected.into_iter().enumerate(),
        }
    }
}

impl fmt::Display for PrefixRewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "from-prefix='{}' → to-prefix='{}'", self.from, self.to)
    }
}

/// A selected record together with its rewrite decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRecord<'a> {
    /// 1-based position within the selection.
    pub index: usize,
    /// Size of the selection.
    pub total: usize,
    /// The source record.
    pub record: &'a Record,
    /// Where it goes, if anywhere.
    pub decision: RewriteDecision,
}

/// Iterator returned by [`PrefixRewrite::plan`].
#[derive(Debug)]
pub struct Plan<'a> {
    rewrite: &'a PrefixRewrite,
    total: usize,
    selected: std::iter::Enumerate<std::vec::IntoIter<&'a Record>>,
}

impl Plan<'_> {
    /// Number of selected records.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl<'a> Iterator for Plan<'a> {
    type Item = PlannedRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (i, record) = self.selected.next()?;
        Some(PlannedRecord {
            index: i + 1,
            total: self.total,
            record,
            decision: self.rewrite.rewrite(&record.key),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.selected.size_hint()
    }
}

impl ExactSizeIterator for Plan<'_> {}
