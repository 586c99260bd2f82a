use std::cmp::Ordering;
use std::fmt::{
    Display,
    Formatter,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::SiteInterval;

/// Characters allowed in a read pattern.
pub const PAT_ALPHABET: [char; 3] = ['.', 'C', 'T'];

/// Non-informative pattern character.
pub const PAD_CHAR: char = '.';

/// One read-level methylation record.
///
/// `start` is a 1-based site index. The read covers the half-open site
/// interval `[start, start + pattern.len())`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Read {
    pub chrom:   String,
    pub start:   u64,
    pub pattern: String,
    pub count:   u64,
    pub tags:    Vec<String>,
}

impl Read {
    pub fn new(
        chrom: impl Into<String>,
        start: u64,
        pattern: impl Into<String>,
        count: u64,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            pattern: pattern.into(),
            count,
            tags: Vec::new(),
        }
    }

    pub fn with_tags(
        mut self,
        tags: Vec<String>,
    ) -> Self {
        self.tags = tags;
        self
    }

    /// Number of sites covered.
    pub fn len(&self) -> u64 {
        self.pattern.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.pattern.is_empty()
    }

    /// Exclusive end of the covered site interval.
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.len())
    }

    /// Whether the covered interval intersects `interval`.
    pub fn overlaps(
        &self,
        interval: &SiteInterval,
    ) -> bool {
        self.chrom == interval.chrom()
            && self.start < interval.end()
            && self.end() > interval.start()
    }

    /// Whether the covered interval lies inside `interval`.
    pub fn is_within(
        &self,
        interval: &SiteInterval,
    ) -> bool {
        self.start >= interval.start() && self.end() <= interval.end()
    }

    pub fn has_valid_pattern(&self) -> bool {
        self.pattern
            .chars()
            .all(|c| PAT_ALPHABET.contains(&c))
    }

    /// Output order: start site, then pattern.
    pub fn cmp_position(
        &self,
        other: &Self,
    ) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.pattern.cmp(&other.pattern))
    }

    /// Two reads can be collapsed into one when they start at the same site
    /// with the same pattern.
    pub fn same_call(
        &self,
        other: &Self,
    ) -> bool {
        self.start == other.start && self.pattern == other.pattern
    }
}

impl Display for Read {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.chrom, self.start, self.pattern, self.count
        )?;
        for tag in self.tags.iter() {
            write!(f, "\t{}", tag)?;
        }
        Ok(())
    }
}
