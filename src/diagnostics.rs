//! Non-fatal diagnostics.
//!
//! Components never print warnings themselves. They push a [`Warning`] into
//! the [`Diagnostics`] collector handed to them; the collector forwards it
//! to the `log` facade so the CLI can route it to stderr, and keeps a copy
//! so callers (and tests) can inspect what happened.

use std::fmt::{
    Display,
    Formatter,
};

use log::warn;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// First record of a stream does not look like a pat record.
    InvalidFirstRecord { line: String },
    /// A record could not be parsed and was skipped.
    MalformedRecord { line: String },
    /// The source produced no lines.
    EmptySource { scope: String },
    /// Bed regions overlap; reads in the overlap are reported twice.
    OverlappingBedRegions { first: String, second: String },
    /// Range query for a region failed, region was skipped.
    RegionQueryFailed { region: String, reason: String },
    /// More bed regions than fit in one super-chunk.
    LargeRegionList { regions: usize },
}

impl Display for Warning {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Warning::InvalidFirstRecord { line } => {
                write!(f, "Invalid first line in pat file: {}", line)
            },
            Warning::MalformedRecord { line } => {
                write!(f, "Skipping malformed pat record: {}", line)
            },
            Warning::EmptySource { scope } => {
                write!(f, "Empty pat source for {}", scope)
            },
            Warning::OverlappingBedRegions { first, second } => {
                write!(
                    f,
                    "Bed regions are not disjoint ({} overlaps {}). Reads \
                     covering overlapping regions will be duplicated.",
                    first, second
                )
            },
            Warning::RegionQueryFailed { region, reason } => {
                write!(f, "Query for region {} failed: {}", region, reason)
            },
            Warning::LargeRegionList { regions } => {
                write!(
                    f,
                    "Viewing {} regions runs one range query per region and is \
                     slow for large bed files. Consider merging regions.",
                    regions
                )
            },
        }
    }
}

/// Explicit warning collector.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        warning: Warning,
    ) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Appends warnings collected elsewhere (e.g. by a worker) without
    /// logging them a second time.
    pub fn extend(
        &mut self,
        other: Diagnostics,
    ) {
        self.warnings.extend(other.warnings);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extend_keeps_order() {
        let mut left = Diagnostics::new();
        left.push(Warning::EmptySource {
            scope: "a".into(),
        });
        let mut right = Diagnostics::new();
        right.push(Warning::EmptySource {
            scope: "b".into(),
        });
        left.extend(right);

        assert_eq!(left.len(), 2);
        assert_eq!(
            left.warnings()[1],
            Warning::EmptySource {
                scope: "b".into()
            }
        );
    }

    #[test]
    fn test_display_mentions_duplication() {
        let warning = Warning::OverlappingBedRegions {
            first:  "chr1:1-10".into(),
            second: "chr1:5-20".into(),
        };
        assert!(warning.to_string().contains("duplicated"));
    }
}
