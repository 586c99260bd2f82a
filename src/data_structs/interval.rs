use std::fmt::{
    Display,
    Formatter,
};

use serde::{
    Deserialize,
    Serialize,
};

/// Half-open interval of site indices on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteInterval {
    chrom: String,
    start: u64,
    end:   u64,
}

impl SiteInterval {
    /// Creates a new interval. Panics if `start > end`; fallible
    /// construction from user input goes through
    /// [`RegionResolver`](crate::region::RegionResolver).
    pub fn new(
        chrom: impl Into<String>,
        start: u64,
        end: u64,
    ) -> Self {
        assert!(
            start <= end,
            "Start site must be less than or equal to end site"
        );
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn length(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Display for SiteInterval {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

/// One row of a bed file annotated with its site range
/// (columns 4 and 5).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BedInterval {
    pub chrom:         String,
    pub genomic_start: u64,
    pub genomic_end:   u64,
    /// `None` when the row carries no sites (`NA` columns).
    pub sites:         Option<(u64, u64)>,
}

impl BedInterval {
    pub fn new(
        chrom: impl Into<String>,
        genomic_start: u64,
        genomic_end: u64,
        sites: Option<(u64, u64)>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            genomic_start,
            genomic_end,
            sites,
        }
    }

    /// Site interval of the row, if it has any sites.
    pub fn site_interval(&self) -> Option<SiteInterval> {
        self.sites
            .filter(|(start, end)| start < end)
            .map(|(start, end)| SiteInterval::new(self.chrom.clone(), start, end))
    }

    /// Region label, genomic 1-based inclusive.
    pub fn label(&self) -> String {
        format!(
            "{}:{}-{}",
            self.chrom,
            self.genomic_start.saturating_add(1),
            self.genomic_end
        )
    }

    /// Whether the genomic blocks of two rows intersect.
    pub fn overlaps(
        &self,
        other: &Self,
    ) -> bool {
        self.chrom == other.chrom
            && self.genomic_start < other.genomic_end
            && other.genomic_start < self.genomic_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bed_label_is_one_based() {
        let bed = BedInterval::new("chr1", 999, 2000, Some((10, 20)));
        assert_eq!(bed.label(), "chr1:1000-2000");
    }

    #[test]
    fn test_bed_without_sites() {
        let bed = BedInterval::new("chr1", 0, 10, None);
        assert!(bed.site_interval().is_none());
        let bed = BedInterval::new("chr1", 0, 10, Some((5, 5)));
        assert!(bed.site_interval().is_none());
    }

    #[test]
    #[should_panic(expected = "Start site must be less than or equal to end site")]
    fn test_inverted_interval_panics() {
        let _ = SiteInterval::new("chr1", 10, 5);
    }
}
