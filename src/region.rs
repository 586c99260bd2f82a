//! Resolution of region requests into site intervals.

use std::fmt::{
    Display,
    Formatter,
};
use std::str::FromStr;

use crate::data_structs::{
    BedInterval,
    SiteInterval,
};
use crate::error::{
    Result,
    ViewError,
};
use crate::reference::ReferenceIndex;

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionRequest {
    WholeGenome,
    /// Whole chromosome.
    Chrom(String),
    /// Genomic range, 1-based inclusive (`chr:start-end`).
    Genomic { chrom: String, start: u64, end: u64 },
    /// Half-open site-index range.
    Sites { start: u64, end: u64 },
    /// Bed row with precomputed site columns.
    Bed(BedInterval),
}

impl RegionRequest {
    /// Parses a `--region` value: `chr` or `chr:start-end`.
    pub fn parse_region(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ViewError::invalid_region(value, "empty region"));
        }
        match value.rsplit_once(':') {
            None => Ok(RegionRequest::Chrom(value.to_owned())),
            Some((chrom, range)) => {
                let (start, end) = parse_range(value, range)?;
                if start == 0 {
                    return Err(ViewError::invalid_region(
                        value,
                        "genomic coordinates are 1-based",
                    ));
                }
                if start > end {
                    return Err(ViewError::invalid_region(value, "start > end"));
                }
                Ok(RegionRequest::Genomic {
                    chrom: chrom.to_owned(),
                    start,
                    end,
                })
            },
        }
    }

    /// Parses a `--sites` value: `start-end`, half-open.
    pub fn parse_sites(value: &str) -> Result<Self> {
        let (start, end) = parse_range(value, value.trim())?;
        if start == 0 {
            return Err(ViewError::invalid_region(value, "site indices are 1-based"));
        }
        if start >= end {
            return Err(ViewError::invalid_region(value, "start >= end"));
        }
        Ok(RegionRequest::Sites { start, end })
    }

    pub fn is_whole(&self) -> bool {
        matches!(self, RegionRequest::WholeGenome)
    }
}

impl FromStr for RegionRequest {
    type Err = ViewError;

    fn from_str(s: &str) -> Result<Self> {
        RegionRequest::parse_region(s)
    }
}

fn parse_range(
    region: &str,
    range: &str,
) -> Result<(u64, u64)> {
    let cleaned = range.replace(',', "");
    let (start, end) = cleaned
        .split_once('-')
        .ok_or_else(|| ViewError::invalid_region(region, "expected START-END"))?;
    let parse = |s: &str| {
        s.trim().parse::<u64>().map_err(|_| {
            ViewError::invalid_region(region, format!("'{}' is not a number", s))
        })
    };
    Ok((parse(start)?, parse(end)?))
}

/// A region request after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegion {
    label:    String,
    /// `None` means no boundary filtering (whole genome).
    interval: Option<SiteInterval>,
}

impl ResolvedRegion {
    pub fn whole() -> Self {
        Self {
            label:    "whole genome".into(),
            interval: None,
        }
    }

    pub fn new(
        label: impl Into<String>,
        interval: SiteInterval,
    ) -> Self {
        Self {
            label:    label.into(),
            interval: Some(interval),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn interval(&self) -> Option<&SiteInterval> {
        self.interval.as_ref()
    }

    pub fn is_whole(&self) -> bool {
        self.interval.is_none()
    }
}

impl Display for ResolvedRegion {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Resolves [`RegionRequest`]s against an optional reference dictionary.
///
/// Bed rows and the whole-genome request never consult the reference;
/// every other request requires one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionResolver<'a> {
    reference: Option<&'a ReferenceIndex>,
}

impl<'a> RegionResolver<'a> {
    pub fn new(reference: Option<&'a ReferenceIndex>) -> Self {
        Self { reference }
    }

    fn reference(
        &self,
        request: &str,
    ) -> Result<&'a ReferenceIndex> {
        self.reference.ok_or_else(|| {
            ViewError::invalid_region(request, "a reference dictionary is required")
        })
    }

    fn label_for(
        reference: &ReferenceIndex,
        chrom: &str,
        start: u64,
        end: u64,
    ) -> String {
        match reference.genomic_span(chrom, start, end) {
            Some((gstart, gend)) => format!("{}:{}-{}", chrom, gstart, gend - 1),
            None => format!("{}:{}-{}", chrom, start, end),
        }
    }

    pub fn resolve(
        &self,
        request: &RegionRequest,
    ) -> Result<ResolvedRegion> {
        match request {
            RegionRequest::WholeGenome => Ok(ResolvedRegion::whole()),
            RegionRequest::Chrom(chrom) => {
                let reference = self.reference(chrom)?;
                let (start, end) = reference.chrom_sites(chrom).ok_or_else(|| {
                    ViewError::invalid_region(chrom.as_str(), "unknown chromosome")
                })?;
                Ok(ResolvedRegion::new(
                    chrom.clone(),
                    SiteInterval::new(chrom.clone(), start, end),
                ))
            },
            RegionRequest::Genomic { chrom, start, end } => {
                let label = format!("{}:{}-{}", chrom, start, end);
                let reference = self.reference(&label)?;
                if !reference.contains(chrom) {
                    return Err(ViewError::invalid_region(label, "unknown chromosome"));
                }
                let (site_start, site_end) = reference
                    .sites_in(chrom, *start, *end)
                    .ok_or_else(|| ViewError::invalid_region(label.as_str(), "No CpGs"))?;
                Ok(ResolvedRegion::new(
                    label,
                    SiteInterval::new(chrom.clone(), site_start, site_end),
                ))
            },
            RegionRequest::Sites { start, end } => {
                let request_label = format!("{}-{}", start, end);
                if start >= end {
                    return Err(ViewError::invalid_region(request_label, "start >= end"));
                }
                let reference = self.reference(&request_label)?;
                let chrom = reference.chrom_of_site(*start).ok_or_else(|| {
                    ViewError::invalid_region(request_label.as_str(), "site out of range")
                })?;
                let (_, chrom_end) = reference
                    .chrom_sites(chrom)
                    .ok_or_else(|| ViewError::invalid_region(request_label.as_str(), "unknown chromosome"))?;
                if *end > chrom_end {
                    return Err(ViewError::invalid_region(
                        request_label,
                        "site range spans more than one chromosome",
                    ));
                }
                Ok(ResolvedRegion::new(
                    Self::label_for(reference, chrom, *start, *end),
                    SiteInterval::new(chrom, *start, *end),
                ))
            },
            RegionRequest::Bed(bed) => self.resolve_bed(bed),
        }
    }

    /// Bed rows use columns 4-5 as the site interval as-is. A row without
    /// sites is an `InvalidRegion` error, reported by the multi-region
    /// driver as a "No CpGs" region.
    pub fn resolve_bed(
        &self,
        bed: &BedInterval,
    ) -> Result<ResolvedRegion> {
        let interval = bed
            .site_interval()
            .ok_or_else(|| ViewError::invalid_region(bed.label(), "No CpGs"))?;
        if let Some(reference) = self.reference {
            if !reference.contains(&bed.chrom) {
                return Err(ViewError::invalid_region(bed.label(), "unknown chromosome"));
            }
        }
        Ok(ResolvedRegion::new(bed.label(), interval))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn reference() -> ReferenceIndex {
        let dict = "chr1\t10\t1\nchr1\t20\t2\nchr1\t35\t3\nchr2\t5\t4\nchr2\t9\t5\n";
        ReferenceIndex::from_reader(dict.as_bytes()).unwrap()
    }

    #[rstest]
    #[case("chr1", RegionRequest::Chrom("chr1".into()))]
    #[case("chr1:1,000-2,000", RegionRequest::Genomic { chrom: "chr1".into(), start: 1000, end: 2000 })]
    fn test_parse_region(
        #[case] value: &str,
        #[case] expected: RegionRequest,
    ) {
        assert_eq!(RegionRequest::parse_region(value).unwrap(), expected);
    }

    #[rstest]
    #[case("chr1:abc-10")]
    #[case("chr1:20-10")]
    #[case("chr1:0-10")]
    #[case("chr1:10")]
    #[case("")]
    fn test_parse_region_invalid(#[case] value: &str) {
        assert!(matches!(
            RegionRequest::parse_region(value),
            Err(ViewError::InvalidRegion { .. })
        ));
    }

    #[rstest]
    #[case("10-10")]
    #[case("11-10")]
    #[case("x-10")]
    fn test_parse_sites_invalid(#[case] value: &str) {
        assert!(RegionRequest::parse_sites(value).is_err());
    }

    #[test]
    fn test_resolve_whole_without_reference() {
        let resolved = RegionResolver::new(None)
            .resolve(&RegionRequest::WholeGenome)
            .unwrap();
        assert!(resolved.is_whole());
    }

    #[test]
    fn test_resolve_chrom_and_genomic() {
        let reference = reference();
        let resolver = RegionResolver::new(Some(&reference));

        let chrom = resolver
            .resolve(&RegionRequest::Chrom("chr2".into()))
            .unwrap();
        assert_eq!(chrom.interval(), Some(&SiteInterval::new("chr2", 4, 6)));

        let genomic = resolver
            .resolve(&RegionRequest::parse_region("chr1:15-40").unwrap())
            .unwrap();
        assert_eq!(genomic.interval(), Some(&SiteInterval::new("chr1", 2, 4)));
        assert_eq!(genomic.label(), "chr1:15-40");
    }

    #[test]
    fn test_resolve_unknown_chrom_and_empty_range() {
        let reference = reference();
        let resolver = RegionResolver::new(Some(&reference));
        assert!(resolver
            .resolve(&RegionRequest::Chrom("chrX".into()))
            .is_err());
        assert!(resolver
            .resolve(&RegionRequest::parse_region("chr1:21-34").unwrap())
            .is_err());
    }

    #[test]
    fn test_resolve_sites() {
        let reference = reference();
        let resolver = RegionResolver::new(Some(&reference));
        let resolved = resolver
            .resolve(&RegionRequest::Sites { start: 2, end: 4 })
            .unwrap();
        assert_eq!(resolved.interval(), Some(&SiteInterval::new("chr1", 2, 4)));
        assert_eq!(resolved.label(), "chr1:20-35");

        assert!(resolver
            .resolve(&RegionRequest::Sites { start: 3, end: 5 })
            .is_err());
    }

    #[test]
    fn test_resolve_requires_reference() {
        assert!(RegionResolver::new(None)
            .resolve(&RegionRequest::Chrom("chr1".into()))
            .is_err());
    }

    #[test]
    fn test_resolve_bed_uses_columns_directly() {
        let bed = BedInterval::new("chr7", 99, 500, Some((1000, 1010)));
        let resolved = RegionResolver::new(None).resolve_bed(&bed).unwrap();
        assert_eq!(
            resolved.interval(),
            Some(&SiteInterval::new("chr7", 1000, 1010))
        );
        assert_eq!(resolved.label(), "chr7:100-500");

        let empty = BedInterval::new("chr7", 99, 500, None);
        assert!(RegionResolver::new(None).resolve_bed(&empty).is_err());
    }
}
