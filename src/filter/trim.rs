use crate::data_structs::{
    Read,
    SiteInterval,
};

/// Strict mode: clips reads that extend past the interval boundaries.
///
/// Reads that do not intersect the interval at all are left untouched; the
/// overlap pre-filter removes them before this stage runs.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryTrimmer<'a> {
    interval: &'a SiteInterval,
}

impl<'a> BoundaryTrimmer<'a> {
    pub fn new(interval: &'a SiteInterval) -> Self {
        Self { interval }
    }

    pub fn trim_read(
        &self,
        mut read: Read,
    ) -> Read {
        if read.is_within(self.interval) {
            return read;
        }
        let (start, end) = (self.interval.start(), self.interval.end());

        if read.start < start {
            let skip = ((start - read.start) as usize).min(read.pattern.len());
            read.pattern.drain(..skip);
            read.start = start;
        }
        if read.end() > end {
            let keep = end.saturating_sub(read.start) as usize;
            read.pattern.truncate(keep);
        }
        read
    }

    pub fn apply(
        &self,
        reads: Vec<Read>,
    ) -> Vec<Read> {
        reads
            .into_iter()
            .map(|read| self.trim_read(read))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Read::new("chr1", 100, "CC.T", 5), 101, "C.")]
    #[case(Read::new("chr1", 99, "CTCTCT", 1), 101, "CT")]
    #[case(Read::new("chr1", 101, "TC", 1), 101, "TC")]
    #[case(Read::new("chr1", 102, "TCCC", 1), 102, "T")]
    #[case(Read::new("chr1", 95, "CCCCCCT", 1), 101, "T")]
    fn test_trim(
        #[case] read: Read,
        #[case] start: u64,
        #[case] pattern: &str,
    ) {
        let interval = SiteInterval::new("chr1", 101, 103);
        let trimmed = BoundaryTrimmer::new(&interval).trim_read(read);
        assert_eq!(trimmed.start, start);
        assert_eq!(trimmed.pattern, pattern);
    }

    #[test]
    fn test_trimmed_reads_stay_inside() {
        let interval = SiteInterval::new("chr1", 50, 60);
        let reads = (40..70)
            .map(|start| Read::new("chr1", start, "CT.CTCTC", 1))
            .filter(|read| read.overlaps(&interval))
            .collect::<Vec<_>>();
        let trimmed = BoundaryTrimmer::new(&interval).apply(reads);
        assert!(!trimmed.is_empty());
        for read in trimmed {
            assert!(read.is_within(&interval), "{} escapes {}", read, interval);
            assert!(!read.is_empty());
        }
    }
}
