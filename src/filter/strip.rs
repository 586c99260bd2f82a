use crate::data_structs::{
    Read,
    PAD_CHAR,
};

/// Removes non-informative `.` padding from both ends of each pattern.
///
/// Reads consisting of padding only are dropped. Removing leading padding
/// advances `start`, so the right edge of the covered interval is
/// unchanged. The result is stably ordered by `(start, pattern)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaddingStripper;

impl PaddingStripper {
    pub fn new() -> Self {
        Self
    }

    /// Strips one read. `None` if nothing informative is left.
    pub fn strip_read(
        &self,
        mut read: Read,
    ) -> Option<Read> {
        let trailing = read.pattern.trim_end_matches(PAD_CHAR).len();
        read.pattern.truncate(trailing);
        if read.pattern.is_empty() {
            return None;
        }

        let leading = read.pattern.len() - read.pattern.trim_start_matches(PAD_CHAR).len();
        if leading > 0 {
            read.pattern.drain(..leading);
            read.start += leading as u64;
        }
        Some(read)
    }

    pub fn apply(
        &self,
        reads: Vec<Read>,
    ) -> Vec<Read> {
        let mut stripped = reads
            .into_iter()
            .filter_map(|read| self.strip_read(read))
            .collect::<Vec<_>>();
        stripped.sort_by(Read::cmp_position);
        stripped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_both_ends() {
        let read = PaddingStripper::new()
            .strip_read(Read::new("chr1", 10, "..CT..", 3))
            .unwrap();
        assert_eq!(read, Read::new("chr1", 12, "CT", 3));
    }

    #[test]
    fn test_all_padding_dropped() {
        assert!(PaddingStripper::new()
            .strip_read(Read::new("chr1", 10, "....", 3))
            .is_none());
    }

    #[test]
    fn test_inner_padding_kept() {
        let read = PaddingStripper::new()
            .strip_read(Read::new("chr1", 1, "C..T", 1))
            .unwrap();
        assert_eq!(read.pattern, "C..T");
        assert_eq!(read.start, 1);
    }

    #[test]
    fn test_idempotent() {
        let stripper = PaddingStripper::new();
        let reads = vec![
            Read::new("chr1", 10, "..CT..", 3),
            Read::new("chr1", 8, "....C", 1),
            Read::new("chr1", 11, "T.", 2),
            Read::new("chr1", 5, "...", 2),
        ];
        let once = stripper.apply(reads);
        let twice = stripper.apply(once.clone());
        assert_eq!(once, twice);
        for read in once.iter() {
            assert!(!read.pattern.starts_with(PAD_CHAR));
            assert!(!read.pattern.ends_with(PAD_CHAR));
        }
    }

    #[test]
    fn test_output_sorted_after_shift() {
        let reads = vec![
            Read::new("chr1", 10, "..T", 1),
            Read::new("chr1", 11, "C", 1),
            Read::new("chr1", 12, "C", 1),
        ];
        let stripped = PaddingStripper::new().apply(reads);
        let order = stripped
            .iter()
            .map(|r| (r.start, r.pattern.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(11, "C"), (12, "C"), (12, "T")]);
    }
}
