//! Parsing of tab-separated pat records:
//! `chrom<TAB>start<TAB>pattern<TAB>count[<TAB>tag]*`.

use crate::data_structs::Read;
use crate::diagnostics::{
    Diagnostics,
    Warning,
};

/// Number of mandatory pat columns.
pub const PAT_COLS: usize = 4;

/// Parses a single line. Returns `None` if the line does not have the four
/// mandatory fields, its start/count are not integers or the read would end
/// past `u64::MAX`.
pub fn parse_line(line: &str) -> Option<Read> {
    let line = line.trim_end_matches(['\n', '\r']);
    let mut fields = line.split('\t');

    let chrom = fields.next().filter(|s| !s.is_empty())?;
    let start = fields.next()?.parse::<u64>().ok()?;
    let pattern = fields.next()?;
    start.checked_add(pattern.len() as u64)?;
    let count = fields.next()?.parse::<u64>().ok()?;
    let tags = fields.map(str::to_owned).collect::<Vec<_>>();

    Some(Read::new(chrom, start, pattern, count).with_tags(tags))
}

/// Whether the line satisfies the checks applied to the first record of a
/// stream: numeric start and count, pattern over `{., C, T}`.
fn is_valid_first_record(line: &str) -> bool {
    parse_line(line)
        .map(|read| read.start >= 1 && read.has_valid_pattern())
        .unwrap_or(false)
}

/// Parses a stream of pat lines.
///
/// Only the first non-empty line is format-checked; an invalid first line
/// is reported but parsing continues. Lines that can not be parsed at all
/// are skipped with a warning. An empty stream yields no reads and a
/// warning.
#[derive(Debug, Clone)]
pub struct RecordParser {
    scope: String,
}

impl RecordParser {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }

    pub fn parse<I, S>(
        &self,
        lines: I,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Read>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>, {
        let mut reads = Vec::new();
        let mut seen_first = false;

        for line in lines {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            if !seen_first {
                seen_first = true;
                if !is_valid_first_record(line) {
                    diagnostics.push(Warning::InvalidFirstRecord {
                        line: line.to_owned(),
                    });
                }
            }
            match parse_line(line) {
                Some(read) => reads.push(read),
                None => {
                    diagnostics.push(Warning::MalformedRecord {
                        line: line.to_owned(),
                    })
                },
            }
        }

        if !seen_first {
            diagnostics.push(Warning::EmptySource {
                scope: self.scope.clone(),
            });
        }
        reads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_with_tags() {
        let read = parse_line("chr1\t100\tCC.T\t5\tfoo\tbar\n").unwrap();
        assert_eq!(read.chrom, "chr1");
        assert_eq!(read.start, 100);
        assert_eq!(read.pattern, "CC.T");
        assert_eq!(read.count, 5);
        assert_eq!(read.tags, vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn test_parse_line_rejects_short_or_non_numeric() {
        assert!(parse_line("chr1\t100\tCC").is_none());
        assert!(parse_line("chr1\tabc\tCC\t1").is_none());
        assert!(parse_line("chr1\t1\tCC\tx").is_none());
    }

    #[test]
    fn test_parse_line_rejects_read_ending_past_u64() {
        assert!(parse_line("chr1\t18446744073709551615\t.C\t1").is_none());
        assert!(parse_line("chr1\t18446744073709551614\tC\t1").is_some());
    }

    #[test]
    fn test_overflowing_start_is_malformed() {
        let mut diagnostics = Diagnostics::new();
        let reads = RecordParser::new("test").parse(
            ["chr1\t1\tCT\t1", "chr1\t18446744073709551615\t.C\t1"],
            &mut diagnostics,
        );
        assert_eq!(reads.len(), 1);
        assert!(matches!(
            diagnostics.warnings(),
            [Warning::MalformedRecord { .. }]
        ));
    }

    #[test]
    fn test_invalid_first_line_warns_and_continues() {
        let mut diagnostics = Diagnostics::new();
        let reads = RecordParser::new("test").parse(
            ["chr1\t1\tCGA\t1", "chr1\t2\tCT\t1"],
            &mut diagnostics,
        );
        assert_eq!(reads.len(), 2);
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics.warnings()[0],
            Warning::InvalidFirstRecord { .. }
        ));
    }

    #[test]
    fn test_only_first_line_is_validated() {
        let mut diagnostics = Diagnostics::new();
        let reads = RecordParser::new("test").parse(
            ["chr1\t1\tCT\t1", "chr1\t2\tCGA\t1"],
            &mut diagnostics,
        );
        assert_eq!(reads.len(), 2);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_empty_stream_warns() {
        let mut diagnostics = Diagnostics::new();
        let reads = RecordParser::new("chr1:1-10")
            .parse(Vec::<String>::new(), &mut diagnostics);
        assert!(reads.is_empty());
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::EmptySource {
                scope: "chr1:1-10".into()
            }]
        );
    }
}
