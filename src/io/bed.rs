//! Bed files annotated with site ranges.
//!
//! Rows need at least five columns; columns 4 and 5 hold the half-open site
//! range `[startCpG, endCpG)` of the block. Further columns are ignored and
//! their number may vary between rows. Rows whose site columns are `NA` or
//! empty carry no sites.

use std::io::Read as IoRead;
use std::path::{
    Path,
    PathBuf,
};

use itertools::Itertools;
use log::info;

use crate::data_structs::BedInterval;
use crate::diagnostics::{
    Diagnostics,
    Warning,
};
use crate::error::{
    Result,
    ViewError,
};
use crate::io::compression::open_text;

/// Reads all rows of a bed file.
pub fn read_bed<P: AsRef<Path>>(path: P) -> Result<Vec<BedInterval>> {
    let path = path.as_ref();
    let mut content = String::new();
    open_text(path)?.read_to_string(&mut content)?;
    let rows = parse_bed(&content, path)?;
    info!("Read {} regions from {}", rows.len(), path.display());
    Ok(rows)
}

fn is_header(line: &str) -> bool {
    line.trim().is_empty()
        || line.starts_with('#')
        || line.starts_with("track")
        || line.starts_with("browser")
}

fn parse_site(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

/// Parses bed text. `path` is only used in error messages.
pub fn parse_bed(
    content: &str,
    path: &Path,
) -> Result<Vec<BedInterval>> {
    let body = content
        .lines()
        .filter(|line| !is_header(line))
        .join("\n");
    let invalid = |reason: String| {
        ViewError::InvalidBed {
            path: PathBuf::from(path),
            reason,
        }
    };

    let mut reader = csv::ReaderBuilder::default()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(body.as_bytes());
    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| invalid(format!("row {}: {}", idx + 1, e)))?;
        if record.len() < 5 {
            return Err(invalid(format!(
                "row {} has less than 5 columns (chrom, start, end, startCpG, endCpG)",
                idx + 1
            )));
        }
        let position = |col: usize| {
            record[col].trim().parse::<u64>().map_err(|_| {
                invalid(format!(
                    "row {}: invalid coordinate '{}'",
                    idx + 1,
                    &record[col]
                ))
            })
        };
        let (start, end) = (position(1)?, position(2)?);
        let sites = parse_site(&record[3]).zip(parse_site(&record[4]));
        rows.push(BedInterval::new(&record[0], start, end, sites));
    }
    Ok(rows)
}

/// Reports every pair of overlapping rows (after sorting by genomic
/// position) to `diagnostics`. Returns whether the rows are disjoint.
pub fn check_disjoint(
    rows: &[BedInterval],
    diagnostics: &mut Diagnostics,
) -> bool {
    let mut disjoint = true;
    let sorted = rows
        .iter()
        .sorted_by(|a, b| {
            a.chrom
                .cmp(&b.chrom)
                .then(a.genomic_start.cmp(&b.genomic_start))
        })
        .collect_vec();

    let mut furthest: Option<&BedInterval> = None;
    for row in sorted {
        if let Some(prev) = furthest.filter(|prev| prev.overlaps(row)) {
            disjoint = false;
            diagnostics.push(Warning::OverlappingBedRegions {
                first:  prev.label(),
                second: row.label(),
            });
        }
        let extends = furthest
            .map(|prev| prev.chrom != row.chrom || row.genomic_end > prev.genomic_end)
            .unwrap_or(true);
        if extends {
            furthest = Some(row);
        }
    }
    disjoint
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_bed_rows() {
        let content = "track name=x\n#comment\nchr1\t0\t100\t1\t5\nchr1\t200\t300\tNA\tNA\n";
        let rows = parse_bed(content, Path::new("x.bed")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], BedInterval::new("chr1", 0, 100, Some((1, 5))));
        assert_eq!(rows[1].sites, None);
    }

    #[test]
    fn test_parse_bed_ragged_columns() {
        let content = "chr1\t0\t100\t1\t5\nchr1\t200\t300\t6\t9\tgeneA\nchr2\t0\t10\t20\t22\ta\tb\n";
        let rows = parse_bed(content, Path::new("x.bed")).unwrap();
        assert_eq!(
            rows,
            vec![
                BedInterval::new("chr1", 0, 100, Some((1, 5))),
                BedInterval::new("chr1", 200, 300, Some((6, 9))),
                BedInterval::new("chr2", 0, 10, Some((20, 22))),
            ]
        );
    }

    #[test]
    fn test_parse_bed_invalid_coordinate() {
        let content = "chr1\tzero\t100\t1\t5\n";
        assert!(matches!(
            parse_bed(content, Path::new("x.bed")),
            Err(ViewError::InvalidBed { .. })
        ));
    }

    #[test]
    fn test_parse_bed_too_few_columns() {
        let content = "chr1\t0\t100\n";
        assert!(matches!(
            parse_bed(content, Path::new("x.bed")),
            Err(ViewError::InvalidBed { .. })
        ));
    }

    #[test]
    fn test_read_bed_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chr2\t10\t20\t100\t102").unwrap();
        let rows = read_bed(file.path()).unwrap();
        assert_eq!(rows, vec![BedInterval::new("chr2", 10, 20, Some((100, 102)))]);
    }

    #[test]
    fn test_disjoint_check() {
        let mut diagnostics = Diagnostics::new();
        let rows = vec![
            BedInterval::new("chr1", 0, 10, None),
            BedInterval::new("chr1", 10, 20, None),
            BedInterval::new("chr2", 5, 20, None),
        ];
        assert!(check_disjoint(&rows, &mut diagnostics));
        assert!(diagnostics.is_empty());

        let rows = vec![
            BedInterval::new("chr1", 0, 100, None),
            BedInterval::new("chr1", 10, 20, None),
            BedInterval::new("chr1", 50, 60, None),
        ];
        assert!(!check_disjoint(&rows, &mut diagnostics));
        assert_eq!(diagnostics.len(), 2);
    }
}
