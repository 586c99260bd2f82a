//! Reference site dictionary.
//!
//! The dictionary is an existing tab-separated file (optionally gzip
//! compressed) listing every assayed site: `chrom<TAB>position<TAB>site`.
//! Site indices are 1-based, consecutive and increase across chromosomes in
//! file order.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use itertools::Itertools;
use log::info;

use crate::error::{
    Result,
    ViewError,
};
use crate::io::compression::open_text;

#[derive(Debug, Clone)]
struct ChromSites {
    /// Site index of the first position.
    first_site: u64,
    /// Genomic positions (1-based), ascending.
    positions:  Vec<u64>,
}

impl ChromSites {
    fn site_range(&self) -> (u64, u64) {
        (
            self.first_site,
            self.first_site + self.positions.len() as u64,
        )
    }
}

/// In-memory index of a reference site dictionary.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    chroms: HashMap<String, ChromSites>,
    order:  Vec<String>,
}

impl ReferenceIndex {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let index = Self::from_reader(open_text(path.as_ref())?)?;
        info!(
            "Loaded reference dictionary {} ({} chromosomes)",
            path.as_ref().display(),
            index.order.len()
        );
        Ok(index)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut index = ReferenceIndex::default();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let bad_line = || {
                ViewError::InvalidReference(format!(
                    "line {}: '{}'",
                    line_no + 1,
                    line
                ))
            };
            let (chrom, pos, site) = line
                .split('\t')
                .take(3)
                .collect_tuple()
                .ok_or_else(bad_line)?;
            let pos = pos.parse::<u64>().map_err(|_| bad_line())?;
            let site = site.parse::<u64>().map_err(|_| bad_line())?;

            index.push_site(chrom, pos, site).map_err(|reason| {
                ViewError::InvalidReference(format!(
                    "line {}: {}",
                    line_no + 1,
                    reason
                ))
            })?;
        }
        Ok(index)
    }

    fn push_site(
        &mut self,
        chrom: &str,
        pos: u64,
        site: u64,
    ) -> std::result::Result<(), String> {
        if !self.chroms.contains_key(chrom) {
            self.order.push(chrom.to_owned());
            self.chroms.insert(
                chrom.to_owned(),
                ChromSites {
                    first_site: site,
                    positions:  Vec::new(),
                },
            );
        }
        let entry = self
            .chroms
            .get_mut(chrom)
            .ok_or_else(|| format!("chromosome {} missing", chrom))?;

        let expected = entry.first_site + entry.positions.len() as u64;
        if site != expected {
            return Err(format!(
                "site indices are not consecutive (expected {}, got {})",
                expected, site
            ));
        }
        if entry.positions.last().is_some_and(|last| *last >= pos) {
            return Err(format!("positions on {} are not ascending", chrom));
        }
        entry.positions.push(pos);
        Ok(())
    }

    pub fn contains(
        &self,
        chrom: &str,
    ) -> bool {
        self.chroms.contains_key(chrom)
    }

    /// Chromosomes in dictionary order.
    pub fn chroms(&self) -> &[String] {
        &self.order
    }

    /// Half-open site range of a whole chromosome.
    pub fn chrom_sites(
        &self,
        chrom: &str,
    ) -> Option<(u64, u64)> {
        self.chroms.get(chrom).map(ChromSites::site_range)
    }

    /// Half-open site range covering positions in `[start, end]`
    /// (genomic, 1-based inclusive). `None` if no site falls inside.
    pub fn sites_in(
        &self,
        chrom: &str,
        start: u64,
        end: u64,
    ) -> Option<(u64, u64)> {
        let sites = self.chroms.get(chrom)?;
        let first = sites.positions.partition_point(|p| *p < start);
        let last = sites.positions.partition_point(|p| *p <= end);
        if first >= last {
            return None;
        }
        Some((
            sites.first_site + first as u64,
            sites.first_site + last as u64,
        ))
    }

    /// Chromosome containing a site index.
    pub fn chrom_of_site(
        &self,
        site: u64,
    ) -> Option<&str> {
        self.order
            .iter()
            .find(|chrom| {
                self.chroms
                    .get(chrom.as_str())
                    .map(|s| {
                        let (start, end) = s.site_range();
                        site >= start && site < end
                    })
                    .unwrap_or(false)
            })
            .map(String::as_str)
    }

    /// Genomic span `[first position, last position + 1]` of a site range on
    /// one chromosome. Used for region labels.
    pub fn genomic_span(
        &self,
        chrom: &str,
        start_site: u64,
        end_site: u64,
    ) -> Option<(u64, u64)> {
        let sites = self.chroms.get(chrom)?;
        let first = start_site.checked_sub(sites.first_site)? as usize;
        let last = end_site.checked_sub(sites.first_site)?.checked_sub(1)? as usize;
        let start = *sites.positions.get(first)?;
        let end = *sites.positions.get(last)?;
        Some((start, end + 1))
    }
}
