//! Multi-sample co-traversal merge.
//!
//! Pulls the minimum `vpos` across all open crawlers at each step and
//! emits one unified record per locus, renumbering each sample's alleles
//! against a shared ALT table built in first-seen order. Unlike
//! `VcfRecord` (one SAMPLE column, matching the single-sample gVCF the
//! rest of this crate reads), a merged locus carries one GT per input
//! stream, so the result is its own small record type rather than a
//! `VcfRecord`.

use crate::crawler::{SiteCrawler, SitePosition, VcfPos};
use crate::error::Result;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    pub chrom: String,
    pub pos: u64,
    pub reference: String,
    pub alt: Vec<String>,
    /// One GT string per input stream, in crawler order. `.` for streams
    /// that had no record at this locus.
    pub samples: Vec<String>,
}

impl MergedRecord {
    pub fn to_line(&self) -> String {
        let alt = if self.alt.is_empty() { ".".to_string() } else { self.alt.join(",") };
        let mut pos_buf = itoa::Buffer::new();
        let mut s = format!(
            "{}\t{}\t.\t{}\t{}\t.\tPASS\t.\tGT",
            self.chrom,
            pos_buf.format(self.pos),
            self.reference,
            alt
        );
        for gt in &self.samples {
            s.push('\t');
            s.push_str(gt);
        }
        s
    }
}

pub struct Merger<'a, R: BufRead> {
    crawlers: Vec<SiteCrawler<'a, R>>,
    peeked: Vec<Option<SitePosition>>,
}

impl<'a, R: BufRead> Merger<'a, R> {
    pub fn new(crawlers: Vec<SiteCrawler<'a, R>>) -> Self {
        let n = crawlers.len();
        Self {
            crawlers,
            peeked: vec![None; n],
        }
    }

    fn fill_peeks(&mut self) -> Result<()> {
        for i in 0..self.crawlers.len() {
            if self.peeked[i].is_none() && !self.crawlers[i].is_exhausted() {
                self.peeked[i] = self.crawlers[i].update()?;
            }
        }
        Ok(())
    }

    fn min_vpos(&self) -> Option<VcfPos> {
        self.peeked.iter().flatten().map(|p| p.vpos()).min()
    }

    /// Advance to and return the next merged record, or `None` once every
    /// crawler is exhausted.
    pub fn next_record(&mut self) -> Result<Option<MergedRecord>> {
        loop {
            self.fill_peeks()?;
            let min = match self.min_vpos() {
                Some(v) => v,
                None => return Ok(None),
            };

            let contributors: Vec<usize> = (0..self.peeked.len())
                .filter(|&i| self.peeked[i].as_ref().map(|p| p.vpos()) == Some(min))
                .collect();

            let chrom = self.peeked[contributors[0]].as_ref().unwrap().chrom.clone();
            let pos = min.0;
            let is_indel = min.1;

            let reference = contributors
                .iter()
                .map(|&i| self.peeked[i].as_ref().unwrap().ref_allele.clone())
                .max_by_key(|r| r.len())
                .unwrap();

            let mut alt_table: Vec<String> = Vec::new();
            let mut samples = vec![".".to_string(); self.peeked.len()];
            let mut any_nonref = false;

            for &i in &contributors {
                let site = self.peeked[i].as_ref().unwrap();
                let gt: Vec<String> = site
                    .alleles
                    .iter()
                    .map(|allele| {
                        if allele == "N" || allele == "X" {
                            ".".to_string()
                        } else if *allele == reference {
                            "0".to_string()
                        } else {
                            any_nonref = true;
                            let idx = match alt_table.iter().position(|a| a == allele) {
                                Some(idx) => idx,
                                None => {
                                    alt_table.push(allele.clone());
                                    alt_table.len() - 1
                                }
                            };
                            (idx + 1).to_string()
                        }
                    })
                    .collect();
                samples[i] = gt.join("/");
                self.peeked[i] = None;
            }

            if is_indel || any_nonref {
                return Ok(Some(MergedRecord {
                    chrom,
                    pos,
                    reference,
                    alt: alt_table,
                    samples,
                }));
            }
        }
    }
}
