//! Demand-driven cursor over one gVCF stream.
//!
//! Produces a lazy, single-pass sequence of positions, expanding
//! compressed non-variant blocks one base at a time and surfacing indels
//! as single unexpanded positions (long indels are skipped over rather
//! than walked, matching the upstream crawler's design).

use crate::error::{GvcfError, Result};
use crate::fasta::FastaAccessor;
use crate::gt::parse_gt;
use crate::vcf_record::VcfRecord;
use std::io::BufRead;

/// `(pos, is_indel)` ordered so a non-indel sorts before an indel at the
/// same position (`false < true` on the second field).
pub type VcfPos = (u64, bool);

#[derive(Debug, Clone)]
pub struct SitePosition {
    pub chrom: String,
    pub pos: u64,
    pub is_indel: bool,
    pub is_call: bool,
    /// Per-haplotype allele strings (REF/ALT resolved from GT), or empty
    /// if the locus carried no sample.
    pub alleles: Vec<String>,
    pub n_total: usize,
    pub ref_allele: String,
}

impl SitePosition {
    pub fn vpos(&self) -> VcfPos {
        (self.pos, self.is_indel)
    }
}

struct BlockWalk {
    chrom: String,
    end: u64,
    gt: Vec<i64>,
    filter_pass: bool,
}

pub struct SiteCrawler<'a, R: BufRead> {
    lines: std::io::Lines<R>,
    fasta: &'a dyn FastaAccessor,
    murdock: bool,
    line_no: usize,
    pos: u64,
    chrom: String,
    block: Option<BlockWalk>,
    skip_range: Option<(u64, u64)>,
    last_vpos: Option<VcfPos>,
    exhausted: bool,
}

impl<'a, R: BufRead> SiteCrawler<'a, R> {
    pub fn new(reader: R, fasta: &'a dyn FastaAccessor, murdock: bool) -> Self {
        Self {
            lines: reader.lines(),
            fasta,
            murdock,
            line_no: 0,
            pos: 0,
            chrom: String::new(),
            block: None,
            skip_range: None,
            last_vpos: None,
            exhausted: false,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Advance to and return the next position, or `None` at end of
    /// stream.
    pub fn update(&mut self) -> Result<Option<SitePosition>> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            if let Some(block) = &self.block {
                if self.pos < block.end {
                    self.pos += 1;
                    let chrom = block.chrom.clone();
                    let allele = (self.fasta.base_at(&chrom, self.pos) as char).to_string();
                    let gt = block.gt.clone();
                    let filter_pass = block.filter_pass;
                    let alleles: Vec<String> = gt
                        .iter()
                        .map(|&g| if g == 0 { allele.clone() } else { "N".to_string() })
                        .collect();
                    let is_call = filter_pass && is_standard_call(&gt) && !self.in_skip_range(self.pos);
                    return Ok(Some(self.emit(chrom, false, is_call, alleles, gt.len(), allele.clone())));
                } else {
                    self.block = None;
                }
            }

            match self.next_line()? {
                None => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Some(raw) => {
                    let fields: Vec<&[u8]> = raw.split('\t').map(|s| s.as_bytes()).collect();
                    let rec = VcfRecord::parse(&fields, self.line_no)?;
                    let vpos = (rec.pos, rec.is_indel());
                    if let Some(last) = self.last_vpos {
                        if vpos <= last {
                            if self.murdock {
                                continue;
                            }
                            return Err(GvcfError::PositionOrder {
                                line: self.line_no,
                                message: format!(
                                    "position {:?} does not follow previous position {:?}",
                                    vpos, last
                                ),
                            });
                        }
                    }
                    self.last_vpos = Some(vpos);
                    self.chrom = rec.chrom.clone();
                    self.pos = rec.pos;

                    let filter_pass = rec.filter.len() == 1 && rec.filter[0] == "PASS";
                    let gt_str = rec.get_sample("GT").unwrap_or(".").to_string();
                    let gt = parse_gt(&gt_str);

                    if rec.is_indel() {
                        let start = rec.pos + 1;
                        let end = rec.pos + rec.reference.len() as u64 - 1;
                        self.skip_range = Some((start, end));
                        let alleles = resolve_indel_alleles(&rec, &gt);
                        let n_total = gt.len();
                        let is_call = filter_pass && is_standard_call(&gt);
                        return Ok(Some(self.emit(rec.chrom.clone(), true, is_call, alleles, n_total, rec.reference.clone())));
                    }

                    let end = rec.get_info("END").and_then(|v| v.parse().ok()).unwrap_or(rec.pos);
                    if end > rec.pos {
                        self.block = Some(BlockWalk {
                            chrom: rec.chrom.clone(),
                            end,
                            gt: gt.clone(),
                            filter_pass,
                        });
                    }
                    let alleles = resolve_site_alleles(&rec, &gt);
                    let n_total = gt.len();
                    let is_call = filter_pass && is_standard_call(&gt) && !self.in_skip_range(rec.pos);
                    return Ok(Some(self.emit(rec.chrom.clone(), false, is_call, alleles, n_total, rec.reference.clone())));
                }
            }
        }
    }

    fn emit(
        &self,
        chrom: String,
        is_indel: bool,
        is_call: bool,
        alleles: Vec<String>,
        n_total: usize,
        ref_allele: String,
    ) -> SitePosition {
        SitePosition {
            chrom,
            pos: self.pos,
            is_indel,
            is_call,
            alleles,
            n_total,
            ref_allele,
        }
    }

    fn in_skip_range(&self, pos: u64) -> bool {
        matches!(self.skip_range, Some((s, e)) if pos >= s && pos <= e)
    }

    fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next() {
            None => Ok(None),
            Some(line) => {
                self.line_no += 1;
                Ok(Some(line.map_err(GvcfError::Io)?))
            }
        }
    }
}

fn is_standard_call(gt: &[i64]) -> bool {
    match gt.len() {
        1 => gt[0] >= 0,
        2 => gt[0] >= 0 && gt[1] >= 0,
        _ => false,
    }
}

fn resolve_site_alleles(rec: &VcfRecord, gt: &[i64]) -> Vec<String> {
    gt.iter()
        .map(|&g| {
            if g < 0 {
                "N".to_string()
            } else if g == 0 {
                rec.reference.clone()
            } else {
                rec.alt.get((g - 1) as usize).cloned().unwrap_or_else(|| "N".to_string())
            }
        })
        .collect()
}

fn resolve_indel_alleles(rec: &VcfRecord, gt: &[i64]) -> Vec<String> {
    gt.iter()
        .map(|&g| {
            if g < 0 {
                "X".to_string()
            } else if g == 0 {
                rec.reference.clone()
            } else {
                rec.alt.get((g - 1) as usize).cloned().unwrap_or_else(|| "X".to_string())
            }
        })
        .collect()
}
