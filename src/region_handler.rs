//! Region-restricted record slicer.
//!
//! Walks a record against a `RegionMap`, invoking a caller-supplied
//! `process_block` callback once per in/out-of-region sub-range. The
//! callback is an injected function value (per the capability-injection
//! design note) rather than a trait-object hierarchy: `break_blocks` and
//! `set_haploid` below are its two concrete shapes.

use crate::fasta::FastaAccessor;
use crate::gt::parse_gt;
use crate::region_map::RegionMap;
use crate::vcf_record::VcfRecord;

pub struct RegionHandler<'a> {
    region_map: &'a RegionMap,
    fasta: &'a dyn FastaAccessor,
}

impl<'a> RegionHandler<'a> {
    pub fn new(region_map: &'a RegionMap, fasta: &'a dyn FastaAccessor) -> Self {
        Self { region_map, fasta }
    }

    pub fn process_line(
        &self,
        mut rec: VcfRecord,
        mut process_block: impl FnMut(bool, u64, &mut VcfRecord, &mut Vec<VcfRecord>),
    ) -> Vec<VcfRecord> {
        let mut out = Vec::new();
        let begin = rec.pos;
        let end = end_pos(&rec);

        if !self.region_map.has_chrom(&rec.chrom) {
            out.push(rec);
            return out;
        }
        let mut cursor = self.region_map.cursor(&rec.chrom);
        if !cursor.overlaps(begin, end) {
            out.push(rec);
            return out;
        }

        let mut cur_begin = begin;
        loop {
            let (in_region, slice_end, has_more) = cursor.next_slice(cur_begin, end);
            if has_more {
                let mut clone = rec.clone();
                process_block(in_region, slice_end, &mut clone, &mut out);
                let next_begin = slice_end + 1;
                rec.pos = next_begin;
                rec.reference = (self.fasta.base_at(&rec.chrom, next_begin) as char).to_string();
                cur_begin = next_begin;
            } else {
                process_block(in_region, slice_end, &mut rec, &mut out);
                break;
            }
        }
        out
    }
}

fn end_pos(rec: &VcfRecord) -> u64 {
    rec.get_info("END").and_then(|v| v.parse().ok()).unwrap_or(rec.pos)
}

fn set_end(rec: &mut VcfRecord, slice_end: u64) {
    if slice_end > rec.pos {
        rec.set_info("END", &slice_end.to_string());
    } else {
        rec.delete_info("END");
    }
}

/// Expand in-region blocks to one record per base; out-of-region slices
/// pass through with `END` adjusted to the slice boundary.
pub fn break_blocks(
    fasta: &dyn FastaAccessor,
) -> impl FnMut(bool, u64, &mut VcfRecord, &mut Vec<VcfRecord>) + '_ {
    move |in_region, slice_end, rec, out| {
        if !in_region {
            set_end(rec, slice_end);
            out.push(rec.clone());
            return;
        }
        rec.delete_info("END");
        out.push(rec.clone());
        let mut pos = rec.pos;
        while slice_end > pos {
            pos += 1;
            let mut next = rec.clone();
            next.pos = pos;
            next.reference = (fasta.base_at(&rec.chrom, pos) as char).to_string();
            out.push(next);
        }
    }
}

/// Coerce equal-allele diploid calls to haploid within a region; flag
/// heterozygous calls as `HAPLOID_CONFLICT` instead.
pub fn set_haploid(haploid_conflict_label: &str) -> impl FnMut(bool, u64, &mut VcfRecord, &mut Vec<VcfRecord>) + '_ {
    move |in_region, slice_end, rec, out| {
        set_end(rec, slice_end);
        if in_region {
            if let Some(gt) = rec.get_sample("GT").map(|s| s.to_string()) {
                let gti = parse_gt(&gt);
                if gti.len() == 2 {
                    if gti[0] == gti[1] {
                        rec.rename_sample_key("PL", "OPL");
                        rec.set_sample("GT", &gti[0].to_string());
                    } else {
                        rec.append_filter(haploid_conflict_label);
                    }
                }
            }
        }
        out.push(rec.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::InMemoryFasta;
    use crate::region_map::RegionMap;

    fn rec(line: &str) -> VcfRecord {
        let fields: Vec<&[u8]> = line.split('\t').map(|s| s.as_bytes()).collect();
        VcfRecord::parse(&fields, 1).unwrap()
    }

    #[test]
    fn break_blocks_expands_in_region_slice_per_base() {
        let map = RegionMap::from_triples(vec![("chr1".into(), 101, 101)]);
        let fasta = InMemoryFasta::new().with_sequence("chr1", "AAGTCCCC");
        let handler = RegionHandler::new(&map, &fasta);
        let r = rec("chr1\t100\t.\tA\t.\t.\tPASS\tEND=103\tGT\t0/0");
        let out = handler.process_line(r, break_blocks(&fasta));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].pos, 100);
        assert_eq!(out[0].get_info("END"), Some("100"));
        assert_eq!(out[1].pos, 101);
        assert_eq!(out[1].get_info("END"), None);
        assert_eq!(out[2].pos, 102);
        assert_eq!(out[2].get_info("END"), Some("103"));
    }

    #[test]
    fn set_haploid_collapses_equal_alleles_in_region() {
        let map = RegionMap::from_triples(vec![("chrX".into(), 50, 200)]);
        let fasta = InMemoryFasta::new();
        let handler = RegionHandler::new(&map, &fasta);
        let r = rec("chrX\t120\t.\tT\tA\t.\tPASS\t.\tGT:PL\t0/0:0,30,255");
        let out = handler.process_line(r, set_haploid("HAPLOID_CONFLICT"));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get_sample("GT"), Some("0"));
        assert_eq!(out[0].get_sample("OPL"), Some("0,30,255"));
        assert_eq!(out[0].get_sample("PL"), None);
    }

    #[test]
    fn set_haploid_flags_heterozygous_conflict() {
        let map = RegionMap::from_triples(vec![("chrX".into(), 50, 200)]);
        let fasta = InMemoryFasta::new();
        let handler = RegionHandler::new(&map, &fasta);
        let r = rec("chrX\t120\t.\tT\tA\t.\tPASS\t.\tGT\t0/1");
        let out = handler.process_line(r, set_haploid("HAPLOID_CONFLICT"));
        assert_eq!(out.len(), 1);
        assert!(out[0].filter.iter().any(|f| f == "HAPLOID_CONFLICT"));
    }

    #[test]
    fn out_of_chrom_record_passes_through_verbatim() {
        let map = RegionMap::from_triples(vec![("chr1".into(), 1, 10)]);
        let fasta = InMemoryFasta::new();
        let handler = RegionHandler::new(&map, &fasta);
        let r = rec("chr2\t5\t.\tA\t.\t.\tPASS\t.\tGT\t0/0");
        let out = handler.process_line(r, break_blocks(&fasta));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].chrom, "chr2");
    }
}
