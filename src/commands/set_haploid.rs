//! `set-haploid`: coerce equal-allele diploid calls to haploid within a
//! region, flagging heterozygous calls as conflicts instead.

use crate::error::{GvcfError, Result};
use crate::fasta::FastaAccessor;
use crate::line_splitter::LineSplitter;
use crate::region_handler::{set_haploid, RegionHandler};
use crate::region_map::RegionMap;
use crate::vcf_record::VcfRecord;
use std::io::{BufRead, Write};

pub struct SetHaploidCommand<'a> {
    region_map: RegionMap,
    fasta: &'a dyn FastaAccessor,
    conflict_label: String,
}

impl<'a> SetHaploidCommand<'a> {
    pub fn new(region_map: RegionMap, fasta: &'a dyn FastaAccessor, conflict_label: impl Into<String>) -> Self {
        Self {
            region_map,
            fasta,
            conflict_label: conflict_label.into(),
        }
    }

    pub fn run(&self, reader: impl BufRead, mut out: impl Write) -> Result<()> {
        let handler = RegionHandler::new(&self.region_map, self.fasta);
        let mut splitter = LineSplitter::new(reader);
        let mut coerce = set_haploid(&self.conflict_label);

        while splitter.parse_line()? {
            let line = std::str::from_utf8(splitter.raw_line()).map_err(|_| GvcfError::MalformedRecord {
                line: splitter.line_number(),
                message: "line is not valid UTF-8".to_string(),
            })?;
            if line.starts_with('#') {
                writeln!(out, "{line}")?;
                continue;
            }
            let record = VcfRecord::parse(&splitter.words(), splitter.line_number())?;
            for rec in handler.process_line(record, &mut coerce) {
                writeln!(out, "{}", rec.to_line())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::InMemoryFasta;

    #[test]
    fn collapses_homozygous_call_in_region() {
        let fasta = InMemoryFasta::new();
        let map = RegionMap::from_triples(vec![("chrX".into(), 50, 200)]);
        let cmd = SetHaploidCommand::new(map, &fasta, "HAPLOID_CONFLICT");
        let input = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE\n\
             chrX\t120\t.\tT\tA\t.\tPASS\t.\tGT:PL\t0/0:0,30,255\n";
        let mut out = Vec::new();
        cmd.run(input.as_bytes(), &mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("GT:OPL\t0:0,30,255"));
    }
}
