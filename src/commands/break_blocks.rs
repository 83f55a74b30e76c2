//! `break-blocks`: expand non-variant blocks to one record per base inside
//! a region, leaving everything outside the region compressed.

use crate::error::{GvcfError, Result};
use crate::fasta::FastaAccessor;
use crate::line_splitter::LineSplitter;
use crate::region_handler::{break_blocks, RegionHandler};
use crate::region_map::RegionMap;
use crate::vcf_record::VcfRecord;
use std::io::{BufRead, Write};

pub struct BreakBlocksCommand<'a> {
    region_map: RegionMap,
    fasta: &'a dyn FastaAccessor,
}

impl<'a> BreakBlocksCommand<'a> {
    pub fn new(region_map: RegionMap, fasta: &'a dyn FastaAccessor) -> Self {
        Self { region_map, fasta }
    }

    pub fn run(&self, reader: impl BufRead, mut out: impl Write) -> Result<()> {
        let handler = RegionHandler::new(&self.region_map, self.fasta);
        let mut splitter = LineSplitter::new(reader);
        let mut expand = break_blocks(self.fasta);

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
            for rec in handler.process_line(record, &mut expand) {
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
    fn expands_in_region_block() {
        let fasta = InMemoryFasta::new().with_sequence("chr1", "AAGTCCCC");
        let map = RegionMap::from_triples(vec![("chr1".into(), 101, 101)]);
        let cmd = BreakBlocksCommand::new(map, &fasta);
        let input = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE\n\
             chr1\t100\t.\tA\t.\t.\tPASS\tEND=103\tGT\t0/0\n";
        let mut out = Vec::new();
        cmd.run(input.as_bytes(), &mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert_eq!(s.lines().count(), 4);
    }
}
