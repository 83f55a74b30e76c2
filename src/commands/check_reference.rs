//! `check-reference`: a diagnostic pass-through that flags REF/FASTA
//! mismatches without altering or rejecting the stream.

use crate::error::{GvcfError, Result};
use crate::fasta::FastaAccessor;
use crate::line_splitter::LineSplitter;
use crate::vcf_record::VcfRecord;
use log::warn;
use std::io::{BufRead, Write};

pub struct CheckReferenceCommand<'a> {
    fasta: &'a dyn FastaAccessor,
}

impl<'a> CheckReferenceCommand<'a> {
    pub fn new(fasta: &'a dyn FastaAccessor) -> Self {
        Self { fasta }
    }

    pub fn run(&self, reader: impl BufRead, mut out: impl Write) -> Result<()> {
        let mut splitter = LineSplitter::new(reader);
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
            self.check(&record);
            writeln!(out, "{}", record.to_line())?;
        }
        Ok(())
    }

    fn check(&self, record: &VcfRecord) {
        match record.get_info("END").and_then(|v| v.parse::<u64>().ok()) {
            Some(end) if end > record.pos => {
                // Non-variant block: one REF base stands for the whole range.
                let expected = record.reference.as_bytes().first().copied().unwrap_or(b'N');
                for pos in record.pos..=end {
                    self.check_one(&record.chrom, pos, expected);
                }
            }
            _ => {
                for (offset, expected) in record.reference.bytes().enumerate() {
                    self.check_one(&record.chrom, record.pos + offset as u64, expected);
                }
            }
        }
    }

    fn check_one(&self, chrom: &str, pos: u64, expected: u8) {
        let actual = self.fasta.base_at(chrom, pos);
        if actual.to_ascii_uppercase() != expected.to_ascii_uppercase() {
            warn!(
                "reference mismatch at {}:{}: record has '{}', FASTA has '{}'",
                chrom, pos, expected as char, actual as char
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::InMemoryFasta;

    fn parse(line: &str) -> VcfRecord {
        let fields: Vec<&[u8]> = line.split('\t').map(|s| s.as_bytes()).collect();
        VcfRecord::parse(&fields, 1).unwrap()
    }

    #[test]
    fn passes_through_unmodified_on_mismatch() {
        let fasta = InMemoryFasta::new().with_sequence("chr1", "CCCC");
        let cmd = CheckReferenceCommand::new(&fasta);
        let input = "chr1\t1\t.\tA\t.\t.\tPASS\t.\tGT\t0/0\n";
        let mut out = Vec::new();
        cmd.run(input.as_bytes(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "chr1\t1\t.\tA\t.\t.\tPASS\t.\tGT\t0/0\n");
    }

    #[test]
    fn checks_every_position_in_a_block() {
        let fasta = InMemoryFasta::new().with_sequence("chr1", "AAAA");
        let cmd = CheckReferenceCommand::new(&fasta);
        let r = parse("chr1\t1\t.\tA\t.\t.\tPASS\tEND=4\tGT\t0/0");
        cmd.check(&r);
    }
}
