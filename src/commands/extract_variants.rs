//! `extract-variants`: copy the header unmodified, then keep only records
//! with at least one ALT allele.

use crate::error::{GvcfError, Result};
use crate::line_splitter::LineSplitter;
use crate::vcf_record::VcfRecord;
use std::io::{BufRead, Write};

pub struct ExtractVariantsCommand;

impl ExtractVariantsCommand {
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
            if record.is_variant() {
                writeln!(out, "{}", record.to_line())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_nonvariant_records() {
        let input = "##fileformat=VCFv4.1\n\
             chr1\t100\t.\tA\t.\t.\tPASS\t.\tGT\t0/0\n\
             chr1\t101\t.\tA\tC\t50\tPASS\t.\tGT\t0/1\n";
        let cmd = ExtractVariantsCommand;
        let mut out = Vec::new();
        cmd.run(input.as_bytes(), &mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("##fileformat"));
        assert!(!s.contains("chr1\t100\t"));
        assert!(s.contains("chr1\t101"));
    }
}
