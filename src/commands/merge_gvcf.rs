//! `merge-gvcf`: co-traverse several single-sample gVCF streams and emit a
//! single multi-sample stream.

use crate::crawler::SiteCrawler;
use crate::error::Result;
use crate::fasta::FastaAccessor;
use crate::merger::Merger;
use std::io::{BufRead, Write};

pub struct MergeGvcfCommand;

impl MergeGvcfCommand {
    /// `readers` are the already-open, header-stripped data streams for
    /// each sample, in the order their columns should appear in the output.
    pub fn run<'a, R: BufRead>(
        &self,
        readers: Vec<R>,
        fasta: &'a dyn FastaAccessor,
        murdock: bool,
        mut out: impl Write,
    ) -> Result<()> {
        let crawlers: Vec<SiteCrawler<'a, R>> = readers
            .into_iter()
            .map(|r| SiteCrawler::new(r, fasta, murdock))
            .collect();
        let mut merger = Merger::new(crawlers);
        while let Some(rec) = merger.next_record()? {
            writeln!(out, "{}", rec.to_line())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::InMemoryFasta;

    #[test]
    fn merges_two_sample_streams_into_one() {
        let fasta = InMemoryFasta::new();
        let a = "chr1\t100\t.\tA\tC\t.\tPASS\t.\tGT\t0/1\n".as_bytes();
        let b = "chr1\t100\t.\tA\tG\t.\tPASS\t.\tGT\t0/1\n".as_bytes();
        let cmd = MergeGvcfCommand;
        let mut out = Vec::new();
        cmd.run(vec![a, b], &fasta, false, &mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert_eq!(s.trim_end(), "chr1\t100\t.\tA\tC,G\t.\tPASS\t.\tGT\t0/1\t0/2");
    }
}
