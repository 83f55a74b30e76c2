//! Random-access reference base lookup.
//!
//! The FASTA backend's contract is `base_at(chrom, pos) -> base`; the rest
//! of this crate only depends on that trait. `IndexedFasta` is a minimal
//! `.fai`-backed implementation for the CLI binary; a production backend
//! (tabix/bgzf-aware) is an external collaborator out of scope here.

use crate::error::{GvcfError, Result};
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

pub trait FastaAccessor {
    /// 1-based position. Returns the uppercase base, or `N` if out of range.
    fn base_at(&self, chrom: &str, pos: u64) -> u8;
}

#[derive(Debug, Clone, Copy)]
struct FaiEntry {
    length: u64,
    offset: u64,
    line_bases: u64,
    line_width: u64,
}

/// A `samtools faidx`-indexed FASTA file, opened once and seeked into on
/// every lookup.
pub struct IndexedFasta {
    file: std::cell::RefCell<File>,
    entries: FxHashMap<String, FaiEntry>,
}

impl IndexedFasta {
    /// `fasta_path` is the `.fa`/`.fasta` file; its `.fai` sibling must
    /// already exist (built with `samtools faidx`).
    pub fn open(fasta_path: impl AsRef<Path>) -> Result<Self> {
        let fasta_path = fasta_path.as_ref();
        let fai_path = fasta_path.with_extension(format!(
            "{}.fai",
            fasta_path.extension().and_then(|e| e.to_str()).unwrap_or("fa")
        ));
        let fai_path = if fai_path.exists() {
            fai_path
        } else {
            let mut p = fasta_path.as_os_str().to_owned();
            p.push(".fai");
            p.into()
        };
        let fai = File::open(&fai_path).map_err(|_| {
            GvcfError::IndexMissing(format!("no .fai index found for {}", fasta_path.display()))
        })?;
        let mut entries = FxHashMap::default();
        for line in BufReader::new(fai).lines() {
            let line = line.map_err(GvcfError::Io)?;
            let mut cols = line.split('\t');
            let name = cols.next().ok_or_else(|| GvcfError::IndexMissing("malformed .fai line".into()))?;
            let parse = |c: Option<&str>| -> Result<u64> {
                c.and_then(|s| s.parse().ok())
                    .ok_or_else(|| GvcfError::IndexMissing("malformed .fai line".into()))
            };
            let length = parse(cols.next())?;
            let offset = parse(cols.next())?;
            let line_bases = parse(cols.next())?;
            let line_width = parse(cols.next())?;
            entries.insert(
                name.to_string(),
                FaiEntry {
                    length,
                    offset,
                    line_bases,
                    line_width,
                },
            );
        }
        let file = File::open(fasta_path).map_err(GvcfError::Io)?;
        Ok(Self {
            file: std::cell::RefCell::new(file),
            entries,
        })
    }
}

impl FastaAccessor for IndexedFasta {
    fn base_at(&self, chrom: &str, pos: u64) -> u8 {
        let Some(entry) = self.entries.get(chrom) else { return b'N' };
        if pos == 0 || pos > entry.length || entry.line_bases == 0 {
            return b'N';
        }
        let zero_based = pos - 1;
        let line_no = zero_based / entry.line_bases;
        let line_off = zero_based % entry.line_bases;
        let file_pos = entry.offset + line_no * entry.line_width + line_off;
        let mut file = self.file.borrow_mut();
        if file.seek(SeekFrom::Start(file_pos)).is_err() {
            return b'N';
        }
        let mut buf = [0u8; 1];
        if file.read_exact(&mut buf).is_err() {
            return b'N';
        }
        buf[0].to_ascii_uppercase()
    }
}

/// An in-memory accessor useful for tests and small fixtures.
pub struct InMemoryFasta {
    sequences: rustc_hash::FxHashMap<String, Vec<u8>>,
}

impl InMemoryFasta {
    pub fn new() -> Self {
        Self {
            sequences: rustc_hash::FxHashMap::default(),
        }
    }

    pub fn with_sequence(mut self, chrom: &str, seq: &str) -> Self {
        self.sequences.insert(chrom.to_string(), seq.as_bytes().to_vec());
        self
    }
}

impl Default for InMemoryFasta {
    fn default() -> Self {
        Self::new()
    }
}

impl FastaAccessor for InMemoryFasta {
    fn base_at(&self, chrom: &str, pos: u64) -> u8 {
        self.sequences
            .get(chrom)
            .and_then(|seq| seq.get((pos - 1) as usize))
            .copied()
            .unwrap_or(b'N')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_base_at_1_based_position() {
        let fa = InMemoryFasta::new().with_sequence("chr1", "AAGT");
        assert_eq!(fa.base_at("chr1", 1), b'A');
        assert_eq!(fa.base_at("chr1", 3), b'G');
    }

    #[test]
    fn returns_n_out_of_range() {
        let fa = InMemoryFasta::new().with_sequence("chr1", "AC");
        assert_eq!(fa.base_at("chr1", 99), b'N');
        assert_eq!(fa.base_at("chr2", 1), b'N');
    }

    #[test]
    fn indexed_fasta_reads_wrapped_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let fa_path = dir.path().join("ref.fa");
        std::fs::write(&fa_path, ">chr1\nAAGT\nCCCC\n>chr2\nTTTT\n").unwrap();
        // ">chr1\n" is 6 bytes; chr1 sequence starts right after it.
        let fai_path = dir.path().join("ref.fa.fai");
        std::fs::write(&fai_path, "chr1\t8\t6\t4\t5\nchr2\t4\t21\t4\t5\n").unwrap();
        let fa = IndexedFasta::open(&fa_path).unwrap();
        assert_eq!(fa.base_at("chr1", 1), b'A');
        assert_eq!(fa.base_at("chr1", 5), b'C');
        assert_eq!(fa.base_at("chr1", 8), b'C');
        assert_eq!(fa.base_at("chr2", 1), b'T');
        assert_eq!(fa.base_at("chr1", 99), b'N');
    }
}
