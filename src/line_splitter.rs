//! Streaming, in-place tab-field splitter.
//!
//! Mirrors the C++ original's `istream_line_splitter`: one growing line
//! buffer is reused across calls, and fields are exposed as byte-slice
//! views into that buffer rather than allocated per record.

use memchr::memchr;
use std::io::{self, BufRead};

/// Minimum number of tab-delimited fields this splitter can expose per line.
pub const MAX_WORDS: usize = 64;

const INITIAL_BUFFER: usize = 4 * 1024;

/// Pull-based line reader that tab-splits each line in place.
pub struct LineSplitter<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
    len: usize,
    field_starts: [usize; MAX_WORDS],
    field_ends: [usize; MAX_WORDS],
    n_fields: usize,
    line_no: usize,
    saw_any_bytes: bool,
}

impl<R: BufRead> LineSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: vec![0u8; INITIAL_BUFFER],
            len: 0,
            field_starts: [0; MAX_WORDS],
            field_ends: [0; MAX_WORDS],
            n_fields: 0,
            line_no: 0,
            saw_any_bytes: false,
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_no
    }

    /// Read and tab-split the next line. Returns `false` at EOF.
    pub fn parse_line(&mut self) -> io::Result<bool> {
        self.len = 0;
        self.saw_any_bytes = false;
        let mut found_newline = false;
        loop {
            let (found, consumed) = {
                let avail = self.reader.fill_buf()?;
                if avail.is_empty() {
                    break;
                }
                match memchr(b'\n', avail) {
                    Some(idx) => {
                        self.push(&avail[..idx]);
                        (true, idx + 1)
                    }
                    None => {
                        self.push(avail);
                        (false, avail.len())
                    }
                }
            };
            self.reader.consume(consumed);
            if found {
                found_newline = true;
                break;
            }
            if consumed == 0 {
                break;
            }
        }

        if !found_newline && !self.saw_any_bytes {
            return Ok(false);
        }

        self.line_no += 1;
        self.split_fields();
        Ok(true)
    }

    fn push(&mut self, bytes: &[u8]) {
        self.saw_any_bytes = true;
        let needed = self.len + bytes.len();
        if needed > self.buf.len() {
            self.buf.resize(needed.max(self.buf.len() * 2), 0);
        }
        self.buf[self.len..needed].copy_from_slice(bytes);
        self.len = needed;
    }

    fn split_fields(&mut self) {
        self.n_fields = 0;
        let mut start = 0usize;
        let line = &self.buf[..self.len];
        loop {
            let rel = memchr(b'\t', &line[start..]);
            match rel {
                Some(off) => {
                    let end = start + off;
                    if self.n_fields < MAX_WORDS {
                        self.field_starts[self.n_fields] = start;
                        self.field_ends[self.n_fields] = end;
                        self.n_fields += 1;
                    }
                    start = end + 1;
                }
                None => {
                    if self.n_fields < MAX_WORDS {
                        self.field_starts[self.n_fields] = start;
                        self.field_ends[self.n_fields] = self.len;
                        self.n_fields += 1;
                    }
                    break;
                }
            }
        }
    }

    pub fn n_words(&self) -> usize {
        self.n_fields
    }

    pub fn word(&self, i: usize) -> &[u8] {
        &self.buf[self.field_starts[i]..self.field_ends[i]]
    }

    pub fn words(&self) -> Vec<&[u8]> {
        (0..self.n_fields).map(|i| self.word(i)).collect()
    }

    pub fn raw_line(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}
