//! Crate-wide error taxonomy.
//!
//! Every fallible library function returns `Result<T, GvcfError>`. Parsing
//! and grooming never panic on malformed input; the CLI driver is the only
//! place a `GvcfError` is turned into a process exit.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GvcfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed record at line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    #[error("unexpected position order at line {line}: {message}")]
    PositionOrder { line: usize, message: String },

    #[error("malformed header: {0}")]
    BadHeader(String),

    #[error("position {pos} is out of range for {chrom}")]
    OutOfRange { chrom: String, pos: u64 },

    #[error("index missing or stale: {0}")]
    IndexMissing(String),

    #[error("failed to parse field at line {line}: {message}")]
    ParseFailure { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, GvcfError>;

impl GvcfError {
    /// Render the `ERROR: <message>` line this crate's CLI driver writes to
    /// the diagnostic stream before exiting, per the documented failure
    /// contract.
    pub fn diagnostic(&self) -> String {
        format!("ERROR: {self}")
    }
}
