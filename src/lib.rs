//! gvcftools: block-compression and region-editing for GATK-style gVCF.
//!
//! # Features
//!
//! - **Non-variant block compression**: collapse contiguous homozygous-ref
//!   sites into single `END`-bearing records under configurable tolerance.
//! - **Region editing**: expand blocks or coerce ploidy inside a BED region.
//! - **Multi-sample merge**: co-traverse several single-sample streams into
//!   one ALT-unified, GT-renumbered stream.
//!
//! # Example
//!
//! ```rust,no_run
//! use gvcftools::{commands::GatkToGvcfCommand, context::Context, options::BlockerOptions};
//! use std::io;
//!
//! let ctx = Context::new("gvcftools gatk-to-gvcf".into());
//! let opts = BlockerOptions::with_defaults(true);
//! let cmd = GatkToGvcfCommand::new(opts);
//! let stdin = io::stdin();
//! let stdout = io::stdout();
//! cmd.run(&ctx, stdin.lock(), stdout.lock()).unwrap();
//! ```

pub mod block;
pub mod blocker;
pub mod commands;
pub mod context;
pub mod crawler;
pub mod error;
pub mod fasta;
pub mod gatk_record;
pub mod gt;
pub mod header;
pub mod line_splitter;
pub mod maybe_int;
pub mod merger;
pub mod options;
pub mod region_handler;
pub mod region_map;
pub mod vcf_record;

pub use context::{Context, VERSION};
pub use error::{GvcfError, Result};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{
        BreakBlocksCommand, CheckReferenceCommand, ExtractVariantsCommand, GatkToGvcfCommand,
        MergeGvcfCommand, SetHaploidCommand,
    };
    pub use crate::context::Context;
    pub use crate::error::{GvcfError, Result};
    pub use crate::fasta::{FastaAccessor, IndexedFasta};
    pub use crate::options::BlockerOptions;
    pub use crate::vcf_record::VcfRecord;
}

#[cfg(test)]
mod tests {
    use crate::blocker::RecordBlocker;
    use crate::options::BlockerOptions;
    use crate::vcf_record::VcfRecord;

    fn rec(line: &str) -> VcfRecord {
        let fields: Vec<&[u8]> = line.split('\t').map(|s| s.as_bytes()).collect();
        VcfRecord::parse(&fields, 1).unwrap()
    }

    #[test]
    fn end_to_end_blocking_workflow() {
        let opts = BlockerOptions::with_defaults(false);
        let mut rb = RecordBlocker::new(&opts);
        rb.append(rec("chr1\t100\t.\tA\t.\t50\tPASS\t.\tGT:DP:GQ\t0/0:30:40"), 1).unwrap();
        rb.append(rec("chr1\t101\t.\tA\t.\t49\tPASS\t.\tGT:DP:GQ\t0/0:30:40"), 2).unwrap();
        let out = rb.finish().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get_info("END"), Some("101"));
    }
}
