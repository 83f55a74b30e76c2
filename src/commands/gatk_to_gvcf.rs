//! `gatk-to-gvcf`: apply the standard filter set and compress non-variant
//! blocks.

use crate::blocker::RecordBlocker;
use crate::context::Context;
use crate::error::{GvcfError, Result};
use crate::header::HeaderHandler;
use crate::line_splitter::LineSplitter;
use crate::options::BlockerOptions;
use crate::vcf_record::VcfRecord;
use log::debug;
use std::io::{BufRead, Write};

pub struct GatkToGvcfCommand {
    opts: BlockerOptions,
}

impl GatkToGvcfCommand {
    pub fn new(opts: BlockerOptions) -> Self {
        Self { opts }
    }

    pub fn run(&self, ctx: &Context, reader: impl BufRead, mut out: impl Write) -> Result<()> {
        let mut header = HeaderHandler::new(ctx, &self.opts);
        let mut splitter = LineSplitter::new(reader);
        let mut blocker = RecordBlocker::new(&self.opts);
        let mut n_records = 0usize;
        let mut n_out = 0usize;

        while splitter.parse_line()? {
            if header.is_valid() {
                let line = utf8_line(splitter.raw_line(), splitter.line_number())?;
                if header.process_line(line, &mut out)? {
                    continue;
                }
            }
            let fields = splitter.words();
            let record = VcfRecord::parse(&fields, splitter.line_number())?;
            n_records += 1;
            for rec in blocker.append(record, splitter.line_number())? {
                writeln!(out, "{}", rec.to_line())?;
                n_out += 1;
            }
        }
        for rec in blocker.finish()? {
            writeln!(out, "{}", rec.to_line())?;
            n_out += 1;
        }
        debug!("gatk-to-gvcf: {n_records} input records, {n_out} output records");
        Ok(())
    }
}

fn utf8_line(bytes: &[u8], line: usize) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| GvcfError::MalformedRecord {
        line,
        message: "line is not valid UTF-8".to_string(),
    })
}
