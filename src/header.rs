//! Streaming VCF header rewriter.
//!
//! Valid (still rewriting) until the `#CHROM` line is consumed, at which
//! point tool metadata and the configured FILTER/FORMAT declarations are
//! injected just before the column header line itself.

use crate::context::Context;
use crate::options::BlockerOptions;
use std::io::{self, Write};

pub struct HeaderHandler<'a> {
    ctx: &'a Context,
    opts: &'a BlockerOptions,
    valid: bool,
    seen_filter_labels: Vec<String>,
}

impl<'a> HeaderHandler<'a> {
    pub fn new(ctx: &'a Context, opts: &'a BlockerOptions) -> Self {
        Self {
            ctx,
            opts,
            valid: true,
            seen_filter_labels: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Process one header line. Returns `true` if the line (and any
    /// injected lines) were consumed as part of the header; `false` means
    /// the caller has reached the first data line and should stop calling
    /// this method.
    pub fn process_line(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        if !self.valid {
            return Ok(false);
        }
        if self.ctx.is_skip_header {
            if line.starts_with("#CHROM") {
                self.valid = false;
            }
            return Ok(true);
        }
        if !line.starts_with('#') {
            self.valid = false;
            return Ok(false);
        }
        if line.starts_with("#CHROM") {
            self.write_injected(out)?;
            writeln!(out, "{line}")?;
            self.valid = false;
            return Ok(true);
        }

        if self.is_skippable(line) {
            return Ok(true);
        }
        self.note_existing_filter(line);
        writeln!(out, "{line}")?;
        Ok(true)
    }

    fn is_skippable(&self, line: &str) -> bool {
        const DROP_PREFIXES: [&str; 3] = ["##INFO=<ID=AC", "##INFO=<ID=AF", "##INFO=<ID=AN"];
        DROP_PREFIXES.iter().any(|p| line.starts_with(p))
    }

    fn note_existing_filter(&mut self, line: &str) {
        if let Some(rest) = line.strip_prefix("##FILTER=<ID=") {
            if let Some(id) = rest.split(',').next() {
                self.seen_filter_labels.push(id.to_string());
            }
        }
    }

    fn already_declared(&self, label: &str) -> bool {
        self.seen_filter_labels.iter().any(|l| l == label)
    }

    fn write_injected(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "##gvcftools_version=\"{}\"", self.ctx.version)?;
        writeln!(out, "##gvcftools_cmdline=\"{}\"", self.ctx.cmdline)?;
        writeln!(out, "##INFO=<ID=END,Number=1,Type=Integer,Description=\"Last reference position in the non-variant block\">")?;
        writeln!(
            out,
            "##INFO=<ID={},Number=0,Type=Flag,Description=\"Non-variant block summary uses the minimum of multiple observations (tolerance: y <= max(x+{},x*(1+{})))\">",
            self.opts.block.block_label, self.opts.block.abs_tol, self.opts.block.frac_tol
        )?;
        writeln!(out, "##FORMAT=<ID=MQ,Number=1,Type=Integer,Description=\"RMS mapping quality\">")?;
        writeln!(out, "##FORMAT=<ID=GQX,Number=1,Type=Integer,Description=\"min(QUAL,GQ)\">")?;
        if !self.already_declared(&self.opts.indel_conflict_label) {
            writeln!(
                out,
                "##FILTER=<ID={},Description=\"Locus is in the region of two or more conflicting indel calls\">",
                self.opts.indel_conflict_label
            )?;
        }
        if !self.already_declared(&self.opts.site_conflict_label) {
            writeln!(
                out,
                "##FILTER=<ID={},Description=\"Site is in conflict with an overlapping indel call\">",
                self.opts.site_conflict_label
            )?;
        }
        if self.opts.has_chrom_depth_filter() && !self.already_declared(&self.opts.max_chrom_depth_filter_tag) {
            let mut ryu_buf = ryu::Buffer::new();
            writeln!(
                out,
                "##FILTER=<ID={},Description=\"Site depth exceeds {} times the chromosome's mean depth\">",
                self.opts.max_chrom_depth_filter_tag,
                ryu_buf.format(self.opts.max_chrom_depth_filter_factor)
            )?;
            let mut chroms: Vec<&String> = self.opts.chrom_depth.keys().collect();
            chroms.sort();
            for chrom in chroms {
                writeln!(out, "##MaxDepth_{}={}", chrom, ryu_buf.format(self.opts.chrom_depth[chrom]))?;
            }
        }
        let gqx_filter = BlockerOptions::gqx_filter(self.opts.min_gqx);
        if !self.already_declared(&gqx_filter.label) {
            writeln!(out, "##FILTER=<ID={},Description=\"{}\">", gqx_filter.label, gqx_filter.description())?;
        }
        for f in &self.opts.filters {
            if !self.already_declared(&f.label) {
                writeln!(out, "##FILTER=<ID={},Description=\"{}\">", f.label, f.description())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::BlockerOptions;

    #[test]
    fn drops_ac_af_an_info_lines() {
        let ctx = Context::new("test".into());
        let opts = BlockerOptions::with_defaults(false);
        let mut hh = HeaderHandler::new(&ctx, &opts);
        let mut out = Vec::new();
        hh.process_line("##fileformat=VCFv4.1", &mut out).unwrap();
        hh.process_line("##INFO=<ID=AC,Number=A,Type=Integer,Description=\"x\">", &mut out).unwrap();
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("fileformat"));
        assert!(!s.contains("ID=AC"));
    }

    #[test]
    fn injects_on_chrom_line_and_marks_invalid() {
        let ctx = Context::new("gvcftools gatk-to-gvcf".into());
        let opts = BlockerOptions::with_defaults(true);
        let mut hh = HeaderHandler::new(&ctx, &opts);
        let mut out = Vec::new();
        hh.process_line("##fileformat=VCFv4.1", &mut out).unwrap();
        hh.process_line("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE", &mut out)
            .unwrap();
        assert!(!hh.is_valid());
        let s = String::from_utf8(out).unwrap();
        assert!(s.contains("##gvcftools_version"));
        assert!(s.contains("##INFO=<ID=END"));
        assert!(s.contains("IndelConflict"));
        assert!(s.contains("LowGQX") || s.contains("GQX"));
        assert!(s.ends_with("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE\n"));
    }

    #[test]
    fn idempotent_when_filter_already_declared() {
        let ctx = Context::new("x".into());
        let opts = BlockerOptions::with_defaults(false);
        let mut hh = HeaderHandler::new(&ctx, &opts);
        let mut out = Vec::new();
        hh.process_line(
            "##FILTER=<ID=IndelConflict,Description=\"already here\">",
            &mut out,
        )
        .unwrap();
        hh.process_line("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSAMPLE", &mut out)
            .unwrap();
        let s = String::from_utf8(out).unwrap();
        assert_eq!(s.matches("ID=IndelConflict").count(), 1);
    }
}
