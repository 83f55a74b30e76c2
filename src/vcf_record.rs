//! In-memory mutable representation of a single VCF/gVCF record.

use crate::error::{GvcfError, Result};
use std::fmt;

/// Fixed column indices of the nine mandatory VCF columns.
pub mod col {
    pub const CHROM: usize = 0;
    pub const POS: usize = 1;
    pub const ID: usize = 2;
    pub const REF: usize = 3;
    pub const ALT: usize = 4;
    pub const QUAL: usize = 5;
    pub const FILTER: usize = 6;
    pub const INFO: usize = 7;
    pub const FORMAT: usize = 8;
    pub const SAMPLE: usize = 9;
    pub const SIZE: usize = 10;
}

#[derive(Debug, Clone)]
pub struct VcfRecord {
    pub chrom: String,
    pub pos: u64,
    pub id: String,
    pub reference: String,
    pub alt: Vec<String>,
    pub qual: String,
    pub filter: Vec<String>,
    pub info: Vec<String>,
    pub format: Vec<String>,
    pub sample: Vec<String>,
}

impl VcfRecord {
    /// Parse a record from already tab-split fields (at least 8 present,
    /// `FORMAT`/`SAMPLE` optional). `line` is used only for error context.
    pub fn parse(fields: &[&[u8]], line: usize) -> Result<Self> {
        if fields.len() <= col::INFO {
            return Err(GvcfError::MalformedRecord {
                line,
                message: format!("expected at least {} fields, got {}", col::INFO + 1, fields.len()),
            });
        }
        let as_str = |i: usize| -> Result<&str> {
            std::str::from_utf8(fields[i]).map_err(|_| GvcfError::MalformedRecord {
                line,
                message: format!("field {i} is not valid UTF-8"),
            })
        };

        let chrom = as_str(col::CHROM)?.to_string();
        let pos: u64 = as_str(col::POS)?.parse().map_err(|_| GvcfError::MalformedRecord {
            line,
            message: format!("invalid POS '{}'", as_str(col::POS).unwrap_or("")),
        })?;
        let id = as_str(col::ID)?.to_string();
        let reference = as_str(col::REF)?.to_string();
        if reference.is_empty() {
            return Err(GvcfError::MalformedRecord {
                line,
                message: "REF must not be empty".to_string(),
            });
        }
        let alt_raw = as_str(col::ALT)?;
        let alt = split_nonempty(alt_raw, ',');
        let qual = as_str(col::QUAL)?.to_string();
        let filter = split_nonempty(as_str(col::FILTER)?, ';');
        let info = split_nonempty(as_str(col::INFO)?, ';');

        let mut format = Vec::new();
        let mut sample = Vec::new();
        if fields.len() > col::FORMAT {
            format = split_nonempty(as_str(col::FORMAT)?, ':');
            if fields.len() > col::SAMPLE {
                sample = split_nonempty(as_str(col::SAMPLE)?, ':');
            }
            while sample.len() < format.len() {
                sample.push(".".to_string());
            }
            if sample.len() != format.len() {
                return Err(GvcfError::MalformedRecord {
                    line,
                    message: format!(
                        "FORMAT has {} keys but SAMPLE has {} values",
                        format.len(),
                        sample.len()
                    ),
                });
            }
        }

        Ok(Self {
            chrom,
            pos,
            id,
            reference,
            alt,
            qual,
            filter,
            info,
            format,
            sample,
        })
    }

    pub fn is_variant(&self) -> bool {
        !self.alt.is_empty()
    }

    /// REF length > 1 with no alt: a gVCF non-variant block placeholder.
    pub fn is_nonvariant_block(&self) -> bool {
        self.reference.len() != 1 && !self.is_variant()
    }

    /// REF longer than one base, or any alt whose length differs from REF's,
    /// or an alt containing a breakend `.` token.
    pub fn is_indel(&self) -> bool {
        if self.reference.len() > 1 {
            return true;
        }
        self.alt.iter().any(|a| a == "." || a.len() != self.reference.len())
    }

    pub fn get_info(&self, key: &str) -> Option<&str> {
        for entry in &self.info {
            if let Some(v) = info_value_if_key(entry, key) {
                return Some(v);
            }
        }
        None
    }

    pub fn set_info(&mut self, key: &str, value: &str) {
        for entry in self.info.iter_mut() {
            if info_value_if_key(entry, key).is_some() {
                *entry = format!("{key}={value}");
                return;
            }
        }
        self.info.push(format!("{key}={value}"));
    }

    pub fn delete_info(&mut self, key: &str) {
        self.info.retain(|entry| info_value_if_key(entry, key).is_none());
    }

    pub fn get_sample(&self, key: &str) -> Option<&str> {
        let idx = self.format.iter().position(|k| k == key)?;
        self.sample.get(idx).map(|s| s.as_str())
    }

    pub fn set_sample(&mut self, key: &str, value: &str) {
        if let Some(idx) = self.format.iter().position(|k| k == key) {
            self.sample[idx] = value.to_string();
        } else {
            self.format.push(key.to_string());
            self.sample.push(value.to_string());
        }
    }

    pub fn delete_sample(&mut self, key: &str) {
        if let Some(idx) = self.format.iter().position(|k| k == key) {
            self.format.remove(idx);
            self.sample.remove(idx);
        }
    }

    /// Rename a FORMAT key in place, keeping its SAMPLE value (used to move
    /// `PL` to `OPL` when coercing a diploid call to haploid).
    pub fn rename_sample_key(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.format.iter().position(|k| k == from) {
            self.format[idx] = to.to_string();
        }
    }

    pub fn pass_filter(&mut self) {
        self.filter = vec!["PASS".to_string()];
    }

    pub fn append_filter(&mut self, label: &str) {
        if self.filter.len() == 1 && self.filter[0] == "PASS" {
            self.filter.clear();
        }
        if !self.filter.iter().any(|f| f == label) {
            self.filter.push(label.to_string());
        }
    }

    fn join_field(items: &[String], sep: &str) -> String {
        if items.is_empty() {
            ".".to_string()
        } else {
            items.join(sep)
        }
    }

    /// Canonical tab-joined serialization. `placeholder_ref` is used for
    /// single-base non-variant records, which render REF as `".."` instead
    /// of the literal base.
    pub fn write_to(&self, out: &mut impl std::fmt::Write, placeholder_ref: bool) -> fmt::Result {
        let ref_field = if placeholder_ref && self.reference.len() == 1 && !self.is_variant() {
            "..".to_string()
        } else {
            self.reference.clone()
        };
        let mut pos_buf = itoa::Buffer::new();
        write!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            pos_buf.format(self.pos),
            if self.id.is_empty() { "." } else { &self.id },
            ref_field,
            Self::join_field(&self.alt, ","),
            if self.qual.is_empty() { "." } else { &self.qual },
            Self::join_field(&self.filter, ";"),
            Self::join_field(&self.info, ";"),
        )?;
        if !self.format.is_empty() {
            write!(out, "\t{}\t{}", self.format.join(":"), self.sample.join(":"))?;
        }
        Ok(())
    }

    pub fn write_unaltered_to(&self, out: &mut impl std::fmt::Write) -> fmt::Result {
        let mut pos_buf = itoa::Buffer::new();
        write!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            pos_buf.format(self.pos),
            if self.id.is_empty() { "." } else { &self.id },
            self.reference,
            Self::join_field(&self.alt, ","),
            if self.qual.is_empty() { "." } else { &self.qual },
            Self::join_field(&self.filter, ";"),
            Self::join_field(&self.info, ";"),
        )?;
        if !self.format.is_empty() {
            write!(out, "\t{}\t{}", self.format.join(":"), self.sample.join(":"))?;
        }
        Ok(())
    }

    pub fn to_line(&self) -> String {
        let mut s = String::new();
        self.write_unaltered_to(&mut s).unwrap();
        s
    }
}

fn split_nonempty(s: &str, sep: char) -> Vec<String> {
    if s.is_empty() || s == "." {
        Vec::new()
    } else {
        s.split(sep).map(|x| x.to_string()).collect()
    }
}

fn info_value_if_key<'a>(entry: &'a str, key: &str) -> Option<&'a str> {
    match entry.split_once('=') {
        Some((k, v)) if k == key => Some(v),
        None if entry == key => Some(""),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> VcfRecord {
        let fields: Vec<&[u8]> = line.split('\t').map(|s| s.as_bytes()).collect();
        VcfRecord::parse(&fields, 1).unwrap()
    }

    #[test]
    fn parses_minimal_record() {
        let r = parse("chr1\t100\t.\tA\t.\t.\tPASS\t.");
        assert_eq!(r.chrom, "chr1");
        assert_eq!(r.pos, 100);
        assert_eq!(r.reference, "A");
        assert!(!r.is_variant());
    }

    #[test]
    fn pads_short_sample_field() {
        let r = parse("chr1\t100\t.\tA\tC\t.\tPASS\t.\tGT:DP:GQ\t0/1:30");
        assert_eq!(r.sample, vec!["0/1", "30", "."]);
    }

    #[test]
    fn rejects_too_few_fields() {
        let fields: Vec<&[u8]> = "chr1\t100\t.\tA".split('\t').map(|s| s.as_bytes()).collect();
        assert!(VcfRecord::parse(&fields, 4).is_err());
    }

    #[test]
    fn rejects_empty_ref() {
        let fields: Vec<&[u8]> = "chr1\t100\t.\t\tC\t.\tPASS\t."
            .split('\t')
            .map(|s| s.as_bytes())
            .collect();
        assert!(VcfRecord::parse(&fields, 1).is_err());
    }

    #[test]
    fn info_get_set_delete_roundtrip() {
        let mut r = parse("chr1\t100\t.\tA\t.\t.\tPASS\tDP=30;MQ=60");
        assert_eq!(r.get_info("DP"), Some("30"));
        r.set_info("DP", "40");
        assert_eq!(r.get_info("DP"), Some("40"));
        r.delete_info("MQ");
        assert_eq!(r.get_info("MQ"), None);
        r.set_info("END", "120");
        assert_eq!(r.get_info("END"), Some("120"));
    }

    #[test]
    fn sample_get_set_delete_roundtrip() {
        let mut r = parse("chr1\t100\t.\tA\tC\t.\tPASS\t.\tGT:DP\t0/1:30");
        assert_eq!(r.get_sample("DP"), Some("30"));
        r.set_sample("DP", "40");
        assert_eq!(r.get_sample("DP"), Some("40"));
        r.delete_sample("DP");
        assert_eq!(r.get_sample("DP"), None);
        assert_eq!(r.format, vec!["GT"]);
    }

    #[test]
    fn append_filter_clears_pass_first() {
        let mut r = parse("chr1\t100\t.\tA\t.\t.\tPASS\t.");
        r.append_filter("LowMQ");
        assert_eq!(r.filter, vec!["LowMQ"]);
        r.append_filter("LowMQ");
        assert_eq!(r.filter, vec!["LowMQ"]);
    }

    #[test]
    fn is_indel_detects_length_mismatch_and_breakend() {
        assert!(parse("chr1\t1\t.\tAG\tA\t.\tPASS\t.").is_indel());
        assert!(parse("chr1\t1\t.\tA\tAG\t.\tPASS\t.").is_indel());
        assert!(parse("chr1\t1\t.\tA\t.\t.\tPASS\t.").is_indel());
        assert!(!parse("chr1\t1\t.\tA\tG\t.\tPASS\t.").is_indel());
    }

    #[test]
    fn write_unaltered_roundtrips_fields() {
        let r = parse("chr1\t100\t.\tA\tC\t50\tPASS\tDP=30\tGT\t0/1");
        assert_eq!(r.to_line(), "chr1\t100\t.\tA\tC\t50\tPASS\tDP=30\tGT\t0/1");
    }

    #[test]
    fn write_placeholder_ref_for_single_base_nonvariant() {
        let r = parse("chr1\t100\t.\tA\t.\t.\tPASS\t.");
        let mut s = String::new();
        r.write_to(&mut s, true).unwrap();
        assert!(s.starts_with("chr1\t100\t.\t..\t"));
    }
}
