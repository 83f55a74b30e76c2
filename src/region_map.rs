//! Chromosome -> sorted, non-overlapping interval list, with a per-scan
//! cursor that slices a query range into successive in/out-of-region
//! sub-intervals.

use crate::error::{GvcfError, Result};
use rustc_hash::FxHashMap;
use std::io::BufRead;

/// Closed, 1-based interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval {
    pub begin: u64,
    pub end: u64,
}

#[derive(Debug, Default)]
pub struct RegionMap {
    by_chrom: FxHashMap<String, Vec<Interval>>,
}

impl RegionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a BED reader (0-based, half-open on disk), merging
    /// touching/overlapping intervals per chromosome.
    pub fn from_bed_reader(r: impl BufRead) -> Result<Self> {
        let mut by_chrom: FxHashMap<String, Vec<Interval>> = FxHashMap::default();
        for (line_no, line) in r.lines().enumerate() {
            let line = line.map_err(GvcfError::Io)?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with("track") || trimmed.starts_with("browser") {
                continue;
            }
            let mut fields = trimmed.split('\t');
            let chrom = fields.next().ok_or_else(|| GvcfError::ParseFailure {
                line: line_no + 1,
                message: "missing chrom".to_string(),
            })?;
            let start: u64 = fields
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| GvcfError::ParseFailure {
                    line: line_no + 1,
                    message: "missing or invalid start".to_string(),
                })?;
            let end: u64 = fields
                .next()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| GvcfError::ParseFailure {
                    line: line_no + 1,
                    message: "missing or invalid end".to_string(),
                })?;
            by_chrom
                .entry(chrom.to_string())
                .or_default()
                .push(Interval { begin: start + 1, end });
        }
        for intervals in by_chrom.values_mut() {
            merge_sorted(intervals);
        }
        Ok(Self { by_chrom })
    }

    pub fn from_triples(triples: impl IntoIterator<Item = (String, u64, u64)>) -> Self {
        let mut by_chrom: FxHashMap<String, Vec<Interval>> = FxHashMap::default();
        for (chrom, begin, end) in triples {
            by_chrom.entry(chrom).or_default().push(Interval { begin, end });
        }
        for intervals in by_chrom.values_mut() {
            merge_sorted(intervals);
        }
        Self { by_chrom }
    }

    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.by_chrom.get(chrom).is_some_and(|v| !v.is_empty())
    }

    /// A fresh per-chromosome cursor. Cursors are cheap; callers hold one
    /// per active chromosome scan.
    pub fn cursor<'a>(&'a self, chrom: &str) -> RegionCursor<'a> {
        RegionCursor {
            intervals: self.by_chrom.get(chrom).map(|v| v.as_slice()).unwrap_or(&[]),
            head: 0,
        }
    }
}

fn merge_sorted(intervals: &mut Vec<Interval>) {
    intervals.sort();
    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for iv in intervals.drain(..) {
        match merged.last_mut() {
            Some(last) if iv.begin <= last.end + 1 => {
                if iv.end > last.end {
                    last.end = iv.end;
                }
            }
            _ => merged.push(iv),
        }
    }
    *intervals = merged;
}

/// Per-chromosome scan cursor. `begin` of successive queries must be
/// non-decreasing (the streaming contract every caller relies on).
pub struct RegionCursor<'a> {
    intervals: &'a [Interval],
    head: usize,
}

impl<'a> RegionCursor<'a> {
    /// Does `[begin,end]` overlap any remaining interval? Advances past
    /// intervals that end before `begin`.
    pub fn overlaps(&mut self, begin: u64, end: u64) -> bool {
        while self.head < self.intervals.len() && self.intervals[self.head].end < begin {
            self.head += 1;
        }
        self.head < self.intervals.len() && self.intervals[self.head].begin <= end
    }

    /// Compute the next `(in_region, slice_end)` partitioning `[begin,end]`
    /// and report whether another slice remains beyond it. Mirrors the
    /// source's two-phase `is_record_in_region` / `get_next_record_region_interval`
    /// split: call `overlaps` first, then repeatedly call this until it
    /// returns `false`.
    pub fn next_slice(&mut self, begin: u64, end: u64) -> (bool, u64, bool) {
        if self.head < self.intervals.len() && begin > self.intervals[self.head].end {
            self.head += 1;
        }
        if self.head >= self.intervals.len() {
            return (false, end, false);
        }
        let iv = self.intervals[self.head];
        let (in_region, slice_end) = if begin < iv.begin {
            (false, end.min(iv.begin - 1))
        } else {
            (true, end.min(iv.end))
        };
        let has_more = slice_end + 1 <= end;
        (in_region, slice_end, has_more)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_touching_intervals() {
        let map = RegionMap::from_triples(vec![
            ("chr1".into(), 1, 10),
            ("chr1".into(), 11, 20),
            ("chr1".into(), 30, 40),
        ]);
        let mut cur = map.cursor("chr1");
        assert!(cur.overlaps(1, 5));
        assert!(cur.overlaps(15, 35));
    }

    #[test]
    fn from_bed_reader_converts_to_1_based() {
        let bed = "chr1\t99\t102\n";
        let map = RegionMap::from_bed_reader(bed.as_bytes()).unwrap();
        let mut cur = map.cursor("chr1");
        assert!(cur.overlaps(100, 102));
    }

    #[test]
    fn no_overlap_when_chrom_absent() {
        let map = RegionMap::from_triples(vec![("chr1".into(), 1, 10)]);
        let mut cur = map.cursor("chr2");
        assert!(!cur.overlaps(1, 100));
    }

    #[test]
    fn next_slice_partitions_mixed_region() {
        let map = RegionMap::from_triples(vec![("chr1".into(), 101, 101)]);
        let mut cur = map.cursor("chr1");
        assert!(cur.overlaps(100, 103));
        let (in_region, end, more) = cur.next_slice(100, 103);
        assert!(!in_region);
        assert_eq!(end, 100);
        assert!(more);
        let (in_region2, end2, more2) = cur.next_slice(101, 103);
        assert!(in_region2);
        assert_eq!(end2, 101);
        assert!(more2);
        let (in_region3, end3, more3) = cur.next_slice(102, 103);
        assert!(!in_region3);
        assert_eq!(end3, 103);
        assert!(!more3);
    }
}
