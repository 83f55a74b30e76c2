//! Accumulates a run of homogeneous non-variant sites into one compressed
//! block record.

use super::stat::BlockStat;
use crate::gatk_record::GatkVcfRecord;
use crate::maybe_int::MaybeInt;
use crate::options::BlockOptions;
use crate::vcf_record::VcfRecord;

struct Tracked {
    base: GatkVcfRecord,
    count: u64,
    is_covered: bool,
    gqx: BlockStat,
    dp: BlockStat,
    mq: BlockStat,
    gqx_multi_obs: bool,
    dp_multi_obs: bool,
    mq_multi_obs: bool,
}

pub struct BlockAccumulator {
    opts: BlockOptions,
    current: Option<Tracked>,
}

impl BlockAccumulator {
    pub fn new(opts: BlockOptions) -> Self {
        Self { opts, current: None }
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Would `next` extend the active block? `false` when the accumulator
    /// is empty (caller should start a fresh block instead).
    pub fn test(&mut self, next: &mut GatkVcfRecord) -> bool {
        let Some(t) = self.current.as_mut() else {
            return false;
        };
        if t.base.record.chrom != next.record.chrom {
            return false;
        }
        if next.record.pos != t.base.record.pos + t.count {
            return false;
        }
        if t.base.record.filter != next.record.filter {
            return false;
        }
        if t.base.gt() != next.gt() {
            return false;
        }
        let is_covered = next.is_covered();
        if t.is_covered != is_covered {
            return false;
        }
        if !is_covered {
            return true;
        }
        field_blockable(&t.gqx, t.base.gqx().clone(), next.gqx().clone(), &self.opts)
            && field_blockable(&t.dp, t.base.dp().clone(), next.dp().clone(), &self.opts)
            && field_blockable(&t.mq, t.base.mq().clone(), next.mq().clone(), &self.opts)
    }

    /// Add `next` to the active block (or start a new one if empty).
    /// Caller must have confirmed `test()` first when the accumulator was
    /// non-empty.
    pub fn add(&mut self, next: GatkVcfRecord) {
        match self.current.as_mut() {
            None => {
                let mut base = next;
                let is_covered = base.is_covered();
                let mut gqx = BlockStat::new();
                let mut dp = BlockStat::new();
                let mut mq = BlockStat::new();
                if is_covered {
                    if base.gqx().is_int {
                        gqx.add(base.gqx().int_val);
                    }
                    if base.dp().is_int {
                        dp.add(base.dp().int_val);
                    }
                    if base.mq().is_int {
                        mq.add(base.mq().int_val);
                    }
                }
                self.current = Some(Tracked {
                    base,
                    count: 1,
                    is_covered,
                    gqx,
                    dp,
                    mq,
                    gqx_multi_obs: false,
                    dp_multi_obs: false,
                    mq_multi_obs: false,
                });
            }
            Some(t) => {
                let mut next = next;
                if t.is_covered {
                    if next.gqx().is_int {
                        if !t.gqx.is_empty() {
                            t.gqx_multi_obs = true;
                        }
                        t.gqx.add(next.gqx().int_val);
                    }
                    if next.dp().is_int {
                        if !t.dp.is_empty() {
                            t.dp_multi_obs = true;
                        }
                        t.dp.add(next.dp().int_val);
                    }
                    if next.mq().is_int {
                        if !t.mq.is_empty() {
                            t.mq_multi_obs = true;
                        }
                        t.mq.add(next.mq().int_val);
                    }
                }
                t.count += 1;
            }
        }
    }

    /// Flush the active block, writing a single compressed `VcfRecord`.
    /// Returns `None` if the accumulator was already empty.
    pub fn flush(&mut self) -> Option<VcfRecord> {
        let t = self.current.take()?;
        let mut rec = t.base.record.clone();
        rec.info.clear();
        let gt = rec
            .format
            .iter()
            .position(|k| k == "GT")
            .map(|i| rec.sample[i].clone());
        rec.format.clear();
        rec.sample.clear();
        if let Some(gt) = gt {
            rec.format.push("GT".to_string());
            rec.sample.push(gt);
        }
        rec.qual = ".".to_string();
        if t.count > 1 {
            let mut buf = itoa::Buffer::new();
            rec.set_info("END", buf.format(rec.pos + t.count - 1));
        }
        let mut is_avg = false;
        if t.is_covered {
            write_min_stat(&mut rec, "DP", &t.dp);
            write_min_stat(&mut rec, "GQX", &t.gqx);
            write_min_stat(&mut rec, "MQ", &t.mq);
            is_avg = t.gqx_multi_obs || t.dp_multi_obs || t.mq_multi_obs;
        }
        if is_avg {
            rec.info.push(self.opts.block_label.clone());
        }
        Some(rec)
    }
}

fn write_min_stat(rec: &mut VcfRecord, key: &str, stat: &BlockStat) {
    if stat.is_empty() {
        rec.set_sample(key, ".");
    } else {
        let mut buf = itoa::Buffer::new();
        rec.set_sample(key, buf.format(stat.min()));
    }
}

fn field_blockable(running: &BlockStat, base: MaybeInt, new: MaybeInt, opts: &BlockOptions) -> bool {
    if !base.is_int || !new.is_int {
        return base.str_val == new.str_val;
    }
    running.would_accept(new.int_val, opts.frac_tol, opts.abs_tol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(line: &str) -> GatkVcfRecord {
        let fields: Vec<&[u8]> = line.split('\t').map(|s| s.as_bytes()).collect();
        GatkVcfRecord::new(VcfRecord::parse(&fields, 1).unwrap())
    }

    #[test]
    fn single_site_block_has_no_end_tag() {
        let mut acc = BlockAccumulator::new(BlockOptions::default());
        acc.add(rec("chr1\t100\t.\tA\t.\t50\tPASS\t.\tGT:DP:MQ:GQ\t0/0:30:60:50"));
        let out = acc.flush().unwrap();
        assert_eq!(out.get_info("END"), None);
    }

    #[test]
    fn three_site_block_emits_end_and_minima() {
        let mut acc = BlockAccumulator::new(BlockOptions::default());
        let mut r1 = rec("chr1\t100\t.\tA\t.\t50\tPASS\t.\tGT:DP:MQ:GQ\t0/0:30:60:50");
        acc.add_first(&mut r1);
        let mut r2 = rec("chr1\t101\t.\tC\t.\t49\tPASS\t.\tGT:DP:MQ:GQ\t0/0:31:60:49");
        assert!(acc.test(&mut r2));
        acc.add(r2);
        let mut r3 = rec("chr1\t102\t.\tG\t.\t50\tPASS\t.\tGT:DP:MQ:GQ\t0/0:30:60:50");
        assert!(acc.test(&mut r3));
        acc.add(r3);
        let out = acc.flush().unwrap();
        assert_eq!(out.get_info("END"), Some("102"));
        assert_eq!(out.get_sample("MQ"), Some("60"));
        assert_eq!(out.get_sample("GQX"), Some("49"));
    }

    #[test]
    fn mismatched_filter_rejects_block() {
        let mut acc = BlockAccumulator::new(BlockOptions::default());
        let mut r1 = rec("chr1\t100\t.\tA\t.\t.\tPASS\t.\tGT:DP\t0/0:30");
        acc.add_first(&mut r1);
        let mut r2 = rec("chr1\t101\t.\tC\t.\t.\tLowMQ\t.\tGT:DP\t0/0:31");
        assert!(!acc.test(&mut r2));
    }

    #[test]
    fn large_dp_jump_outside_tolerance_rejects() {
        let mut acc = BlockAccumulator::new(BlockOptions::default());
        let mut r1 = rec("chr1\t100\t.\tA\t.\t.\tPASS\t.\tGT:DP\t0/0:10");
        acc.add_first(&mut r1);
        let mut r2 = rec("chr1\t101\t.\tC\t.\t.\tPASS\t.\tGT:DP\t0/0:50");
        assert!(!acc.test(&mut r2));
    }

    impl BlockAccumulator {
        fn add_first(&mut self, r: &mut GatkVcfRecord) {
            self.add(r.clone());
        }
    }
}
