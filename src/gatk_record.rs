//! `VcfRecord` specialization that lazily caches the handful of FORMAT
//! fields the blocking engine inspects on every record.

use crate::maybe_int::MaybeInt;
use crate::vcf_record::VcfRecord;

#[derive(Debug, Clone)]
pub struct GatkVcfRecord {
    pub record: VcfRecord,
    gt: Option<String>,
    dp: Option<MaybeInt>,
    mq: Option<MaybeInt>,
    gq: Option<MaybeInt>,
    gqx: Option<MaybeInt>,
}

impl GatkVcfRecord {
    pub fn new(record: VcfRecord) -> Self {
        Self {
            record,
            gt: None,
            dp: None,
            mq: None,
            gq: None,
            gqx: None,
        }
    }

    /// Invalidate every memoized field. Must be called after any mutation
    /// that could change SAMPLE/QUAL content.
    pub fn invalidate_caches(&mut self) {
        self.gt = None;
        self.dp = None;
        self.mq = None;
        self.gq = None;
        self.gqx = None;
    }

    pub fn gt(&mut self) -> &str {
        if self.gt.is_none() {
            self.gt = Some(self.record.get_sample("GT").unwrap_or(".").to_string());
        }
        self.gt.as_deref().unwrap()
    }

    pub fn dp(&mut self) -> &MaybeInt {
        if self.dp.is_none() {
            self.dp = Some(MaybeInt::from_str_opt(self.record.get_sample("DP")));
        }
        self.dp.as_ref().unwrap()
    }

    pub fn mq(&mut self) -> &MaybeInt {
        if self.mq.is_none() {
            self.mq = Some(MaybeInt::from_str_opt(self.record.get_sample("MQ")));
        }
        self.mq.as_ref().unwrap()
    }

    pub fn gq(&mut self) -> &MaybeInt {
        if self.gq.is_none() {
            self.gq = Some(MaybeInt::from_str_opt(self.record.get_sample("GQ")));
        }
        self.gq.as_ref().unwrap()
    }

    /// `GQX = min(QUAL, GQ)` when both parse as integers; otherwise unset.
    pub fn gqx(&mut self) -> &MaybeInt {
        if self.gqx.is_none() {
            let qual = MaybeInt::from_str_opt(Some(self.record.qual.as_str()));
            let gq = self.gq().clone();
            self.gqx = Some(if qual.is_int && gq.is_int {
                if qual.int_val <= gq.int_val {
                    qual
                } else {
                    gq
                }
            } else {
                MaybeInt::unset()
            });
        }
        self.gqx.as_ref().unwrap()
    }

    pub fn is_covered(&mut self) -> bool {
        self.dp().is_non_zero()
    }

    pub fn set_sample(&mut self, key: &str, value: &str) {
        self.record.set_sample(key, value);
        self.invalidate_caches();
    }

    pub fn delete_sample(&mut self, key: &str) {
        self.record.delete_sample(key);
        self.invalidate_caches();
    }

    pub fn set_qual(&mut self, qual: &str) {
        self.record.qual = qual.to_string();
        self.invalidate_caches();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(line: &str) -> GatkVcfRecord {
        let fields: Vec<&[u8]> = line.split('\t').map(|s| s.as_bytes()).collect();
        GatkVcfRecord::new(VcfRecord::parse(&fields, 1).unwrap())
    }

    #[test]
    fn gqx_is_min_of_qual_and_gq() {
        let mut r = make("chr1\t1\t.\tA\t.\t50\tPASS\t.\tGT:GQ\t0/0:40");
        assert_eq!(r.gqx().int_val, 40);
    }

    #[test]
    fn gqx_unset_when_qual_missing() {
        let mut r = make("chr1\t1\t.\tA\t.\t.\tPASS\t.\tGT:GQ\t0/0:40");
        assert!(!r.gqx().is_int);
    }

    #[test]
    fn is_covered_requires_nonzero_dp() {
        let mut r = make("chr1\t1\t.\tA\t.\t.\tPASS\t.\tGT:DP\t0/0:0");
        assert!(!r.is_covered());
        let mut r2 = make("chr1\t1\t.\tA\t.\t.\tPASS\t.\tGT:DP\t0/0:5");
        assert!(r2.is_covered());
    }

    #[test]
    fn mutation_invalidates_cache() {
        let mut r = make("chr1\t1\t.\tA\t.\t.\tPASS\t.\tGT:DP\t0/0:5");
        assert!(r.is_covered());
        r.set_sample("DP", "0");
        assert!(!r.is_covered());
    }
}
