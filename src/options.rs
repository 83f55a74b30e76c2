//! Configuration tables for the blocking/grooming engine: filter
//! definitions, tolerance parameters, and the default filter set.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterScope {
    Site,
    Indel,
    Both,
}

impl FilterScope {
    pub fn applies_to_site(self) -> bool {
        matches!(self, FilterScope::Site | FilterScope::Both)
    }

    pub fn applies_to_indel(self) -> bool {
        matches!(self, FilterScope::Indel | FilterScope::Both)
    }

    /// The header-description noun: Site / Indel / Locus. `Both`-scoped
    /// filters (GQX, QD) are described as "Locus" in header text, matching
    /// the original's `FILTERTYPE::Label`.
    pub fn label(self) -> &'static str {
        match self {
            FilterScope::Site => "Site",
            FilterScope::Indel => "Indel",
            FilterScope::Both => "Locus",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterInfo {
    pub label: String,
    pub scope: FilterScope,
    pub tag: String,
    pub thresh: f64,
    pub is_max_thresh: bool,
    pub is_sample_value: bool,
    pub is_filter_if_missing: bool,
}

impl FilterInfo {
    pub fn new(
        label: &str,
        scope: FilterScope,
        tag: &str,
        thresh: f64,
        is_max_thresh: bool,
    ) -> Self {
        Self {
            label: label.to_string(),
            scope,
            tag: tag.to_string(),
            thresh,
            is_max_thresh,
            is_sample_value: false,
            is_filter_if_missing: false,
        }
    }

    pub fn sample_value(mut self, v: bool) -> Self {
        self.is_sample_value = v;
        self
    }

    pub fn filter_if_missing(mut self, v: bool) -> Self {
        self.is_filter_if_missing = v;
        self
    }

    pub fn description(&self) -> String {
        let direction = if self.is_max_thresh { "greater" } else { "less" };
        let suffix = if self.is_filter_if_missing { " or not present" } else { "" };
        format!(
            "{} {} is {} than {}{}",
            self.scope.label(),
            self.tag,
            direction,
            self.thresh,
            suffix
        )
    }
}

/// Non-variant block tolerance configuration.
#[derive(Debug, Clone)]
pub struct BlockOptions {
    pub frac_tol: f64,
    pub abs_tol: i64,
    pub block_label: String,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            frac_tol: 0.3,
            abs_tol: 3,
            block_label: "BLOCKAVG_min30p3a".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlockerOptions {
    pub filters: Vec<FilterInfo>,
    pub max_chrom_depth_filter_tag: String,
    pub max_chrom_depth_filter_factor: f64,
    pub min_nonref_blockable: f64,
    pub indel_conflict_label: String,
    pub site_conflict_label: String,
    pub min_gqx: f64,
    pub block: BlockOptions,
    /// Per-chromosome mean depth; empty disables the chrom-depth filter.
    pub chrom_depth: FxHashMap<String, f64>,
}

impl BlockerOptions {
    /// The eight filters the original seeds by default, before GQX (which
    /// is always appended separately since its threshold is independently
    /// configurable via `--min-gqx`).
    pub fn default_filters() -> Vec<FilterInfo> {
        vec![
            FilterInfo::new("LowMQ", FilterScope::Site, "MQ", 20.0, false),
            FilterInfo::new("LowQD", FilterScope::Both, "QD", 3.73, false),
            FilterInfo::new("HighFS", FilterScope::Site, "FS", 60.0, true),
            FilterInfo::new("HighHaplotypeScore", FilterScope::Site, "HaplotypeScore", 13.0, true),
            FilterInfo::new("LowMQRankSum", FilterScope::Site, "MQRankSum", -12.5, false),
            FilterInfo::new("LowReadPosRankSum", FilterScope::Site, "ReadPosRankSum", -2.386, false),
            FilterInfo::new("HighIndelFS", FilterScope::Indel, "FS", 200.0, true),
            FilterInfo::new(
                "LowIndelReadPosRankSum",
                FilterScope::Indel,
                "ReadPosRankSum",
                -20.0,
                false,
            ),
        ]
    }

    pub fn gqx_filter(min_gqx: f64) -> FilterInfo {
        FilterInfo::new("LowGQX", FilterScope::Both, "GQX", min_gqx, false)
            .sample_value(true)
            .filter_if_missing(true)
    }

    pub fn with_defaults(use_default_filters: bool) -> Self {
        Self {
            filters: if use_default_filters { Self::default_filters() } else { Vec::new() },
            max_chrom_depth_filter_tag: "MaxDepth".to_string(),
            max_chrom_depth_filter_factor: 3.0,
            min_nonref_blockable: 0.2,
            indel_conflict_label: "IndelConflict".to_string(),
            site_conflict_label: "SiteConflict".to_string(),
            min_gqx: 20.0,
            block: BlockOptions::default(),
            chrom_depth: FxHashMap::default(),
        }
    }

    pub fn has_chrom_depth_filter(&self) -> bool {
        !self.chrom_depth.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_description_wording() {
        let f = FilterInfo::new("LowMQ", FilterScope::Site, "MQ", 20.0, false);
        assert_eq!(f.description(), "Site MQ is less than 20");
    }

    #[test]
    fn gqx_filter_is_locus_scoped_and_missing_triggers() {
        let f = BlockerOptions::gqx_filter(20.0);
        assert_eq!(f.scope.label(), "Locus");
        assert!(f.is_filter_if_missing);
        assert!(f.description().ends_with("or not present"));
    }

    #[test]
    fn default_filters_seed_eight_entries() {
        assert_eq!(BlockerOptions::default_filters().len(), 8);
    }
}
