//! Genotype string parsing shared across grooming and region-editing code.

/// Split a GT token on `/` or `|`; each allele is an integer or `.`
/// (no-call, encoded as `-1`).
pub fn parse_gt(gt: &str) -> Vec<i64> {
    gt.split(|c| c == '/' || c == '|')
        .map(|tok| if tok == "." { -1 } else { tok.parse().unwrap_or(-1) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_slash_and_pipe() {
        assert_eq!(parse_gt("0/1"), vec![0, 1]);
        assert_eq!(parse_gt("1|0"), vec![1, 0]);
    }

    #[test]
    fn no_call_token_is_negative_one() {
        assert_eq!(parse_gt("./1"), vec![-1, 1]);
        assert_eq!(parse_gt("."), vec![-1]);
    }

    #[test]
    fn single_allele_haploid() {
        assert_eq!(parse_gt("0"), vec![0]);
    }
}
