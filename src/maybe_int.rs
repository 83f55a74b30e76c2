//! Tri-state numeric value used throughout INFO/FORMAT parsing.
//!
//! A `MaybeInt` remembers whether its source token was present and
//! integer-valued, alongside the parsed double and the raw string, so
//! downstream code can distinguish "missing", "non-numeric", and
//! "numeric but fractional" without re-parsing.

#[derive(Debug, Clone, PartialEq)]
pub struct MaybeInt {
    pub is_int: bool,
    pub int_val: i64,
    pub double_val: f64,
    pub str_val: String,
}

impl MaybeInt {
    /// Parse from a raw token (`None`, `""`, and `"."` are all "not set").
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            None => Self::unset(),
            Some(s) if s.is_empty() || s == "." => Self::unset(),
            Some(s) => match s.parse::<f64>() {
                Ok(d) => Self {
                    is_int: true,
                    int_val: d.round() as i64,
                    double_val: d,
                    str_val: s.to_string(),
                },
                Err(_) => Self {
                    is_int: false,
                    int_val: 0,
                    double_val: 0.0,
                    str_val: s.to_string(),
                },
            },
        }
    }

    pub fn from_int(v: i64) -> Self {
        Self {
            is_int: true,
            int_val: v,
            double_val: v as f64,
            str_val: v.to_string(),
        }
    }

    pub fn unset() -> Self {
        Self {
            is_int: false,
            int_val: 0,
            double_val: 0.0,
            str_val: String::new(),
        }
    }

    pub fn is_non_zero(&self) -> bool {
        self.is_int && self.int_val != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_dot_are_unset() {
        assert!(!MaybeInt::from_str_opt(None).is_int);
        assert!(!MaybeInt::from_str_opt(Some(".")).is_int);
        assert!(!MaybeInt::from_str_opt(Some("")).is_int);
    }

    #[test]
    fn integer_token_rounds_correctly() {
        let v = MaybeInt::from_str_opt(Some("41.6"));
        assert!(v.is_int);
        assert_eq!(v.int_val, 42);
    }

    #[test]
    fn non_numeric_token_is_not_int() {
        let v = MaybeInt::from_str_opt(Some("NA"));
        assert!(!v.is_int);
        assert_eq!(v.str_val, "NA");
    }

    #[test]
    fn is_non_zero() {
        assert!(MaybeInt::from_int(3).is_non_zero());
        assert!(!MaybeInt::from_int(0).is_non_zero());
        assert!(!MaybeInt::unset().is_non_zero());
    }
}
