//! Value search queries

use std::str::FromStr;

use crate::AnalysisError;

/// Tolerance for an exact-value query
pub const APPROX_TOLERANCE: f64 = 0.01;

/// A search over series samples: `>100` or `50`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueQuery {
    /// Strictly greater than the threshold
    GreaterThan(f64),
    /// Within [`APPROX_TOLERANCE`] of the target
    Approx(f64),
}

impl ValueQuery {
    pub fn parse(input: &str) -> Result<Self, AnalysisError> {
        let input = input.trim();
        let (greater, number) = match input.strip_prefix('>') {
            Some(rest) => (true, rest.trim()),
            None => (false, input),
        };

        let target: f64 = number.parse().map_err(|_| AnalysisError::InvalidQuery {
            query: input.to_string(),
            reason: format!("{number:?} is not a number"),
        })?;
        if target.is_nan() {
            return Err(AnalysisError::InvalidQuery {
                query: input.to_string(),
                reason: "NaN never matches".to_string(),
            });
        }

        Ok(if greater {
            ValueQuery::GreaterThan(target)
        } else {
            ValueQuery::Approx(target)
        })
    }

    /// NaN samples never match
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            ValueQuery::GreaterThan(threshold) => value > threshold,
            ValueQuery::Approx(target) => (value - target).abs() < APPROX_TOLERANCE,
        }
    }
}

impl FromStr for ValueQuery {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(ValueQuery::parse(">100").unwrap(), ValueQuery::GreaterThan(100.0));
        assert_eq!(ValueQuery::parse(" > 2.5 ").unwrap(), ValueQuery::GreaterThan(2.5));
        assert_eq!(ValueQuery::parse("50").unwrap(), ValueQuery::Approx(50.0));
        assert_eq!("-3".parse::<ValueQuery>().unwrap(), ValueQuery::Approx(-3.0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(ValueQuery::parse(">abc"), Err(AnalysisError::InvalidQuery { .. })));
        assert!(ValueQuery::parse("").is_err());
        assert!(ValueQuery::parse("NaN").is_err());
    }

    #[test]
    fn test_nan_never_matches() {
        assert!(!ValueQuery::GreaterThan(0.0).matches(f64::NAN));
        assert!(!ValueQuery::Approx(0.0).matches(f64::NAN));
    }
}
