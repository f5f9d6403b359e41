use std::fmt;
use thiserror::Error;

/// Ordinal contribution-intensity bucket for a single day
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) enum Level {
    None,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl Level {
    /// All levels in ascending order, as drawn in the legend
    pub(crate) const ALL: [Level; 5] = [
        Level::None,
        Level::Low,
        Level::Moderate,
        Level::High,
        Level::VeryHigh,
    ];

    /// Classify a raw count coming from outside the crate.  Negative counts
    /// are rejected.
    pub(crate) fn classify(count: i64) -> Result<Level, InvalidCountError> {
        u32::try_from(count)
            .map(Level::for_count)
            // Counts too large for a u32 are still "very high"
            .or_else(|_| {
                if count < 0 {
                    Err(InvalidCountError(count))
                } else {
                    Ok(Level::VeryHigh)
                }
            })
    }

    pub(crate) fn for_count(count: u32) -> Level {
        match count {
            0 => Level::None,
            1..=2 => Level::Low,
            3..=4 => Level::Moderate,
            5..=6 => Level::High,
            _ => Level::VeryHigh,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Level::None => "none",
            Level::Low => "low",
            Level::Moderate => "moderate",
            Level::High => "high",
            Level::VeryHigh => "very high",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, Eq, Error, PartialEq)]
#[error("contribution count cannot be negative: {0}")]
pub(crate) struct InvalidCountError(pub(crate) i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(Level::classify(0), Ok(Level::None));
        assert_eq!(Level::classify(1), Ok(Level::Low));
        assert_eq!(Level::classify(2), Ok(Level::Low));
        assert_eq!(Level::classify(3), Ok(Level::Moderate));
        assert_eq!(Level::classify(4), Ok(Level::Moderate));
        assert_eq!(Level::classify(5), Ok(Level::High));
        assert_eq!(Level::classify(6), Ok(Level::High));
        assert_eq!(Level::classify(7), Ok(Level::VeryHigh));
        assert_eq!(Level::classify(1000), Ok(Level::VeryHigh));
        assert_eq!(Level::classify(i64::MAX), Ok(Level::VeryHigh));
    }

    #[test]
    fn test_negative() {
        assert_eq!(Level::classify(-1), Err(InvalidCountError(-1)));
        assert_eq!(
            Level::classify(-1).unwrap_err().to_string(),
            "contribution count cannot be negative: -1"
        );
    }

    #[test]
    fn test_monotonic() {
        let mut prev = Level::None;
        for count in 0..50 {
            let lvl = Level::for_count(count);
            assert!(lvl >= prev, "level decreased at count {count}");
            prev = lvl;
        }
    }

    #[test]
    fn test_all_is_ordered() {
        assert_eq!(Level::ALL.first(), Some(&Level::None));
        assert_eq!(Level::ALL.last(), Some(&Level::VeryHigh));
        assert!(Level::ALL.windows(2).all(|w| w[0] < w[1]));
    }
}
