//! Dividend announcements.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pre-tax payout rate of a dividend announcement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PayoutRate {
    /// Payout rate in percent.
    Percent(f64),
    /// The feed reported no applicable rate (shown as `--`).
    NotApplicable,
}

impl PayoutRate {
    /// Rate in percent, with "not applicable" read as zero.
    pub const fn normalized(&self) -> f64 {
        match *self {
            Self::Percent(rate) => rate,
            Self::NotApplicable => 0.0,
        }
    }
}

impl FromStr for PayoutRate {
    type Err = std::convert::Infallible;

    /// Parse feed text such as `4.17%`. Anything that is not a percentage is
    /// treated as not applicable.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(number) = s.trim().strip_suffix('%') else {
            return Ok(Self::NotApplicable);
        };
        Ok(number
            .trim()
            .parse::<f64>()
            .map_or(Self::NotApplicable, Self::Percent))
    }
}

impl fmt::Display for PayoutRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(rate) => write!(f, "{rate:.2}%"),
            Self::NotApplicable => f.write_str("--"),
        }
    }
}

/// One dividend announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendEvent {
    /// Date the implementation notice was published
    pub announce_date: NaiveDate,
    /// Free-text payout plan, e.g. `10派15.22元(含税)`; informational only
    pub payout_description: String,
    /// Pre-tax payout rate
    pub payout_rate: PayoutRate,
}

impl DividendEvent {
    /// Create a new event.
    pub fn new(announce_date: NaiveDate, payout_description: impl Into<String>, payout_rate: PayoutRate) -> Self {
        Self {
            announce_date,
            payout_description: payout_description.into(),
            payout_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case("4.17%", 4.17)]
    #[case(" 0.85 % ", 0.85)]
    #[case("--", 0.0)]
    #[case("", 0.0)]
    #[case("abc%", 0.0)]
    fn test_payout_rate_parse(#[case] text: &str, #[case] expected: f64) {
        let rate: PayoutRate = text.parse().unwrap();
        assert_relative_eq!(rate.normalized(), expected);
    }

    #[test]
    fn test_dash_is_not_applicable() {
        assert_eq!("--".parse::<PayoutRate>().unwrap(), PayoutRate::NotApplicable);
        assert_eq!(PayoutRate::NotApplicable.to_string(), "--");
        assert_eq!(PayoutRate::Percent(4.1).to_string(), "4.10%");
    }
}
