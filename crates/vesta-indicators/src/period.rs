//! Fiscal period resolution.
//!
//! A statement only becomes usable once it has been published, so the period
//! behind a ratio trails the calendar date. Net assets come from quarterly
//! filings:
//!
//! | months | period used                 |
//! |--------|-----------------------------|
//! | 1-4    | third quarter of prior year |
//! | 5-8    | first quarter               |
//! | 9-10   | interim (half year)         |
//! | 11-12  | third quarter               |
//!
//! Profit, revenue and cashflow come from annual reports: the prior year's
//! report when it is in the set, otherwise the one before it.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vesta_data::{FilingSet, MetricKind, PeriodKey};

/// No disclosed filing covers the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("no disclosed filing for {metric} on {date}")]
pub struct LookupMiss {
    /// Date being resolved
    pub date: NaiveDate,
    /// Metric being resolved
    pub metric: MetricKind,
}

/// Quarterly period whose net assets apply on `date`.
pub fn quarterly_period(date: NaiveDate) -> PeriodKey {
    let year = date.year();
    match date.month() {
        1..=4 => PeriodKey::ThirdQuarter(year - 1),
        5..=8 => PeriodKey::FirstQuarter(year),
        9 | 10 => PeriodKey::Interim(year),
        _ => PeriodKey::ThirdQuarter(year),
    }
}

/// Periods to try for `metric` on `date`, most preferred first.
pub fn candidate_periods(date: NaiveDate, metric: MetricKind) -> impl Iterator<Item = PeriodKey> {
    let year = date.year();
    let (preferred, fallback) = if metric.uses_annual_filings() {
        (PeriodKey::Annual(year - 1), Some(PeriodKey::Annual(year - 2)))
    } else {
        (quarterly_period(date), None)
    };
    std::iter::once(preferred).chain(fallback)
}

/// Resolve the disclosed period whose `metric` is the denominator on `date`.
///
/// Callers must not use the annual rule for dates before the prior year's
/// reports are out; this function only checks what is in `filings`.
pub fn resolve_period(date: NaiveDate, metric: MetricKind, filings: &FilingSet) -> Result<PeriodKey, LookupMiss> {
    candidate_periods(date, metric)
        .find(|period| filings.contains(*period))
        .ok_or(LookupMiss { date, metric })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use vesta_data::FiscalFiling;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(day(2023, 1, 3), PeriodKey::ThirdQuarter(2022))]
    #[case(day(2023, 4, 28), PeriodKey::ThirdQuarter(2022))]
    #[case(day(2023, 5, 4), PeriodKey::FirstQuarter(2023))]
    #[case(day(2023, 8, 31), PeriodKey::FirstQuarter(2023))]
    #[case(day(2023, 9, 1), PeriodKey::Interim(2023))]
    #[case(day(2023, 10, 31), PeriodKey::Interim(2023))]
    #[case(day(2023, 11, 1), PeriodKey::ThirdQuarter(2023))]
    #[case(day(2023, 12, 29), PeriodKey::ThirdQuarter(2023))]
    fn test_quarterly_windows(#[case] date: NaiveDate, #[case] expected: PeriodKey) {
        assert_eq!(quarterly_period(date), expected);
    }

    #[test]
    fn test_every_early_month_uses_prior_q3() {
        let filings: FilingSet = [
            FiscalFiling::new(PeriodKey::ThirdQuarter(2021)),
            FiscalFiling::new(PeriodKey::FirstQuarter(2022)),
        ]
        .into_iter()
        .collect();

        let mut date = day(2022, 1, 1);
        while date < day(2022, 9, 1) {
            let expected = if date.month() <= 4 {
                PeriodKey::ThirdQuarter(2021)
            } else {
                PeriodKey::FirstQuarter(2022)
            };
            assert_eq!(resolve_period(date, MetricKind::NetAssets, &filings), Ok(expected));
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_annual_prefers_prior_year() {
        let filings: FilingSet = [
            FiscalFiling::new(PeriodKey::Annual(2021)),
            FiscalFiling::new(PeriodKey::Annual(2022)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            resolve_period(day(2023, 6, 1), MetricKind::NetProfit, &filings),
            Ok(PeriodKey::Annual(2022))
        );
    }

    #[test]
    fn test_annual_falls_back_two_years() {
        let filings: FilingSet = [FiscalFiling::new(PeriodKey::Annual(2021))].into_iter().collect();

        assert_eq!(
            resolve_period(day(2023, 2, 1), MetricKind::TotalRevenue, &filings),
            Ok(PeriodKey::Annual(2021))
        );
    }

    #[rstest]
    #[case(MetricKind::NetAssets)]
    #[case(MetricKind::NetProfit)]
    #[case(MetricKind::OperatingCashflow)]
    fn test_lookup_miss(#[case] metric: MetricKind) {
        let filings: FilingSet = [FiscalFiling::new(PeriodKey::Annual(2015))].into_iter().collect();
        let date = day(2023, 6, 1);

        assert_eq!(resolve_period(date, metric, &filings), Err(LookupMiss { date, metric }));
    }
}
