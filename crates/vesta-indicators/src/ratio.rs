//! Ratio reconstruction.
//!
//! Each ratio is `market_cap / denominator`, rounded to two decimals, where the
//! denominator comes from the filing resolved for the row's date. A missing or
//! non-positive denominator leaves PE, PS and PC empty for that row, while the
//! same condition on net assets removes the row from the series.

use crate::period::resolve_period;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vesta_data::{DailySeries, FilingSet, MetricKind, PeriodKey, round2};

/// Outcome of looking up a ratio denominator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Denominator {
    /// A disclosed, positive value.
    Valid {
        /// Period the value comes from
        period: PeriodKey,
        /// Reported value
        value: f64,
    },
    /// No disclosed filing covers the date.
    LookupMiss,
    /// The filing exists but the value is absent or not positive.
    Invalid {
        /// Period that was resolved
        period: PeriodKey,
        /// Reported value, if any
        value: Option<f64>,
    },
}

impl Denominator {
    /// Ratio of `market_cap` over this denominator, if defined.
    pub fn ratio(&self, market_cap: f64) -> Option<f64> {
        match *self {
            Self::Valid { value, .. } => Some(round2(market_cap / value)),
            Self::LookupMiss | Self::Invalid { .. } => None,
        }
    }
}

/// Denominator for `metric` on `date`.
pub fn denominator(date: NaiveDate, metric: MetricKind, filings: &FilingSet) -> Denominator {
    let Ok(period) = resolve_period(date, metric, filings) else {
        return Denominator::LookupMiss;
    };
    match filings.value(period, metric) {
        Some(value) if value.is_finite() && value > 0.0 => Denominator::Valid { period, value },
        value => Denominator::Invalid { period, value },
    }
}

/// What [`reconstruct_ratios`] did to a series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioReport {
    /// Ratio columns that were computed
    pub computed: Vec<MetricKind>,
    /// Ratio columns left alone because every row already had a value
    pub skipped: Vec<MetricKind>,
    /// Cells left empty because the denominator was unusable
    pub null_cells: usize,
    /// Rows removed for lacking usable net assets
    pub dropped_rows: usize,
}

/// Fill the ratio columns of `series` that are not already complete.
///
/// Filings must be fully loaded; nothing is fetched or retried here.
pub fn reconstruct_ratios(series: &mut DailySeries, filings: &FilingSet) -> RatioReport {
    let mut report = RatioReport::default();

    for metric in MetricKind::all() {
        if series.ratio_complete(metric) {
            report.skipped.push(metric);
            continue;
        }

        for record in series.records_mut() {
            let ratio = denominator(record.date, metric, filings).ratio(record.market_cap);
            *record.ratio_mut(metric) = ratio;
            if ratio.is_none() && metric != MetricKind::NetAssets {
                report.null_cells += 1;
            }
        }

        if metric == MetricKind::NetAssets {
            let before = series.len();
            series.retain(|r| r.book_ratio.is_some());
            report.dropped_rows = before - series.len();
            if report.dropped_rows > 0 {
                debug!(
                    code = %series.code(),
                    dropped = report.dropped_rows,
                    "dropped rows without usable net assets"
                );
            }
        }
        report.computed.push(metric);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vesta_data::{FiscalFiling, MarketCapPoint, SecurityCode};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(points: &[(NaiveDate, f64)]) -> DailySeries {
        let code = SecurityCode::parse("600036").unwrap();
        DailySeries::from_market_caps(
            code,
            "China Merchants Bank",
            points.iter().map(|&(d, cap)| MarketCapPoint::new(d, cap)),
        )
        .unwrap()
    }

    fn full_filings() -> FilingSet {
        [
            FiscalFiling::new(PeriodKey::ThirdQuarter(2022)).with(MetricKind::NetAssets, 300.0),
            FiscalFiling::new(PeriodKey::FirstQuarter(2023)).with(MetricKind::NetAssets, 400.0),
            FiscalFiling::new(PeriodKey::Annual(2022))
                .with(MetricKind::NetProfit, 30.0)
                .with(MetricKind::TotalRevenue, 90.0)
                .with(MetricKind::OperatingCashflow, 45.0),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_denominator_variants() {
        let filings: FilingSet = [
            FiscalFiling::new(PeriodKey::Annual(2022)).with(MetricKind::NetProfit, 0.0),
            FiscalFiling::new(PeriodKey::FirstQuarter(2023)).with(MetricKind::NetAssets, 10.0),
        ]
        .into_iter()
        .collect();
        let date = day(2023, 6, 1);

        assert_eq!(
            denominator(date, MetricKind::NetAssets, &filings),
            Denominator::Valid {
                period: PeriodKey::FirstQuarter(2023),
                value: 10.0
            }
        );
        assert_eq!(
            denominator(date, MetricKind::NetProfit, &filings),
            Denominator::Invalid {
                period: PeriodKey::Annual(2022),
                value: Some(0.0)
            }
        );
        assert_eq!(
            denominator(date, MetricKind::TotalRevenue, &filings),
            Denominator::Invalid {
                period: PeriodKey::Annual(2022),
                value: None
            }
        );
        assert_eq!(
            denominator(day(2030, 1, 1), MetricKind::NetProfit, &filings),
            Denominator::LookupMiss
        );
    }

    #[test]
    fn test_ratios_use_resolved_period() {
        let mut s = series(&[(day(2023, 4, 28), 1234.0), (day(2023, 5, 5), 1300.0)]);
        let report = reconstruct_ratios(&mut s, &full_filings());

        assert_eq!(report.computed.len(), 4);
        assert_eq!(report.dropped_rows, 0);
        assert_eq!(report.null_cells, 0);

        let may = &s.records()[0];
        let april = &s.records()[1];
        assert_relative_eq!(april.book_ratio.unwrap(), 4.11);
        assert_relative_eq!(may.book_ratio.unwrap(), 3.25);
        assert_relative_eq!(may.earnings_ratio.unwrap(), 43.33);
        assert_relative_eq!(may.sales_ratio.unwrap(), 14.44);
        assert_relative_eq!(may.cashflow_ratio.unwrap(), 28.89);
    }

    #[test]
    fn test_non_positive_net_assets_drops_row() {
        let filings: FilingSet = [
            FiscalFiling::new(PeriodKey::ThirdQuarter(2022)).with(MetricKind::NetAssets, -5.0),
            FiscalFiling::new(PeriodKey::FirstQuarter(2023)).with(MetricKind::NetAssets, 50.0),
            FiscalFiling::new(PeriodKey::Annual(2022)).with(MetricKind::NetProfit, 10.0),
        ]
        .into_iter()
        .collect();
        let mut s = series(&[(day(2023, 3, 1), 100.0), (day(2023, 6, 1), 100.0)]);

        let report = reconstruct_ratios(&mut s, &filings);

        assert_eq!(report.dropped_rows, 1);
        assert_eq!(s.dates(), vec![day(2023, 6, 1)]);
        assert_eq!(s.records()[0].book_ratio, Some(2.0));
    }

    #[test]
    fn test_non_positive_profit_leaves_null() {
        let filings: FilingSet = [
            FiscalFiling::new(PeriodKey::FirstQuarter(2023)).with(MetricKind::NetAssets, 50.0),
            FiscalFiling::new(PeriodKey::Annual(2022)).with(MetricKind::NetProfit, -10.0),
        ]
        .into_iter()
        .collect();
        let mut s = series(&[(day(2023, 6, 1), 100.0), (day(2023, 6, 2), 110.0)]);

        let report = reconstruct_ratios(&mut s, &filings);

        assert_eq!(s.len(), 2);
        assert!(s.records().iter().all(|r| r.earnings_ratio.is_none()));
        assert!(s.records().iter().all(|r| r.book_ratio.is_some()));
        // PE, PS and PC are all undefined on both rows
        assert_eq!(report.null_cells, 6);
    }

    #[test]
    fn test_complete_column_is_kept() {
        let mut s = series(&[(day(2023, 6, 1), 100.0)]);
        s.records_mut()[0].book_ratio = Some(9.99);

        let report = reconstruct_ratios(&mut s, &full_filings());

        assert_eq!(report.skipped, vec![MetricKind::NetAssets]);
        assert_eq!(s.records()[0].book_ratio, Some(9.99));
    }
}
