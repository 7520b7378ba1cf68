//! Dividend yield back-fill.
//!
//! Announcements are sparse; the persisted series needs a yield on every row.
//! Each announcement is snapped to the nearest row, which receives the payout
//! rate. Earlier rows, back to the row of the previous announcement and never
//! more than `max_window_rows` away, receive the rate scaled by their market
//! cap relative to the snapped row. Untouched rows keep 0.00.
//!
//! More than one announcement inside a rolling year is not reconciled: a later
//! announcement simply overwrites the rows inside its own window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use vesta_data::{DailySeries, DividendEvent, round2};

/// Configuration for [`DividendBackfill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillConfig {
    /// Most rows one announcement may reach beyond its own row (default: 365)
    pub max_window_rows: usize,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self { max_window_rows: 365 }
    }
}

/// What a back-fill pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
    /// Announcements applied to the series
    pub events_applied: usize,
    /// Rows that received a scaled yield
    pub rows_scaled: usize,
}

/// Index of the row nearest to `target` in `dates`.
///
/// An exact match wins; otherwise the smallest absolute day distance, with ties
/// going to the first row in series order.
pub fn snap_to_row(dates: &[NaiveDate], target: NaiveDate) -> Option<usize> {
    dates
        .iter()
        .enumerate()
        .min_by_key(|(_, d)| (**d - target).num_days().abs())
        .map(|(i, _)| i)
}

/// Spreads dividend announcements over a daily series.
#[derive(Debug, Clone, Default)]
pub struct DividendBackfill {
    config: BackfillConfig,
}

impl DividendBackfill {
    /// Create a back-fill with the given configuration.
    pub const fn with_config(config: BackfillConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub const fn config(&self) -> &BackfillConfig {
        &self.config
    }

    /// Rewrite the dividend column of `series` from `events`.
    ///
    /// `series` must be most-recent-first and `events` ascending by
    /// announcement date; every row ends up with a yield.
    pub fn apply(&self, series: &mut DailySeries, events: &[DividendEvent]) -> BackfillReport {
        let mut report = BackfillReport::default();
        let dates = series.dates();
        let code = series.code().clone();
        let rows = series.records_mut();

        for row in rows.iter_mut() {
            row.dividend_yield = Some(0.0);
        }

        // Row of the previous announcement; before the first one the window
        // may run to the oldest row.
        let mut previous: Option<usize> = None;

        for event in events {
            let Some(snapped) = snap_to_row(&dates, event.announce_date) else {
                break;
            };
            let rate = event.payout_rate.normalized();
            rows[snapped].dividend_yield = Some(rate);
            report.events_applied += 1;

            let limit = previous.map_or(rows.len(), |p| (p + 1).min(rows.len()));
            let end = (snapped + 1 + self.config.max_window_rows).min(limit);
            let reference = rows[snapped].market_cap;
            debug!(
                %code,
                announced = %event.announce_date,
                row = %dates[snapped],
                rate,
                window = end.saturating_sub(snapped + 1),
                "applying dividend"
            );

            if reference > 0.0 {
                for row in rows.iter_mut().take(end).skip(snapped + 1) {
                    row.dividend_yield = Some(round2(rate * (row.market_cap / reference)));
                    report.rows_scaled += 1;
                }
            } else {
                warn!(%code, row = %dates[snapped], "non-positive market cap on dividend row, not scaling");
            }

            previous = Some(snapped);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;
    use rstest::rstest;
    use vesta_data::{MarketCapPoint, PayoutRate, SecurityCode};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Consecutive calendar days ending at `latest`, market cap rising with the date.
    fn daily_series(latest: NaiveDate, rows: usize) -> DailySeries {
        let code = SecurityCode::parse("600519").unwrap();
        let points = (0..rows).map(|i| {
            let date = latest - Duration::days(i as i64);
            MarketCapPoint::new(date, 1000.0 - i as f64)
        });
        DailySeries::from_market_caps(code, "Moutai", points).unwrap()
    }

    fn yields(series: &DailySeries) -> Vec<f64> {
        series.records().iter().map(|r| r.dividend_yield.unwrap()).collect()
    }

    #[rstest]
    #[case(day(2023, 1, 4), Some(1))]
    #[case(day(2023, 1, 7), Some(0))]
    #[case(day(2022, 12, 1), Some(2))]
    fn test_snap(#[case] target: NaiveDate, #[case] expected: Option<usize>) {
        let dates = vec![day(2023, 1, 5), day(2023, 1, 4), day(2023, 1, 2)];
        assert_eq!(snap_to_row(&dates, target), expected);
    }

    #[test]
    fn test_snap_tie_takes_first_row() {
        let dates = vec![day(2023, 1, 5), day(2023, 1, 3)];
        assert_eq!(snap_to_row(&dates, day(2023, 1, 4)), Some(0));
        assert_eq!(snap_to_row(&[], day(2023, 1, 4)), None);
    }

    #[test]
    fn test_no_events_yields_zero() {
        let mut s = daily_series(day(2023, 1, 10), 5);
        let report = DividendBackfill::default().apply(&mut s, &[]);
        assert_eq!(report, BackfillReport::default());
        assert_eq!(yields(&s), vec![0.0; 5]);
    }

    #[test]
    fn test_not_applicable_rate_is_zero() {
        let mut s = daily_series(day(2023, 1, 10), 5);
        let event = DividendEvent::new(day(2023, 1, 8), "不分配不转增", PayoutRate::NotApplicable);
        DividendBackfill::default().apply(&mut s, &[event]);
        assert_eq!(yields(&s), vec![0.0; 5]);
    }

    #[test]
    fn test_scaling_by_market_cap() {
        let mut s = daily_series(day(2023, 1, 10), 6);
        let event = DividendEvent::new(day(2023, 1, 8), "10派10元(含税)", PayoutRate::Percent(2.0));
        let report = DividendBackfill::default().apply(&mut s, &[event]);

        let y = yields(&s);
        assert_eq!(&y[..2], &[0.0, 0.0]);
        assert_relative_eq!(y[2], 2.0);
        // 2.0 * 997 / 998
        assert_relative_eq!(y[3], 2.0);
        assert_eq!(report.rows_scaled, 3);
    }

    #[test]
    fn test_window_is_capped() {
        let config = BackfillConfig { max_window_rows: 3 };
        let mut s = daily_series(day(2023, 1, 10), 10);
        let event = DividendEvent::new(day(2023, 1, 9), "", PayoutRate::Percent(5.0));
        DividendBackfill::with_config(config).apply(&mut s, &[event]);

        let touched: Vec<usize> = yields(&s)
            .iter()
            .enumerate()
            .filter(|(_, y)| **y > 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(touched, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_later_event_stops_at_previous_row() {
        let mut s = daily_series(day(2023, 1, 20), 20);
        let events = [
            DividendEvent::new(day(2023, 1, 5), "", PayoutRate::Percent(1.0)),
            DividendEvent::new(day(2023, 1, 15), "", PayoutRate::Percent(3.0)),
        ];
        let report = DividendBackfill::default().apply(&mut s, &events);

        let y = yields(&s);
        // first event sits on row 15 and fills 16..20
        assert!(y[16..].iter().all(|v| *v > 0.0 && *v < 1.01));
        // second event sits on row 5 and fills through row 15
        assert_relative_eq!(y[5], 3.0);
        assert!(y[6..=15].iter().all(|v| *v > 2.9 && *v < 3.01));
        assert_eq!(&y[..5], &[0.0; 5]);
        assert_eq!(report.events_applied, 2);
    }
}
