//! Behavioural tests for period resolution, ratio reconstruction and dividend back-fill.

use chrono::{Datelike, Duration, NaiveDate};
use vesta_data::{
    DailySeries, DividendEvent, FilingSet, FiscalFiling, MarketCapPoint, MetricKind, PayoutRate,
    PeriodKey, SecurityCode, round2,
};
use vesta_indicators::{DividendBackfill, denominator, reconstruct_ratios, resolve_period};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// One row per calendar day ending at `latest`, with a wavy market cap.
fn calendar_series(latest: NaiveDate, rows: usize) -> DailySeries {
    let code = SecurityCode::parse("000858").unwrap();
    let points = (0..rows).map(|i| {
        let cap = 5000.0 + 300.0 * ((i as f64) / 17.0).sin() - i as f64;
        MarketCapPoint::new(latest - Duration::days(i as i64), cap)
    });
    DailySeries::from_market_caps(code, "Wuliangye", points).unwrap()
}

fn filings_2018_2023() -> FilingSet {
    let mut set = FilingSet::new();
    for year in 2018..=2023 {
        let base = f64::from(year - 2000);
        set.insert(FiscalFiling::new(PeriodKey::FirstQuarter(year)).with(MetricKind::NetAssets, base * 10.0));
        set.insert(FiscalFiling::new(PeriodKey::Interim(year)).with(MetricKind::NetAssets, base * 11.0));
        set.insert(FiscalFiling::new(PeriodKey::ThirdQuarter(year)).with(MetricKind::NetAssets, base * 12.0));
        set.insert(
            FiscalFiling::new(PeriodKey::Annual(year))
                .with(MetricKind::NetProfit, base * 3.0)
                .with(MetricKind::TotalRevenue, base * 9.0)
                .with(MetricKind::OperatingCashflow, base * 4.0),
        );
    }
    set
}

#[test]
fn net_assets_windows_for_first_two_thirds_of_year() {
    let filings = filings_2018_2023();
    let mut date = day(2021, 1, 1);
    while date.year() == 2021 && date.month() <= 8 {
        let period = resolve_period(date, MetricKind::NetAssets, &filings).unwrap();
        if date.month() <= 4 {
            assert_eq!(period, PeriodKey::ThirdQuarter(2020), "{date}");
        } else {
            assert_eq!(period, PeriodKey::FirstQuarter(2021), "{date}");
        }
        date = date.succ_opt().unwrap();
    }
}

#[test]
fn every_ratio_equals_rounded_quotient() {
    let filings = filings_2018_2023();
    let mut series = calendar_series(day(2023, 12, 29), 900);
    reconstruct_ratios(&mut series, &filings);

    assert_eq!(series.len(), 900);
    for record in series.records() {
        for metric in MetricKind::all() {
            let Some(ratio) = record.ratio(metric) else {
                continue;
            };
            let period = resolve_period(record.date, metric, &filings).unwrap();
            let value = filings.value(period, metric).unwrap();
            assert_eq!(ratio, round2(record.market_cap / value), "{} {metric}", record.date);
        }
    }
}

#[test]
fn net_assets_drop_rows_but_profit_only_nulls() {
    let mut filings = FilingSet::new();
    filings.insert(FiscalFiling::new(PeriodKey::ThirdQuarter(2022)).with(MetricKind::NetAssets, 0.0));
    filings.insert(FiscalFiling::new(PeriodKey::FirstQuarter(2023)).with(MetricKind::NetAssets, 100.0));
    filings.insert(
        FiscalFiling::new(PeriodKey::Annual(2022))
            .with(MetricKind::NetProfit, -1.0)
            .with(MetricKind::TotalRevenue, 50.0)
            .with(MetricKind::OperatingCashflow, 25.0),
    );

    // 2023-04-20 .. 2023-05-10
    let mut series = calendar_series(day(2023, 5, 10), 21);
    let report = reconstruct_ratios(&mut series, &filings);

    assert_eq!(report.dropped_rows, 11);
    assert_eq!(series.len(), 10);
    assert!(series.records().iter().all(|r| r.date.month() == 5));
    assert!(series.records().iter().all(|r| r.earnings_ratio.is_none()));
    assert!(series.records().iter().all(|r| r.sales_ratio.is_some() && r.cashflow_ratio.is_some()));
    assert!(matches!(
        denominator(day(2023, 5, 1), MetricKind::NetProfit, &filings),
        vesta_indicators::Denominator::Invalid { .. }
    ));
}

#[test]
fn single_event_fills_earlier_rows_only() {
    let latest = day(2023, 12, 31);
    let mut series = calendar_series(latest, 600);
    let event = DividendEvent::new(latest - Duration::days(50), "10派10元(含税)", PayoutRate::Percent(10.0));

    DividendBackfill::default().apply(&mut series, &[event]);

    let rows = series.records();
    let reference = rows[50].market_cap;
    assert!(rows[..50].iter().all(|r| r.dividend_yield == Some(0.0)));
    assert_eq!(rows[50].dividend_yield, Some(10.0));
    for (i, row) in rows.iter().enumerate().take(50 + 365 + 1).skip(51) {
        assert_eq!(row.dividend_yield, Some(round2(10.0 * row.market_cap / reference)), "row {i}");
    }
    assert!(rows[416..].iter().all(|r| r.dividend_yield == Some(0.0)));
}

#[test]
fn window_capped_between_distant_events() {
    let latest = day(2023, 12, 31);
    let mut series = calendar_series(latest, 1000);
    let newer = latest - Duration::days(10);
    let older = newer - Duration::days(400);
    let events = [
        DividendEvent::new(older, "", PayoutRate::Percent(4.0)),
        DividendEvent::new(newer, "", PayoutRate::Percent(2.0)),
    ];

    DividendBackfill::default().apply(&mut series, &events);

    let rows = series.records();
    let newer_ref = rows[10].market_cap;
    let older_ref = rows[410].market_cap;
    assert_eq!(rows[10].dividend_yield, Some(2.0));
    assert_eq!(rows[375].dividend_yield, Some(round2(2.0 * rows[375].market_cap / newer_ref)));
    // rows 376..410 lie beyond the capped window of the newer event
    assert!(rows[376..410].iter().all(|r| r.dividend_yield == Some(0.0)));
    assert_eq!(rows[410].dividend_yield, Some(4.0));
    assert_eq!(rows[775].dividend_yield, Some(round2(4.0 * rows[775].market_cap / older_ref)));
    assert!(rows[776..].iter().all(|r| r.dividend_yield == Some(0.0)));
}
