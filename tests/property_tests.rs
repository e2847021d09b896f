//! Property-based tests for the correction, aggregation and configuration
//! invariants, over randomly generated inputs.

use country_forecast::config::OrderRange;
use country_forecast::core::Series;
use country_forecast::data::Dataset;
use country_forecast::forecast::{correct, CorrectionMode, CorrectionRequest, TailPolicy};
use proptest::prelude::*;

/// Forecast-like series: first year plus 2..40 values, some negative.
fn forecast_strategy() -> impl Strategy<Value = Series> {
    (2000..2100_i32, prop::collection::vec(-50.0..500.0_f64, 2..40))
        .prop_map(|(first, values)| Series::from_consecutive(first, &values))
}

fn mode_strategy() -> impl Strategy<Value = CorrectionMode> {
    prop_oneof![
        Just(CorrectionMode::Start),
        Just(CorrectionMode::Linear(TailPolicy::Untouched)),
        Just(CorrectionMode::Linear(TailPolicy::Continuous)),
        Just(CorrectionMode::Linear(TailPolicy::Short)),
    ]
}

proptest! {
    #[test]
    fn correction_keeps_index_and_floors_at_zero(
        series in forecast_strategy(),
        offset in 1usize..40,
        target in -100.0..1000.0_f64,
        mode in mode_strategy(),
    ) {
        let years = series.years();
        let target_year = years[offset % years.len()];
        let mut values = series.clone();
        let request = CorrectionRequest::new(target_year, target, mode);

        match correct(&mut values, &request) {
            Ok(()) => {
                prop_assert_eq!(values.years(), years);
                prop_assert!(values.values().iter().all(|v| *v >= 0.0));
            }
            Err(_) => prop_assert_eq!(values, series),
        }
    }

    #[test]
    fn linear_correction_hits_target(
        series in forecast_strategy(),
        offset in 1usize..40,
        target in 0.0..1000.0_f64,
    ) {
        let years = series.years();
        let target_year = years[1 + offset % (years.len() - 1)];
        let mut values = series;
        let request = CorrectionRequest::new(
            target_year,
            target,
            CorrectionMode::Linear(TailPolicy::Short),
        );

        correct(&mut values, &request).unwrap();
        let hit = values.get(target_year).unwrap();
        prop_assert!((hit - target).abs() <= 1e-9 * target.max(1.0));
        for year in years.into_iter().filter(|y| *y > target_year) {
            prop_assert_eq!(values.get(year), Some(target));
        }
    }

    #[test]
    fn aggregate_is_yearwise_sum(
        a in prop::collection::vec(prop::option::of(0.0..100.0_f64), 1..20),
        b in prop::collection::vec(prop::option::of(0.0..100.0_f64), 1..20),
    ) {
        let mut ds = Dataset::new();
        for (i, v) in a.iter().enumerate() {
            ds.insert_observation("A", "x", 1990 + i as i32, *v);
        }
        for (i, v) in b.iter().enumerate() {
            ds.insert_observation("B", "x", 1990 + i as i32, *v);
        }

        let bundle = ds.aggregate(&["A", "B"], 1990, 2020, "G").unwrap();
        let total = bundle.get("x").cloned().unwrap_or_default();

        for year in 1990..2010 {
            let i = (year - 1990) as usize;
            let va = a.get(i).copied().flatten();
            let vb = b.get(i).copied().flatten();
            match (va, vb) {
                (None, None) => prop_assert_eq!(total.get(year), None),
                _ => {
                    let want = va.unwrap_or(0.0) + vb.unwrap_or(0.0);
                    prop_assert!((total.get(year).unwrap() - want).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn group_of_one_reproduces_member(
        first in 1980..2000_i32,
        cells in prop::collection::vec(prop::option::of(-100.0..100.0_f64), 1..40),
        start in 1985..2005_i32,
        span in 0..20_i32,
    ) {
        let mut ds = Dataset::new();
        for (i, v) in cells.iter().enumerate() {
            ds.insert_observation("A", "x", first + i as i32, *v);
        }
        let end = start + span;

        let bundle = ds.aggregate(&["A"], start, end, "G").unwrap();
        let member = ds.extract("A", "x", start, end);

        prop_assert_eq!(bundle.get("x").cloned().unwrap_or_default(), member.clone());
        prop_assert_eq!(ds.extract("G", "x", start, end), member);
    }

    #[test]
    fn order_range_parse_is_total(text in ".{0,12}") {
        let range = OrderRange::parse(&text);
        prop_assert!(range.start() < range.end());
    }

    #[test]
    fn order_range_parses_valid_pairs(start in 0usize..5, len in 1usize..5) {
        let range = OrderRange::parse(&format!("{start},{}", start + len));
        prop_assert_eq!(range.values().collect::<Vec<_>>(), (start..start + len).collect::<Vec<_>>());
    }
}
