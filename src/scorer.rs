//! Momentum scoring
//!
//! The score is the percentage move from the close at (or just before) the
//! lookback cutoff to the latest close. The cutoff is measured back from the
//! series' own latest timestamp, not the wall clock, so a stale series is
//! scored over its last trading window.

use chrono::Duration;

use crate::{MomentumResult, PricePoint, PriceSeries, Symbol};

/// Percentage change from `past` to `last`
pub fn percent_change(last: f64, past: f64) -> f64 {
    (last / past - 1.0) * 100.0
}

/// Score a series over `lookback_minutes`.
///
/// Returns `None` for an empty series. When no point is old enough to sit at
/// or before the cutoff, the reference price is the latest close and the
/// score is 0.
pub fn score(symbol: &Symbol, series: &PriceSeries, lookback_minutes: u32) -> Option<MomentumResult> {
    let points = series.points();

    // Equal timestamps resolve to the higher close, whatever the input order
    let latest = latest_of(points.iter())?;
    let cutoff = latest.datetime - Duration::minutes(i64::from(lookback_minutes));

    let past = latest_of(points.iter().filter(|p| p.datetime <= cutoff))
        .map(|p| p.close)
        .unwrap_or(latest.close);

    Some(MomentumResult {
        symbol: symbol.clone(),
        score: percent_change(latest.close, past),
        last: latest.close,
        past,
    })
}

fn latest_of<'a>(points: impl Iterator<Item = &'a PricePoint>) -> Option<&'a PricePoint> {
    let mut latest: Option<&'a PricePoint> = None;
    for p in points {
        let newer = latest.map_or(true, |l| {
            p.datetime
                .cmp(&l.datetime)
                .then(p.close.total_cmp(&l.close))
                .is_gt()
        });
        if newer {
            latest = Some(p);
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{DateTime, TimeZone, Utc};

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 14, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn series(points: &[(i64, f64)]) -> PriceSeries {
        PriceSeries::from_points(points.iter().map(|(m, c)| PricePoint::new(t(*m), *c)))
    }

    fn sym() -> Symbol {
        Symbol::new("RY.TO")
    }

    #[test]
    fn test_empty_series_has_no_score() {
        assert!(score(&sym(), &PriceSeries::default(), 60).is_none());
    }

    #[test]
    fn test_single_point_is_neutral() {
        for lookback in [5, 60, 1440] {
            let result = score(&sym(), &series(&[(0, 42.17)]), lookback).unwrap();
            assert_eq!(result.score, 0.0);
            assert_eq!(result.past, 42.17);
            assert_eq!(result.last, 42.17);
        }
    }

    #[test]
    fn test_cutoff_between_two_points() {
        let result = score(&sym(), &series(&[(0, 100.0), (30, 105.0)]), 20).unwrap();
        assert_eq!(result.past, 100.0);
        assert_eq!(result.last, 105.0);
        assert_relative_eq!(result.score, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_point_exactly_at_cutoff_is_eligible() {
        let result = score(&sym(), &series(&[(0, 50.0), (10, 55.0), (60, 60.0)]), 50).unwrap();
        assert_eq!(result.past, 55.0);
    }

    #[test]
    fn test_uses_latest_eligible_point() {
        let result = score(
            &sym(),
            &series(&[(0, 90.0), (10, 180.0), (40, 150.0), (70, 200.0)]),
            30,
        )
        .unwrap();
        assert_eq!(result.past, 150.0);
        assert_eq!(result.last, 200.0);
    }

    #[test]
    fn test_known_score() {
        let result = score(&sym(), &series(&[(0, 180.0), (120, 200.0)]), 60).unwrap();
        assert_relative_eq!(result.score, 11.111_111_111, epsilon = 1e-6);
    }

    #[test]
    fn test_lookback_longer_than_series_is_neutral() {
        let result = score(&sym(), &series(&[(0, 10.0), (5, 12.0)]), 60).unwrap();
        assert_eq!(result.past, 12.0);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_negative_momentum() {
        let result = score(&sym(), &series(&[(0, 100.0), (90, 97.5)]), 60).unwrap();
        assert_relative_eq!(result.score, -2.5, epsilon = 1e-9);
    }

    #[test]
    fn test_order_of_input_does_not_matter() {
        let ordered = [(0, 20.0), (15, 21.0), (45, 19.5), (75, 23.0), (90, 22.4)];
        let expected = score(&sym(), &series(&ordered), 30).unwrap();

        let mut shuffled = ordered.to_vec();
        shuffled.reverse();
        shuffled.swap(1, 3);
        let result = score(&sym(), &series(&shuffled), 30).unwrap();

        assert_eq!(result, expected);
        assert_eq!(result.last, 22.4);
        assert_eq!(result.past, 19.5);
    }

    #[test]
    fn test_duplicate_timestamps_do_not_depend_on_order() {
        let first = score(&sym(), &series(&[(0, 100.0), (30, 105.0), (30, 110.0)]), 30).unwrap();
        let second = score(&sym(), &series(&[(0, 100.0), (30, 110.0), (30, 105.0)]), 30).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.last, 110.0);
        assert_eq!(first.past, 100.0);
        assert_relative_eq!(first.score, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_duplicate_timestamps_at_cutoff() {
        let first = score(&sym(), &series(&[(0, 48.0), (0, 50.0), (60, 55.0)]), 60).unwrap();
        let second = score(&sym(), &series(&[(0, 50.0), (0, 48.0), (60, 55.0)]), 60).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.past, 50.0);
    }

    #[test]
    fn test_score_matches_prices() {
        let result = score(&sym(), &series(&[(0, 33.3), (61, 34.1)]), 60).unwrap();
        assert!(result.past > 0.0);
        assert_relative_eq!(
            result.score,
            (result.last / result.past - 1.0) * 100.0,
            epsilon = 1e-12
        );
    }
}
