//! Discount forecasting
//!
//! The primary forecaster fits an autoregressive-integrated model on a
//! product's discount series and projects a fixed horizon of future days.
//! A supplementary tree-ensemble regressor ([`regressor`]) estimates a
//! same-day adjusted discount per observation; it is a sanity-check model,
//! not part of the time-series forecast.

pub mod arima;
pub mod regressor;

use crate::error::{RadarError, Result};
use crate::types::ForecastPoint;
use arima::{ArModel, ArimaSpec};
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Minimum valid observations before a fit is attempted.
pub const MIN_OBSERVATIONS: usize = 5;

/// Default forecast horizon in days.
pub const DEFAULT_HORIZON: usize = 5;

pub struct DiscountForecaster {
    horizon: usize,
    spec: ArimaSpec,
}

impl DiscountForecaster {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            spec: ArimaSpec::default(),
        }
    }

    /// Fit on the (date, discount) series and project `horizon` consecutive
    /// calendar days starting the day after the last observation.
    ///
    /// Duplicates are collapsed (last value per date wins) and the series
    /// sorted ascending before fitting. Fewer than [`MIN_OBSERVATIONS`]
    /// valid points is `InsufficientHistory`; a failed fit is
    /// `ForecastFailed`. Both are non-fatal to the pipeline, which shows an
    /// empty forecast instead.
    pub fn fit_and_forecast(&self, series: &[(NaiveDate, Decimal)]) -> Result<Vec<ForecastPoint>> {
        let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (date, discount) in series {
            // dropping entries that do not coerce to a finite number
            if let Some(value) = discount.to_f64().filter(|v| v.is_finite()) {
                by_date.insert(*date, value);
            }
        }

        if by_date.len() < MIN_OBSERVATIONS {
            return Err(RadarError::InsufficientHistory {
                observed: by_date.len(),
                required: MIN_OBSERVATIONS,
            });
        }

        let values: Vec<f64> = by_date.values().copied().collect();
        let last_date = *by_date.keys().next_back().expect("non-empty series");

        let model = ArModel::fit(&values, self.spec)
            .ok_or_else(|| RadarError::ForecastFailed("model fit failed".to_string()))?;
        let predictions = model.forecast(&values, self.horizon);

        let mut points = Vec::with_capacity(self.horizon);
        let mut date = last_date;
        for value in predictions {
            date = date
                .succ_opt()
                .ok_or_else(|| RadarError::ForecastFailed("forecast date overflow".to_string()))?;
            let predicted = Decimal::from_f64_retain(value)
                .ok_or_else(|| {
                    RadarError::ForecastFailed(format!("non-finite prediction: {value}"))
                })?
                .round_dp(2);
            points.push(ForecastPoint {
                date,
                predicted_discount: predicted,
            });
        }

        Ok(points)
    }
}

impl Default for DiscountForecaster {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(discounts: &[(u32, Decimal)]) -> Vec<(NaiveDate, Decimal)> {
        discounts.iter().map(|(day, v)| (d(*day), *v)).collect()
    }

    #[test]
    fn test_short_history_is_insufficient() {
        let forecaster = DiscountForecaster::default();
        let input = series(&[(1, dec!(5)), (2, dec!(7)), (3, dec!(6)), (4, dec!(8))]);
        let err = forecaster.fit_and_forecast(&input).unwrap_err();
        match err {
            RadarError::InsufficientHistory { observed, required } => {
                assert_eq!(observed, 4);
                assert_eq!(required, 5);
            }
            other => panic!("expected InsufficientHistory, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_dates_count_once() {
        let forecaster = DiscountForecaster::default();
        // six raw rows, only four distinct dates
        let input = series(&[
            (1, dec!(5)),
            (1, dec!(5)),
            (2, dec!(7)),
            (2, dec!(6)),
            (3, dec!(6)),
            (4, dec!(8)),
        ]);
        assert!(matches!(
            forecaster.fit_and_forecast(&input),
            Err(RadarError::InsufficientHistory { observed: 4, .. })
        ));
    }

    #[test]
    fn test_five_point_series_three_day_horizon() {
        let forecaster = DiscountForecaster::new(3);
        let input = series(&[
            (1, dec!(5)),
            (2, dec!(7)),
            (3, dec!(6)),
            (4, dec!(8)),
            (5, dec!(9)),
        ]);
        let forecast = forecaster.fit_and_forecast(&input).unwrap();
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[0].date, d(6));
        assert_eq!(forecast[1].date, d(7));
        assert_eq!(forecast[2].date, d(8));
        // numeric, never a missing marker
        for point in &forecast {
            assert!(point.predicted_discount > Decimal::MIN);
        }
    }

    #[test]
    fn test_horizon_length_and_contiguous_dates() {
        let forecaster = DiscountForecaster::new(5);
        let input: Vec<(NaiveDate, Decimal)> = (1..=15)
            .map(|day| (d(day), Decimal::from(5 + (day as i64 * 3) % 7)))
            .collect();
        let forecast = forecaster.fit_and_forecast(&input).unwrap();
        assert_eq!(forecast.len(), 5);
        for window in forecast.windows(2) {
            assert_eq!(window[1].date, window[0].date.succ_opt().unwrap());
        }
        // starts the day after the last training date, never reuses it
        assert_eq!(forecast[0].date, d(16));
    }

    #[test]
    fn test_unsorted_input_is_sorted_before_fit() {
        let forecaster = DiscountForecaster::new(2);
        let input = series(&[
            (3, dec!(6)),
            (1, dec!(5)),
            (5, dec!(9)),
            (2, dec!(7)),
            (4, dec!(8)),
        ]);
        let forecast = forecaster.fit_and_forecast(&input).unwrap();
        assert_eq!(forecast[0].date, d(6));
    }

    #[test]
    fn test_constant_series_still_forecasts() {
        let forecaster = DiscountForecaster::new(3);
        let input: Vec<(NaiveDate, Decimal)> = (1..=8).map(|day| (d(day), dec!(5))).collect();
        let forecast = forecaster.fit_and_forecast(&input).unwrap();
        assert_eq!(forecast.len(), 3);
        for point in &forecast {
            assert_eq!(point.predicted_discount, dec!(5));
        }
    }
}
