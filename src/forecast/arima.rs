//! Autoregressive-integrated model
//!
//! AR coefficients are estimated by OLS on the differenced series. The AR
//! order degrades when the series is too short to identify the requested
//! lag or the design matrix is singular, so a minimal 5-point history still
//! yields a usable fit.

use nalgebra::{DMatrix, DVector};

/// Requested model order. The default mirrors an ARIMA(2,1,0): AR lag 2,
/// one differencing step, no moving-average term.
#[derive(Debug, Clone, Copy)]
pub struct ArimaSpec {
    pub ar_order: usize,
    pub differencing: usize,
}

impl Default for ArimaSpec {
    fn default() -> Self {
        Self {
            ar_order: 2,
            differencing: 1,
        }
    }
}

/// A fitted model. `ar_order` is the effective lag actually used, which may
/// be lower than requested on short series.
#[derive(Debug, Clone)]
pub struct ArModel {
    pub ar_order: usize,
    pub differencing: usize,
    pub coefficients: Vec<f64>,
    pub constant: f64,
}

impl ArModel {
    /// Fit on the raw series. Returns `None` when the series is empty after
    /// differencing or contains non-finite values.
    pub fn fit(data: &[f64], spec: ArimaSpec) -> Option<Self> {
        let diff = difference(data, spec.differencing);
        if diff.is_empty() {
            return None;
        }

        // Largest lag the data can identify: one OLS row per usable
        // observation, at least as many rows as parameters.
        let mut ar_order = spec.ar_order.min(diff.len().saturating_sub(1));
        while ar_order > 0 && diff.len() - ar_order < ar_order + 1 {
            ar_order -= 1;
        }

        // Singular fits (constant or collinear differenced series) degrade
        // through lower lags down to a drift-only model, which always
        // identifies.
        while ar_order > 0 {
            if let Some((constant, coefficients)) = estimate_ar(&diff, ar_order) {
                if constant.is_finite() && coefficients.iter().all(|c| c.is_finite()) {
                    return Some(Self {
                        ar_order,
                        differencing: spec.differencing,
                        coefficients,
                        constant,
                    });
                }
            }
            ar_order -= 1;
        }

        let constant = diff.iter().sum::<f64>() / diff.len() as f64;
        if !constant.is_finite() {
            return None;
        }
        Some(Self {
            ar_order: 0,
            differencing: spec.differencing,
            coefficients: Vec::new(),
            constant,
        })
    }

    /// Project `horizon` steps past the end of the training series.
    pub fn forecast(&self, data: &[f64], horizon: usize) -> Vec<f64> {
        let mut extended = difference(data, self.differencing);
        let mut steps = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let mut next = self.constant;
            for (lag, coeff) in self.coefficients.iter().enumerate() {
                let idx = extended.len() - 1 - lag;
                next += coeff * extended[idx];
            }
            extended.push(next);
            steps.push(next);
        }

        // Undo differencing to return to the original scale.
        let mut result = steps;
        for _ in 0..self.differencing {
            result = integrate(&result, data.last().copied().unwrap_or(0.0));
        }
        result
    }
}

/// Difference the series `d` times.
pub fn difference(data: &[f64], d: usize) -> Vec<f64> {
    let mut result = data.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

fn integrate(diff: &[f64], start: f64) -> Vec<f64> {
    let mut cumsum = start;
    diff.iter()
        .map(|d| {
            cumsum += d;
            cumsum
        })
        .collect()
}

/// OLS estimate of `y_t = c + phi_1 y_{t-1} + ... + phi_p y_{t-p}`.
fn estimate_ar(data: &[f64], p: usize) -> Option<(f64, Vec<f64>)> {
    let n = data.len();
    let rows = n - p;

    let mut x_data = Vec::with_capacity(rows * (p + 1));
    for t in p..n {
        x_data.push(1.0);
        for lag in 1..=p {
            x_data.push(data[t - lag]);
        }
    }

    let x = DMatrix::from_row_slice(rows, p + 1, &x_data);
    let y = DVector::from_iterator(rows, data[p..].iter().copied());

    let xtx = x.transpose() * &x;
    let xty = x.transpose() * y;
    let beta = xtx.try_inverse()? * xty;

    let constant = beta[0];
    let coefficients = beta.iter().skip(1).copied().collect();
    Some((constant, coefficients))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference() {
        let data = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&data, 1), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&data, 2), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_integrate_inverts_difference() {
        let data = vec![4.0, 6.0, 9.0, 13.0];
        let diff = difference(&data, 1);
        assert_eq!(integrate(&diff, data[0]), vec![6.0, 9.0, 13.0]);
    }

    #[test]
    fn test_minimal_series_fits_with_reduced_order() {
        let data = vec![5.0, 7.0, 6.0, 8.0, 9.0];
        let model = ArModel::fit(&data, ArimaSpec::default()).unwrap();
        // only 4 differenced points, lag 2 is unidentifiable
        assert_eq!(model.ar_order, 1);

        let forecast = model.forecast(&data, 3);
        assert_eq!(forecast.len(), 3);
        assert!(forecast.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_full_order_on_longer_series() {
        let data: Vec<f64> = (0..20).map(|i| 10.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let model = ArModel::fit(&data, ArimaSpec::default()).unwrap();
        assert_eq!(model.ar_order, 2);
        assert_eq!(model.coefficients.len(), 2);
    }

    #[test]
    fn test_constant_series_degrades_to_drift() {
        let data = vec![5.0; 8];
        let model = ArModel::fit(&data, ArimaSpec::default()).unwrap();
        assert_eq!(model.ar_order, 0);
        let forecast = model.forecast(&data, 4);
        assert!(forecast.iter().all(|v| (v - 5.0).abs() < 1e-9));
    }

    #[test]
    fn test_linear_trend_forecast_continues_trend() {
        // constant steps are collinear, so the fit falls back to drift
        let data: Vec<f64> = (1..=12).map(|i| i as f64 * 2.0).collect();
        let model = ArModel::fit(&data, ArimaSpec::default()).unwrap();
        assert_eq!(model.ar_order, 0);
        let forecast = model.forecast(&data, 3);
        assert!((forecast[0] - 26.0).abs() < 1e-9);
        assert!((forecast[1] - 28.0).abs() < 1e-9);
        assert!((forecast[2] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_short_series_fails() {
        assert!(ArModel::fit(&[1.0], ArimaSpec::default()).is_none());
        assert!(ArModel::fit(&[], ArimaSpec::default()).is_none());
    }
}
