use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::error::BenchmarkError;
use crate::types::{round_dp, with_metadata, ComputationOutput};
use crate::BenchmarkResult;

/// A slope smaller than this share of the series mean reads as flat.
const STABLE_SLOPE_SHARE: Decimal = dec!(0.01);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Ordinary least-squares line over the index points `0..n-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendFit {
    pub slope: Decimal,
    pub intercept: Decimal,
    /// Coefficient of determination in [0, 1]
    pub r_squared: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    InsufficientData,
}

// ---------------------------------------------------------------------------
// Regression
// ---------------------------------------------------------------------------

/// Magnitude above which a series is rescaled by a power of ten before the
/// sums of squares are taken.
const RESCALE_ABOVE: Decimal = dec!(1000000000);

/// Fit `y = intercept + slope·x` over `x = 0..n-1`.
///
/// Fewer than two points give a flat line through the single point (or
/// zero) with `r_squared = 0`. A perfectly flat series of two or more
/// points is fully explained and gets `r_squared = 1`. Large series are
/// fitted in units of a power of ten; if the sums still overflow the
/// result is a flat line through the mean with `r_squared = 0`.
pub fn fit_trend(series: &[Decimal]) -> TrendFit {
    let n = series.len();
    if n < 2 {
        return TrendFit {
            slope: Decimal::ZERO,
            intercept: series.first().copied().unwrap_or(Decimal::ZERO),
            r_squared: Decimal::ZERO,
        };
    }

    let scale = power_of_ten_scale(series);
    let unit: Vec<Decimal> = series.iter().map(|y| *y / scale).collect();

    fit_unit(&unit)
        .and_then(|fit| {
            Some(TrendFit {
                slope: fit.slope.checked_mul(scale)?,
                intercept: fit.intercept.checked_mul(scale)?,
                r_squared: fit.r_squared,
            })
        })
        .unwrap_or_else(|| {
            warn!(points = n, "trend sums overflowed, returning a flat fit");
            let mean = unit.iter().map(|y| *y / Decimal::from(n as u64)).sum::<Decimal>();
            TrendFit {
                slope: Decimal::ZERO,
                intercept: mean.checked_mul(scale).unwrap_or(series[n - 1]),
                r_squared: Decimal::ZERO,
            }
        })
}

/// `10^k` bringing the largest magnitude under [`RESCALE_ABOVE`]; 1 for
/// ordinary series, so their fit is exact.
fn power_of_ten_scale(series: &[Decimal]) -> Decimal {
    let max_abs = series.iter().map(|y| y.abs()).max().unwrap_or(Decimal::ZERO);
    let mut scale = Decimal::ONE;
    while max_abs / scale > RESCALE_ABOVE {
        scale *= Decimal::TEN;
    }
    scale
}

fn fit_unit(series: &[Decimal]) -> Option<TrendFit> {
    let n = series.len();
    let n_dec = Decimal::from(n as u64);
    let x_bar = Decimal::from((n - 1) as u64) / dec!(2);
    let y_bar = series
        .iter()
        .try_fold(Decimal::ZERO, |acc, y| acc.checked_add(*y))?
        / n_dec;

    let mut s_xy = Decimal::ZERO;
    let mut s_xx = Decimal::ZERO;
    let mut ss_tot = Decimal::ZERO;
    for (i, y) in series.iter().enumerate() {
        let dx = Decimal::from(i as u64) - x_bar;
        let dy = y.checked_sub(y_bar)?;
        s_xy = s_xy.checked_add(dx.checked_mul(dy)?)?;
        s_xx = s_xx.checked_add(dx.checked_mul(dx)?)?;
        ss_tot = ss_tot.checked_add(dy.checked_mul(dy)?)?;
    }

    // s_xx > 0 whenever n >= 2
    let slope = s_xy.checked_div(s_xx)?;
    let intercept = y_bar.checked_sub(slope.checked_mul(x_bar)?)?;

    let r_squared = if ss_tot.is_zero() {
        Decimal::ONE
    } else {
        let mut ss_res = Decimal::ZERO;
        for (i, y) in series.iter().enumerate() {
            let fitted = intercept.checked_add(slope.checked_mul(Decimal::from(i as u64))?)?;
            let resid = y.checked_sub(fitted)?;
            ss_res = ss_res.checked_add(resid.checked_mul(resid)?)?;
        }
        (Decimal::ONE - ss_res.checked_div(ss_tot)?).clamp(Decimal::ZERO, Decimal::ONE)
    };

    Some(TrendFit {
        slope,
        intercept,
        r_squared,
    })
}

impl TrendFit {
    /// Saturates to the intercept if the line leaves the decimal range.
    pub fn value_at(&self, x: u64) -> Decimal {
        self.slope
            .checked_mul(Decimal::from(x))
            .and_then(|v| v.checked_add(self.intercept))
            .unwrap_or(self.intercept)
    }

    /// Value `steps_ahead` periods past the last of `n` observations.
    pub fn project(&self, n: usize, steps_ahead: u32) -> Decimal {
        let last = (n as u64).saturating_sub(1);
        self.value_at(last + u64::from(steps_ahead))
    }

    /// In-sample mean absolute percentage error over the non-zero
    /// observations; 100 when there are none.
    pub fn mean_absolute_percentage_error(&self, series: &[Decimal]) -> Decimal {
        let errors: Vec<Decimal> = series
            .iter()
            .enumerate()
            .filter(|(_, y)| !y.is_zero())
            .map(|(i, y)| ((*y - self.value_at(i as u64)) / *y).abs())
            .collect();
        if errors.is_empty() {
            return Decimal::ONE_HUNDRED;
        }
        errors.iter().copied().sum::<Decimal>() / Decimal::from(errors.len() as u64)
            * Decimal::ONE_HUNDRED
    }

    pub fn direction(&self, series: &[Decimal]) -> TrendDirection {
        if series.len() < 2 {
            return TrendDirection::InsufficientData;
        }
        let n = Decimal::from(series.len() as u64);
        let mean = series.iter().map(|y| *y / n).sum::<Decimal>();
        if self.slope.is_zero() || self.slope.abs() < mean.abs() * STABLE_SLOPE_SHARE {
            TrendDirection::Stable
        } else if self.slope > Decimal::ZERO {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope function
// ---------------------------------------------------------------------------

fn default_steps_ahead() -> u32 {
    1
}

/// Input for fitting a trend to an arbitrary evenly spaced series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendInput {
    pub series: Vec<Decimal>,
    #[serde(default = "default_steps_ahead")]
    pub steps_ahead: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendOutput {
    pub fit: TrendFit,
    pub projection: Decimal,
    pub direction: TrendDirection,
    pub mape_pct: Decimal,
    pub data_points: usize,
}

pub fn analyze_trend(input: &TrendInput) -> BenchmarkResult<ComputationOutput<TrendOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.series.is_empty() {
        return Err(BenchmarkError::InsufficientData(
            "Trend series must contain at least one observation".into(),
        ));
    }
    if input.series.len() < 3 {
        warnings.push(format!(
            "Only {} observations; the fitted trend is not reliable",
            input.series.len()
        ));
    }

    let fit = fit_trend(&input.series);
    let output = TrendOutput {
        fit,
        projection: round_dp(fit.project(input.series.len(), input.steps_ahead), 4),
        direction: fit.direction(&input.series),
        mape_pct: round_dp(fit.mean_absolute_percentage_error(&input.series), 2),
        data_points: input.series.len(),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Ordinary least-squares linear trend over evenly spaced periods",
        &serde_json::json!({
            "x_axis": "period index 0..n-1",
            "steps_ahead": input.steps_ahead,
            "stable_band": "|slope| < 1% of |mean|",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn series(values: &[i64]) -> Vec<Decimal> {
        values.iter().map(|v| Decimal::from(*v)).collect()
    }

    #[test]
    fn test_perfect_line() {
        let fit = fit_trend(&series(&[10, 20, 30, 40, 50]));
        assert_eq!(fit.slope, dec!(10));
        assert_eq!(fit.intercept, dec!(10));
        assert_eq!(fit.r_squared, Decimal::ONE);
    }

    #[test]
    fn test_degenerate_series() {
        let empty = fit_trend(&[]);
        assert_eq!(empty.slope, Decimal::ZERO);
        assert_eq!(empty.intercept, Decimal::ZERO);
        assert_eq!(empty.r_squared, Decimal::ZERO);

        let single = fit_trend(&[dec!(42.5)]);
        assert_eq!(single.slope, Decimal::ZERO);
        assert_eq!(single.intercept, dec!(42.5));
        assert_eq!(single.r_squared, Decimal::ZERO);
    }

    #[test]
    fn test_flat_series_is_fully_explained() {
        let fit = fit_trend(&series(&[7, 7, 7, 7]));
        assert_eq!(fit.slope, Decimal::ZERO);
        assert_eq!(fit.intercept, dec!(7));
        assert_eq!(fit.r_squared, Decimal::ONE);
        assert_eq!(fit.direction(&series(&[7, 7, 7, 7])), TrendDirection::Stable);
    }

    #[test]
    fn test_noisy_series_r_squared_in_unit_interval() {
        let data = series(&[12, 9, 15, 11, 18, 14]);
        let fit = fit_trend(&data);
        assert!(fit.slope > Decimal::ZERO);
        assert!(fit.r_squared > Decimal::ZERO && fit.r_squared < Decimal::ONE);
    }

    #[test]
    fn test_projection() {
        let data = series(&[10, 20, 30, 40, 50]);
        let fit = fit_trend(&data);
        assert_eq!(fit.project(data.len(), 1), dec!(60));
        assert_eq!(fit.project(data.len(), 3), dec!(80));
    }

    #[test]
    fn test_direction_bands() {
        let up = series(&[100, 110, 120]);
        assert_eq!(fit_trend(&up).direction(&up), TrendDirection::Increasing);
        let down = series(&[120, 110, 100]);
        assert_eq!(fit_trend(&down).direction(&down), TrendDirection::Decreasing);
        // slope 0.5 against a mean near 1000 is under 1%
        let drift = vec![dec!(1000), dec!(1000.5), dec!(1001)];
        assert_eq!(fit_trend(&drift).direction(&drift), TrendDirection::Stable);
    }

    #[test]
    fn test_national_scale_series_does_not_overflow() {
        let data = vec![dec!(0), dec!(1000000000000000), dec!(2000000000000000)];
        let fit = fit_trend(&data);
        assert_eq!(fit.slope, dec!(1000000000000000));
        assert_eq!(fit.intercept, Decimal::ZERO);
        assert_eq!(fit.r_squared, Decimal::ONE);
        assert_eq!(fit.project(data.len(), 1), dec!(3000000000000000));

        let noisy = vec![
            dec!(4200000000000000),
            dec!(4350000000000000),
            dec!(4280000000000000),
            dec!(4510000000000000),
        ];
        let fit = fit_trend(&noisy);
        assert!(fit.slope > Decimal::ZERO);
        assert!(fit.r_squared >= Decimal::ZERO && fit.r_squared <= Decimal::ONE);
        assert_eq!(fit.direction(&noisy), TrendDirection::Increasing);
    }

    #[test]
    fn test_near_max_values_fall_back_to_flat_fit() {
        let data = vec![Decimal::MAX, Decimal::MIN, Decimal::MAX];
        let fit = fit_trend(&data);
        assert!(fit.r_squared <= Decimal::ONE);
        let _ = fit.project(data.len(), 1);
        let _ = fit.direction(&data);
    }

    #[test]
    fn test_mape() {
        let data = series(&[10, 20, 30, 40, 50]);
        assert_eq!(fit_trend(&data).mean_absolute_percentage_error(&data), Decimal::ZERO);
        let zeros = series(&[0, 0, 0]);
        assert_eq!(
            fit_trend(&zeros).mean_absolute_percentage_error(&zeros),
            Decimal::ONE_HUNDRED
        );
    }

    #[test]
    fn test_analyze_trend_envelope() {
        let out = analyze_trend(&TrendInput {
            series: series(&[3, 5]),
            steps_ahead: 2,
        })
        .unwrap();
        assert_eq!(out.result.projection, dec!(9));
        assert_eq!(out.result.direction, TrendDirection::Increasing);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_analyze_trend_rejects_empty_series() {
        let err = analyze_trend(&TrendInput {
            series: vec![],
            steps_ahead: 1,
        })
        .unwrap_err();
        assert!(matches!(err, BenchmarkError::InsufficientData(_)));
    }
}
