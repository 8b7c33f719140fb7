//! Goodness-of-fit metrics between observed and simulated discharge.
//!
//! All metrics take observed and simulated slices of equal, non-zero length
//! and return a scalar score.
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StreamError};

fn check(observed: &[f64], simulated: &[f64]) -> Result<()> {
    if observed.len() != simulated.len() {
        return Err(StreamError::LengthMismatch {
            expected: observed.len(),
            found: simulated.len(),
        });
    }
    if observed.is_empty() {
        return Err(StreamError::InvalidInput(
            "cannot score empty series".to_string(),
        ));
    }
    Ok(())
}

/// Nash-Sutcliffe Efficiency. Range: (-inf, 1], 1 = perfect.
pub fn nse(observed: &[f64], simulated: &[f64]) -> Result<f64> {
    check(observed, simulated)?;
    let n = observed.len();
    let mean_obs: f64 = observed.iter().sum::<f64>() / n as f64;
    let numerator: f64 = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .sum();
    let denominator: f64 = observed.iter().map(|o| (o - mean_obs).powi(2)).sum();
    if denominator == 0.0 {
        return Ok(f64::NEG_INFINITY);
    }
    Ok(1.0 - numerator / denominator)
}

/// Log-transformed NSE. Uses log(x + 0.01) to avoid log(0).
pub fn log_nse(observed: &[f64], simulated: &[f64]) -> Result<f64> {
    check(observed, simulated)?;
    let log_obs: Vec<f64> = observed.iter().map(|o| (o + 0.01).ln()).collect();
    let log_sim: Vec<f64> = simulated.iter().map(|s| (s + 0.01).ln()).collect();
    nse(&log_obs, &log_sim)
}

/// Kling-Gupta Efficiency. Range: (-inf, 1], 1 = perfect.
pub fn kge(observed: &[f64], simulated: &[f64]) -> Result<f64> {
    check(observed, simulated)?;
    let n = observed.len() as f64;
    let mean_o = observed.iter().sum::<f64>() / n;
    let mean_s = simulated.iter().sum::<f64>() / n;
    let std_o = std_dev(observed, mean_o);
    let std_s = std_dev(simulated, mean_s);

    let r = if std_o == 0.0 || std_s == 0.0 {
        0.0
    } else {
        observed
            .iter()
            .zip(simulated)
            .map(|(o, s)| (o - mean_o) * (s - mean_s))
            .sum::<f64>()
            / (n * std_o * std_s)
    };
    let alpha = if std_o == 0.0 { 0.0 } else { std_s / std_o };
    let beta = if mean_o == 0.0 { 0.0 } else { mean_s / mean_o };

    Ok(1.0 - ((r - 1.0).powi(2) + (alpha - 1.0).powi(2) + (beta - 1.0).powi(2)).sqrt())
}

fn std_dev(values: &[f64], mean: f64) -> f64 {
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Percent Bias. Optimal = 0. Positive = overestimation.
pub fn pbias(observed: &[f64], simulated: &[f64]) -> Result<f64> {
    check(observed, simulated)?;
    let sum_obs: f64 = observed.iter().sum();
    if sum_obs == 0.0 {
        return Ok(f64::INFINITY);
    }
    let diff_sum: f64 = simulated
        .iter()
        .zip(observed)
        .map(|(s, o)| s - o)
        .sum();
    Ok(100.0 * diff_sum / sum_obs)
}

/// Root Mean Square Error. Range: [0, inf), 0 = perfect.
pub fn rmse(observed: &[f64], simulated: &[f64]) -> Result<f64> {
    check(observed, simulated)?;
    let n = observed.len() as f64;
    let mse: f64 = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .sum::<f64>()
        / n;
    Ok(mse.sqrt())
}

/// Mean Absolute Error. Range: [0, inf), 0 = perfect.
pub fn mae(observed: &[f64], simulated: &[f64]) -> Result<f64> {
    check(observed, simulated)?;
    let n = observed.len() as f64;
    Ok(observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).abs())
        .sum::<f64>()
        / n)
}

/// NSE of a simulated discharge series, ignoring the first `warmup` values
/// of both series.
pub fn nash_sutcliffe(simulated: &[f64], observed: &[f64], warmup: usize) -> Result<f64> {
    if simulated.len() != observed.len() {
        return Err(StreamError::LengthMismatch {
            expected: simulated.len(),
            found: observed.len(),
        });
    }
    if warmup >= simulated.len() {
        return Err(StreamError::InvalidInput(format!(
            "{warmup} warm-up months leave nothing of a {}-month series to score",
            simulated.len()
        )));
    }
    nse(&observed[warmup..], &simulated[warmup..])
}

/// Metric selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Nse,
    LogNse,
    Kge,
    Pbias,
    Rmse,
    Mae,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Nse,
        Metric::LogNse,
        Metric::Kge,
        Metric::Pbias,
        Metric::Rmse,
        Metric::Mae,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Nse => "nse",
            Metric::LogNse => "log-nse",
            Metric::Kge => "kge",
            Metric::Pbias => "pbias",
            Metric::Rmse => "rmse",
            Metric::Mae => "mae",
        }
    }

    pub fn evaluate(&self, observed: &[f64], simulated: &[f64]) -> Result<f64> {
        match self {
            Metric::Nse => nse(observed, simulated),
            Metric::LogNse => log_nse(observed, simulated),
            Metric::Kge => kge(observed, simulated),
            Metric::Pbias => pbias(observed, simulated),
            Metric::Rmse => rmse(observed, simulated),
            Metric::Mae => mae(observed, simulated),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Metric::ALL
            .into_iter()
            .find(|m| m.name() == normalized)
            .ok_or_else(|| StreamError::UnknownVariable {
                name: s.to_string(),
                available: Metric::ALL.iter().map(|m| m.name().to_string()).collect(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // --- NSE tests ---

    #[test]
    fn nse_perfect_match() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(nse(&obs, &sim).unwrap(), 1.0);
    }

    #[test]
    fn nse_mean_simulation_gives_zero() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mean = 3.0;
        let sim = [mean; 5];
        assert_relative_eq!(nse(&obs, &sim).unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn nse_constant_observed_returns_neg_inf() {
        let obs = [5.0; 5];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(nse(&obs, &sim).unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    fn nse_poor_simulation_negative() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [5.0, 4.0, 3.0, 2.0, 1.0];
        assert!(nse(&obs, &sim).unwrap() < 0.0);
    }

    #[test]
    fn nse_known_value() {
        // obs = [1,2,3,4,5], sim = [1.1, 2.2, 2.8, 4.1, 4.9]
        // mean_obs = 3.0
        // num = (0.1^2 + 0.2^2 + 0.2^2 + 0.1^2 + 0.1^2) = 0.01+0.04+0.04+0.01+0.01 = 0.11
        // den = (4+1+0+1+4) = 10
        // NSE = 1 - 0.11/10 = 0.989
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [1.1, 2.2, 2.8, 4.1, 4.9];
        assert_relative_eq!(nse(&obs, &sim).unwrap(), 0.989, epsilon = 1e-10);
    }

    // --- Log NSE tests ---

    #[test]
    fn log_nse_perfect_match() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(log_nse(&obs, &sim).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn log_nse_constant_observed_returns_neg_inf() {
        let obs = [1.0; 5];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(log_nse(&obs, &sim).unwrap(), f64::NEG_INFINITY);
    }

    #[test]
    fn log_nse_handles_zeros() {
        let obs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let sim = [0.0, 1.0, 2.0, 3.0, 4.0];
        let result = log_nse(&obs, &sim).unwrap();
        assert!(result.is_finite());
        assert_relative_eq!(result, 1.0, epsilon = 1e-10);
    }

    // --- KGE tests ---

    #[test]
    fn kge_perfect_match() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(kge(&obs, &sim).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn kge_bias_reduces_score() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [2.0, 3.0, 4.0, 5.0, 6.0];
        assert!(kge(&obs, &sim).unwrap() < 1.0);
    }

    #[test]
    fn kge_variability_reduces_score() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [2.0, 2.5, 3.0, 3.5, 4.0];
        assert!(kge(&obs, &sim).unwrap() < 1.0);
    }

    #[test]
    fn kge_zero_variance_observed() {
        let obs = [3.0; 5];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        let result = kge(&obs, &sim).unwrap();
        assert!(result.is_finite());
    }

    // --- PBIAS tests ---

    #[test]
    fn pbias_perfect_match() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(pbias(&obs, &sim).unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn pbias_overestimation_positive() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [2.0, 3.0, 4.0, 5.0, 6.0];
        assert!(pbias(&obs, &sim).unwrap() > 0.0);
    }

    #[test]
    fn pbias_underestimation_negative() {
        let obs = [2.0, 3.0, 4.0, 5.0, 6.0];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(pbias(&obs, &sim).unwrap() < 0.0);
    }

    #[test]
    fn pbias_zero_observed_returns_inf() {
        let obs = [0.0; 5];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(pbias(&obs, &sim).unwrap(), f64::INFINITY);
    }

    #[test]
    fn pbias_known_value() {
        // obs = [10, 20, 30], sim = [12, 22, 28]
        // diff = 2 + 2 - 2 = 2
        // sum_obs = 60
        // pbias = 100 * 2 / 60 = 3.333...
        let obs = [10.0, 20.0, 30.0];
        let sim = [12.0, 22.0, 28.0];
        assert_relative_eq!(pbias(&obs, &sim).unwrap(), 100.0 * 2.0 / 60.0, epsilon = 1e-10);
    }

    // --- RMSE tests ---

    #[test]
    fn rmse_perfect_match() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(rmse(&obs, &sim).unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn rmse_constant_error() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [2.0, 3.0, 4.0, 5.0, 6.0];
        assert_relative_eq!(rmse(&obs, &sim).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn rmse_always_nonnegative() {
        let obs = [1.0, 2.0, 3.0];
        let sim = [5.0, 1.0, 2.0];
        assert!(rmse(&obs, &sim).unwrap() >= 0.0);
    }

    #[test]
    fn rmse_known_value() {
        // obs = [1,2,3], sim = [1,2,4] -> errors = [0,0,1] -> mse = 1/3 -> rmse = sqrt(1/3)
        let obs = [1.0, 2.0, 3.0];
        let sim = [1.0, 2.0, 4.0];
        assert_relative_eq!(rmse(&obs, &sim).unwrap(), (1.0_f64 / 3.0).sqrt(), epsilon = 1e-10);
    }

    // --- MAE tests ---

    #[test]
    fn mae_perfect_match() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(mae(&obs, &sim).unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn mae_constant_error() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let sim = [2.0, 3.0, 4.0, 5.0, 6.0];
        assert_relative_eq!(mae(&obs, &sim).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn mae_symmetric_error() {
        let obs = [2.0, 2.0];
        let sim = [1.0, 3.0];
        assert_relative_eq!(mae(&obs, &sim).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn mae_always_nonnegative() {
        let obs = [1.0, 2.0, 3.0];
        let sim = [5.0, 1.0, 2.0];
        assert!(mae(&obs, &sim).unwrap() >= 0.0);
    }

    // --- Validation and warm-up ---

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(matches!(
            nse(&[1.0, 2.0], &[1.0]),
            Err(StreamError::LengthMismatch { expected: 2, found: 1 })
        ));
        assert!(rmse(&[], &[]).is_err());
    }

    #[test]
    fn nash_sutcliffe_skips_warmup() {
        // The first two values would ruin the score.
        let sim = [100.0, -50.0, 1.0, 2.0, 3.0];
        let obs = [0.0, 0.0, 1.0, 2.0, 3.0];
        assert_relative_eq!(nash_sutcliffe(&sim, &obs, 2).unwrap(), 1.0);
        assert!(nash_sutcliffe(&sim, &obs, 0).unwrap() < 0.0);
    }

    #[test]
    fn nash_sutcliffe_warmup_too_long() {
        assert!(nash_sutcliffe(&[1.0, 2.0], &[1.0, 2.0], 2).is_err());
    }

    #[test]
    fn metric_names_roundtrip() {
        for m in Metric::ALL {
            assert_eq!(m.to_string().parse::<Metric>().unwrap(), m);
        }
        assert_eq!("LOG_NSE".parse::<Metric>().unwrap(), Metric::LogNse);
        assert!("r2".parse::<Metric>().is_err());
    }

    #[test]
    fn metric_evaluate_dispatches() {
        let obs = [1.0, 2.0, 3.0];
        let sim = [1.0, 2.0, 4.0];
        assert_relative_eq!(
            Metric::Rmse.evaluate(&obs, &sim).unwrap(),
            rmse(&obs, &sim).unwrap()
        );
    }
}
