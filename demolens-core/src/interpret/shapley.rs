//! Shapley attribution over input units.
//!
//! Units are players; a coalition is the set of units that keep their
//! original state. Small games are solved exactly by enumerating every
//! coalition, larger ones by averaging marginal contributions over seeded
//! random permutations.

use crate::config::InterpretationConfig;
use crate::error::{ConfigError, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Largest unit count exact enumeration accepts, whatever the configured threshold.
pub const MAX_EXACT_UNITS: usize = 20;

/// Shapley value of each of `units` players under `value`.
///
/// `value` receives a keep-mask with one entry per unit. Exact enumeration
/// is used up to `config.shapley_exact_max_units` units, capped at
/// [`MAX_EXACT_UNITS`].
pub fn shapley_values<F>(units: usize, config: &InterpretationConfig, value: F) -> Result<Vec<f64>>
where
    F: FnMut(&[bool]) -> Result<f64>,
{
    if units == 0 {
        return Ok(Vec::new());
    }
    if units <= config.shapley_exact_max_units.min(MAX_EXACT_UNITS) {
        exact(units, value)
    } else {
        let permutations = (config.shapley_samples_per_unit * units as f64).ceil().max(1.0) as usize;
        sampled(units, permutations, config.seed, value)
    }
}

fn mask_of(bits: usize, units: usize) -> Vec<bool> {
    (0..units).map(|i| bits & (1 << i) != 0).collect()
}

/// Exact Shapley values by enumerating all `2^units` coalitions.
///
/// Fails for more than [`MAX_EXACT_UNITS`] units.
pub fn exact<F>(units: usize, mut value: F) -> Result<Vec<f64>>
where
    F: FnMut(&[bool]) -> Result<f64>,
{
    if units > MAX_EXACT_UNITS {
        return Err(ConfigError::InvalidParameter {
            component: "shapley".into(),
            parameter: "units".into(),
            reason: format!("exact enumeration supports at most {MAX_EXACT_UNITS} units, got {units}"),
        }
        .into());
    }
    if units == 0 {
        return Ok(Vec::new());
    }
    let coalitions = 1usize << units;
    let values = (0..coalitions)
        .map(|bits| value(&mask_of(bits, units)))
        .collect::<Result<Vec<f64>>>()?;

    // weight[s] = s! (n - s - 1)! / n!
    let n = units as f64;
    let mut weights = vec![0.0; units];
    weights[0] = 1.0 / n;
    for s in 1..units {
        weights[s] = weights[s - 1] * s as f64 / (n - s as f64);
    }

    let mut phi = vec![0.0; units];
    for (i, contribution) in phi.iter_mut().enumerate() {
        let bit = 1 << i;
        for bits in (0..coalitions).filter(|b| b & bit == 0) {
            let size = bits.count_ones() as usize;
            *contribution += weights[size] * (values[bits | bit] - values[bits]);
        }
    }
    Ok(phi)
}

/// Monte-Carlo Shapley values from `permutations` seeded random orderings.
pub fn sampled<F>(units: usize, permutations: usize, seed: u64, mut value: F) -> Result<Vec<f64>>
where
    F: FnMut(&[bool]) -> Result<f64>,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<usize> = (0..units).collect();
    let mut phi = vec![0.0; units];
    let empty = value(&vec![false; units])?;
    for _ in 0..permutations {
        order.shuffle(&mut rng);
        let mut mask = vec![false; units];
        let mut previous = empty;
        for &unit in &order {
            mask[unit] = true;
            let current = value(&mask)?;
            phi[unit] += current - previous;
            previous = current;
        }
    }
    let count = permutations.max(1) as f64;
    Ok(phi.into_iter().map(|p| p / count).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DemoError;

    fn config(exact_max: usize) -> InterpretationConfig {
        InterpretationConfig {
            shapley_exact_max_units: exact_max,
            ..InterpretationConfig::default()
        }
    }

    /// v(S) = 3 * [0 in S] + [1 in S] * [2 in S]
    fn game(mask: &[bool]) -> Result<f64> {
        let on = |i: usize| if mask[i] { 1.0 } else { 0.0 };
        Ok(3.0 * on(0) + on(1) * on(2))
    }

    #[test]
    fn test_exact_known_game() {
        let phi = exact(3, game).unwrap();
        assert!((phi[0] - 3.0).abs() < 1e-12);
        assert!((phi[1] - 0.5).abs() < 1e-12);
        assert!((phi[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_exact_efficiency() {
        let weights = [0.3, -1.2, 2.5, 0.0, 4.1];
        let v = |mask: &[bool]| -> Result<f64> {
            let linear: f64 = mask.iter().zip(weights).filter(|(m, _)| **m).map(|(_, w)| w).sum();
            let interaction = if mask[0] && mask[4] { 1.5 } else { 0.0 };
            Ok(linear + interaction)
        };
        let phi = exact(5, v).unwrap();
        let total: f64 = phi.iter().sum();
        let full = v(&[true; 5]).unwrap();
        let none = v(&[false; 5]).unwrap();
        assert!((total - (full - none)).abs() < 1e-9);
        assert!((phi[1] + 1.2).abs() < 1e-9);
        assert!((phi[0] - (0.3 + 0.75)).abs() < 1e-9);
    }

    #[test]
    fn test_sampled_is_reproducible_and_efficient() {
        let a = sampled(3, 10, 7, game).unwrap();
        let b = sampled(3, 10, 7, game).unwrap();
        assert_eq!(a, b);
        // Every permutation distributes exactly v(all) - v(none).
        assert!((a.iter().sum::<f64>() - 4.0).abs() < 1e-9);
        assert!((a[0] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_selects_strategy() {
        let mut calls = 0;
        shapley_values(3, &config(12), |mask| {
            calls += 1;
            game(mask)
        })
        .unwrap();
        assert_eq!(calls, 8);

        let mut calls = 0;
        shapley_values(3, &config(2), |mask| {
            calls += 1;
            game(mask)
        })
        .unwrap();
        // one empty coalition plus ceil(2.0 * 3) permutations of 3 steps
        assert_eq!(calls, 1 + 6 * 3);
    }

    #[test]
    fn test_oversized_threshold_falls_back_to_sampling() {
        let units = 64;
        let mut calls = 0;
        let phi = shapley_values(units, &config(64), |mask| {
            calls += 1;
            Ok(mask.iter().filter(|m| **m).count() as f64)
        })
        .unwrap();
        assert_eq!(phi.len(), units);
        assert_eq!(calls, 1 + 2 * units * units);
        assert!((phi.iter().sum::<f64>() - units as f64).abs() < 1e-9);
    }

    #[test]
    fn test_exact_rejects_too_many_units() {
        let result = exact(MAX_EXACT_UNITS + 1, game);
        assert!(matches!(
            result,
            Err(DemoError::Config(ConfigError::InvalidParameter { .. }))
        ));
    }

    #[test]
    fn test_errors_propagate() {
        let result = exact(2, |_| Err(DemoError::invalid_value("test", "boom")));
        assert!(result.is_err());
        assert!(shapley_values(0, &config(12), game).unwrap().is_empty());
    }
}
