//! Gamma-weighted depth averaging
//!
//! TEX86-style proxy temperatures integrate over the depth habitat of the
//! source organisms. Following Tierney & Tingley (2015), the habitat is
//! modeled as a gamma distribution over depth: each model layer is weighted
//! by the distribution's probability mass between the layer's top and bottom
//! boundaries, and the field is averaged over depth with those weights.
//!
//! Layers that are missing (NaN, e.g. below the sea floor) are excluded and
//! the remaining weights renormalized per grid point, so valid weights always
//! sum to 1. A missing topmost layer marks the whole column as land and
//! forces the average to missing.

use crate::errors::{PaleovarError, Result};
use ndarray::{ArrayD, Axis};
use statrs::distribution::{ContinuousCDF, Gamma};

/// Gamma shape parameter of the depth habitat model.
pub const GAMMA_SHAPE: f64 = 4.5;

/// Gamma scale parameter in cm. The calibration is 15 m; CCSM and CESM ocean
/// depth coordinates are in cm, hence the factor 100.
pub const GAMMA_SCALE_CM: f64 = 15.0 * 100.0;

/// Probability mass of the depth habitat within each model layer.
///
/// `z_w_top` and `z_w_bot` are the boundary depths (cm, positive down) of
/// each layer: weight = CDF(bottom) - CDF(top).
pub fn gamma_layer_weights(z_w_top: &[f64], z_w_bot: &[f64]) -> Result<Vec<f64>> {
    if z_w_top.len() != z_w_bot.len() {
        return Err(PaleovarError::ShapeMismatch {
            message: format!(
                "layer tops ({}) and bottoms ({}) differ in length",
                z_w_top.len(),
                z_w_bot.len()
            ),
        });
    }

    // statrs parameterizes by rate, the reciprocal of the scale.
    let habitat = Gamma::new(GAMMA_SHAPE, 1.0 / GAMMA_SCALE_CM)
        .map_err(|e| PaleovarError::Generic(format!("gamma distribution: {}", e)))?;

    Ok(z_w_top
        .iter()
        .zip(z_w_bot)
        .map(|(&top, &bot)| habitat.cdf(bot) - habitat.cdf(top))
        .collect())
}

/// Weighted mean of `data` along `depth_axis` using per-layer `weights`.
///
/// Weights are renormalized at every point over the valid (non-NaN) layers
/// only; accumulation is in f64, the result is stored as f32. Any point
/// whose topmost layer is missing comes out missing, even when deeper layers
/// would yield a finite weighted sum.
///
/// # Errors
///
/// Returns an invalid-configuration error when `weights` does not match the
/// depth-axis length, or when `depth_axis` is out of bounds.
pub fn gamma_weighted_mean(
    data: &ArrayD<f32>,
    depth_axis: usize,
    weights: &[f64],
) -> Result<ArrayD<f32>> {
    if depth_axis >= data.ndim() {
        return Err(PaleovarError::InvalidConfig {
            message: format!(
                "depth axis {} out of bounds for array with {} dimensions",
                depth_axis,
                data.ndim()
            ),
        });
    }
    if weights.len() != data.shape()[depth_axis] {
        return Err(PaleovarError::InvalidConfig {
            message: format!(
                "{} layer weights for depth axis of length {}",
                weights.len(),
                data.shape()[depth_axis]
            ),
        });
    }

    let result = data.map_axis(Axis(depth_axis), |column| {
        if column.is_empty() || column[0].is_nan() {
            return f32::NAN;
        }

        let mut weighted_sum = 0.0_f64;
        let mut weight_total = 0.0_f64;
        for (k, &value) in column.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            weighted_sum += f64::from(value) * weights[k];
            weight_total += weights[k];
        }

        if weight_total > 0.0 {
            #[allow(clippy::cast_possible_truncation)]
            {
                (weighted_sum / weight_total) as f32
            }
        } else {
            f32::NAN
        }
    });

    Ok(result)
}
