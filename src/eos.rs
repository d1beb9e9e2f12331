//! Seawater equation-of-state conversions
//!
//! Pressure from depth follows Saunders (1981). The potential-temperature
//! algorithm is UNESCO 1983 (Fofonoff & Millard): the Bryden (1973) adiabatic
//! lapse-rate polynomial integrated with a 4-stage Runge-Kutta scheme.
//! Running the integration from reference pressure 0 dbar to the ambient
//! pressure inverts model potential temperature into in-situ temperature.
//!
//! Depths in iCESM ocean output are in centimeters, positive down; callers
//! convert to meters before the pressure computation.

use crate::errors::{PaleovarError, Result};
use ndarray::ArrayD;
use rayon::prelude::*;

/// Sea pressure (dbar) from depth (m, positive down) and latitude (degrees).
///
/// Saunders (1981) latitude-dependent approximation.
pub fn pressure_from_depth(depth_m: f64, lat_deg: f64) -> f64 {
    let sin_lat = lat_deg.to_radians().sin();
    let c1 = 5.92e-3 + 5.25e-3 * sin_lat * sin_lat;
    ((1.0 - c1) - ((1.0 - c1) * (1.0 - c1) - 8.84e-6 * depth_m).sqrt()) / 4.42e-6
}

/// Adiabatic temperature gradient (deg C per dbar), Bryden (1973) polynomial
/// as given in UNESCO Technical Paper 44.
fn adiabatic_lapse_rate(s: f64, t: f64, p: f64) -> f64 {
    let ds = s - 35.0;

    3.5803e-5
        + (8.5258e-6 + (-6.836e-8 + 6.6228e-10 * t) * t) * t
        + (1.8932e-6 - 4.2393e-8 * t) * ds
        + ((1.8741e-8 + (-6.7795e-10 + (8.733e-12 - 5.4481e-14 * t) * t) * t)
            + (-1.1351e-10 + 2.7759e-12 * t) * ds)
            * p
        + (-4.6206e-13 + (1.8676e-14 - 2.1687e-16 * t) * t) * p * p
}

/// Potential temperature (deg C) of a parcel with in-situ temperature `t` at
/// pressure `p`, referenced to pressure `p_ref`.
///
/// Fofonoff & Millard (1983) Runge-Kutta integration of the adiabatic
/// lapse rate. Check value: theta(S=40, T=40, p=10000, p_ref=0) = 36.89073.
pub fn potential_temperature(s: f64, t: f64, p: f64, p_ref: f64) -> f64 {
    let dp = p_ref - p;

    let mut dt = dp * adiabatic_lapse_rate(s, t, p);
    let mut th = t + 0.5 * dt;
    let mut q = dt;

    dt = dp * adiabatic_lapse_rate(s, th, p + 0.5 * dp);
    th += 0.29289322 * (dt - q);
    q = 0.58578644 * dt + 0.121320344 * q;

    dt = dp * adiabatic_lapse_rate(s, th, p + 0.5 * dp);
    th += 1.707106781 * (dt - q);
    q = 3.414213562 * dt - 4.121320344 * q;

    dt = dp * adiabatic_lapse_rate(s, th, p + dp);
    th + (dt - 2.0 * q) / 6.0
}

/// In-situ temperature (deg C) at pressure `p` (dbar) from model potential
/// temperature `theta` (referenced to the surface) and salinity `s`.
pub fn insitu_from_potential(theta: f64, s: f64, p: f64) -> f64 {
    potential_temperature(s, theta, 0.0, p)
}

/// Sea pressure at every (depth, horizontal) grid point.
///
/// `z_t_cm` holds layer midpoint depths in cm (positive down); `lat` holds
/// latitude in degrees on the horizontal grid. The result has shape
/// `[z_t_cm.len(), ..lat.shape()]` and is broadcast over time by the caller.
pub fn pressure_field(z_t_cm: &[f64], lat: &ArrayD<f64>) -> Result<ArrayD<f64>> {
    let mut shape = vec![z_t_cm.len()];
    shape.extend_from_slice(lat.shape());

    let lat_vals: Vec<f64> = lat.iter().copied().collect();
    let mut values = Vec::with_capacity(z_t_cm.len() * lat_vals.len());
    for &z_cm in z_t_cm {
        // cm -> m; depth is positive down so no sign flip is needed here.
        let depth_m = z_cm * 0.01;
        for &lat_deg in &lat_vals {
            values.push(pressure_from_depth(depth_m, lat_deg));
        }
    }

    Ok(ArrayD::from_shape_vec(shape, values)?)
}

/// Convert a (time, depth, ...) potential temperature field to in-situ
/// temperature, elementwise against salinity and the precomputed pressure
/// field.
///
/// NaN in either input propagates to the output. `time_chunks` bounds how
/// finely the work is split: each parallel job covers at least that many time
/// steps, so chunked evaluation stays equivalent to the eager result.
///
/// # Errors
///
/// Returns a shape mismatch error when the temperature and salinity fields
/// disagree, or when the pressure field does not match their spatial shape.
pub fn insitu_field(
    theta: &ArrayD<f32>,
    salt: &ArrayD<f32>,
    pressure: &ArrayD<f64>,
    time_chunks: usize,
) -> Result<ArrayD<f32>> {
    if theta.shape() != salt.shape() {
        return Err(PaleovarError::ShapeMismatch {
            message: format!(
                "temperature shape {:?} != salinity shape {:?}",
                theta.shape(),
                salt.shape()
            ),
        });
    }
    if theta.shape().len() < 2 || &theta.shape()[1..] != pressure.shape() {
        return Err(PaleovarError::ShapeMismatch {
            message: format!(
                "pressure shape {:?} does not match spatial shape of temperature {:?}",
                pressure.shape(),
                theta.shape()
            ),
        });
    }

    let theta_vals: Vec<f32> = theta.iter().copied().collect();
    let salt_vals: Vec<f32> = salt.iter().copied().collect();
    let pressure_vals: Vec<f64> = pressure.iter().copied().collect();

    let spatial = pressure_vals.len();
    let min_len = time_chunks.max(1) * spatial;

    let result: Vec<f32> = (0..theta_vals.len())
        .into_par_iter()
        .with_min_len(min_len)
        .map(|idx| {
            let t = theta_vals[idx];
            let s = salt_vals[idx];
            if t.is_nan() || s.is_nan() {
                return f32::NAN;
            }
            let p = pressure_vals[idx % spatial];
            #[allow(clippy::cast_possible_truncation)]
            {
                insitu_from_potential(f64::from(t), f64::from(s), p) as f32
            }
        })
        .collect();

    Ok(ArrayD::from_shape_vec(theta.raw_dim(), result)?)
}
