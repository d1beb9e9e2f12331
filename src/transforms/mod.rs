//! Derived-variable transforms
//!
//! Each transform reads one or more raw iCESM variables through the
//! [`crate::stack`] layer, applies its arithmetic, and returns a
//! [`DerivedOutput`] ready for the [`crate::output`] writer. All
//! configuration arrives as explicit parameters; nothing is process-global.
//!
//! # Organization
//!
//! - [`atmosphere`]: CAM transforms (precipitation, reference/surface
//!   temperature, precipitation isotope deltas)
//! - [`ocean`]: POP transforms (surface temperature and salinity, seawater
//!   d18O, gamma-average temperature)
//! - [`combine`]: merge a glob of single-variable files into one dataset

pub mod atmosphere;
pub mod combine;
pub mod ocean;

use crate::errors::{PaleovarError, Result};
use ndarray::ArrayD;

pub use atmosphere::{make_d18op, make_ddp, make_pr, make_tas, make_ts, IsotopeDeltaGlobs};
pub use combine::combine_glob;
pub use ocean::{make_d18osw, make_sos, make_toga, make_tos, OceanOptions};

/// Floor for isotope-ratio denominators. Sums at or below this are replaced
/// by it before division so near-zero precipitation cannot blow up the delta.
pub const PTINY: f64 = 1e-18;

/// Sum fields elementwise, failing on any shape disagreement.
pub fn sum_fields(fields: &[&ArrayD<f32>]) -> Result<ArrayD<f32>> {
    let first = fields
        .first()
        .ok_or_else(|| PaleovarError::Generic("no fields to sum".to_string()))?;

    let mut total = (*first).clone();
    for field in &fields[1..] {
        if field.shape() != total.shape() {
            return Err(PaleovarError::ShapeMismatch {
                message: format!(
                    "cannot sum fields of shape {:?} and {:?}",
                    total.shape(),
                    field.shape()
                ),
            });
        }
        total = total + *field;
    }
    Ok(total)
}

/// Per-mille isotopic delta: `(heavy/light - 1) * 1000`.
///
/// The denominator is clamped from below at [`PTINY`]: values strictly
/// greater than it pass through, everything else (including NaN) is replaced
/// by it. Arithmetic runs in f64 and the result is stored as f32.
pub fn permille_delta(heavy: &ArrayD<f32>, light: &ArrayD<f32>) -> Result<ArrayD<f32>> {
    if heavy.shape() != light.shape() {
        return Err(PaleovarError::ShapeMismatch {
            message: format!(
                "heavy isotope shape {:?} != light isotope shape {:?}",
                heavy.shape(),
                light.shape()
            ),
        });
    }

    let values: Vec<f32> = heavy
        .iter()
        .zip(light.iter())
        .map(|(&h, &l)| {
            let l = f64::from(l);
            let l = if l > PTINY { l } else { PTINY };
            #[allow(clippy::cast_possible_truncation)]
            {
                ((f64::from(h) / l - 1.0) * 1000.0) as f32
            }
        })
        .collect();

    Ok(ArrayD::from_shape_vec(heavy.raw_dim(), values)?)
}

/// Mask non-physical (non-positive) values to NaN in place. Used on ocean
/// salinity where negative values mark bad cells.
pub fn mask_nonpositive(data: &mut ArrayD<f32>) {
    data.mapv_inplace(|v| if v > 0.0 { v } else { f32::NAN });
}
