//! POP (ocean) transforms
//!
//! Surface products select the topmost model level (z_t = 500 cm in iCESM);
//! the gamma-average temperature works over the upper ocean down to a fixed
//! cutoff. Potential temperature is converted to in-situ temperature through
//! the [`crate::eos`] module before any averaging, since the proxies record
//! ambient temperature.

use super::mask_nonpositive;
use crate::eos;
use crate::errors::{PaleovarError, Result};
use crate::gamma::{gamma_layer_weights, gamma_weighted_mean};
use crate::output::{DerivedField, DerivedOutput};
use crate::stack::{indices_within, nearest_index, read_coord, read_coord_field, read_stacked};
use ndarray::{ArrayD, Axis};

/// Depth of the highest ocean level in iCESM (cm).
pub const TOP_LEVEL_CM: f64 = 500.0;

/// Depth cutoff for the gamma-average temperature (cm). Habitat weights
/// below this are negligible.
pub const TOGA_CUTOFF_CM: f64 = 20000.0;

/// Options shared by the ocean transforms that run the equation of state.
#[derive(Debug, Clone)]
pub struct OceanOptions {
    /// Minimum number of time steps each parallel job covers.
    pub time_chunks: usize,
    /// Mask non-positive salinity cells to missing before conversion.
    pub mask_badsalt: bool,
}

impl Default for OceanOptions {
    fn default() -> Self {
        Self {
            time_chunks: 5,
            mask_badsalt: false,
        }
    }
}

/// Sea surface temperature: topmost-level potential temperature converted to
/// in-situ temperature against local salinity and pressure.
pub fn make_tos(
    temp_glob: &str,
    salt_glob: &str,
    out_var: &str,
    opts: &OceanOptions,
) -> Result<DerivedOutput> {
    let (mut theta, time) = read_stacked(temp_glob, "TEMP")?;
    let (mut salt, _) = read_stacked(salt_glob, "SALT")?;

    let z_t = read_coord(temp_glob, "z_t")?;
    let top = nearest_index(&z_t, TOP_LEVEL_CM)?;
    theta.select_index("z_t", top)?;
    salt.select_index("z_t", top)?;

    if opts.mask_badsalt {
        mask_nonpositive(&mut salt.data);
    }

    let tlat = read_latitude(temp_glob)?;
    let pressure = eos::pressure_field(&z_t[top..=top], &tlat)?.index_axis_move(Axis(0), 0);

    println!("⚡ Converting potential temperature to in-situ at the surface level");
    let insitu = eos::insitu_field(&theta.data, &salt.data, &pressure, opts.time_chunks)?;

    Ok(DerivedOutput {
        field: DerivedField {
            name: out_var.to_string(),
            data: insitu,
            dims: theta.dims,
            units: Some("degC".to_string()),
            long_name: Some("Sea Temperature (In-situ Temperature)".to_string()),
        },
        time,
    })
}

/// Sea surface salinity: topmost-level SALT, metadata carried over.
pub fn make_sos(salt_glob: &str, out_var: &str, opts: &OceanOptions) -> Result<DerivedOutput> {
    let (mut salt, time) = read_stacked(salt_glob, "SALT")?;

    let z_t = read_coord(salt_glob, "z_t")?;
    salt.select_index("z_t", nearest_index(&z_t, TOP_LEVEL_CM)?)?;

    if opts.mask_badsalt {
        mask_nonpositive(&mut salt.data);
    }

    Ok(DerivedOutput {
        field: DerivedField {
            name: out_var.to_string(),
            data: salt.data,
            dims: salt.dims,
            units: salt.units,
            long_name: salt.long_name,
        },
        time,
    })
}

/// Gamma-average in-situ sea temperature over the upper ocean.
///
/// Layers are kept while their bottom boundary stays above
/// [`TOGA_CUTOFF_CM`]; potential temperature is converted to in-situ on the
/// full kept column, then collapsed with the habitat weights.
pub fn make_toga(
    temp_glob: &str,
    salt_glob: &str,
    out_var: &str,
    opts: &OceanOptions,
) -> Result<DerivedOutput> {
    let (mut theta, time) = read_stacked(temp_glob, "TEMP")?;
    let (mut salt, _) = read_stacked(salt_glob, "SALT")?;

    let z_t = read_coord(temp_glob, "z_t")?;
    let z_w_top = read_coord(temp_glob, "z_w_top")?;
    let z_w_bot = read_coord(temp_glob, "z_w_bot")?;

    // Layer boundaries increase with depth, so the kept set is a prefix.
    let n_layers = indices_within(&z_w_bot, TOGA_CUTOFF_CM).len();
    if n_layers == 0 {
        return Err(PaleovarError::InvalidConfig {
            message: format!("no ocean layers above the {} cm cutoff", TOGA_CUTOFF_CM),
        });
    }

    theta.truncate_axis("z_t", n_layers)?;
    salt.truncate_axis("z_t", n_layers)?;

    if opts.mask_badsalt {
        mask_nonpositive(&mut salt.data);
    }

    let tlat = read_latitude(temp_glob)?;
    let pressure = eos::pressure_field(&z_t[..n_layers], &tlat)?;

    println!(
        "⚡ Converting potential temperature to in-situ over {} layers",
        n_layers
    );
    let insitu = eos::insitu_field(&theta.data, &salt.data, &pressure, opts.time_chunks)?;

    let weights = gamma_layer_weights(&z_w_top[..n_layers], &z_w_bot[..n_layers])?;
    let depth_axis = theta.axis_index("z_t")?;
    let averaged = gamma_weighted_mean(&insitu, depth_axis, &weights)?;

    let mut dims = theta.dims.clone();
    dims.remove(depth_axis);

    Ok(DerivedOutput {
        field: DerivedField {
            name: out_var.to_string(),
            data: averaged,
            dims,
            units: Some("degC".to_string()),
            long_name: Some("Sea Temperature (Gamma-average)".to_string()),
        },
        time,
    })
}

/// Seawater d18O: per-mille delta of the topmost-level R18O ratio, with an
/// optional mask from a previously derived surface-salinity file.
pub fn make_d18osw(
    r18o_glob: &str,
    out_var: &str,
    bad_sos_glob: Option<&str>,
    sos_var: &str,
) -> Result<DerivedOutput> {
    let (mut r18o, time) = read_stacked(r18o_glob, "R18O")?;

    let z_t = read_coord(r18o_glob, "z_t")?;
    r18o.select_index("z_t", nearest_index(&z_t, TOP_LEVEL_CM)?)?;

    #[allow(clippy::cast_possible_truncation)]
    let mut delta = r18o
        .data
        .mapv(|v| ((f64::from(v) - 1.0) * 1000.0) as f32);

    if let Some(pattern) = bad_sos_glob {
        let (sos, _) = read_stacked(pattern, sos_var)?;
        if sos.data.shape() != delta.shape() {
            return Err(PaleovarError::ShapeMismatch {
                message: format!(
                    "salinity mask shape {:?} does not match d18O shape {:?}",
                    sos.data.shape(),
                    delta.shape()
                ),
            });
        }
        delta.zip_mut_with(&sos.data, |d, &s| {
            if s.is_nan() || s <= 0.0 {
                *d = f32::NAN;
            }
        });
    }

    Ok(DerivedOutput {
        field: DerivedField {
            name: out_var.to_string(),
            data: delta,
            dims: r18o.dims,
            units: Some("permil".to_string()),
            long_name: Some("seawater d18O".to_string()),
        },
        time,
    })
}

fn read_latitude(pattern: &str) -> Result<ArrayD<f64>> {
    let (values, shape) = read_coord_field(pattern, "TLAT")?;
    Ok(ArrayD::from_shape_vec(shape, values)?)
}
