//! CAM (atmosphere) transforms
//!
//! Precipitation and temperature products from CAM history variables, plus
//! the precipitation isotope deltas. CAM splits precipitation into
//! convective/large-scale and rain/snow components, one time-series file per
//! component; the isotopic variants exist per water isotopologue.

use super::{permille_delta, sum_fields};
use crate::errors::{PaleovarError, Result};
use crate::output::{DerivedField, DerivedOutput};
use crate::stack::{read_stacked, TimeAxis};
use ndarray::ArrayD;

/// CAM variable names for the four H216O precipitation components.
pub const H216O_VARS: [&str; 4] = [
    "PRECRC_H216Or",
    "PRECRL_H216OR",
    "PRECSC_H216Os",
    "PRECSL_H216OS",
];

/// CAM variable names for the four H218O precipitation components.
pub const H218O_VARS: [&str; 4] = [
    "PRECRC_H218Or",
    "PRECRL_H218OR",
    "PRECSC_H218Os",
    "PRECSL_H218OS",
];

/// CAM variable names for the four H2O precipitation components.
pub const H2O_VARS: [&str; 4] = ["PRECRC_H2Or", "PRECRL_H2OR", "PRECSC_H2Os", "PRECSL_H2OS"];

/// CAM variable names for the four HDO precipitation components.
pub const HDO_VARS: [&str; 4] = ["PRECRC_HDOr", "PRECRL_HDOR", "PRECSC_HDOs", "PRECSL_HDOS"];

/// Input globs for an isotope delta: four light components, four heavy,
/// ordered rain-convective, rain-large-scale, snow-convective,
/// snow-large-scale.
#[derive(Debug, Clone)]
pub struct IsotopeDeltaGlobs<'a> {
    pub light: [&'a str; 4],
    pub heavy: [&'a str; 4],
}

/// Total precipitation rate: PRECC + PRECL.
pub fn make_pr(precc_glob: &str, precl_glob: &str, out_var: &str) -> Result<DerivedOutput> {
    let (precc, time) = read_stacked(precc_glob, "PRECC")?;
    let (precl, _) = read_stacked(precl_glob, "PRECL")?;

    let total = sum_fields(&[&precc.data, &precl.data])?;

    Ok(DerivedOutput {
        field: DerivedField {
            name: out_var.to_string(),
            data: total,
            dims: precc.dims,
            units: Some("m/s".to_string()),
            long_name: Some("total precipitation rate".to_string()),
        },
        time,
    })
}

/// Near-surface air temperature: TREFHT renamed, metadata carried over.
pub fn make_tas(trefht_glob: &str, out_var: &str) -> Result<DerivedOutput> {
    renamed_variable(trefht_glob, "TREFHT", out_var)
}

/// Surface (skin) temperature: TS renamed, metadata carried over.
pub fn make_ts(ts_glob: &str, out_var: &str) -> Result<DerivedOutput> {
    renamed_variable(ts_glob, "TS", out_var)
}

/// Precipitation d18O: per-mille delta of summed H218O over summed H216O
/// components.
pub fn make_d18op(globs: &IsotopeDeltaGlobs<'_>, out_var: &str) -> Result<DerivedOutput> {
    isotope_delta(globs, &H216O_VARS, &H218O_VARS, out_var, "precipitation d18O")
}

/// Precipitation dD: per-mille delta of summed HDO over summed H2O
/// components.
pub fn make_ddp(globs: &IsotopeDeltaGlobs<'_>, out_var: &str) -> Result<DerivedOutput> {
    isotope_delta(globs, &H2O_VARS, &HDO_VARS, out_var, "precipitation dD")
}

fn renamed_variable(pattern: &str, var_name: &str, out_var: &str) -> Result<DerivedOutput> {
    let (source, time) = read_stacked(pattern, var_name)?;
    Ok(DerivedOutput {
        field: DerivedField {
            name: out_var.to_string(),
            data: source.data,
            dims: source.dims,
            units: source.units,
            long_name: source.long_name,
        },
        time,
    })
}

fn isotope_delta(
    globs: &IsotopeDeltaGlobs<'_>,
    light_vars: &[&str; 4],
    heavy_vars: &[&str; 4],
    out_var: &str,
    long_name: &str,
) -> Result<DerivedOutput> {
    let (light, time, dims) = stacked_component_sum(&globs.light, light_vars)?;
    let (heavy, _, heavy_dims) = stacked_component_sum(&globs.heavy, heavy_vars)?;

    if dims != heavy_dims {
        return Err(PaleovarError::ShapeMismatch {
            message: format!(
                "light components have dimensions {:?} but heavy have {:?}",
                dims, heavy_dims
            ),
        });
    }

    let delta = permille_delta(&heavy, &light)?;

    Ok(DerivedOutput {
        field: DerivedField {
            name: out_var.to_string(),
            data: delta,
            dims,
            units: Some("permil".to_string()),
            long_name: Some(long_name.to_string()),
        },
        time,
    })
}

/// Read each (glob, variable) pair stacked over time and sum the four
/// components.
fn stacked_component_sum(
    patterns: &[&str; 4],
    var_names: &[&str; 4],
) -> Result<(ArrayD<f32>, TimeAxis, Vec<String>)> {
    let mut components = Vec::with_capacity(4);
    let mut time = None;
    let mut dims: Vec<String> = Vec::new();

    for (pattern, var_name) in patterns.iter().zip(var_names) {
        let (component, component_time) = read_stacked(pattern, var_name)?;
        if time.is_none() {
            time = Some(component_time);
            dims = component.dims.clone();
        } else if component.dims != dims {
            return Err(PaleovarError::ShapeMismatch {
                message: format!(
                    "component '{}' has dimensions {:?}, expected {:?}",
                    var_name, component.dims, dims
                ),
            });
        }
        components.push(component.data);
    }

    let views: Vec<&ArrayD<f32>> = components.iter().collect();
    let total = sum_fields(&views)?;
    let time = time.ok_or_else(|| PaleovarError::Generic("no components read".to_string()))?;

    Ok((total, time, dims))
}
