//! Multi-file NetCDF input: glob expansion and record-axis stacking
//!
//! Raw iCESM history output arrives as one time-series file per variable per
//! slice. This module expands glob patterns into concrete paths, reads a
//! named variable from every matched file into an `ArrayD<f32>`, concatenates
//! along the record (time) axis, and sorts the result by the time coordinate.
//! Fill values are decoded to NaN on read so downstream arithmetic can treat
//! missing data uniformly.

use crate::errors::{PaleovarError, Result};
use ndarray::{concatenate, ArrayD, Axis};
use netcdf::{open, AttributeValue, File};
use std::path::PathBuf;

/// Values with magnitude at or above this are treated as missing even when a
/// file carries no explicit `_FillValue` (CF default fill is ~9.97e36).
pub const FILL_THRESHOLD: f32 = 1.0e30;

/// Default fill value written to output files (CF-conventions standard).
pub const FILL_VALUE_F32: f32 = 9.96921e+36;

/// Name of the record dimension in iCESM history files.
pub const RECORD_DIM: &str = "time";

/// A variable stacked across files along the record axis, time-sorted.
#[derive(Debug, Clone)]
pub struct StackedVariable {
    pub name: String,
    /// Data with the record axis first; fill values decoded to NaN.
    pub data: ArrayD<f32>,
    pub dims: Vec<String>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

/// The time coordinate and its bounds companion, stacked and sorted together
/// with the variable they describe.
#[derive(Debug, Clone)]
pub struct TimeAxis {
    pub values: Vec<f64>,
    pub units: Option<String>,
    pub calendar: Option<String>,
    /// `time_bnds` in CAM output, `time_bound` in POP output.
    pub bounds_name: String,
    /// Shape (time, 2).
    pub bounds: ArrayD<f64>,
}

impl StackedVariable {
    /// Index of a named dimension within this variable.
    pub fn axis_index(&self, dim: &str) -> Result<usize> {
        self.dims
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| PaleovarError::DimensionNotFound {
                var: self.name.clone(),
                dim: dim.to_string(),
            })
    }

    /// Collapse a dimension by selecting a single index along it.
    pub fn select_index(&mut self, dim: &str, index: usize) -> Result<()> {
        let axis = self.axis_index(dim)?;
        let len = self.data.shape()[axis];
        if index >= len {
            return Err(PaleovarError::ShapeMismatch {
                message: format!(
                    "index {} out of bounds for dimension '{}' of length {}",
                    index, dim, len
                ),
            });
        }
        self.data = self.data.index_axis(Axis(axis), index).to_owned();
        self.dims.remove(axis);
        Ok(())
    }

    /// Truncate a dimension to its first `len` entries.
    pub fn truncate_axis(&mut self, dim: &str, len: usize) -> Result<()> {
        let axis = self.axis_index(dim)?;
        let full = self.data.shape()[axis];
        if len > full {
            return Err(PaleovarError::ShapeMismatch {
                message: format!(
                    "cannot keep {} entries of dimension '{}' with length {}",
                    len, dim, full
                ),
            });
        }
        let indices: Vec<usize> = (0..len).collect();
        self.data = self.data.select(Axis(axis), &indices);
        Ok(())
    }
}

/// Expand a glob pattern, failing when nothing matches.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut matches = Vec::new();
    for entry in glob::glob(pattern)? {
        matches.push(entry?);
    }
    if matches.is_empty() {
        return Err(PaleovarError::NoInputFiles {
            pattern: pattern.to_string(),
        });
    }
    matches.sort();
    Ok(matches)
}

/// Read a variable from every file matched by `pattern`, stacked along the
/// record axis and sorted ascending by the time coordinate.
pub fn read_stacked(pattern: &str, var_name: &str) -> Result<(StackedVariable, TimeAxis)> {
    let files = expand_glob(pattern)?;
    read_stacked_files(&files, var_name)
}

/// Like [`read_stacked`] but over an explicit file list.
pub fn read_stacked_files(files: &[PathBuf], var_name: &str) -> Result<(StackedVariable, TimeAxis)> {
    let mut chunks: Vec<ArrayD<f32>> = Vec::with_capacity(files.len());
    let mut times: Vec<f64> = Vec::new();
    let mut bounds_chunks: Vec<ArrayD<f64>> = Vec::with_capacity(files.len());

    let mut dims: Vec<String> = Vec::new();
    let mut units = None;
    let mut long_name = None;
    let mut time_units = None;
    let mut calendar = None;
    let mut bounds_name = String::new();

    for (i, path) in files.iter().enumerate() {
        let file = open(path)?;
        let (chunk, file_dims, file_units, file_long_name) = read_variable(&file, var_name)?;

        if i == 0 {
            dims = file_dims.clone();
            units = file_units;
            long_name = file_long_name;
            bounds_name = detect_bounds_name(&file)?;
            time_units = attr_string(&file, RECORD_DIM, "units");
            calendar = attr_string(&file, RECORD_DIM, "calendar");
        } else if file_dims != dims {
            return Err(PaleovarError::ShapeMismatch {
                message: format!(
                    "variable '{}' has dimensions {:?} in {} but {:?} in {}",
                    var_name,
                    file_dims,
                    path.display(),
                    dims,
                    files[0].display()
                ),
            });
        }

        if dims.first().map(String::as_str) != Some(RECORD_DIM) {
            return Err(PaleovarError::DimensionNotFound {
                var: var_name.to_string(),
                dim: RECORD_DIM.to_string(),
            });
        }

        times.extend(read_f64_values(&file, RECORD_DIM)?);
        bounds_chunks.push(read_bounds(&file, &bounds_name)?);
        chunks.push(chunk);
    }

    let views: Vec<_> = chunks.iter().map(|chunk| chunk.view()).collect();
    let data = concatenate(Axis(0), &views)?;
    let bound_views: Vec<_> = bounds_chunks.iter().map(|chunk| chunk.view()).collect();
    let bounds = concatenate(Axis(0), &bound_views)?;

    if times.is_empty() {
        return Err(PaleovarError::Generic(format!(
            "no input data: variable '{}' has zero records across the matched files",
            var_name
        )));
    }
    if data.shape()[0] != times.len() {
        return Err(PaleovarError::ShapeMismatch {
            message: format!(
                "variable '{}' has {} records but the time coordinate has {}",
                var_name,
                data.shape()[0],
                times.len()
            ),
        });
    }

    let (data, bounds, times) = sort_by_time(data, bounds, times);

    Ok((
        StackedVariable {
            name: var_name.to_string(),
            data,
            dims,
            units,
            long_name,
        },
        TimeAxis {
            values: times,
            units: time_units,
            calendar,
            bounds_name,
            bounds,
        },
    ))
}

/// Read a 1-D f64 coordinate (e.g. `z_t`, `z_w_top`, `z_w_bot`) from the
/// first file matched by `pattern`.
pub fn read_coord(pattern: &str, name: &str) -> Result<Vec<f64>> {
    let files = expand_glob(pattern)?;
    let file = open(&files[0])?;
    read_f64_values(&file, name)
}

/// Read a coordinate variable of any rank as f64 from the first matched file,
/// returning its values and shape. Used for the POP curvilinear `TLAT` grid.
pub fn read_coord_field(pattern: &str, name: &str) -> Result<(Vec<f64>, Vec<usize>)> {
    let files = expand_glob(pattern)?;
    let file = open(&files[0])?;
    let var = file
        .variable(name)
        .ok_or_else(|| PaleovarError::VariableNotFound {
            var: name.to_string(),
        })?;
    let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
    let values = var.get_values::<f64, _>(..)?;
    Ok((values, shape))
}

/// Nearest index into a coordinate for a target value.
pub fn nearest_index(coords: &[f64], target: f64) -> Result<usize> {
    if coords.is_empty() {
        return Err(PaleovarError::Generic(
            "cannot index into an empty coordinate".to_string(),
        ));
    }
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, &c) in coords.iter().enumerate() {
        let dist = (c - target).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    Ok(best)
}

/// Indices of coordinate values less than or equal to `cutoff`.
pub fn indices_within(coords: &[f64], cutoff: f64) -> Vec<usize> {
    coords
        .iter()
        .enumerate()
        .filter_map(|(i, &c)| if c <= cutoff { Some(i) } else { None })
        .collect()
}

fn read_variable(
    file: &File,
    var_name: &str,
) -> Result<(ArrayD<f32>, Vec<String>, Option<String>, Option<String>)> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| PaleovarError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    let dims: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();

    let raw = var.get_values::<f32, _>(..)?;
    let fill = fill_value(file, var_name);
    let decoded: Vec<f32> = raw
        .into_iter()
        .map(|v| {
            let missing = !v.is_finite()
                || v.abs() >= FILL_THRESHOLD
                || fill.map_or(false, |fv| v == fv);
            if missing {
                f32::NAN
            } else {
                v
            }
        })
        .collect();

    let data = ArrayD::from_shape_vec(shape, decoded)?;
    let units = attr_string(file, var_name, "units");
    let long_name = attr_string(file, var_name, "long_name");
    Ok((data, dims, units, long_name))
}

fn read_f64_values(file: &File, name: &str) -> Result<Vec<f64>> {
    let var = file
        .variable(name)
        .ok_or_else(|| PaleovarError::VariableNotFound {
            var: name.to_string(),
        })?;
    Ok(var.get_values::<f64, _>(..)?)
}

fn read_bounds(file: &File, bounds_name: &str) -> Result<ArrayD<f64>> {
    let var = file
        .variable(bounds_name)
        .ok_or_else(|| PaleovarError::VariableNotFound {
            var: bounds_name.to_string(),
        })?;
    let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
    let values = var.get_values::<f64, _>(..)?;
    Ok(ArrayD::from_shape_vec(shape, values)?)
}

/// Find the time-bounds companion: `time_bnds` (CAM) or `time_bound` (POP).
pub fn detect_bounds_name(file: &File) -> Result<String> {
    for candidate in ["time_bnds", "time_bound"] {
        if file.variable(candidate).is_some() {
            return Ok(candidate.to_string());
        }
    }
    Err(PaleovarError::VariableNotFound {
        var: "time_bnds/time_bound".to_string(),
    })
}

/// `_FillValue` (or `missing_value`) of a variable as f32, when present.
pub fn fill_value(file: &File, var_name: &str) -> Option<f32> {
    let var = file.variable(var_name)?;
    for attr_name in ["_FillValue", "missing_value"] {
        if let Some(attr) = var.attribute(attr_name) {
            match attr.value().ok()? {
                AttributeValue::Float(v) => return Some(v),
                AttributeValue::Double(v) => return Some(v as f32),
                AttributeValue::Short(v) => return Some(f32::from(v)),
                _ => {}
            }
        }
    }
    None
}

/// String attribute of a variable, when present.
pub fn attr_string(file: &File, var_name: &str, attr_name: &str) -> Option<String> {
    let var = file.variable(var_name)?;
    let attr = var.attribute(attr_name)?;
    match attr.value().ok()? {
        AttributeValue::Str(s) => Some(s),
        _ => None,
    }
}

fn sort_by_time(
    data: ArrayD<f32>,
    bounds: ArrayD<f64>,
    times: Vec<f64>,
) -> (ArrayD<f32>, ArrayD<f64>, Vec<f64>) {
    let mut order: Vec<usize> = (0..times.len()).collect();
    order.sort_by(|&a, &b| times[a].partial_cmp(&times[b]).unwrap_or(std::cmp::Ordering::Equal));

    if order.windows(2).all(|w| w[0] < w[1]) && order.first() == Some(&0) {
        return (data, bounds, times);
    }

    let sorted_times: Vec<f64> = order.iter().map(|&i| times[i]).collect();
    let sorted_data = data.select(Axis(0), &order);
    let sorted_bounds = bounds.select(Axis(0), &order);
    (sorted_data, sorted_bounds, sorted_times)
}
