//! Derived-variable output files
//!
//! Writes a derived field plus its time coordinate and time-bounds companion
//! to a new NetCDF file with units/long-name metadata, re-encoding NaN as the
//! CF fill value. Files are written to a temporary sibling path and renamed
//! into place on success, so a failed run never leaves a partial output file
//! behind.

use crate::errors::{PaleovarError, Result};
use crate::stack::{TimeAxis, FILL_VALUE_F32};
use chrono::Utc;
use ndarray::{Array1, ArrayD};
use netcdf::create;
use std::{fs, path::Path, path::PathBuf};

/// A named gridded result carrying its storage metadata.
#[derive(Debug, Clone)]
pub struct DerivedField {
    pub name: String,
    /// Record (time) axis first; missing values as NaN.
    pub data: ArrayD<f32>,
    pub dims: Vec<String>,
    pub units: Option<String>,
    pub long_name: Option<String>,
}

/// A derived field together with the time axis it is defined on.
#[derive(Debug, Clone)]
pub struct DerivedOutput {
    pub field: DerivedField,
    pub time: TimeAxis,
}

impl DerivedField {
    /// Validate that `name` is usable as a NetCDF variable name.
    pub fn validate_name(name: &str) -> Result<()> {
        let mut chars = name.chars();
        let valid = match chars.next() {
            Some(c) => {
                (c.is_ascii_alphabetic() || c == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            None => false,
        };
        if valid {
            Ok(())
        } else {
            Err(PaleovarError::InvalidConfig {
                message: format!("'{}' is not a valid output variable name", name),
            })
        }
    }
}

/// Writer for derived-variable output files.
pub struct OutputWriter<'a> {
    output_path: &'a Path,
}

impl<'a> OutputWriter<'a> {
    pub fn new(output_path: &'a Path) -> Self {
        Self { output_path }
    }

    /// Write the derived field, time coordinate, and time-bounds companion.
    ///
    /// # Errors
    ///
    /// Fails on an invalid variable name, a dimension/shape disagreement, or
    /// any NetCDF write failure. No output file exists after a failure.
    pub fn write(&self, output: &DerivedOutput) -> Result<()> {
        DerivedField::validate_name(&output.field.name)?;

        if output.field.dims.len() != output.field.data.ndim() {
            return Err(PaleovarError::ShapeMismatch {
                message: format!(
                    "{} dimension names for array of rank {}",
                    output.field.dims.len(),
                    output.field.data.ndim()
                ),
            });
        }
        if output.field.data.shape().first() != Some(&output.time.values.len()) {
            return Err(PaleovarError::ShapeMismatch {
                message: format!(
                    "field has {} records but the time axis has {}",
                    output.field.data.shape().first().copied().unwrap_or(0),
                    output.time.values.len()
                ),
            });
        }

        let tmp_path = tmp_sibling(self.output_path);
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let result = self.write_to(&tmp_path, output);
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
            return result;
        }

        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }
        fs::rename(&tmp_path, self.output_path)?;
        Ok(())
    }

    fn write_to(&self, path: &Path, output: &DerivedOutput) -> Result<()> {
        let field = &output.field;
        let time = &output.time;
        let mut file = create(path)?;

        for (dim_name, &dim_len) in field.dims.iter().zip(field.data.shape()) {
            file.add_dimension(dim_name, dim_len)?;
        }

        // Bounds companion dimension: POP history files call it d2, CAM nbnd.
        let bounds_dim = if time.bounds_name == "time_bound" {
            "d2"
        } else {
            "nbnd"
        };
        let n_bounds = time.bounds.shape().get(1).copied().unwrap_or(2);
        file.add_dimension(bounds_dim, n_bounds)?;

        let mut time_var = file.add_variable::<f64>("time", &["time"])?;
        if let Some(units) = &time.units {
            time_var.put_attribute("units", units.as_str())?;
        }
        if let Some(calendar) = &time.calendar {
            time_var.put_attribute("calendar", calendar.as_str())?;
        }
        time_var.put_attribute("bounds", time.bounds_name.as_str())?;
        let time_values = Array1::from(time.values.clone());
        time_var.put(time_values.view(), ..)?;

        let mut bounds_var =
            file.add_variable::<f64>(&time.bounds_name, &["time", bounds_dim])?;
        bounds_var.put(time.bounds.view(), ..)?;

        let dim_refs: Vec<&str> = field.dims.iter().map(String::as_str).collect();
        let mut var = file.add_variable::<f32>(&field.name, &dim_refs)?;
        var.put_attribute("_FillValue", FILL_VALUE_F32)?;
        if let Some(units) = &field.units {
            var.put_attribute("units", units.as_str())?;
        }
        if let Some(long_name) = &field.long_name {
            var.put_attribute("long_name", long_name.as_str())?;
        }

        let encoded = field
            .data
            .mapv(|v| if v.is_nan() { FILL_VALUE_F32 } else { v });
        var.put(encoded.view(), ..)?;

        file.add_attribute(
            "history",
            format!("Created by paleovar on {}", Utc::now().to_rfc3339()),
        )?;

        Ok(())
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}
