//! Merge a glob of single-variable NetCDF files into one dataset
//!
//! iCESM archives one variable per time-series file. This transform stacks
//! every record variable across the matched files along the sort coordinate
//! (time by default), carries static variables and attributes over from the
//! first file, and writes a single combined file.

use crate::errors::{PaleovarError, Result};
use crate::stack::expand_glob;
use chrono::Utc;
use ndarray::{concatenate, ArrayD, Axis};
use netcdf::{create, open, AttributeValue};
use std::{fs, path::Path, path::PathBuf};

enum Stored {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
}

/// Combine all files matched by `pattern` into `output_path`, sorting
/// records ascending by the `sortby` coordinate.
pub fn combine_glob(pattern: &str, sortby: &str, output_path: &Path) -> Result<()> {
    let files = expand_glob(pattern)?;
    println!("🚀 Combining {} files into one dataset", files.len());

    // Sort order across the concatenated record axis.
    let mut sort_values: Vec<f64> = Vec::new();
    for path in &files {
        let file = open(path)?;
        let var = file
            .variable(sortby)
            .ok_or_else(|| PaleovarError::VariableNotFound {
                var: sortby.to_string(),
            })?;
        sort_values.extend(var.get_values::<f64, _>(..)?);
    }
    let mut order: Vec<usize> = (0..sort_values.len()).collect();
    order.sort_by(|&a, &b| {
        sort_values[a]
            .partial_cmp(&sort_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let tmp_path = tmp_sibling(output_path);
    if tmp_path.exists() {
        fs::remove_file(&tmp_path)?;
    }

    let result = write_combined(&files, sortby, &order, &tmp_path);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
        return result;
    }

    if output_path.exists() {
        fs::remove_file(output_path)?;
    }
    fs::rename(&tmp_path, output_path)?;
    Ok(())
}

fn write_combined(
    files: &[PathBuf],
    sortby: &str,
    order: &[usize],
    tmp_path: &Path,
) -> Result<()> {
    let first = open(&files[0])?;
    let mut out = create(tmp_path)?;

    for dim in first.dimensions() {
        let len = if dim.name() == sortby {
            order.len()
        } else {
            dim.len()
        };
        out.add_dimension(&dim.name(), len)?;
    }

    let var_names: Vec<String> = first.variables().map(|v| v.name().to_string()).collect();
    for var_name in &var_names {
        let var = first
            .variable(var_name)
            .ok_or_else(|| PaleovarError::VariableNotFound {
                var: var_name.clone(),
            })?;
        let dims: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| d.name().to_string())
            .collect();
        let dim_refs: Vec<&str> = dims.iter().map(String::as_str).collect();

        let is_record = dims.first().map(String::as_str) == Some(sortby);
        // History files only carry float and double variables; anything
        // else is stored as float.
        let is_double = format!("{:?}", var.vartype())
            .to_lowercase()
            .contains("double");

        let stored = if is_record {
            read_record_variable(files, var_name, is_double, order)?
        } else {
            read_static_variable(&first, var_name, is_double)?
        };

        match stored {
            Stored::F64(data) => {
                let mut new_var = out.add_variable::<f64>(var_name, &dim_refs)?;
                copy_attribute_values(&var, |name, value| {
                    put_variable_attribute(&mut new_var, name, value)
                })?;
                new_var.put(data.view(), ..)?;
            }
            Stored::F32(data) => {
                let mut new_var = out.add_variable::<f32>(var_name, &dim_refs)?;
                copy_attribute_values(&var, |name, value| {
                    put_variable_attribute(&mut new_var, name, value)
                })?;
                new_var.put(data.view(), ..)?;
            }
        }
    }

    for attr in first.attributes() {
        let name = attr.name().to_string();
        if name == "history" {
            continue;
        }
        match attr.value()? {
            AttributeValue::Str(v) => {
                out.add_attribute(&name, v)?;
            }
            AttributeValue::Float(v) => {
                out.add_attribute(&name, v)?;
            }
            AttributeValue::Double(v) => {
                out.add_attribute(&name, v)?;
            }
            AttributeValue::Int(v) => {
                out.add_attribute(&name, v)?;
            }
            _ => {}
        }
    }
    out.add_attribute(
        "history",
        format!("Created by paleovar on {}", Utc::now().to_rfc3339()),
    )?;

    Ok(())
}

fn read_record_variable(
    files: &[PathBuf],
    var_name: &str,
    is_double: bool,
    order: &[usize],
) -> Result<Stored> {
    if is_double {
        let chunks = read_chunks::<f64>(files, var_name)?;
        let views: Vec<_> = chunks.iter().map(|chunk| chunk.view()).collect();
        let data = concatenate(Axis(0), &views)?;
        Ok(Stored::F64(data.select(Axis(0), order)))
    } else {
        let chunks = read_chunks::<f32>(files, var_name)?;
        let views: Vec<_> = chunks.iter().map(|chunk| chunk.view()).collect();
        let data = concatenate(Axis(0), &views)?;
        Ok(Stored::F32(data.select(Axis(0), order)))
    }
}

fn read_static_variable(file: &netcdf::File, var_name: &str, is_double: bool) -> Result<Stored> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| PaleovarError::VariableNotFound {
            var: var_name.to_string(),
        })?;
    let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
    if is_double {
        let values = var.get_values::<f64, _>(..)?;
        Ok(Stored::F64(ArrayD::from_shape_vec(shape, values)?))
    } else {
        let values = var.get_values::<f32, _>(..)?;
        Ok(Stored::F32(ArrayD::from_shape_vec(shape, values)?))
    }
}

fn read_chunks<T: netcdf::NcTypeDescriptor + Copy>(files: &[PathBuf], var_name: &str) -> Result<Vec<ArrayD<T>>> {
    let mut chunks = Vec::with_capacity(files.len());
    for path in files {
        let file = open(path)?;
        let var = file
            .variable(var_name)
            .ok_or_else(|| PaleovarError::VariableNotFound {
                var: var_name.to_string(),
            })?;
        let shape: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();
        let values = var.get_values::<T, _>(..)?;
        chunks.push(ArrayD::from_shape_vec(shape, values)?);
    }
    Ok(chunks)
}

fn copy_attribute_values<F>(var: &netcdf::Variable, mut put: F) -> Result<()>
where
    F: FnMut(&str, AttributeValue) -> Result<()>,
{
    for attr in var.attributes() {
        let name = attr.name().to_string();
        put(&name, attr.value()?)?;
    }
    Ok(())
}

fn put_variable_attribute(
    var: &mut netcdf::VariableMut,
    name: &str,
    value: AttributeValue,
) -> Result<()> {
    match value {
        AttributeValue::Str(v) => {
            var.put_attribute(name, v)?;
        }
        AttributeValue::Strs(v) => {
            var.put_attribute(name, v)?;
        }
        AttributeValue::Float(v) => {
            var.put_attribute(name, v)?;
        }
        AttributeValue::Floats(v) => {
            var.put_attribute(name, v)?;
        }
        AttributeValue::Double(v) => {
            var.put_attribute(name, v)?;
        }
        AttributeValue::Doubles(v) => {
            var.put_attribute(name, v)?;
        }
        AttributeValue::Int(v) => {
            var.put_attribute(name, v)?;
        }
        AttributeValue::Ints(v) => {
            var.put_attribute(name, v)?;
        }
        AttributeValue::Short(v) => {
            var.put_attribute(name, v)?;
        }
        AttributeValue::Shorts(v) => {
            var.put_attribute(name, v)?;
        }
        _ => {
            println!("⚠ Skipped unsupported attribute type for '{}'", name);
        }
    }
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}
