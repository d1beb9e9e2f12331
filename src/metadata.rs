//! NetCDF metadata inspection
//!
//! Quick-look functions for examining the structure of raw or derived files:
//! global attributes, dimensions, and per-variable shape and attribute
//! listings.

use crate::errors::{PaleovarError, Result};
use netcdf::{AttributeValue, File};

/// Prints global attributes, dimensions, and variables of a NetCDF file.
pub fn print_metadata(file: &File) -> Result<()> {
    println!("\n===== Global Attributes =====");
    for attr in file.attributes() {
        println!("- {}: {:?}", attr.name(), attr.value()?);
    }

    println!("\n===== Dimensions =====");
    let mut dimensions: Vec<_> = file.dimensions().collect();
    dimensions.sort_by(|a, b| a.name().cmp(&b.name()));
    for dim in dimensions {
        println!("- {} = {}", dim.name(), dim.len());
    }

    println!("\n===== Variables =====");
    let mut variables: Vec<_> = file.variables().collect();
    variables.sort_by(|a, b| a.name().cmp(&b.name()));
    for var in variables {
        let dims: Vec<String> = var
            .dimensions()
            .iter()
            .map(|d| format!("{}[{}]", d.name(), d.len()))
            .collect();
        println!("- {} ({})", var.name(), dims.join(", "));
    }

    Ok(())
}

/// Describes a specific variable showing its data type, shape, and all
/// attributes.
pub fn describe_variable(file: &File, var_name: &str) -> Result<()> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| PaleovarError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    println!("\n Variable Description: {}", var_name);
    println!("={}", "=".repeat(var_name.len() + 25));

    let data_type = format!("{:?}", var.vartype()).to_lowercase();
    println!(" Data type: {}", data_type);

    let dims: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.name().to_string())
        .collect();
    let shape: Vec<String> = var
        .dimensions()
        .iter()
        .map(|d| d.len().to_string())
        .collect();

    if dims.is_empty() {
        println!(" Dimensions: (scalar)");
    } else {
        println!(" Dimensions: [{}]", dims.join(", "));
        println!(" Shape: ({})", shape.join(" x "));
    }

    println!("\n Attributes:");
    let mut any = false;
    for attr in var.attributes() {
        any = true;
        match attr.value()? {
            AttributeValue::Str(v) => println!("    {} = \"{}\"", attr.name(), v),
            other => println!("    {} = {:?}", attr.name(), other),
        }
    }
    if !any {
        println!("    (none)");
    }

    Ok(())
}
