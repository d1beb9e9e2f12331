//! Unit tests for paleovar modules
//!
//! These tests cover the core numeric pieces (equation of state, gamma
//! depth weighting, isotope deltas) and the input/output plumbing against
//! small temporary NetCDF fixtures.

use ndarray::{Array1, Array2, ArrayD};
use netcdf::{create, open};
use paleovar::{
    eos,
    errors::{PaleovarError, Result},
    gamma::{gamma_layer_weights, gamma_weighted_mean},
    output::{DerivedField, DerivedOutput, OutputWriter},
    parallel::ParallelConfig,
    stack::{expand_glob, nearest_index, read_stacked, TimeAxis},
    transforms::{mask_nonpositive, permille_delta, sum_fields, PTINY},
};
use tempfile::tempdir;

#[test]
fn test_error_types() {
    let no_input = PaleovarError::NoInputFiles {
        pattern: "/nowhere/*.nc".to_string(),
    };
    assert!(format!("{}", no_input).contains("No input files matched"));

    let var_err = PaleovarError::VariableNotFound {
        var: "TEMP".to_string(),
    };
    assert!(format!("{}", var_err).contains("Variable 'TEMP' not found"));

    let dim_err = PaleovarError::DimensionNotFound {
        var: "TEMP".to_string(),
        dim: "z_t".to_string(),
    };
    assert!(format!("{}", dim_err).contains("Dimension 'z_t' not found in variable 'TEMP'"));

    let shape_err = PaleovarError::ShapeMismatch {
        message: "a != b".to_string(),
    };
    assert!(format!("{}", shape_err).contains("Shape mismatch"));

    let config_err = PaleovarError::InvalidConfig {
        message: "bad name".to_string(),
    };
    assert!(format!("{}", config_err).contains("Invalid configuration"));
}

#[test]
fn test_parallel_config() {
    let default_config = ParallelConfig::new_default();
    assert!(default_config.num_threads.is_none());

    let config_4 = ParallelConfig::with_threads(4);
    assert_eq!(config_4.num_threads, Some(4));

    let all_cores_config = ParallelConfig::all_cores();
    assert!(all_cores_config.num_threads.unwrap() > 0);

    assert!(default_config.current_threads() > 0);
}

#[test]
fn test_gamma_weights_two_layer_average() -> Result<()> {
    // Two layers [0, 1000] and [1000, 3000] cm with values 10 and 20: the
    // average must land strictly between the layer values. The habitat
    // distribution peaks around 5000 cm, so of these two shallow layers the
    // deeper one carries more mass.
    let weights = gamma_layer_weights(&[0.0, 1000.0], &[1000.0, 3000.0])?;
    assert!(weights.iter().all(|&w| w > 0.0));
    assert!(weights[1] > weights[0]);

    let field = ArrayD::from_shape_vec(vec![2, 1], vec![10.0_f32, 20.0])?;
    let mean = gamma_weighted_mean(&field, 0, &weights)?;

    assert_eq!(mean.shape(), &[1]);
    let value = mean[[0]];
    assert!(value > 10.0 && value < 20.0, "mean was {}", value);
    Ok(())
}

#[test]
fn test_gamma_weights_renormalize_over_valid_layers() -> Result<()> {
    let weights = gamma_layer_weights(&[0.0, 1000.0, 3000.0], &[1000.0, 3000.0, 8000.0])?;

    // Middle layer missing: the average must equal the weighted mean over
    // the two valid layers with their weights renormalized to sum to 1.
    let field = ArrayD::from_shape_vec(vec![3, 1], vec![1.0_f32, f32::NAN, 3.0])?;
    let mean = gamma_weighted_mean(&field, 0, &weights)?;

    let w_valid = weights[0] + weights[2];
    let expected = (1.0 * weights[0] + 3.0 * weights[2]) / w_valid;
    assert!((f64::from(mean[[0]]) - expected).abs() < 1e-6);

    // Renormalized weights over the valid layers sum to 1.
    let renorm_sum = weights[0] / w_valid + weights[2] / w_valid;
    assert!((renorm_sum - 1.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_gamma_missing_top_layer_masks_output() -> Result<()> {
    let weights = gamma_layer_weights(&[0.0, 1000.0], &[1000.0, 3000.0])?;

    // A valid deep layer alone would yield a finite weighted sum; the
    // missing surface layer must still force the output to missing.
    let field = ArrayD::from_shape_vec(vec![2, 2], vec![f32::NAN, 10.0, 20.0, 20.0])?;
    let mean = gamma_weighted_mean(&field, 0, &weights)?;

    assert!(mean[[0]].is_nan());
    assert!(!mean[[1]].is_nan());
    Ok(())
}

#[test]
fn test_gamma_weight_length_mismatch_is_error() {
    let field = ArrayD::from_shape_vec(vec![3, 1], vec![1.0_f32, 2.0, 3.0]).unwrap();
    let result = gamma_weighted_mean(&field, 0, &[0.5, 0.5]);
    assert!(matches!(result, Err(PaleovarError::InvalidConfig { .. })));
}

#[test]
fn test_permille_delta_clamps_zero_denominator() -> Result<()> {
    let heavy = ArrayD::from_shape_vec(vec![3], vec![0.0_f32, 2e-18, 2e-8])?;
    let light = ArrayD::from_shape_vec(vec![3], vec![0.0_f32, 0.0, 1e-8])?;

    let delta = permille_delta(&heavy, &light)?;

    // Zero denominators are clamped to PTINY before dividing, so no value
    // blows up to infinity or NaN.
    assert!(delta.iter().all(|v| v.is_finite()));
    assert!((f64::from(delta[[0]]) - -1000.0).abs() < 1e-6);
    assert!((f64::from(delta[[1]]) - (2e-18 / PTINY - 1.0) * 1000.0).abs() < 1e-6);
    assert!((f64::from(delta[[2]]) - 1000.0).abs() < 1e-3);
    Ok(())
}

#[test]
fn test_permille_delta_shape_mismatch() {
    let heavy = ArrayD::from_shape_vec(vec![2], vec![1.0_f32, 1.0]).unwrap();
    let light = ArrayD::from_shape_vec(vec![3], vec![1.0_f32, 1.0, 1.0]).unwrap();
    assert!(matches!(
        permille_delta(&heavy, &light),
        Err(PaleovarError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_sum_fields_precipitation_components() -> Result<()> {
    let precc = ArrayD::from_shape_vec(vec![1], vec![1e-8_f32])?;
    let precl = ArrayD::from_shape_vec(vec![1], vec![2e-8_f32])?;

    let total = sum_fields(&[&precc, &precl])?;
    assert_eq!(total[[0]], 3e-8_f32);
    Ok(())
}

#[test]
fn test_sum_fields_shape_mismatch() {
    let a = ArrayD::from_shape_vec(vec![2], vec![1.0_f32, 1.0]).unwrap();
    let b = ArrayD::from_shape_vec(vec![3], vec![1.0_f32, 1.0, 1.0]).unwrap();
    assert!(matches!(
        sum_fields(&[&a, &b]),
        Err(PaleovarError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_mask_nonpositive() {
    let mut salt = ArrayD::from_shape_vec(vec![4], vec![35.0_f32, 0.0, -1.0, f32::NAN]).unwrap();
    mask_nonpositive(&mut salt);
    assert_eq!(salt[[0]], 35.0);
    assert!(salt[[1]].is_nan());
    assert!(salt[[2]].is_nan());
    assert!(salt[[3]].is_nan());
}

#[test]
fn test_potential_temperature_check_value() {
    // UNESCO 1983 check value for the algorithm.
    let theta = eos::potential_temperature(40.0, 40.0, 10000.0, 0.0);
    assert!((theta - 36.89073).abs() < 1e-3, "theta was {}", theta);
}

#[test]
fn test_insitu_inverts_potential_temperature() {
    // Converting a potential temperature to in-situ and referencing it back
    // to the surface must recover the starting value.
    let (s, p) = (34.7, 4000.0);
    let theta = 1.5;
    let t = eos::insitu_from_potential(theta, s, p);
    assert!(t > theta, "in-situ must exceed potential at depth");
    let back = eos::potential_temperature(s, t, p, 0.0);
    assert!((back - theta).abs() < 1e-3);
}

#[test]
fn test_pressure_from_depth() {
    assert!(eos::pressure_from_depth(0.0, 30.0).abs() < 1e-9);

    let p_1000 = eos::pressure_from_depth(1000.0, 30.0);
    assert!(p_1000 > 1000.0 && p_1000 < 1020.0, "pressure was {}", p_1000);

    // Stronger gravity toward the poles means more pressure per meter.
    assert!(eos::pressure_from_depth(1000.0, 80.0) > eos::pressure_from_depth(1000.0, 0.0));
}

#[test]
fn test_insitu_field_propagates_nan_and_checks_shapes() -> Result<()> {
    // Shape (time=2, depth=1, point=1).
    let theta = ArrayD::from_shape_vec(vec![2, 1, 1], vec![10.0_f32, f32::NAN])?;
    let salt = ArrayD::from_shape_vec(vec![2, 1, 1], vec![35.0_f32, 35.0])?;
    let pressure = ArrayD::from_shape_vec(vec![1, 1], vec![5.0_f64])?;

    let insitu = eos::insitu_field(&theta, &salt, &pressure, 1)?;
    assert!(!insitu[[0, 0, 0]].is_nan());
    assert!(insitu[[1, 0, 0]].is_nan());

    // Near-surface pressure leaves the value close to the potential value.
    assert!((f64::from(insitu[[0, 0, 0]]) - 10.0).abs() < 0.05);

    let bad_salt = ArrayD::from_shape_vec(vec![1, 1, 1], vec![35.0_f32])?;
    assert!(matches!(
        eos::insitu_field(&theta, &bad_salt, &pressure, 1),
        Err(PaleovarError::ShapeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_expand_glob_no_match() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let pattern = format!("{}/*.nc", temp_dir.path().display());

    match expand_glob(&pattern) {
        Err(PaleovarError::NoInputFiles { pattern: p }) => assert_eq!(p, pattern),
        other => panic!("Expected NoInputFiles error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_nearest_index() -> Result<()> {
    let z_t = [500.0, 1500.0, 2500.0];
    assert_eq!(nearest_index(&z_t, 500.0)?, 0);
    assert_eq!(nearest_index(&z_t, 1400.0)?, 1);
    assert_eq!(nearest_index(&z_t, 9000.0)?, 2);
    assert!(nearest_index(&[], 1.0).is_err());
    Ok(())
}

/// Create a minimal CAM-style file with one (time, lat, lon) variable.
fn create_cam_file(
    path: &std::path::Path,
    var_name: &str,
    times: &[f64],
    values: &[f32],
) -> Result<()> {
    let n_time = times.len();
    let mut file = create(path)?;
    file.add_dimension("time", n_time)?;
    file.add_dimension("lat", 2)?;
    file.add_dimension("lon", 2)?;
    file.add_dimension("nbnd", 2)?;

    let mut time_var = file.add_variable::<f64>("time", &["time"])?;
    time_var.put_attribute("units", "days since 0001-01-01 00:00:00")?;
    time_var.put(Array1::from(times.to_vec()).view(), ..)?;

    let mut bnds = file.add_variable::<f64>("time_bnds", &["time", "nbnd"])?;
    let bnds_values: Vec<f64> = times.iter().flat_map(|&t| [t - 1.0, t]).collect();
    bnds.put(
        Array2::from_shape_vec((n_time, 2), bnds_values)
            .unwrap()
            .view(),
        ..,
    )?;

    let mut var = file.add_variable::<f32>(var_name, &["time", "lat", "lon"])?;
    var.put_attribute("units", "m/s")?;
    var.put_attribute("long_name", "test variable")?;
    var.put_attribute("_FillValue", 9.96921e+36_f32)?;
    let data = ArrayD::from_shape_vec(vec![n_time, 2, 2], values.to_vec())?;
    var.put(data.view(), ..)?;

    Ok(())
}

#[test]
fn test_read_stacked_sorts_and_decodes_fill() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");

    // First file (alphabetically) holds the later times; stacking must
    // reorder records so time increases.
    let late = temp_dir.path().join("a_late.nc");
    let early = temp_dir.path().join("b_early.nc");

    let mut late_values = vec![2.0_f32; 4];
    late_values.extend(vec![3.0_f32; 4]);
    create_cam_file(&late, "PRECC", &[2.0, 3.0], &late_values)?;

    let mut early_values = vec![0.0_f32; 4];
    early_values.extend(vec![1.0_f32; 4]);
    early_values[0] = 9.96921e+36; // encoded missing value
    create_cam_file(&early, "PRECC", &[0.0, 1.0], &early_values)?;

    let pattern = format!("{}/*.nc", temp_dir.path().display());
    let (stacked, time) = read_stacked(&pattern, "PRECC")?;

    assert_eq!(stacked.dims, vec!["time", "lat", "lon"]);
    assert_eq!(stacked.data.shape(), &[4, 2, 2]);
    assert_eq!(time.values, vec![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(time.bounds_name, "time_bnds");
    assert_eq!(time.bounds.shape(), &[4, 2]);

    // Record values follow the sorted time order.
    assert!(stacked.data[[0, 0, 0]].is_nan()); // fill decoded to NaN
    assert_eq!(stacked.data[[0, 0, 1]], 0.0);
    assert_eq!(stacked.data[[1, 0, 0]], 1.0);
    assert_eq!(stacked.data[[2, 0, 0]], 2.0);
    assert_eq!(stacked.data[[3, 0, 0]], 3.0);

    assert_eq!(stacked.units.as_deref(), Some("m/s"));
    Ok(())
}

#[test]
fn test_read_stacked_missing_variable() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("input.nc");
    create_cam_file(&path, "PRECC", &[0.0], &[0.0; 4])?;

    let pattern = format!("{}/*.nc", temp_dir.path().display());
    let result = read_stacked(&pattern, "PRECL");
    assert!(matches!(
        result,
        Err(PaleovarError::VariableNotFound { .. })
    ));
    Ok(())
}

fn sample_output(name: &str) -> DerivedOutput {
    DerivedOutput {
        field: DerivedField {
            name: name.to_string(),
            data: ArrayD::from_shape_vec(vec![2, 2], vec![1.5_f32, f32::NAN, 3.5, 4.5]).unwrap(),
            dims: vec!["time".to_string(), "lat".to_string()],
            units: Some("degC".to_string()),
            long_name: Some("Sea Temperature (In-situ Temperature)".to_string()),
        },
        time: TimeAxis {
            values: vec![10.0, 20.0],
            units: Some("days since 0001-01-01 00:00:00".to_string()),
            calendar: Some("noleap".to_string()),
            bounds_name: "time_bound".to_string(),
            bounds: ArrayD::from_shape_vec(vec![2, 2], vec![5.0, 10.0, 15.0, 20.0]).unwrap(),
        },
    }
}

#[test]
fn test_output_writer_roundtrip() -> Result<()> {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let out_path = temp_dir.path().join("tos.nc");

    let output = sample_output("tos");
    OutputWriter::new(&out_path).write(&output)?;

    let file = open(&out_path)?;
    let var = file.variable("tos").expect("Variable should exist");
    assert_eq!(var.dimensions()[0].name(), "time");
    assert_eq!(var.dimensions()[1].name(), "lat");

    let values: Vec<f32> = var.get_values::<f32, _>(..)?;
    assert_eq!(values[0], 1.5);
    assert!(values[1] >= 1e30, "NaN must be stored as the fill value");
    assert_eq!(values[2], 3.5);
    assert_eq!(values[3], 4.5);

    assert_eq!(
        paleovar::stack::attr_string(&file, "tos", "units").as_deref(),
        Some("degC")
    );
    assert_eq!(
        paleovar::stack::attr_string(&file, "tos", "long_name").as_deref(),
        Some("Sea Temperature (In-situ Temperature)")
    );

    // Time coordinate and bounds companion survive the round trip.
    let time_var = file.variable("time").expect("time should exist");
    let times: Vec<f64> = time_var.get_values::<f64, _>(..)?;
    assert_eq!(times, vec![10.0, 20.0]);

    let bounds_var = file.variable("time_bound").expect("bounds should exist");
    assert_eq!(bounds_var.dimensions()[1].name(), "d2");

    Ok(())
}

#[test]
fn test_output_writer_rejects_bad_variable_name() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let out_path = temp_dir.path().join("bad.nc");

    let output = sample_output("not a name");
    let result = OutputWriter::new(&out_path).write(&output);
    assert!(matches!(result, Err(PaleovarError::InvalidConfig { .. })));
    assert!(!out_path.exists(), "no partial output on failure");
}

#[test]
fn test_validate_name() {
    assert!(DerivedField::validate_name("tos").is_ok());
    assert!(DerivedField::validate_name("d18osw").is_ok());
    assert!(DerivedField::validate_name("_internal").is_ok());
    assert!(DerivedField::validate_name("").is_err());
    assert!(DerivedField::validate_name("9pr").is_err());
    assert!(DerivedField::validate_name("has space").is_err());
}
