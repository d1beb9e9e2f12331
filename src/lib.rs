//! paleovar: derived-variable post-processing for iCESM NetCDF output
//!
//! A Rust library and CLI for turning raw iCESM (isotope-enabled CESM)
//! history output into analysis-ready gridded variables. Raw model output
//! arrives as one multi-file time series per variable; each transform reads
//! its inputs by glob pattern, applies a small physical or arithmetic
//! derivation, and writes a single NetCDF file holding the derived variable
//! with its time-bounds companion and metadata.
//!
//! ## Key Features
//!
//! - **Multi-file stacking**: glob selection, record-axis concatenation, and
//!   time sorting with fill values decoded to NaN
//! - **Physical transforms**: potential-to-in-situ temperature conversion and
//!   gamma-weighted depth averaging for proxy temperatures
//! - **Arithmetic transforms**: precipitation totals and per-mille isotope
//!   deltas with clamped denominators
//! - **Parallel Processing**: elementwise conversions computed with Rayon
//! - **Atomic Outputs**: results land under their final path only after a
//!   complete, successful write
//!
//! ## Module Organization
//!
//! - [`stack`]: glob expansion and multi-file record stacking
//! - [`eos`]: seawater equation-of-state conversions
//! - [`gamma`]: gamma-weighted depth averaging
//! - [`transforms`]: the derived-variable transforms
//! - [`output`]: derived-variable NetCDF writing
//! - [`metadata`]: NetCDF file inspection
//! - [`transfer`]: Globus CLI wrapper for staging raw archives
//! - [`parallel`]: parallel processing configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use paleovar::prelude::*;
//!
//! // Derive total precipitation from CAM convective + large-scale files
//! let output = paleovar::transforms::make_pr(
//!     "/data/case/*.PRECC.*.nc",
//!     "/data/case/*.PRECL.*.nc",
//!     "pr",
//! ).unwrap();
//!
//! OutputWriter::new(std::path::Path::new("pr.nc")).write(&output).unwrap();
//! ```
//!
//! The library is designed around fail-fast error handling: a run either
//! completes and writes its output file or aborts with a descriptive error
//! before any output is observable.

// Core modules
pub mod cli;
pub mod eos;
pub mod errors;
pub mod gamma;
pub mod metadata;
pub mod output;
pub mod parallel;
pub mod stack;
pub mod transfer;
pub mod transforms;

// Direct re-exports for the public API
pub use errors::*;
pub use output::*;
pub use stack::*;

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::errors::{PaleovarError, Result};
    pub use crate::output::{DerivedField, DerivedOutput, OutputWriter};
    pub use crate::parallel::ParallelConfig;
    pub use crate::stack::{read_stacked, StackedVariable, TimeAxis};
    pub use crate::transforms::{IsotopeDeltaGlobs, OceanOptions};
}
