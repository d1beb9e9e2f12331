//! Centralized error handling for paleovar
//!
//! This module provides structured error types used across the crate,
//! enabling better error context and type safety than a generic
//! `Box<dyn Error>`.

use std::fmt;

/// Main error type for paleovar operations
#[derive(Debug)]
pub enum PaleovarError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// A glob pattern matched no input files
    NoInputFiles { pattern: String },

    /// Malformed glob pattern or unreadable match
    GlobError(String),

    /// Variable not found in NetCDF file
    VariableNotFound { var: String },

    /// Dimension not found in variable
    DimensionNotFound { var: String, dim: String },

    /// Combined fields have incompatible shapes
    ShapeMismatch { message: String },

    /// Invalid transform configuration (e.g. malformed output variable name)
    InvalidConfig { message: String },

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// External file-transfer tool failure
    TransferError(String),

    /// Generic error
    Generic(String),
}

impl fmt::Display for PaleovarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaleovarError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            PaleovarError::IoError(e) => write!(f, "I/O error: {}", e),
            PaleovarError::ArrayError(e) => write!(f, "Array error: {}", e),
            PaleovarError::NoInputFiles { pattern } => {
                write!(f, "No input files matched glob pattern '{}'", pattern)
            }
            PaleovarError::GlobError(msg) => write!(f, "Glob error: {}", msg),
            PaleovarError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            PaleovarError::DimensionNotFound { var, dim } => {
                write!(f, "Dimension '{}' not found in variable '{}'", dim, var)
            }
            PaleovarError::ShapeMismatch { message } => write!(f, "Shape mismatch: {}", message),
            PaleovarError::InvalidConfig { message } => {
                write!(f, "Invalid configuration: {}", message)
            }
            PaleovarError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            PaleovarError::TransferError(msg) => write!(f, "Transfer error: {}", msg),
            PaleovarError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for PaleovarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PaleovarError::NetCDFError(e) => Some(e),
            PaleovarError::IoError(e) => Some(e),
            PaleovarError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for PaleovarError {
    fn from(error: netcdf::Error) -> Self {
        PaleovarError::NetCDFError(error)
    }
}

impl From<std::io::Error> for PaleovarError {
    fn from(error: std::io::Error) -> Self {
        PaleovarError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for PaleovarError {
    fn from(error: ndarray::ShapeError) -> Self {
        PaleovarError::ArrayError(error)
    }
}

impl From<glob::PatternError> for PaleovarError {
    fn from(error: glob::PatternError) -> Self {
        PaleovarError::GlobError(error.to_string())
    }
}

impl From<glob::GlobError> for PaleovarError {
    fn from(error: glob::GlobError) -> Self {
        PaleovarError::GlobError(error.to_string())
    }
}

impl From<String> for PaleovarError {
    fn from(error: String) -> Self {
        PaleovarError::Generic(error)
    }
}

impl From<&str> for PaleovarError {
    fn from(error: &str) -> Self {
        PaleovarError::Generic(error.to_string())
    }
}

/// Result type alias for paleovar operations
pub type Result<T> = std::result::Result<T, PaleovarError>;
