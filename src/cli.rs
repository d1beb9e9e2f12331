//! Defines command-line interface options using `clap` for the paleovar
//! application.
//!
//! Every transform gets its own subcommand enumerating the required input
//! globs, the output variable name (with its documented default), the output
//! path, and any optional flags. Nothing is read from process-wide state.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// A CLI tool for deriving analysis-ready variables from iCESM output
#[derive(Parser, Debug)]
#[command(
    version,
    name = "paleovar",
    about = "Derive analysis-ready climate variables from raw iCESM NetCDF output"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Derive total precipitation rate from CAM PRECC and PRECL files
    MakePr(MakePrArgs),
    /// Derive near-surface air temperature from CAM TREFHT files
    MakeTas(MakeTasArgs),
    /// Derive surface temperature from CAM TS files
    MakeTs(MakeTsArgs),
    /// Derive precipitation d18O from CAM water isotope files
    MakeD18op(MakeD18opArgs),
    /// Derive precipitation dD from CAM water isotope files
    MakeDdp(MakeDdpArgs),
    /// Derive sea surface (in-situ) temperature from POP TEMP and SALT files
    MakeTos(MakeTosArgs),
    /// Derive sea surface salinity from POP SALT files
    MakeSos(MakeSosArgs),
    /// Derive gamma-average sea temperature from POP TEMP and SALT files
    MakeToga(MakeTogaArgs),
    /// Derive seawater d18O from POP R18O files
    MakeD18osw(MakeD18oswArgs),
    /// Combine a glob of NetCDF files into a single time-sorted file
    Combine(CombineArgs),
    /// Print the structure of a NetCDF file
    Inspect(InspectArgs),
    /// Stage raw archive directories with the Globus CLI
    Fetch(FetchArgs),
}

#[derive(Args, Debug)]
pub struct MakePrArgs {
    /// Glob pattern to input CAM PRECC NetCDF files.
    #[arg(long)]
    pub precc_glob: String,

    /// Glob pattern to input CAM PRECL NetCDF files.
    #[arg(long)]
    pub precl_glob: String,

    /// Variable name in output NetCDF file.
    #[arg(long, default_value = "pr")]
    pub out_var: String,

    /// Path for output NetCDF file.
    #[arg(long)]
    pub outfl: PathBuf,
}

#[derive(Args, Debug)]
pub struct MakeTasArgs {
    /// Glob pattern to input CAM TREFHT NetCDF files.
    #[arg(long)]
    pub trefht_glob: String,

    /// Variable name in output NetCDF file.
    #[arg(long, default_value = "tas")]
    pub out_var: String,

    /// Path for output NetCDF file.
    #[arg(long)]
    pub outfl: PathBuf,
}

#[derive(Args, Debug)]
pub struct MakeTsArgs {
    /// Glob pattern to input CAM TS NetCDF files.
    #[arg(long)]
    pub ts_glob: String,

    /// Variable name in output NetCDF file.
    #[arg(long, default_value = "ts")]
    pub out_var: String,

    /// Path for output NetCDF file.
    #[arg(long)]
    pub outfl: PathBuf,
}

#[derive(Args, Debug)]
pub struct MakeD18opArgs {
    /// Glob pattern to input CAM PRECRC_H216Or NetCDF files.
    #[arg(long)]
    pub precrc_h216o_glob: String,

    /// Glob pattern to input CAM PRECRL_H216OR NetCDF files.
    #[arg(long)]
    pub precrl_h216o_glob: String,

    /// Glob pattern to input CAM PRECSC_H216Os NetCDF files.
    #[arg(long)]
    pub precsc_h216o_glob: String,

    /// Glob pattern to input CAM PRECSL_H216OS NetCDF files.
    #[arg(long)]
    pub precsl_h216o_glob: String,

    /// Glob pattern to input CAM PRECRC_H218Or NetCDF files.
    #[arg(long)]
    pub precrc_h218o_glob: String,

    /// Glob pattern to input CAM PRECRL_H218OR NetCDF files.
    #[arg(long)]
    pub precrl_h218o_glob: String,

    /// Glob pattern to input CAM PRECSC_H218Os NetCDF files.
    #[arg(long)]
    pub precsc_h218o_glob: String,

    /// Glob pattern to input CAM PRECSL_H218OS NetCDF files.
    #[arg(long)]
    pub precsl_h218o_glob: String,

    /// Variable name in output NetCDF file.
    #[arg(long, default_value = "d18op")]
    pub out_var: String,

    /// Path for output NetCDF file.
    #[arg(long)]
    pub outfl: PathBuf,
}

#[derive(Args, Debug)]
pub struct MakeDdpArgs {
    /// Glob pattern to input CAM PRECRC_H2Or NetCDF files.
    #[arg(long)]
    pub precrc_h2o_glob: String,

    /// Glob pattern to input CAM PRECRL_H2OR NetCDF files.
    #[arg(long)]
    pub precrl_h2o_glob: String,

    /// Glob pattern to input CAM PRECSC_H2Os NetCDF files.
    #[arg(long)]
    pub precsc_h2o_glob: String,

    /// Glob pattern to input CAM PRECSL_H2OS NetCDF files.
    #[arg(long)]
    pub precsl_h2o_glob: String,

    /// Glob pattern to input CAM PRECRC_HDOr NetCDF files.
    #[arg(long)]
    pub precrc_hdo_glob: String,

    /// Glob pattern to input CAM PRECRL_HDOR NetCDF files.
    #[arg(long)]
    pub precrl_hdo_glob: String,

    /// Glob pattern to input CAM PRECSC_HDOs NetCDF files.
    #[arg(long)]
    pub precsc_hdo_glob: String,

    /// Glob pattern to input CAM PRECSL_HDOS NetCDF files.
    #[arg(long)]
    pub precsl_hdo_glob: String,

    /// Variable name in output NetCDF file.
    #[arg(long, default_value = "ddp")]
    pub out_var: String,

    /// Path for output NetCDF file.
    #[arg(long)]
    pub outfl: PathBuf,
}

#[derive(Args, Debug)]
pub struct MakeTosArgs {
    /// Glob pattern to input POP TEMP NetCDF files.
    #[arg(long)]
    pub temp_glob: String,

    /// Glob pattern to input POP SALT NetCDF files.
    #[arg(long)]
    pub salt_glob: String,

    /// Variable name in output NetCDF file.
    #[arg(long, default_value = "tos")]
    pub out_var: String,

    /// Path for output NetCDF file.
    #[arg(long)]
    pub outfl: PathBuf,

    /// Minimum number of time steps handled by each parallel job.
    #[arg(long, default_value_t = 5)]
    pub time_chunks: usize,

    /// Mask-out non-positive SALT values with NAs?
    #[arg(long, default_value_t = false)]
    pub mask_badsalt: bool,
}

#[derive(Args, Debug)]
pub struct MakeSosArgs {
    /// Glob pattern to input POP SALT NetCDF files.
    #[arg(long)]
    pub salt_glob: String,

    /// Variable name in output NetCDF file.
    #[arg(long, default_value = "sos")]
    pub out_var: String,

    /// Path for output NetCDF file.
    #[arg(long)]
    pub outfl: PathBuf,

    /// Mask-out non-positive SALT values with NAs?
    #[arg(long, default_value_t = false)]
    pub mask_badsalt: bool,
}

#[derive(Args, Debug)]
pub struct MakeTogaArgs {
    /// Glob pattern to input POP TEMP NetCDF files.
    #[arg(long)]
    pub temp_glob: String,

    /// Glob pattern to input POP SALT NetCDF files.
    #[arg(long)]
    pub salt_glob: String,

    /// Variable name in output NetCDF file.
    #[arg(long, default_value = "toga")]
    pub out_var: String,

    /// Path for output NetCDF file.
    #[arg(long)]
    pub outfl: PathBuf,

    /// Minimum number of time steps handled by each parallel job.
    #[arg(long, default_value_t = 5)]
    pub time_chunks: usize,

    /// Mask-out non-positive SALT values with NAs?
    #[arg(long, default_value_t = false)]
    pub mask_badsalt: bool,
}

#[derive(Args, Debug)]
pub struct MakeD18oswArgs {
    /// Glob pattern to input POP R18O NetCDF files.
    #[arg(long)]
    pub r18o_glob: String,

    /// Variable name in output NetCDF file.
    #[arg(long, default_value = "d18osw")]
    pub out_var: String,

    /// Path for output NetCDF file.
    #[arg(long)]
    pub outfl: PathBuf,

    /// Glob pattern to derived surface-salinity NetCDF files, used to mask
    /// grid points with non-positive salinity.
    #[arg(long)]
    pub bad_sos_glob: Option<String>,

    /// Surface salinity variable name within the mask files.
    #[arg(long, default_value = "sos")]
    pub sos_var: String,
}

#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Glob pattern for NetCDF files.
    #[arg(long)]
    pub nc_glob: String,

    /// Path for output NetCDF file.
    #[arg(long)]
    pub outfl: PathBuf,

    /// Coordinate variable to sort merged records by.
    #[arg(long, default_value = "time")]
    pub sortby: String,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the NetCDF file.
    #[arg(short, long)]
    pub file: PathBuf,

    /// Describe a specific variable (data type, shape, and attributes).
    #[arg(long)]
    pub describe: Option<String>,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Remote directory to transfer, recursively.
    #[arg(long)]
    pub from_dir: String,

    /// Local destination directory.
    #[arg(long)]
    pub to_dir: String,

    /// Display name of the remote Globus endpoint.
    #[arg(long, default_value = "NCAR Campaign Storage")]
    pub remote_endpoint: String,

    /// Owner ID of the remote Globus endpoint.
    #[arg(long, default_value = "ncar@globusid.org")]
    pub remote_owner: String,

    /// Display name of the local Globus endpoint.
    #[arg(long)]
    pub local_endpoint: String,

    /// Owner ID of the local Globus endpoint.
    #[arg(long)]
    pub local_owner: String,
}
