//! Entry point for the paleovar application.
//! Handles CLI parsing and dispatches each transform subcommand: reading the
//! raw input globs, deriving the requested variable, and writing the output
//! NetCDF file.

use clap::Parser;
use netcdf::open;
use std::path::Path;

use paleovar::cli::{Cli, Command};
use paleovar::errors::Result;
use paleovar::metadata::{describe_variable, print_metadata};
use paleovar::output::{DerivedOutput, OutputWriter};
use paleovar::parallel::ParallelConfig;
use paleovar::transfer::{self, EndpointSpec};
use paleovar::transforms::{self, IsotopeDeltaGlobs, OceanOptions};

fn main() {
    let cli = Cli::parse();

    println!(
        r#"
------------------------------------------------------------------
             ____        _            __     __
            |  _ \ __ _ | | ___  ___  \ \   / /_ _ _ __
            | |_) / _` || |/ _ \/ _ \  \ \ / / _` | '__|
            |  __/ (_| || |  __/ (_) |  \ V / (_| | |
            |_|   \__,_||_|\___|\___/    \_/ \__,_|_|
                  Rust-based iCESM post-processing
------------------------------------------------------------------
                        "#
    );

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    ParallelConfig::new(cli.threads).setup_global_pool()?;

    if cli.verbose {
        println!("🔧 Running with options: {:#?}", cli.command);
    }

    match cli.command {
        Command::MakePr(args) => {
            let output = transforms::make_pr(&args.precc_glob, &args.precl_glob, &args.out_var)?;
            save(&output, &args.outfl)
        }
        Command::MakeTas(args) => {
            let output = transforms::make_tas(&args.trefht_glob, &args.out_var)?;
            save(&output, &args.outfl)
        }
        Command::MakeTs(args) => {
            let output = transforms::make_ts(&args.ts_glob, &args.out_var)?;
            save(&output, &args.outfl)
        }
        Command::MakeD18op(args) => {
            let globs = IsotopeDeltaGlobs {
                light: [
                    &args.precrc_h216o_glob,
                    &args.precrl_h216o_glob,
                    &args.precsc_h216o_glob,
                    &args.precsl_h216o_glob,
                ],
                heavy: [
                    &args.precrc_h218o_glob,
                    &args.precrl_h218o_glob,
                    &args.precsc_h218o_glob,
                    &args.precsl_h218o_glob,
                ],
            };
            let output = transforms::make_d18op(&globs, &args.out_var)?;
            save(&output, &args.outfl)
        }
        Command::MakeDdp(args) => {
            let globs = IsotopeDeltaGlobs {
                light: [
                    &args.precrc_h2o_glob,
                    &args.precrl_h2o_glob,
                    &args.precsc_h2o_glob,
                    &args.precsl_h2o_glob,
                ],
                heavy: [
                    &args.precrc_hdo_glob,
                    &args.precrl_hdo_glob,
                    &args.precsc_hdo_glob,
                    &args.precsl_hdo_glob,
                ],
            };
            let output = transforms::make_ddp(&globs, &args.out_var)?;
            save(&output, &args.outfl)
        }
        Command::MakeTos(args) => {
            let opts = OceanOptions {
                time_chunks: args.time_chunks,
                mask_badsalt: args.mask_badsalt,
            };
            let output =
                transforms::make_tos(&args.temp_glob, &args.salt_glob, &args.out_var, &opts)?;
            save(&output, &args.outfl)
        }
        Command::MakeSos(args) => {
            let opts = OceanOptions {
                mask_badsalt: args.mask_badsalt,
                ..OceanOptions::default()
            };
            let output = transforms::make_sos(&args.salt_glob, &args.out_var, &opts)?;
            save(&output, &args.outfl)
        }
        Command::MakeToga(args) => {
            let opts = OceanOptions {
                time_chunks: args.time_chunks,
                mask_badsalt: args.mask_badsalt,
            };
            let output =
                transforms::make_toga(&args.temp_glob, &args.salt_glob, &args.out_var, &opts)?;
            save(&output, &args.outfl)
        }
        Command::MakeD18osw(args) => {
            let output = transforms::make_d18osw(
                &args.r18o_glob,
                &args.out_var,
                args.bad_sos_glob.as_deref(),
                &args.sos_var,
            )?;
            save(&output, &args.outfl)
        }
        Command::Combine(args) => {
            transforms::combine_glob(&args.nc_glob, &args.sortby, &args.outfl)?;
            println!("✅ Saved combined dataset to {}", args.outfl.display());
            Ok(())
        }
        Command::Inspect(args) => {
            let file = open(&args.file)?;
            match args.describe {
                Some(var_name) => describe_variable(&file, &var_name),
                None => print_metadata(&file),
            }
        }
        Command::Fetch(args) => {
            let remote = EndpointSpec::new(&args.remote_endpoint, &args.remote_owner);
            let local = EndpointSpec::new(&args.local_endpoint, &args.local_owner);
            transfer::fetch(&remote, &local, &args.from_dir, &args.to_dir)?;
            println!("✅ Transfer submitted");
            Ok(())
        }
    }
}

fn save(output: &DerivedOutput, outfl: &Path) -> Result<()> {
    let writer = OutputWriter::new(outfl);
    writer.write(output)?;
    println!(
        "✅ Saved variable '{}' to {}",
        output.field.name,
        outfl.display()
    );
    Ok(())
}
