// SPDX-License-Identifier: MIT
//! Command-line entry point for the heap-dump remapper

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hprof_remap::{load_mappings, RecordReader, RecordWriter, Remapper};

#[derive(Parser)]
#[command(
    name = "hprof-remap",
    version,
    about = "Rewrite obfuscated method and field names in an HPROF heap dump"
)]
struct Args {
    /// Mapping source: a directory with methods.csv/fields.csv, or a zip
    /// archive containing both
    #[arg(short = 'm', value_name = "PATH", value_parser = existing_path)]
    mapping: PathBuf,

    /// Input heap dump
    #[arg(short = 'i', value_name = "PATH", value_parser = existing_path)]
    input: PathBuf,

    /// Output heap dump, must differ from the input
    #[arg(short = 'o', value_name = "PATH")]
    output: PathBuf,
}

impl Args {
    fn validate(&self) -> Result<()> {
        let input = std::path::absolute(&self.input)?;
        let output = std::path::absolute(&self.output)?;
        if input == output {
            bail!("Input and output files must be different");
        }

        Ok(())
    }
}

fn existing_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("path '{}' does not exist", value))
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::DisplayHelp || e.kind() == ErrorKind::DisplayVersion => {
            e.print()?;
            return Ok(());
        }
        Err(e) => {
            e.print()?;
            std::process::exit(1);
        }
    };
    args.validate()?;

    info!("hprof-remap version {}", env!("CARGO_PKG_VERSION"));
    info!("Mapping location: {}", args.mapping.display());
    info!("Input file      : {}", args.input.display());
    info!("Output file     : {}", args.output.display());

    let mappings = load_mappings(&args.mapping).with_context(|| {
        format!(
            "Failed to load mappings from {}",
            args.mapping.display()
        )
    })?;

    let input = File::open(&args.input)
        .with_context(|| format!("Failed to open input file {}", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("Failed to create output file {}", args.output.display()))?;

    let mut reader = RecordReader::new(BufReader::new(input));
    let mut writer = RecordWriter::new(BufWriter::new(output));

    let stats = Remapper::new(mappings.methods, mappings.fields)
        .run(&mut reader, &mut writer)
        .context("Failed to remap heap dump")?;
    writer.flush().context("Failed to flush output file")?;

    info!(
        "Done: {} records written, {} strings remapped",
        stats.records, stats.strings_remapped
    );

    Ok(())
}
