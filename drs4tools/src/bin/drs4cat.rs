use anyhow::{bail, Context, Result};
use argh::FromArgs;
use either::{Left, Right};
use std::fs::File;
use std::io::{stdin, stdout, BufReader, Read, Write};
use tracing_subscriber::EnvFilter;

use drs4tools::calib::ModuleCalibrations;
use drs4tools::de::{self, ModuleReader};
use drs4tools::ser;
use drs4tools::wave::DEFAULT_TIME_SCALE;

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[derive(Debug, FromArgs, Clone)]
/// Decode raw digitizer streams of a single module and print the
/// calibrated waveforms as tab-separated values (event, module, group,
/// channel, sample, time, amplitude) to standard output.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// calibration tables (JSON); raw codes are only scaled if omitted
    #[argh(option, short = 'c')]
    pub calibrations: Option<String>,
    /// module id reported in the output
    #[argh(option, short = 'm', default = "0")]
    pub module: usize,
    /// print one summary record per event instead of every sample
    #[argh(switch, short = 's')]
    pub summary: bool,
    /// time scale for the four sampling frequencies, comma separated
    #[argh(option)]
    pub time_scale: Option<String>,
    /// with no input or when input is '-', read from standard input
    #[argh(positional)]
    pub input: Vec<String>,
}

fn parse_time_scale(s: &str) -> Result<[f64; 4]> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("time scale must be numbers")?;
    match <[f64; 4]>::try_from(values) {
        Ok(table) => Ok(table),
        Err(v) => bail!("time scale needs 4 entries, got {}", v.len()),
    }
}

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        let stdout = stdout();
        let mut stdout = stdout.lock();
        writeln!(
            stdout,
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        )?;
        return Ok(())
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let calibrations = match &args.calibrations {
        Some(path) => {
            let f = File::open(path).with_context(|| format!("cannot open {}", path))?;
            ModuleCalibrations::from_json(BufReader::new(f))?
        }
        None => ModuleCalibrations::zeroed(),
    };
    let time_scale = match &args.time_scale {
        Some(s) => parse_time_scale(s)?,
        None => DEFAULT_TIME_SCALE,
    };

    // Collect inputs
    let mut inputs = Vec::new();
    if args.input.is_empty() {
        inputs.push(Left(()));
    } else {
        let mut contains_stdin = false;
        for i in &args.input {
            if i == "-" {
                if contains_stdin {
                    bail!("cannot specify '-' for stdin twice");
                }
                contains_stdin = true;
                inputs.push(Left(()));
            } else {
                inputs.push(Right(i.clone()));
            }
        }
    }

    let stdout = stdout();
    let stdout = stdout.lock();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_writer(stdout);

    for i in inputs {
        let source: Box<dyn Read + Send> = match i {
            Left(()) => Box::new(stdin()),
            Right(path) => de::open(&path)?,
        };
        let reader =
            ModuleReader::new(args.module, source, &calibrations).with_time_scale(time_scale);
        for event in reader {
            let event = event?;
            if args.summary {
                ser::summary_tsv(&mut wtr, args.module, &event)?;
            } else {
                ser::tsv(&mut wtr, args.module, &event)?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}
