use anyhow::{Context, Result};
use drs4sync::{CliArgs, Synchronizer};
use drs4tools::calib::ModuleCalibrations;
use drs4tools::cfg::Run;
use drs4tools::de::{self, ModuleReader};
use drs4tools::ser;
use std::io::{stdout, Read};
use tracing_subscriber::EnvFilter;

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        println!(
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        );
        return Ok(())
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let run = Run::from_path(&args.run)?;
    tracing::info!(name = %run.name, modules = run.modules.len(), "loaded run");
    let max_events = args.max_events.or(run.max_events);

    let mut sync: Synchronizer<Box<dyn Read + Send>, ModuleCalibrations> = Synchronizer::new();
    for module in &run.modules {
        let calibrations = module.load_calibrations()?;
        let source = de::open(&module.data)
            .with_context(|| format!("module {}: cannot open data", module.id))?;
        let mut reader = ModuleReader::new(module.id, source, calibrations);
        if let Some(time_scale) = run.time_scale {
            reader = reader.with_time_scale(time_scale);
        }
        sync.add_reader(reader);
    }

    let stdout = stdout();
    let stdout = stdout.lock();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_writer(stdout);

    let mut count = 0u64;
    while max_events.map_or(true, |n| count < n) {
        let more = match args.parallel {
            true => sync.next_parallel()?,
            false => sync.next()?,
        };
        if !more {
            break
        }
        for (&module, event) in sync.event().module_events() {
            match args.summary {
                true => ser::summary_tsv(&mut wtr, module, event)?,
                false => ser::tsv(&mut wtr, module, event)?,
            }
        }
        count += 1;
    }
    wtr.flush()?;
    tracing::info!(events = count, "done");
    Ok(())
}
