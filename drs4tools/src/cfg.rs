//! Configuration tools: declaring which module streams make up a run
//!
//! A run file is JSON. Every module names its data file and, optionally, a
//! calibration file holding [`ModuleCalibrations`] as JSON. Modules without
//! calibrations are decoded with zero pedestals and a zero time axis.
//!
//! ```json
//! {
//!     "name": "beam_test_042",
//!     "modules": [
//!         {"id": 0, "data": "run042_mod0.dat", "calibrations": "mod0.json"},
//!         {"id": 1, "data": "run042_mod1.dat.zst", "calibrations": "mod1.json"}
//!     ],
//!     "time_scale": [1.0, 2.0, 5.0, 6.666666666666667]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::calib::ModuleCalibrations;

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct Run {
    #[serde(default)]
    pub name: String,
    #[serde(default = "emptyvec", skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<Module>,
    /// Per-frequency time scale, overriding the built-in table
    pub time_scale: Option<[f64; 4]>,
    /// Stop after this many events
    pub max_events: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Module {
    pub id: usize,
    pub data: PathBuf,
    pub calibrations: Option<PathBuf>,
}

fn emptyvec<T>() -> Vec<T> {
    Vec::new()
}

impl Run {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Run> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("cannot open run file {}", path.display()))?;
        let run: Run = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("cannot parse run file {}", path.display()))?;
        Ok(run.relative_to(path.parent().unwrap_or_else(|| Path::new(""))))
    }

    /// Resolve relative module paths against `dir`
    pub fn relative_to(mut self, dir: &Path) -> Run {
        for m in self.modules.iter_mut() {
            m.data = dir.join(&m.data);
            m.calibrations = m.calibrations.take().map(|c| dir.join(c));
        }
        self
    }
}

impl Module {
    /// Load this module's calibrations, or zeroed tables if none are given
    pub fn load_calibrations(&self) -> Result<ModuleCalibrations> {
        match &self.calibrations {
            Some(path) => {
                let f = File::open(path).with_context(|| {
                    format!("module {}: cannot open calibrations {}", self.id, path.display())
                })?;
                let calibrations = ModuleCalibrations::from_json(BufReader::new(f))
                    .with_context(|| format!("module {}: bad calibrations", self.id))?;
                Ok(calibrations)
            }
            None => {
                tracing::warn!(module = self.id, "no calibrations given, using zeroed tables");
                Ok(ModuleCalibrations::zeroed())
            }
        }
    }
}
