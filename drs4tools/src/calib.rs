//! Calibration tables consumed by the event decoder
//!
//! The decoder only ever queries calibrations through [`CalibrationLookup`],
//! so any preloaded, immutable store can back it. [`ModuleCalibrations`] is
//! the in-memory store used by the tools, loaded from JSON.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::sync::Arc;

use crate::{Error, Result, CELLS, CHANNELS, GROUPS};

/// Read-only access to the calibrations of one module.
///
/// Every table is indexed by ring buffer cell and holds at least [`CELLS`]
/// entries. Channel index 8 refers to the trigger channel.
pub trait CalibrationLookup {
    /// Width of every cell of a group, in the 5 GS/s time unit
    fn time_calibrations(&self, group: usize) -> Option<&[f64]>;
    /// Pedestal of every cell of a channel
    fn offset_mean(&self, group: usize, channel: usize) -> Option<&[f64]>;
    /// Per-sample amplitude correction of a channel
    fn calib_sample(&self, group: usize, channel: usize) -> Option<&[f64]>;
}

impl<T: CalibrationLookup + ?Sized> CalibrationLookup for &T {
    fn time_calibrations(&self, group: usize) -> Option<&[f64]> {
        (**self).time_calibrations(group)
    }

    fn offset_mean(&self, group: usize, channel: usize) -> Option<&[f64]> {
        (**self).offset_mean(group, channel)
    }

    fn calib_sample(&self, group: usize, channel: usize) -> Option<&[f64]> {
        (**self).calib_sample(group, channel)
    }
}

impl<T: CalibrationLookup + ?Sized> CalibrationLookup for Arc<T> {
    fn time_calibrations(&self, group: usize) -> Option<&[f64]> {
        (**self).time_calibrations(group)
    }

    fn offset_mean(&self, group: usize, channel: usize) -> Option<&[f64]> {
        (**self).offset_mean(group, channel)
    }

    fn calib_sample(&self, group: usize, channel: usize) -> Option<&[f64]> {
        (**self).calib_sample(group, channel)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChannelCalibrations {
    pub off_mean: Vec<f64>,
    pub calib_sample: Vec<f64>,
}

/// Calibrations of one group: its time calibration and up to nine
/// channels, the last one being the trigger channel
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GroupCalibrations {
    pub time_calibrations: Vec<f64>,
    pub channels: Vec<ChannelCalibrations>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModuleCalibrations {
    pub groups: Vec<GroupCalibrations>,
}

impl ChannelCalibrations {
    pub fn zeroed() -> Self {
        ChannelCalibrations {
            off_mean: vec![0.0; CELLS],
            calib_sample: vec![0.0; CELLS],
        }
    }
}

impl GroupCalibrations {
    /// Zero pedestals and corrections with a uniform cell width
    pub fn uniform(cell_width: f64) -> Self {
        GroupCalibrations {
            time_calibrations: vec![cell_width; CELLS],
            channels: (0..=CHANNELS).map(|_| ChannelCalibrations::zeroed()).collect(),
        }
    }
}

impl ModuleCalibrations {
    /// All-zero tables for every group and channel, turning raw codes
    /// straight into millivolts
    pub fn zeroed() -> Self {
        Self::uniform(0.0)
    }

    pub fn uniform(cell_width: f64) -> Self {
        ModuleCalibrations {
            groups: (0..GROUPS).map(|_| GroupCalibrations::uniform(cell_width)).collect(),
        }
    }

    /// Deserialize from JSON and check every table covers the ring buffer
    pub fn from_json(rdr: impl Read) -> Result<Self> {
        let calibrations: ModuleCalibrations = serde_json::from_reader(rdr)?;
        calibrations.validate()?;
        Ok(calibrations)
    }

    pub fn validate(&self) -> Result<()> {
        for (group, g) in self.groups.iter().enumerate() {
            check_cells(g.time_calibrations.len(), group, None)?;
            for (channel, c) in g.channels.iter().enumerate() {
                check_cells(c.off_mean.len(), group, Some(channel))?;
                check_cells(c.calib_sample.len(), group, Some(channel))?;
            }
        }
        Ok(())
    }

    pub fn group_mut(&mut self, group: usize) -> Option<&mut GroupCalibrations> {
        self.groups.get_mut(group)
    }

    fn channel(&self, group: usize, channel: usize) -> Option<&ChannelCalibrations> {
        self.groups.get(group)?.channels.get(channel)
    }
}

fn check_cells(len: usize, group: usize, channel: Option<usize>) -> Result<()> {
    if len < CELLS {
        let table = match channel {
            Some(ch) => format!("group {} channel {}", group, ch),
            None => format!("group {} time calibration", group),
        };
        return Err(Error::Config(format!(
            "{} has {} cells, expected {}",
            table, len, CELLS
        )));
    }
    Ok(())
}

impl CalibrationLookup for ModuleCalibrations {
    fn time_calibrations(&self, group: usize) -> Option<&[f64]> {
        self.groups.get(group).map(|g| g.time_calibrations.as_slice())
    }

    fn offset_mean(&self, group: usize, channel: usize) -> Option<&[f64]> {
        self.channel(group, channel).map(|c| c.off_mean.as_slice())
    }

    fn calib_sample(&self, group: usize, channel: usize) -> Option<&[f64]> {
        self.channel(group, channel).map(|c| c.calib_sample.as_slice())
    }
}
