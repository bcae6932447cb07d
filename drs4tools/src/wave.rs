//! Calibrated waveforms and time axes

use crate::{Waveform, CELLS};

/// Full scale of the 12-bit ADC
pub const ADC_FULL_SCALE: f64 = 4095.0;

/// Time scale for each sampling frequency setting (5 GS/s, 2.5 GS/s,
/// 1 GS/s and 750 MS/s), relative to the 5 GS/s time calibration
pub const DEFAULT_TIME_SCALE: [f64; 4] = [1.0, 2.0, 5.0, 20.0 / 3.0];

/// Build the cumulative time axis of a group.
///
/// `time_calib` holds the width of every ring buffer cell; it is rotated by
/// the start cell so that the axis follows the physical sampling order.
///
/// Panics if `time_calib` holds fewer than [`CELLS`] entries.
pub fn time_axis(time_calib: &[f64], start_cell: u16, time_scale: f64) -> Vec<f64> {
    let start = start_cell as usize;
    let mut times = Vec::with_capacity(CELLS);
    times.push(0.0);
    for i in 1..CELLS {
        let dt = time_calib[(i - 1 + start) % CELLS] * time_scale;
        times.push(times[i - 1] + dt);
    }
    times
}

/// Convert raw ADC codes to millivolts over a ±0.5 V range.
///
/// The pedestal is indexed by ring buffer cell, the sample correction by
/// sample position. The result always has one entry per raw code.
///
/// Panics if `pedestal` holds fewer than [`CELLS`] entries or `calib` fewer
/// than `raw`.
pub fn calibrate(raw: &[u16], start_cell: u16, pedestal: &[f64], calib: &[f64]) -> Waveform {
    let start = start_cell as usize;
    raw.iter()
        .enumerate()
        .map(|(j, &r)| {
            let code = f64::from(r) - pedestal[(j + start) % CELLS] - calib[j];
            (1000. * (code / ADC_FULL_SCALE - 0.5)) as f32
        })
        .collect()
}
