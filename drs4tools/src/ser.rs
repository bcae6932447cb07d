//! Serialization of decoded events to tab-separated values

use anyhow::Result;
use std::io::Write;

use crate::Event;

/// Serialize every sample of an event, one record per sample:
/// (event, module, group, channel, sample, time, amplitude).
pub fn tsv(wtr: &mut csv::Writer<impl Write>, module: usize, event: &Event) -> Result<()> {
    let number = event.event_number();
    for (group, g) in event.indexed_groups() {
        for (channel, waveform) in g.waveforms() {
            for (i, &amplitude) in waveform.iter().enumerate() {
                let time = g.times().get(i).copied().unwrap_or(f64::NAN);
                wtr.serialize((number, module, group, channel, i, time, amplitude))?;
            }
        }
    }
    Ok(())
}

/// Serialize one summary record per event and module:
/// (event, module, time tag, overflow, board fail, group mask, trigger time tags).
pub fn summary_tsv(wtr: &mut csv::Writer<impl Write>, module: usize, event: &Event) -> Result<()> {
    let header = event.header();
    let ttts = event
        .groups()
        .iter()
        .map(|g| g.trigger_time_tag().to_string())
        .collect::<Vec<_>>()
        .join(",");
    wtr.serialize((
        header.event_number(),
        module,
        header.event_time_tag(),
        header.event_time_overflow() as u8,
        header.board_fail() as u8,
        header.group_mask(),
        ttts,
    ))?;
    Ok(())
}
