//! Decoding of module streams into calibrated events

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use zstd::stream;

use tracing::{debug, error, info, warn};

use crate::bit::{self, HEADER_WORDS, SAMPLES_PER_FRAME, SAMPLE_WORDS};
use crate::calib::CalibrationLookup;
use crate::wave::{self, DEFAULT_TIME_SCALE};
use crate::{ChannelGroup, Error, Event, Result, CELLS, CHANNELS, TRIGGER_CHANNEL};

/// Open a module data file for sequential reading.
///
/// Files ending in `.zst` are decompressed on the fly.
pub fn open(path: impl AsRef<Path>) -> Result<Box<dyn Read + Send>> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::Config(format!(
            "input file '{}' does not exist",
            path.display()
        )));
    }
    let f = File::open(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("zst") => Ok(Box::new(stream::read::Decoder::new(f)?)),
        _ => Ok(Box::new(f)),
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum State {
    /// Positioned at a frame boundary
    Ready,
    /// No more frames, or a fault left the stream misaligned
    Exhausted,
}

/// Reads one module's stream, one event per call.
///
/// The reader owns its stream and releases it when dropped.
pub struct ModuleReader<R, C> {
    id: usize,
    rdr: BufReader<R>,
    calibrations: C,
    time_scale: [f64; 4],
    state: State,
}

impl<R: Read, C: CalibrationLookup> ModuleReader<R, C> {
    pub fn new(id: usize, source: R, calibrations: C) -> Self {
        ModuleReader {
            id,
            rdr: BufReader::new(source),
            calibrations,
            time_scale: DEFAULT_TIME_SCALE,
            state: State::Ready,
        }
    }

    /// Replace the per-frequency time scale table
    pub fn with_time_scale(mut self, time_scale: [f64; 4]) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn calibrations(&self) -> &C {
        &self.calibrations
    }

    /// Decode the next event, or `None` once the stream is exhausted.
    ///
    /// Any fault leaves the reader exhausted: the stream position inside
    /// the frame is lost and cannot be recovered.
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        if self.state == State::Exhausted {
            return Ok(None);
        }
        let result = self.decode_event();
        match &result {
            Ok(None) => {
                info!(module = self.id, "end of stream");
                self.state = State::Exhausted;
            }
            Err(e) => {
                error!(module = self.id, "{}", e);
                self.state = State::Exhausted;
            }
            Ok(Some(_)) => {}
        }
        result
    }

    fn decode_event(&mut self) -> Result<Option<Event>> {
        let module = self.id;
        let at_end = self
            .rdr
            .fill_buf()
            .map_err(|source| Error::Stream { module, source })?
            .is_empty();
        if at_end {
            return Ok(None);
        }
        let header = bit::decode_header(self.read_words::<HEADER_WORDS>()?);
        if header.board_fail() {
            warn!(
                module = self.id,
                event = header.event_number(),
                "board fail flag set"
            );
        }
        let mut event = Event::new(header);
        for group in header.active_groups() {
            let g = self.decode_group(group)?;
            event.add_group(g);
        }
        debug!(
            module = self.id,
            event = header.event_number(),
            groups = event.groups().len(),
            "decoded event"
        );
        Ok(Some(event))
    }

    fn decode_group(&mut self, group: usize) -> Result<ChannelGroup> {
        let mut g = bit::decode_group(self.read_word(1, 0)?);
        let nsample = g.num_samples();
        if nsample > CELLS {
            return Err(Error::OversizedGroup {
                module: self.id,
                group,
                samples: nsample,
            });
        }
        let start_cell = g.start_index_cell();

        // Time axis
        let time_calib = self
            .calibrations
            .time_calibrations(group)
            .ok_or(Error::MissingTimeCalibration {
                module: self.id,
                group,
            })?;
        self.check_len(group, None, time_calib, CELLS)?;
        let time_scale = self.time_scale[g.frequency() as usize];
        g.set_times(wave::time_axis(time_calib, start_cell, time_scale));

        // Samples of the eight data channels, one frame per sample index
        let nchannel = if g.trigger_channel() { CHANNELS + 1 } else { CHANNELS };
        let mut channel_samples = vec![vec![0u16; nsample]; nchannel];
        for i in 0..nsample {
            let samples = bit::unpack_samples(self.read_words::<SAMPLE_WORDS>()?);
            for (ch, &s) in samples.iter().enumerate() {
                channel_samples[ch][i] = s;
            }
        }

        // Trigger channel, eight consecutive samples per frame
        if g.trigger_channel() {
            let trigger_samples = &mut channel_samples[TRIGGER_CHANNEL];
            for i in 0..nsample / SAMPLES_PER_FRAME {
                let samples = bit::unpack_samples(self.read_words::<SAMPLE_WORDS>()?);
                let at = i * SAMPLES_PER_FRAME;
                trigger_samples[at..at + SAMPLES_PER_FRAME].copy_from_slice(&samples);
            }
        }

        for (ch, raw) in channel_samples.iter().enumerate() {
            let off_mean = self.calibrations.offset_mean(group, ch);
            let calib_sample = self.calibrations.calib_sample(group, ch);
            let (off_mean, calib_sample) = match (off_mean, calib_sample) {
                (Some(o), Some(c)) => (o, c),
                _ => {
                    return Err(Error::MissingCalibration {
                        module: self.id,
                        group,
                        channel: ch,
                    })
                }
            };
            self.check_len(group, Some(ch), off_mean, CELLS)?;
            self.check_len(group, Some(ch), calib_sample, nsample)?;
            g.add_waveform(ch, wave::calibrate(raw, start_cell, off_mean, calib_sample));
        }

        // The trailer carries the trigger time tag
        let trailer = self.read_word(1, 0)?;
        g.set_trigger_time_tag(trailer & 0x3fff_ffff);
        Ok(g)
    }

    fn check_len(
        &self,
        group: usize,
        channel: Option<usize>,
        table: &[f64],
        needed: usize,
    ) -> Result<()> {
        if table.len() < needed {
            return Err(Error::ShortCalibration {
                module: self.id,
                group,
                channel,
                len: table.len(),
                needed,
            });
        }
        Ok(())
    }

    fn read_words<const N: usize>(&mut self) -> Result<[u32; N]> {
        let mut words = [0u32; N];
        for (i, w) in words.iter_mut().enumerate() {
            *w = self.read_word(N, i)?;
        }
        Ok(words)
    }

    /// Read one little-endian word; `expected` and `read` describe the
    /// enclosing request for truncation reports
    fn read_word(&mut self, expected: usize, read: usize) -> Result<u32> {
        let mut buf = [0u8; 4];
        match self.rdr.read_exact(&mut buf) {
            Ok(()) => Ok(u32::from_le_bytes(buf)),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(Error::TruncatedFrame {
                module: self.id,
                expected,
                read,
            }),
            Err(source) => Err(Error::Stream {
                module: self.id,
                source,
            }),
        }
    }
}

impl<R: Read, C: CalibrationLookup> Iterator for ModuleReader<R, C> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}
