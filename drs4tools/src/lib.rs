pub mod bit;
pub mod calib;
pub mod cfg;
pub mod de;
pub mod error;
pub mod ser;
pub mod wave;

use bit::BitField;

pub use error::{Error, Result};

/// Number of cells in the sampling ring buffer
pub const CELLS: usize = 1024;
/// Data channels per group
pub const CHANNELS: usize = 8;
/// Channel index of the optional trigger waveform
pub const TRIGGER_CHANNEL: usize = 8;
/// Channel groups per module
pub const GROUPS: usize = 2;
/// Trigger time tag step (8.5 ns)
pub const TTT_STEP: f64 = 8.5e-9;

/// Calibrated samples of one channel, in mV
pub type Waveform = Vec<f32>;

/// The four-word header opening every event frame.
///
/// Fields are views over the raw words and are never modified once read.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct EventHeader {
    words: [u32; 4],
}

impl EventHeader {
    pub fn new(words: [u32; 4]) -> Self {
        EventHeader { words }
    }

    pub fn words(&self) -> [u32; 4] {
        self.words
    }

    /// Frame type marker
    #[inline]
    pub fn init(&self) -> u8 {
        self.words[0].field(28, 4) as u8
    }

    #[inline]
    pub fn event_size(&self) -> u32 {
        self.words[0].field(0, 28)
    }

    #[inline]
    pub fn board_fail(&self) -> bool {
        self.words[1].check(26)
    }

    /// Bitmask of the groups present in this frame, group 0 in the low bit
    #[inline]
    pub fn group_mask(&self) -> u8 {
        self.words[1].field(0, 2) as u8
    }

    /// Indices of the groups present in this frame, in ascending order
    pub fn active_groups(&self) -> Vec<usize> {
        bit::mask_to_groups(self.group_mask())
    }

    #[inline]
    pub fn event_number(&self) -> u32 {
        self.words[2].field(0, 24)
    }

    #[inline]
    pub fn event_time_tag(&self) -> u32 {
        self.words[3].field(0, 31)
    }

    #[inline]
    pub fn event_time_overflow(&self) -> bool {
        self.words[3].check(31)
    }
}

/// One channel group within an event: the decoded group descriptor, its
/// time axis and the calibrated waveform of every channel read out.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ChannelGroup {
    descriptor: u32,
    trigger_time_tag: u32,
    times: Vec<f64>,
    waveforms: [Option<Waveform>; CHANNELS + 1],
}

impl ChannelGroup {
    pub fn new(descriptor: u32) -> Self {
        ChannelGroup {
            descriptor,
            ..Default::default()
        }
    }

    pub fn descriptor(&self) -> u32 {
        self.descriptor
    }

    /// Sum of the diagnostic bit fields (30-31, 18-19 and 13-15)
    pub fn control_bits(&self) -> u8 {
        (self.descriptor.field(30, 2) + self.descriptor.field(18, 2) + self.descriptor.field(13, 3))
            as u8
    }

    /// Ring buffer cell at which sampling started
    #[inline]
    pub fn start_index_cell(&self) -> u16 {
        self.descriptor.field(20, 10) as u16
    }

    /// Sampling frequency selector
    #[inline]
    pub fn frequency(&self) -> u8 {
        self.descriptor.field(16, 2) as u8
    }

    /// Whether a trigger waveform follows the eight data channels
    #[inline]
    pub fn trigger_channel(&self) -> bool {
        self.descriptor.check(12)
    }

    /// Samples per channel in this group's payload.
    ///
    /// The size field counts words of the 8-channel payload, three words per
    /// sample, hence the division.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.descriptor.field(0, 12) as usize / 3
    }

    pub fn set_trigger_time_tag(&mut self, trigger_time_tag: u32) {
        self.trigger_time_tag = trigger_time_tag;
    }

    pub fn trigger_time_tag(&self) -> u32 {
        self.trigger_time_tag
    }

    /// Trigger time in seconds
    pub fn trigger_time(&self) -> f64 {
        TTT_STEP * self.trigger_time_tag as f64
    }

    pub fn set_times(&mut self, times: Vec<f64>) {
        self.times = times;
    }

    /// Cumulative time of each sample, in the unit of the time calibration
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Store the waveform of a channel, 8 being the trigger channel.
    ///
    /// Panics if `channel` is above [`TRIGGER_CHANNEL`].
    pub fn add_waveform(&mut self, channel: usize, waveform: Waveform) {
        assert!(channel <= TRIGGER_CHANNEL, "no channel {}", channel);
        self.waveforms[channel] = Some(waveform);
    }

    pub fn waveform(&self, channel: usize) -> Option<&Waveform> {
        self.waveforms.get(channel).and_then(Option::as_ref)
    }

    /// All waveforms present, by ascending channel index
    pub fn waveforms(&self) -> impl Iterator<Item = (usize, &Waveform)> {
        self.waveforms
            .iter()
            .enumerate()
            .filter_map(|(ch, w)| w.as_ref().map(|w| (ch, w)))
    }
}

/// One module's record of a trigger
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Event {
    header: EventHeader,
    groups: Vec<ChannelGroup>,
}

impl Event {
    pub fn new(header: EventHeader) -> Self {
        Event {
            header,
            groups: Vec::new(),
        }
    }

    pub fn header(&self) -> &EventHeader {
        &self.header
    }

    pub fn event_number(&self) -> u32 {
        self.header.event_number()
    }

    pub fn add_group(&mut self, group: ChannelGroup) -> &mut ChannelGroup {
        self.groups.push(group);
        let last = self.groups.len() - 1;
        &mut self.groups[last]
    }

    /// Groups present in this event, in ascending group index order
    pub fn groups(&self) -> &[ChannelGroup] {
        &self.groups
    }

    /// Look up a group by its hardware index rather than its position
    pub fn group(&self, index: usize) -> Option<&ChannelGroup> {
        let pos = self
            .header
            .active_groups()
            .into_iter()
            .position(|g| g == index)?;
        self.groups.get(pos)
    }

    /// Group indices paired with their groups
    pub fn indexed_groups(&self) -> impl Iterator<Item = (usize, &ChannelGroup)> {
        self.header.active_groups().into_iter().zip(self.groups.iter())
    }
}
