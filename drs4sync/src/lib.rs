pub mod sync;

use argh::FromArgs;
use drs4tools::Event;
use std::collections::BTreeMap;

pub use sync::Synchronizer;

#[derive(Debug, FromArgs, Clone)]
/// Merge the streams of several digitizer modules into one event per
/// trigger and print them as tab-separated values
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// read the modules of each event in parallel
    #[argh(switch, short = 'p')]
    pub parallel: bool,
    /// print one summary record per module and event instead of every sample
    #[argh(switch, short = 's')]
    pub summary: bool,
    /// stop after this many events (overrides the run file)
    #[argh(option, short = 'n')]
    pub max_events: Option<u64>,
    /// run file (JSON) listing the modules
    #[argh(positional)]
    pub run: String,
}

/// One trigger as seen by every module, keyed by module id.
///
/// All events held share the same event number.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct GlobalEvent {
    module_events: BTreeMap<usize, Event>,
}

impl GlobalEvent {
    pub fn new() -> Self {
        GlobalEvent::default()
    }

    pub fn clear(&mut self) {
        self.module_events.clear();
    }

    pub fn add_module_event(&mut self, module: usize, event: Event) {
        self.module_events.insert(module, event);
    }

    pub fn module_events(&self) -> &BTreeMap<usize, Event> {
        &self.module_events
    }

    pub fn module(&self, module: usize) -> Option<&Event> {
        self.module_events.get(&module)
    }

    /// The shared event number, if any module is present
    pub fn event_number(&self) -> Option<u32> {
        self.module_events.values().next().map(Event::event_number)
    }

    pub fn len(&self) -> usize {
        self.module_events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.module_events.is_empty()
    }
}
