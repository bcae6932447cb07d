//! Synchronization of module streams on the shared event number

use drs4tools::calib::CalibrationLookup;
use drs4tools::de::ModuleReader;
use drs4tools::{Error, Event, Result};
use std::collections::BTreeMap;
use std::io::Read;

#[allow(unused_imports)]
use tracing::{debug, error, info, span, warn, Level};

use crate::GlobalEvent;

/// Pulls one event from every registered module per cycle and checks they
/// all belong to the same trigger.
pub struct Synchronizer<R, C> {
    readers: BTreeMap<usize, ModuleReader<R, C>>,
    event: GlobalEvent,
}

impl<R, C> Default for Synchronizer<R, C> {
    fn default() -> Self {
        Synchronizer {
            readers: BTreeMap::new(),
            event: GlobalEvent::new(),
        }
    }
}

impl<R: Read, C: CalibrationLookup> Synchronizer<R, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module stream. A later registration under the same id
    /// replaces the earlier one.
    pub fn add_module(&mut self, id: usize, source: R, calibrations: C) {
        self.add_reader(ModuleReader::new(id, source, calibrations));
    }

    /// Register a reader configured by the caller
    pub fn add_reader(&mut self, reader: ModuleReader<R, C>) {
        info!(module = reader.id(), "module registered");
        self.readers.insert(reader.id(), reader);
    }

    pub fn modules(&self) -> impl Iterator<Item = usize> + '_ {
        self.readers.keys().copied()
    }

    /// The event assembled by the last successful cycle
    pub fn event(&self) -> &GlobalEvent {
        &self.event
    }

    /// Read one event from every module, in module id order.
    ///
    /// Returns `Ok(false)` as soon as one module is exhausted, leaving the
    /// remaining modules unread and the global event empty. With no
    /// modules registered there is nothing to read and `Ok(false)` is
    /// returned as well.
    ///
    /// A fault is reported once. The faulty module is exhausted from then
    /// on, so every later call returns `Ok(false)`.
    pub fn next(&mut self) -> Result<bool> {
        self.event.clear();
        if self.readers.is_empty() {
            return Ok(false);
        }
        let span = span!(Level::DEBUG, "sync_cycle");
        let _enter = span.enter();

        let mut events = Vec::with_capacity(self.readers.len());
        for (&id, reader) in self.readers.iter_mut() {
            match reader.next_event()? {
                Some(event) => events.push((id, event)),
                None => {
                    info!(module = id, "module exhausted, stopping");
                    return Ok(false);
                }
            }
            check_sync(&events)?;
        }
        self.store(events);
        Ok(true)
    }

    /// Read the next global event, or `None` at the end of any stream
    pub fn read_next_global_event(&mut self) -> Result<Option<&GlobalEvent>> {
        match self.next()? {
            true => Ok(Some(&self.event)),
            false => Ok(None),
        }
    }

    fn store(&mut self, events: Vec<(usize, Event)>) {
        for (id, event) in events {
            self.event.add_module_event(id, event);
        }
        debug!(
            event = self.event.event_number().unwrap_or_default(),
            modules = self.event.len(),
            "global event"
        );
    }
}

impl<R, C> Synchronizer<R, C>
where
    R: Read + Send,
    C: CalibrationLookup + Send,
{
    /// Like [`Synchronizer::next`], but reads all modules concurrently.
    ///
    /// Every module is read before event numbers are compared, so one
    /// event is consumed from each stream that still has one even when
    /// another is exhausted. Faults are reported for the lowest module id.
    pub fn next_parallel(&mut self) -> Result<bool> {
        use rayon::prelude::*;

        self.event.clear();
        if self.readers.is_empty() {
            return Ok(false);
        }
        let span = span!(Level::DEBUG, "sync_cycle_parallel");
        let _enter = span.enter();

        let mut results: Vec<(usize, Result<Option<Event>>)> = self
            .readers
            .par_iter_mut()
            .map(|(&id, reader)| (id, reader.next_event()))
            .collect();
        results.sort_by_key(|(id, _)| *id);

        let mut events = Vec::with_capacity(results.len());
        let mut exhausted = false;
        for (id, result) in results {
            match result? {
                Some(event) => events.push((id, event)),
                None => {
                    info!(module = id, "module exhausted, stopping");
                    exhausted = true;
                }
            }
        }
        if exhausted {
            return Ok(false);
        }
        check_sync(&events)?;
        self.store(events);
        Ok(true)
    }
}

/// Check that every event read so far carries the first one's event number
fn check_sync(events: &[(usize, Event)]) -> Result<()> {
    let reference = match events.first() {
        Some((_, event)) => event.event_number(),
        None => return Ok(()),
    };
    for (id, event) in events.iter().skip(1) {
        let found = event.event_number();
        if found != reference {
            error!(module = *id, reference, found, "lost synchronisation");
            return Err(Error::SynchronizationLoss {
                module: *id,
                reference,
                found,
            });
        }
    }
    Ok(())
}
