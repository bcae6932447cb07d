//! Faults raised while decoding and synchronizing module streams.
//!
//! Running out of frames is not one of them: readers report a clean end of
//! stream as `Ok(None)` (or `Ok(false)` for the synchronizer). Everything
//! here is fatal to the call that raised it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream failed for a reason other than running out
    #[error("module {module}: stream error: {source}")]
    Stream {
        module: usize,
        #[source]
        source: std::io::Error,
    },

    /// The stream ended inside a frame
    #[error("module {module}: truncated frame, expected {expected} words but the stream ended after {read}")]
    TruncatedFrame {
        module: usize,
        expected: usize,
        read: usize,
    },

    #[error("lost synchronisation between the module readers: module {module} read event {found}, other modules read event {reference}")]
    SynchronizationLoss {
        module: usize,
        reference: u32,
        found: u32,
    },

    #[error("module {module}: no time calibration for group {group}")]
    MissingTimeCalibration { module: usize, group: usize },

    #[error("module {module}: no calibration for group {group} channel {channel}")]
    MissingCalibration {
        module: usize,
        group: usize,
        channel: usize,
    },

    /// `channel` is `None` for the time calibration
    #[error("module {module}: {} for group {group} holds {len} entries, {needed} needed", table_name(.channel))]
    ShortCalibration {
        module: usize,
        group: usize,
        channel: Option<usize>,
        len: usize,
        needed: usize,
    },

    /// A group claims more samples than the ring buffer has cells
    #[error("module {module}: group {group} declares {samples} samples per channel")]
    OversizedGroup {
        module: usize,
        group: usize,
        samples: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn table_name(channel: &Option<usize>) -> String {
    match *channel {
        Some(ch) => format!("calibration table of channel {}", ch),
        None => String::from("time calibration"),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
