#![allow(dead_code)]

/// Pack eight 12-bit samples into three words, the inverse of
/// `bit::unpack_samples`
pub fn pack_samples(s: [u16; 8]) -> [u32; 3] {
    let s = s.map(u32::from);
    [
        s[0] | s[1] << 12 | (s[2] & 0xff) << 24,
        s[2] >> 8 | s[3] << 4 | s[4] << 16 | (s[5] & 0xf) << 28,
        s[5] >> 4 | s[6] << 8 | s[7] << 20,
    ]
}

pub fn descriptor(nsample: usize, start_cell: u16, frequency: u8, trigger: bool) -> u32 {
    (nsample as u32 * 3) & 0xfff
        | (trigger as u32) << 12
        | (frequency as u32 & 0x3) << 16
        | (start_cell as u32 & 0x3ff) << 20
}

/// A group to encode: raw codes per data channel and an optional trigger
/// channel, of which the first `samples / 8 * 8` codes are written
pub struct Group {
    pub start_cell: u16,
    pub frequency: u8,
    pub channels: [Vec<u16>; 8],
    pub trigger: Option<Vec<u16>>,
    pub trailer: u32,
}

impl Group {
    /// Every channel holds the same ramp `base + i`
    pub fn ramp(samples: usize, base: u16, start_cell: u16) -> Group {
        let ramp: Vec<u16> = (0..samples).map(|i| base + i as u16).collect();
        Group {
            start_cell,
            frequency: 0,
            channels: [(); 8].map(|_| ramp.clone()),
            trigger: None,
            trailer: 0,
        }
    }

    pub fn words(&self) -> Vec<u32> {
        let nsample = self.channels[0].len();
        let trigger = self.trigger.is_some();
        let mut words = vec![descriptor(nsample, self.start_cell, self.frequency, trigger)];
        for i in 0..nsample {
            let mut s = [0u16; 8];
            for (ch, samples) in self.channels.iter().enumerate() {
                s[ch] = samples[i];
            }
            words.extend_from_slice(&pack_samples(s));
        }
        if let Some(trigger) = &self.trigger {
            for chunk in trigger.chunks(8).take(nsample / 8) {
                let mut s = [0u16; 8];
                s.copy_from_slice(chunk);
                words.extend_from_slice(&pack_samples(s));
            }
        }
        words.push(self.trailer);
        words
    }
}

/// Encode one event frame: the header followed by the groups present
pub fn event_words(event_number: u32, groups: [Option<&Group>; 2]) -> Vec<u32> {
    let mut body = Vec::new();
    let mut mask = 0u32;
    for (i, g) in groups.iter().enumerate() {
        if let Some(g) = g {
            mask |= 1 << i;
            body.extend(g.words());
        }
    }
    let size = (4 + body.len()) as u32;
    let mut words = vec![
        0xa << 28 | size,
        mask,
        event_number & 0xff_ffff,
        event_number.wrapping_mul(1000) & 0x7fff_ffff,
    ];
    words.extend(body);
    words
}

pub fn to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// A stream of single-group events with the given event numbers
pub fn stream(event_numbers: &[u32], samples: usize) -> Vec<u8> {
    let mut words = Vec::new();
    for &n in event_numbers {
        let g = Group::ramp(samples, (n % 1000) as u16, (n % 1024) as u16);
        words.extend(event_words(n, [Some(&g), None]));
    }
    to_bytes(&words)
}

/// Expected amplitude of a raw code with all-zero calibrations
pub fn zero_calibrated(raw: u16) -> f32 {
    (1000. * (raw as f64 / 4095. - 0.5)) as f32
}
