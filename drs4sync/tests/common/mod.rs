#![allow(dead_code)]

/// Encode a module stream of single-group events with the given event
/// numbers; every channel of event `n` holds the raw code `n` in each of
/// its `samples` samples
pub fn stream(event_numbers: &[u32], samples: usize) -> Vec<u8> {
    let mut words = Vec::new();
    for &n in event_numbers {
        let code = n & 0xfff;
        words.extend_from_slice(&[0xa000_0000 | (6 + 3 * samples) as u32, 0x1, n, 0]);
        words.push((samples * 3) as u32);
        for _ in 0..samples {
            // Eight copies of a 12-bit code
            let byte = code & 0xff;
            words.extend_from_slice(&[
                code | code << 12 | byte << 24,
                code >> 8 | code << 4 | code << 16 | (code & 0xf) << 28,
                code >> 4 | code << 8 | code << 20,
            ]);
        }
        words.push(n);
    }
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Truncate a stream inside its last event
pub fn truncated(mut bytes: Vec<u8>) -> Vec<u8> {
    bytes.truncate(bytes.len() - 6);
    bytes
}
