//! Bit layout of the digitizer's event frames: headers, group descriptors
//! and packed 12-bit samples

use bit_iter::BitIter;
use num_traits::{PrimInt, Unsigned};

use crate::{ChannelGroup, EventHeader};

/// Words in an event header
pub const HEADER_WORDS: usize = 4;
/// Words holding one sample of each of the eight channels
pub const SAMPLE_WORDS: usize = 3;
/// Samples packed into one `SAMPLE_WORDS` frame
pub const SAMPLES_PER_FRAME: usize = 8;

/// Typed views over bit ranges of unsigned words
pub trait BitField: PrimInt + Unsigned {
    /// Extract `width` bits starting at bit `lo`; `width` must be narrower
    /// than the word
    fn field(self, lo: usize, width: usize) -> Self;
    fn check(self, b: usize) -> bool;
}

impl<T: PrimInt + Unsigned> BitField for T {
    #[inline]
    fn field(self, lo: usize, width: usize) -> Self {
        let mask = !(!T::zero() << width);
        (self >> lo) & mask
    }

    #[inline]
    fn check(self, b: usize) -> bool {
        (self >> b) & T::one() == T::one()
    }
}

/// Returns all groups in mask, group 0 being the low bit
pub fn mask_to_groups(m: u8) -> Vec<usize> {
    BitIter::from(m).collect()
}

/// Interpret four raw words as an event header. Nothing is validated here.
#[inline]
pub fn decode_header(words: [u32; HEADER_WORDS]) -> EventHeader {
    EventHeader::new(words)
}

/// Interpret a group descriptor word
#[inline]
pub fn decode_group(word: u32) -> ChannelGroup {
    ChannelGroup::new(word)
}

/// Unpack eight 12-bit samples, one per channel, from three words
#[inline]
pub fn unpack_samples(words: [u32; SAMPLE_WORDS]) -> [u16; SAMPLES_PER_FRAME] {
    let [a, b, c] = words;
    [
        (a & 0xfff) as u16,
        ((a >> 12) & 0xfff) as u16,
        ((a >> 24) | ((b & 0xf) << 8)) as u16,
        ((b >> 4) & 0xfff) as u16,
        ((b >> 16) & 0xfff) as u16,
        ((b >> 28) | ((c & 0xff) << 4)) as u16,
        ((c >> 8) & 0xfff) as u16,
        (c >> 20) as u16,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(s: [u16; 8]) -> [u32; 3] {
        let s = s.map(u32::from);
        [
            s[0] | s[1] << 12 | (s[2] & 0xff) << 24,
            s[2] >> 8 | s[3] << 4 | s[4] << 16 | (s[5] & 0xf) << 28,
            s[5] >> 4 | s[6] << 8 | s[7] << 20,
        ]
    }

    #[test]
    fn fields() {
        assert_eq!(0xdu32.field(0, 2), 0b01);
        assert_eq!(0xf000_0000u32.field(28, 4), 0xf);
        assert_eq!(u32::MAX.field(4, 12), 0xfff);
        assert!(0x8000_0000u32.check(31));
        assert!(!0x7fff_ffffu32.check(31));
    }

    #[test]
    fn group_masks() {
        assert_eq!(mask_to_groups(0b00), Vec::<usize>::new());
        assert_eq!(mask_to_groups(0b01), vec![0]);
        assert_eq!(mask_to_groups(0b10), vec![1]);
        assert_eq!(mask_to_groups(0b11), vec![0, 1]);
    }

    #[test]
    fn header_fields_cover_their_bits() {
        for &words in [
            [0u32, 0, 0, 0],
            [u32::MAX; 4],
            [0xa000_0123, 0x0400_0002, 0x00ab_cdef, 0x8000_0042],
            [0x1234_5678, 0x9abc_def0, 0x0fed_cba9, 0x7654_3210],
        ]
        .iter()
        {
            let h = decode_header(words);
            let w0 = (h.init() as u32) << 28 | h.event_size();
            assert_eq!(w0, words[0]);
            let w1 = (h.board_fail() as u32) << 26 | h.group_mask() as u32;
            assert_eq!(w1, words[1] & (1 << 26 | 0x3));
            assert_eq!(h.event_number(), words[2] & 0xff_ffff);
            let w3 = (h.event_time_overflow() as u32) << 31 | h.event_time_tag();
            assert_eq!(w3, words[3]);
        }
    }

    #[test]
    fn header_layout() {
        let h = decode_header([0xa000_0123, 0x0400_0002, 0xff00_0007, 0x8000_0042]);
        assert_eq!(h.init(), 0xa);
        assert_eq!(h.event_size(), 0x123);
        assert!(h.board_fail());
        assert_eq!(h.group_mask(), 0b10);
        assert_eq!(h.active_groups(), vec![1]);
        assert_eq!(h.event_number(), 7);
        assert_eq!(h.event_time_tag(), 0x42);
        assert!(h.event_time_overflow());
    }

    #[test]
    fn group_descriptor() {
        let word = 72 | 1 << 16 | 100 << 20;
        let g = decode_group(word);
        assert_eq!(g.num_samples(), 24);
        assert_eq!(g.start_index_cell(), 100);
        assert_eq!(g.frequency(), 1);
        assert!(!g.trigger_channel());
        assert_eq!(g.control_bits(), 0);

        let g = decode_group(3072 | 1 << 12 | 3 << 16 | 1023 << 20);
        assert_eq!(g.num_samples(), 1024);
        assert_eq!(g.start_index_cell(), 1023);
        assert_eq!(g.frequency(), 3);
        assert!(g.trigger_channel());
    }

    #[test]
    fn control_bits_sum() {
        // 3 + 3 + 7
        let g = decode_group(0b11 << 30 | 0b11 << 18 | 0b111 << 13);
        assert_eq!(g.control_bits(), 13);
        assert_eq!(g.start_index_cell(), 0);
        assert_eq!(g.frequency(), 0);
        assert!(!g.trigger_channel());
        assert_eq!(g.num_samples(), 0);
    }

    #[test]
    fn unpack_known_words() {
        assert_eq!(unpack_samples([0, 0, 0]), [0; 8]);
        assert_eq!(unpack_samples([u32::MAX; 3]), [0xfff; 8]);
        let s = unpack_samples([0x2300_0001, 0x0000_0001, 0x0000_0000]);
        assert_eq!(s[0], 1);
        assert_eq!(s[2], 0x123);
    }

    #[test]
    fn unpack_inverts_packing() {
        let cases: [[u16; 8]; 4] = [
            [0, 4095, 0, 4095, 0, 4095, 0, 4095],
            [4095, 0, 4095, 0, 4095, 0, 4095, 0],
            [1, 2, 3, 4, 5, 6, 7, 8],
            [0xabc, 0x123, 0xf0f, 0x0f0, 0x800, 0x7ff, 0x001, 0xffe],
        ];
        for s in cases.iter() {
            assert_eq!(&unpack_samples(pack(*s)), s);
        }
        // Every value in every slot
        for v in 0..=4095u16 {
            for slot in 0..8 {
                let mut s = [0u16; 8];
                s[slot] = v;
                assert_eq!(unpack_samples(pack(s)), s);
            }
        }
    }
}
