//! Packing and unpacking of 8-bit ARGB channels into a 32-bit word.
//!
//! The word layout is `A << 24 | R << 16 | G << 8 | B`. Compositing
//! arithmetic happens in `i32`, so a channel can leave `0..=255` before it
//! is packed. [`pack`] clamps each channel first, which keeps a stray
//! negative or oversized value from bleeding into its neighbours.
//!
//! [`pack_wrapping`] keeps the legacy composition where the shifted values
//! are simply OR-ed together: a negative channel sign-extends over every
//! higher channel, and a channel above 255 spills into the next one. The
//! stipple styles were originally tuned against that behaviour (the
//! yellowish-white background is a product of it), so it stays available
//! behind [`Overflow::Wrap`].

use std::fmt;

use image::Rgba;
use serde::{Deserialize, Serialize};

/// Largest value a single channel can hold.
pub const MAX_CHANNEL: i32 = 255;

/// Treatment of channel values outside `0..=255` at packing time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overflow {
    /// Saturate each channel to `0..=255` independently.
    #[default]
    Clamp,
    /// Two's-complement shifts OR-ed together; out-of-range channels
    /// corrupt their neighbours.
    Wrap,
}

impl Overflow {
    /// Pack four channel values according to this overflow mode.
    #[must_use]
    pub fn pack(self, a: i32, r: i32, g: i32, b: i32) -> u32 {
        match self {
            Self::Clamp => pack(a, r, g, b),
            Self::Wrap => pack_wrapping(a, r, g, b),
        }
    }
}

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clamp => f.write_str("Clamp"),
            Self::Wrap => f.write_str("Wrap"),
        }
    }
}

/// Saturate an intermediate channel value to `0..=255`.
#[must_use]
pub fn clamp_channel(value: i32) -> u8 {
    u8::try_from(value.clamp(0, MAX_CHANNEL)).unwrap_or(u8::MAX)
}

/// Pack four channels into an ARGB word, clamping each one first.
#[must_use]
pub fn pack(a: i32, r: i32, g: i32, b: i32) -> u32 {
    u32::from_be_bytes([
        clamp_channel(a),
        clamp_channel(r),
        clamp_channel(g),
        clamp_channel(b),
    ])
}

/// Pack four channels with plain shifts and no clamping.
///
/// Identical to [`pack`] while every input is within `0..=255`.
#[must_use]
pub const fn pack_wrapping(a: i32, r: i32, g: i32, b: i32) -> u32 {
    let word = a.wrapping_shl(24) | r.wrapping_shl(16) | g.wrapping_shl(8) | b;
    word.cast_unsigned()
}

/// Split an ARGB word into `[a, r, g, b]`.
#[must_use]
pub const fn unpack(word: u32) -> [u8; 4] {
    word.to_be_bytes()
}

/// `image` pixel (stored in RGBA order) for an ARGB word.
#[must_use]
pub const fn from_word(word: u32) -> Rgba<u8> {
    let [a, r, g, b] = unpack(word);
    Rgba([r, g, b, a])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_layout() {
        assert_eq!(pack(0x12, 0x34, 0x56, 0x78), 0x1234_5678);
        assert_eq!(pack(255, 0, 0, 0), 0xFF00_0000);
        assert_eq!(pack(0, 0, 0, 255), 0x0000_00FF);
    }

    #[test]
    fn unpack_pack_round_trip_every_channel_value() {
        // Each channel position is swept independently; the other three
        // hold distinct sentinels so a cross-channel leak would show up.
        for v in 0..=255_u8 {
            let i = i32::from(v);
            assert_eq!(unpack(pack(i, 1, 2, 3)), [v, 1, 2, 3]);
            assert_eq!(unpack(pack(4, i, 5, 6)), [4, v, 5, 6]);
            assert_eq!(unpack(pack(7, 8, i, 9)), [7, 8, v, 9]);
            assert_eq!(unpack(pack(10, 11, 12, i)), [10, 11, 12, v]);
        }
    }

    #[test]
    fn pack_clamps_out_of_range_channels() {
        assert_eq!(unpack(pack(255, -5, 300, 10)), [255, 0, 255, 10]);
        assert_eq!(unpack(pack(-1, 256, -300, 1000)), [0, 255, 0, 255]);
    }

    #[test]
    fn clamp_channel_bounds() {
        assert_eq!(clamp_channel(-1), 0);
        assert_eq!(clamp_channel(0), 0);
        assert_eq!(clamp_channel(128), 128);
        assert_eq!(clamp_channel(255), 255);
        assert_eq!(clamp_channel(i32::MAX), 255);
        assert_eq!(clamp_channel(i32::MIN), 0);
    }

    #[test]
    fn pack_wrapping_matches_pack_in_range() {
        for (a, r, g, b) in [(0, 0, 0, 0), (255, 255, 255, 255), (12, 200, 7, 99)] {
            assert_eq!(pack_wrapping(a, r, g, b), pack(a, r, g, b));
        }
    }

    #[test]
    fn pack_wrapping_sign_extends_negative_channels() {
        // A negative blue channel floods every bit above it.
        assert_eq!(pack_wrapping(0, 0, 0, -1), 0xFFFF_FFFF);
        // Equal negative colour channels leave only blue below 255.
        assert_eq!(unpack(pack_wrapping(255, -4, -4, -4)), [255, 255, 255, 252]);
    }

    #[test]
    fn pack_wrapping_spills_into_next_channel() {
        // 0x109 in blue sets the low bit of green.
        assert_eq!(unpack(pack_wrapping(0, 0, 0, 265)), [0, 0, 1, 9]);
    }

    #[test]
    fn overflow_dispatch() {
        assert_eq!(Overflow::Clamp.pack(255, -4, -4, -4), 0xFF00_0000);
        assert_eq!(Overflow::Wrap.pack(255, -4, -4, -4), 0xFFFF_FFFC);
        assert_eq!(Overflow::default(), Overflow::Clamp);
    }

    #[test]
    fn word_to_pixel_reorders_alpha_last() {
        assert_eq!(from_word(0x4411_2233), Rgba([0x11, 0x22, 0x33, 0x44]));
        assert_eq!(from_word(pack(255, -4, 300, 7)), Rgba([0, 255, 7, 255]));
    }
}
