//! Restoration of packed sensor samples.
//!
//! Sensors with 10/12/14 effective bits deliver their samples inside a 16-bit
//! container using firmware-defined layouts. The layouts below must be
//! reproduced bit-exactly; every downstream statistic depends on them.

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::image::{Image, ImageView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum BitDepth {
    Eight,
    Ten,
    Twelve,
    Fourteen,
    #[default]
    Sixteen,
}

impl BitDepth {
    pub fn bits(self) -> u8 {
        match self {
            Self::Eight => 8,
            Self::Ten => 10,
            Self::Twelve => 12,
            Self::Fourteen => 14,
            Self::Sixteen => 16,
        }
    }

    /// Largest value a restored sample can take.
    pub fn max_value(self) -> u16 {
        match self {
            Self::Sixteen => u16::MAX,
            // 14-bit restoration divides by 16, leaving a 10-bit range.
            Self::Fourteen => 1023,
            other => (1u16 << other.bits()) - 1,
        }
    }
}

impl TryFrom<u8> for BitDepth {
    type Error = Error;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(Self::Eight),
            10 => Ok(Self::Ten),
            12 => Ok(Self::Twelve),
            14 => Ok(Self::Fourteen),
            16 => Ok(Self::Sixteen),
            other => Err(Error::UnsupportedBitDepth(other)),
        }
    }
}

impl From<BitDepth> for u8 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

/// Decodes one container sample.
#[inline]
pub fn restore_sample(raw: u16, depth: BitDepth) -> u16 {
    match depth {
        BitDepth::Ten => ((raw & 0xFF00) >> 6) | (raw & 0x3),
        BitDepth::Twelve => raw >> 4,
        // Integer division, not a shift of the combined value.
        BitDepth::Fourteen => (((raw & 0xFF00) >> 2) | (raw & 0x3F)) / 16,
        BitDepth::Eight | BitDepth::Sixteen => raw,
    }
}

pub fn restore(img: &ImageView<'_, u16>, depth: BitDepth) -> Image<u16> {
    let mut out = img.to_owned_image();
    restore_in_place(&mut out, depth);
    out
}

pub fn restore_in_place(img: &mut Image<u16>, depth: BitDepth) {
    if matches!(depth, BitDepth::Eight | BitDepth::Sixteen) {
        return;
    }
    for px in img.data_mut() {
        *px = restore_sample(*px, depth);
    }
}
