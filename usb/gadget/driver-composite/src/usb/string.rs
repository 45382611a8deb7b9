//! String descriptors (USB2 9.6.7).
//!
//! Strings are sent as UTF-16LE without a terminator. Index zero does not hold a string but the
//! list of LANGIDs the device supports.

use super::DescriptorKind;

/// LANGID of English (United States).
pub const LANGID_EN_US: u16 = 0x0409;

/// bLength is a single byte, which leaves room for 126 UTF-16 code units after the header.
pub const STRING_DESC_MAX_CHARS: usize = (u8::MAX as usize - 2) / 2;

/// The string descriptor at index zero, advertising [LANGID_EN_US] only.
pub const LANGUAGE_TABLE: [u8; 4] = [
    4,
    DescriptorKind::String as u8,
    LANGID_EN_US as u8,
    (LANGID_EN_US >> 8) as u8,
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringDescriptor {
    buf: [u8; 2 + STRING_DESC_MAX_CHARS * 2],
}

impl StringDescriptor {
    /// Transcodes `s` into the wire format.
    ///
    /// Returns the number of UTF-16 code units `s` needs when it does not fit in a descriptor.
    pub fn encode(s: &str) -> Result<Self, usize> {
        let units = s.encode_utf16().count();
        if units > STRING_DESC_MAX_CHARS {
            return Err(units);
        }

        let mut buf = [0u8; 2 + STRING_DESC_MAX_CHARS * 2];
        buf[0] = (2 + units * 2) as u8;
        buf[1] = DescriptorKind::String as u8;
        for (dst, unit) in buf[2..].chunks_exact_mut(2).zip(s.encode_utf16()) {
            dst.copy_from_slice(&unit.to_le_bytes());
        }

        Ok(Self { buf })
    }

    /// String descriptor zero, listing the supported languages instead of holding a string.
    pub fn language_table() -> Self {
        let mut buf = [0u8; 2 + STRING_DESC_MAX_CHARS * 2];
        buf[..LANGUAGE_TABLE.len()].copy_from_slice(&LANGUAGE_TABLE);
        Self { buf }
    }

    pub fn len(&self) -> usize {
        self.buf[0] as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 2
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len()]
    }
}
