//!  Mask flag and key.

/// Payload mask with a 32-bit key.
///
/// `Mask::Skip` is used by server side to skip unmask
/// if mask key equals 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mask {
    Key([u8; 4]),
    Skip,
    None,
}

impl Mask {
    /// Read the flag which indicates whether mask is used.
    #[inline]
    pub const fn from_flag(b: u8) -> Self {
        match b & 0x80 {
            0x80 => Mask::Skip,
            _ => Mask::None,
        }
    }

    /// Get the flag byte.
    #[inline]
    pub const fn to_flag(&self) -> u8 {
        use Mask::*;
        match self {
            Key(_) | Skip => 0x80,
            None => 0x00,
        }
    }

    /// Build from the 4 key bytes as they appear on the wire.
    #[inline]
    pub fn from_key(key: [u8; 4]) -> Self {
        if key.iter().all(|b| *b == 0) {
            Mask::Skip
        } else {
            Mask::Key(key)
        }
    }

    /// Number of key bytes on the wire.
    #[inline]
    pub const fn key_len(&self) -> usize {
        match self {
            Mask::None => 0,
            _ => 4,
        }
    }
}

/// Mask the buffer, byte by byte.
///
/// Key byte 0 is the most significant byte of the 32-bit key, so
/// byte `i` of the payload is xored with `key[i % 4]`.
#[inline]
pub fn apply_mask(key: [u8; 4], buf: &mut [u8]) {
    for (i, b) in buf.iter_mut().enumerate() {
        *b ^= key[i & 0x03];
    }
}
