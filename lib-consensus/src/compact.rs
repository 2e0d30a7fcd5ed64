//! Compact-target arithmetic.
//!
//! A proof-of-work target is a 256-bit integer, carried in block headers
//! as a 32-bit compact form: the high byte is a size, the low 23 bits a
//! mantissa, bit 23 a sign flag that must be clear for valid targets.
//! The encoded value is `mantissa * 256^(size - 3)`.

use lib_crypto::Hash256;

/// Mantissa mask: low 23 bits.
pub const COMPACT_MANTISSA_MASK: u32 = 0x007F_FFFF;

/// Sign flag inside the mantissa word.
pub const COMPACT_SIGN_BIT: u32 = 0x0080_0000;

/// Expands a compact encoding into the full 256-bit target.
///
/// Invalid encodings (sign bit set, size above 34) expand to the zero
/// target, which no hash can satisfy.
pub fn expand_compact(compact: u32) -> Hash256 {
    let mut target = [0u8; 32];

    let size = ((compact >> 24) & 0xFF) as usize;
    let word = compact & COMPACT_MANTISSA_MASK;

    if compact & COMPACT_SIGN_BIT != 0 {
        return Hash256::ZERO;
    }
    if size > 34 {
        return Hash256::ZERO;
    }

    if size <= 3 {
        let word = word >> (8 * (3 - size));
        target[0] = (word & 0xFF) as u8;
        target[1] = ((word >> 8) & 0xFF) as u8;
        target[2] = ((word >> 16) & 0xFF) as u8;
    } else {
        // Mantissa bytes land at offsets size-3 .. size-1 of the
        // little-endian storage. Offsets past byte 31 are dropped.
        let pos = size - 3;
        if pos <= 29 {
            target[pos] = (word & 0xFF) as u8;
            if pos + 1 < 32 {
                target[pos + 1] = ((word >> 8) & 0xFF) as u8;
            }
            if pos + 2 < 32 {
                target[pos + 2] = ((word >> 16) & 0xFF) as u8;
            }
        }
    }

    Hash256::from_bytes(target)
}

/// Packs a 256-bit target into compact form.
///
/// The output's sign bit is always clear: if the top mantissa byte would
/// set it, the mantissa is shifted right one byte and the size bumped.
pub fn compact_from_target(target: &Hash256) -> u32 {
    let bytes = target.as_bytes();

    // Most significant non-zero byte (storage is little-endian).
    let msb_pos = match (0..32).rev().find(|&i| bytes[i] != 0) {
        Some(pos) => pos,
        None => return 0,
    };

    let size = msb_pos + 1;

    if size <= 3 {
        let mut word: u32 = 0;
        for i in (0..size).rev() {
            word = (word << 8) | bytes[i] as u32;
        }
        word <<= 8 * (3 - size);
        ((size as u32) << 24) | word
    } else {
        let mut word = ((bytes[msb_pos] as u32) << 16)
            | ((bytes[msb_pos - 1] as u32) << 8)
            | bytes[msb_pos - 2] as u32;
        let mut size = size as u32;

        if word & COMPACT_SIGN_BIT != 0 {
            word >>= 8;
            size += 1;
        }

        (size << 24) | word
    }
}
