//! Bit-level primitives shared by the sketches.

// clz of a 4-bit nibble, offset by 28 so that `CLZ_LOOKUP[x >> n] - n` is the full count.
const CLZ_LOOKUP: [u8; 16] = [32, 31, 30, 30, 29, 29, 29, 29, 28, 28, 28, 28, 28, 28, 28, 28];

/// Counts the leading zero bits of a 32-bit value.
///
/// Returns 32 for `0` and 0 for any value with the most significant bit set.
/// The shift is picked by a fixed branch tree on nibble boundaries and the
/// remaining nibble is resolved from a lookup table, so every input costs the
/// same four comparisons.
pub fn leading_zero_count32(x: u32) -> u8 {
    let n: u8 = if x >= 1 << 16 {
        if x >= 1 << 24 {
            if x >= 1 << 28 {
                28
            } else {
                24
            }
        } else if x >= 1 << 20 {
            20
        } else {
            16
        }
    } else if x >= 1 << 8 {
        if x >= 1 << 12 {
            12
        } else {
            8
        }
    } else if x >= 1 << 4 {
        4
    } else {
        0
    };
    CLZ_LOOKUP[(x >> n) as usize] - n
}

/// Extracts the bits in `[lo, hi)` (lsb 0 numbering) and shifts them down to bit 0.
///
/// `hi` may be 32 or larger; the mask saturates at the full word.
pub fn extract_bits(bits: u32, hi: u8, lo: u8) -> u32 {
    if lo >= 32 {
        return 0;
    }
    let width = hi.saturating_sub(lo).min(32) as u32;
    let mask = ((1u64 << width) - 1) << lo;
    ((bits as u64 & mask) >> lo) as u32
}

/// Counts set bits with the parallel (SWAR) reduction.
pub fn pop_count32(bits: u32) -> u32 {
    let mut b = bits;
    b = (b & 0x5555_5555) + ((b >> 1) & 0x5555_5555);
    b = (b & 0x3333_3333) + ((b >> 2) & 0x3333_3333);
    b = (b & 0x0f0f_0f0f) + ((b >> 4) & 0x0f0f_0f0f);
    b = (b & 0x00ff_00ff) + ((b >> 8) & 0x00ff_00ff);
    (b & 0x0000_ffff) + ((b >> 16) & 0x0000_ffff)
}

/// Counts set bits of a 128-bit word as four 32-bit lanes.
pub fn pop_count128(bits: u128) -> u32 {
    (0..4)
        .map(|lane| pop_count32((bits >> (lane * 32)) as u32))
        .sum()
}

/// HyperLogLog bias-correction constant for `m` registers.
pub fn alpha(m: u32) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / m as f64),
    }
}

/// Number of registers still at zero.
pub fn count_zeros(registers: &[u8]) -> u32 {
    registers.iter().filter(|&&r| r == 0).count() as u32
}
