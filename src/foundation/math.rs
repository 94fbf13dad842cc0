use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Convert decibels to a linear amplitude factor.
pub(crate) fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Convert a linear amplitude to decibels. Zero maps to `-inf`.
pub(crate) fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.log10()
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

/// Blend two channel values with weight `t` (0..=255) on `b`.
pub(crate) fn lerp_u8(a: u8, b: u8, t: u8) -> u8 {
    let t = u16::from(t);
    (mul_div255_u16(u16::from(a), 255 - t) + mul_div255_u16(u16::from(b), t)).min(255) as u8
}

/// Derive a stable sub-seed from a run seed and a label (e.g. `"line:3"`).
pub(crate) fn derive_seed(seed: u64, label: &str) -> u64 {
    xxh3_64_with_seed(label.as_bytes(), seed)
}

pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
