//! Big-endian integer access at arbitrary byte offsets.
//!
//! These helpers have no failure mode. Callers validate lengths first; an
//! out-of-range offset panics.

/// Read a big-endian `u16` at `at`.
pub fn read_be16(r: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([r[at], r[at + 1]])
}

/// Read a big-endian `u32` at `at`.
pub fn read_be32(r: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([r[at], r[at + 1], r[at + 2], r[at + 3]])
}

/// Write a big-endian `u16` at `at`.
pub fn write_be16(w: &mut [u8], at: usize, value: u16) {
    w[at..at + 2].copy_from_slice(&value.to_be_bytes());
}

/// Write a big-endian `u32` at `at`.
pub fn write_be32(w: &mut [u8], at: usize, value: u32) {
    w[at..at + 4].copy_from_slice(&value.to_be_bytes());
}

/// Read a big-endian `u16` at `at`, or `None` if the slice is too short.
pub(crate) fn get_be16(r: &[u8], at: usize) -> Option<u16> {
    let bytes = r.get(at..at.checked_add(2)?)?;
    Some(u16::from_be_bytes(bytes.try_into().ok()?))
}

/// Read a big-endian `u32` at `at`, or `None` if the slice is too short.
pub(crate) fn get_be32(r: &[u8], at: usize) -> Option<u32> {
    let bytes = r.get(at..at.checked_add(4)?)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}
