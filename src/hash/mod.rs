/// Process-wide ASCII case-folding table.
const LOWCASE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let c = i as u8;
        table[i] = if c >= b'A' && c <= b'Z' { c | 0x20 } else { c };
        i += 1;
    }
    table
};

#[inline]
pub(crate) fn to_lower(c: u8) -> u8 {
    LOWCASE[c as usize]
}

/// One step of the streaming key hash. Overflow wraps in the native word.
#[inline]
pub fn hash(key: usize, c: u8) -> usize {
    key.wrapping_mul(31).wrapping_add(c as usize)
}

/// Hash a byte sequence.
pub fn hash_key(data: &[u8]) -> usize {
    data.iter().fold(0, |key, &c| hash(key, c))
}

/// Hash a byte sequence as if it were lowercase.
pub fn hash_key_lc(data: &[u8]) -> usize {
    data.iter().fold(0, |key, &c| hash(key, to_lower(c)))
}

/// Copy `src` into `dst` lowercased and return the hash of the copy.
///
/// Both slices must have the same length.
pub fn hash_strlow(dst: &mut [u8], src: &[u8]) -> usize {
    assert_eq!(dst.len(), src.len());

    let mut key = 0;
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = to_lower(s);
        key = hash(key, *d);
    }
    key
}

/// Copy `src` into `dst` lowercased.
pub(crate) fn strlow(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());

    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = to_lower(s);
    }
}
