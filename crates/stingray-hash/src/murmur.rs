//! MurmurHash64A as used by the Stingray engine
//!
//! Resource names are hashed with seed 0. The 32-bit variant is the upper
//! half of the 64-bit hash, not a separate Murmur3 computation.

const M: u64 = 0xc6a4_a793_5bd1_e995;
const R: u32 = 47;

/// Compute MurmurHash64A of `data` with the given seed
///
/// # Examples
///
/// ```
/// use stingray_hash::murmur64a;
///
/// assert_eq!(murmur64a(b"", 0), 0);
/// ```
pub fn murmur64a(data: &[u8], seed: u64) -> u64 {
    let mut h = seed ^ (data.len() as u64).wrapping_mul(M);

    let mut chunks = data.chunks_exact(8);
    for chunk in &mut chunks {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        let mut k = u64::from_le_bytes(bytes);

        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);

        h ^= k;
        h = h.wrapping_mul(M);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        for (i, &byte) in tail.iter().enumerate() {
            h ^= u64::from(byte) << (8 * i);
        }
        h = h.wrapping_mul(M);
    }

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;
    h
}

/// Hash a resource name to its 64-bit identifier
pub fn hash64(name: &str) -> u64 {
    murmur64a(name.as_bytes(), 0)
}

/// Hash a resource name to its 32-bit short identifier
pub fn hash32(name: &str) -> u32 {
    (hash64(name) >> 32) as u32
}
