//! CRC-32 (IEEE 802.3) as used by ZIP local and central headers.
//!
//! The reflected polynomial `0xEDB88320` is expanded into a 256-entry lookup
//! table at compile time, so digesting costs one table lookup per byte.

/// Reflected CRC-32/IEEE-802.3 polynomial.
const POLYNOMIAL: u32 = 0xEDB8_8320;

static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                POLYNOMIAL ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

/// Incremental CRC-32 hasher.
///
/// Feeding the same bytes in any chunking yields the same digest as
/// [`crc32`] over the concatenation.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    acc: u32,
}

impl Crc32 {
    pub fn new() -> Self {
        Self { acc: 0xFFFF_FFFF }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        let mut acc = self.acc;
        for &b in bytes {
            acc = TABLE[((acc ^ b as u32) & 0xFF) as usize] ^ (acc >> 8);
        }
        self.acc = acc;
    }

    pub fn finalize(self) -> u32 {
        self.acc ^ 0xFFFF_FFFF
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the CRC-32 digest of `bytes`.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(bytes);
    hasher.finalize()
}
