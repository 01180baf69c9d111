//! Byte-addressable execution memory
//!
//! Memory grows in 32-byte words. Expansion cost is computed from
//! [`Memory::required_size`] and charged before [`Memory::grow`] is
//! called, so a failed gas check leaves the buffer untouched.

use basalt_primitives::U256;

/// Lazily expanding, word-aligned byte buffer.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create new empty memory
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current size in bytes (always a multiple of 32)
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Word-aligned size needed to cover `offset..offset + len`.
    /// Returns None when the range overflows usize. A zero-length
    /// access never requires expansion.
    pub fn required_size(offset: usize, len: usize) -> Option<usize> {
        if len == 0 {
            return Some(0);
        }
        let end = offset.checked_add(len)?;
        end.checked_add(31).map(|e| (e / 32) * 32)
    }

    /// Expand to at least `new_size` bytes. Never shrinks.
    pub fn grow(&mut self, new_size: usize) {
        if new_size > self.data.len() {
            self.data.resize(new_size, 0);
        }
    }

    /// Load a 32-byte word. Bytes beyond the current size read as zero.
    pub fn load(&self, offset: usize) -> U256 {
        let mut buf = [0u8; 32];
        let end = (offset + 32).min(self.data.len());
        if offset < end {
            buf[..end - offset].copy_from_slice(&self.data[offset..end]);
        }
        U256::from_big_endian(&buf)
    }

    /// Store a 32-byte word. The buffer must already cover the range.
    pub fn store(&mut self, offset: usize, value: U256) {
        debug_assert!(offset + 32 <= self.data.len());
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        self.data[offset..offset + 32].copy_from_slice(&buf);
    }

    /// Store a single byte. The buffer must already cover the offset.
    pub fn store8(&mut self, offset: usize, value: u8) {
        debug_assert!(offset < self.data.len());
        self.data[offset] = value;
    }

    /// Copy a range out of memory. Bytes beyond the current size read as zero.
    pub fn load_slice(&self, offset: usize, len: usize) -> Vec<u8> {
        if len == 0 {
            return Vec::new();
        }
        let mut out = vec![0u8; len];
        let end = (offset + len).min(self.data.len());
        if offset < end {
            out[..end - offset].copy_from_slice(&self.data[offset..end]);
        }
        out
    }

    /// Store a byte slice. The buffer must already cover the range.
    pub fn store_slice(&mut self, offset: usize, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        debug_assert!(offset + data.len() <= self.data.len());
        self.data[offset..offset + data.len()].copy_from_slice(data);
    }

    /// Copy within memory, handling overlap (MCOPY semantics).
    pub fn copy(&mut self, dest: usize, src: usize, len: usize) {
        if len == 0 {
            return;
        }
        debug_assert!(dest + len <= self.data.len() && src + len <= self.data.len());
        self.data.copy_within(src..src + len, dest);
    }

    /// Raw contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
