use std::ops::{Deref, DerefMut};

use crate::error::BufferError;

/// Fixed-capacity packet storage.
///
/// Allocated once and never resized: the buffer length is the packet size for the lifetime of the
/// stream. The backend never interprets the contents; the tracer core reads and writes them.
#[derive(Debug)]
pub struct PacketBuffer {
    bytes: Box<[u8]>,
}

impl PacketBuffer {
    /// Allocate a zeroed buffer of exactly `len` bytes.
    pub fn allocate(len: usize) -> Result<Self, BufferError> {
        if len == 0 {
            return Err(BufferError::Empty);
        }

        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| BufferError::OutOfMemory { len })?;
        bytes.resize(len, 0);

        Ok(Self {
            bytes: bytes.into_boxed_slice(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Deref for PacketBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for PacketBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_exact_zeroed_capacity() {
        let buf = PacketBuffer::allocate(256).unwrap();
        assert_eq!(buf.capacity(), 256);
        assert_eq!(buf.len(), 256);
        assert!(buf.iter().all(|b| *b == 0));
    }

    #[test]
    fn zero_length_is_rejected() {
        assert_eq!(PacketBuffer::allocate(0).unwrap_err(), BufferError::Empty);
    }

    #[test]
    fn allocation_failure_returns_error() {
        let err = PacketBuffer::allocate(usize::MAX).unwrap_err();
        assert_eq!(err, BufferError::OutOfMemory { len: usize::MAX });
    }

    #[test]
    fn writes_do_not_move_or_resize() {
        let mut buf = PacketBuffer::allocate(16).unwrap();
        let base = buf.as_ptr();
        buf[..4].copy_from_slice(&[1, 2, 3, 4]);
        buf.as_mut_slice()[15] = 0xFF;
        assert_eq!(buf.as_ptr(), base);
        assert_eq!(buf.capacity(), 16);
        assert_eq!(&buf.as_slice()[..4], &[1, 2, 3, 4]);
    }
}
