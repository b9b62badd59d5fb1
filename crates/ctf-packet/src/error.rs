use std::io;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("packet buffer size must be non-zero")]
    Empty,

    #[error("out of memory allocating {len} bytes")]
    OutOfMemory { len: usize },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid packet magic 0x{0:08X}")]
    InvalidMagic(u32),

    #[error("truncated packet header ({read} of {expected} bytes)")]
    TruncatedHeader { read: usize, expected: usize },

    #[error("packet size of {bits} bits is out of bounds")]
    PacketSizeOutOfBounds { bits: u64 },

    #[error("content size of {bits} bits exceeds packet size of {packet_bits} bits")]
    ContentSizeOutOfBounds { bits: u64, packet_bits: u64 },

    #[error("event at offset {offset} runs past the end of the packet content")]
    TruncatedEvent { offset: usize },

    #[error("out of memory allocating {len} bytes")]
    OutOfMemory { len: usize },
}
