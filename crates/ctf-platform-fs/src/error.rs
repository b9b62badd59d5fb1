use std::io;

use ctf_packet::BufferError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Failures while acquiring a stream's resources. Nothing is left allocated or open when one of
/// these is returned.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("out of memory allocating {len} bytes")]
    OutOfMemory { len: usize },

    #[error("packet buffer size must be non-zero")]
    EmptyBuffer,

    #[error("packet buffer of {len} bytes is smaller than the {min}-byte minimum packet")]
    BufferTooSmall { len: usize, min: usize },

    #[error("invalid platform context kind {0}")]
    InvalidContextKind(u32),

    #[error("invalid config: {0}")]
    Config(String),
}

impl From<BufferError> for PlatformError {
    fn from(value: BufferError) -> Self {
        match value {
            BufferError::Empty => Self::EmptyBuffer,
            BufferError::OutOfMemory { len } => Self::OutOfMemory { len },
        }
    }
}

/// Contract or I/O violations after initialization. These are never returned; see [`fatal`].
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("open_packet called while a packet is already open")]
    PacketAlreadyOpen,

    #[error("close_packet called while no packet is open")]
    PacketAlreadyClosed,

    #[error("short packet write ({written} of {expected} bytes)")]
    ShortWrite { expected: usize, written: usize },

    #[error("packet write failed: {0}")]
    SinkWrite(io::Error),

    #[error("closing sink failed: {0}")]
    SinkClose(io::Error),
}

/// Terminate the stream. Under `panic = "abort"` this aborts the process.
#[cold]
#[track_caller]
pub fn fatal(err: FatalError) -> ! {
    tracing::error!(error = %err, "unrecoverable trace backend error");
    panic!("ctf platform fatal: {err}");
}
