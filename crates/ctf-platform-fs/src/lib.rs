#![forbid(unsafe_code)]

//! File-backed platform backend for a packet-oriented tracer core.
//!
//! [`PlatformContext`] owns the packet buffer, the stream's logical clock, a capacity policy and a
//! sink. It opens the first packet at initialization, closes and flushes packets on request (or
//! when the tracer core rotates them through [`ctf_packet::PlatformCallbacks`]), and flushes the
//! last non-empty packet at [`PlatformContext::finalize`].
//!
//! Resource acquisition failures are returned as [`PlatformError`]. Anything that goes wrong once
//! tracing has started (double open/close, failed or short writes) is a [`FatalError`] and panics
//! through [`fatal`]: a truncated packet must never reach the stream file.

mod config;
mod context;
mod error;
mod kind;
mod policy;
mod sink;

pub use crate::config::{PlatformConfig, ENV_BUF_SIZE, ENV_CONTEXT_KIND, ENV_STREAM_PATH};
pub use crate::context::PlatformContext;
pub use crate::error::{fatal, FatalError, PlatformError, Result};
pub use crate::kind::{ContextKind, StreamSlot};
pub use crate::policy::{BackendStats, CapacityPolicy, NeverFull};
pub use crate::sink::{FileSink, PacketSink, WriterSink};

pub use ctf_clock::{ClockSource, ManualClock};
pub use ctf_packet::{PacketBuffer, PlatformCallbacks, StreamAccess, StreamMut, TracerCore};
