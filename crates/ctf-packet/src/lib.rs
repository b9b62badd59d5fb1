#![forbid(unsafe_code)]

//! Packet buffer and the boundary between a platform backend and a tracer core.
//!
//! A *tracer core* serializes typed events into a fixed-size [`PacketBuffer`] and keeps its own
//! cursor/open bookkeeping. The platform backend owns the buffer, answers the four
//! [`PlatformCallbacks`], and drives packet open/close through the [`TracerCore`] entry points.
//!
//! [`reference::ReferenceTracer`] is a small schema-free tracer core; [`decode`] reads the packets
//! it produces back out of a stream file.

mod boundary;
mod buffer;
pub mod decode;
mod error;
pub mod reference;

pub use crate::boundary::{PlatformCallbacks, StreamAccess, StreamMut, TracerCore};
pub use crate::buffer::PacketBuffer;
pub use crate::decode::{DecodedPacket, EventRecord, PacketHeader, PacketReader};
pub use crate::error::{BufferError, DecodeError};
pub use crate::reference::ReferenceTracer;
