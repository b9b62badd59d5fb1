//! Schema-free tracer core.
//!
//! Packets are little-endian:
//!
//! | offset | field                  | type  |
//! |--------|------------------------|-------|
//! | 0      | magic (`0xC1FC1FC1`)   | `u32` |
//! | 4      | stream id              | `u32` |
//! | 8      | packet size (bits)     | `u64` |
//! | 16     | content size (bits)    | `u64` |
//! | 24     | beginning timestamp    | `u64` |
//! | 32     | end timestamp          | `u64` |
//! | 40     | events discarded       | `u64` |
//! | 48     | sequence number        | `u64` |
//!
//! followed by events, each `id: u16`, `timestamp: u64`, `payload_len: u16`, then the payload.
//! The tail past the content is zero padding, so a closed packet always fills the whole buffer.

use crate::boundary::{PlatformCallbacks, StreamAccess, TracerCore};
use crate::buffer::PacketBuffer;

pub const PACKET_MAGIC: u32 = 0xC1FC_1FC1;
pub const PACKET_HEADER_LEN: usize = 56;
pub const EVENT_HEADER_LEN: usize = 12;

pub(crate) mod offsets {
    pub const MAGIC: usize = 0;
    pub const STREAM_ID: usize = 4;
    pub const PACKET_SIZE: usize = 8;
    pub const CONTENT_SIZE: usize = 16;
    pub const BEGIN_TS: usize = 24;
    pub const END_TS: usize = 32;
    pub const EVENTS_DISCARDED: usize = 40;
    pub const SEQUENCE: usize = 48;
}

#[derive(Debug, Clone)]
pub struct ReferenceTracer {
    stream_id: u32,
    open: bool,
    at: usize,
    events_discarded: u64,
    sequence_number: u64,
}

impl ReferenceTracer {
    pub fn new(stream_id: u32) -> Self {
        Self {
            stream_id,
            open: false,
            at: 0,
            events_discarded: 0,
            sequence_number: 0,
        }
    }

    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }

    pub fn events_discarded(&self) -> u64 {
        self.events_discarded
    }

    /// Sequence number the next opened packet will carry.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Bytes written into the current packet, header included.
    pub fn content_len(&self) -> usize {
        self.at
    }

    /// Serialize one event into the platform's packet buffer.
    ///
    /// Returns `false` when the event was discarded, either because it can never fit into a packet
    /// of this size or because the backend reported itself full.
    pub fn trace<P>(platform: &mut P, id: u16, payload: &[u8]) -> bool
    where
        P: PlatformCallbacks + StreamAccess<ReferenceTracer>,
    {
        let event_len = EVENT_HEADER_LEN + payload.len();

        let must_close = {
            let stream = platform.stream_mut();
            if payload.len() > usize::from(u16::MAX)
                || PACKET_HEADER_LEN + event_len > stream.buf.capacity()
            {
                stream.tracer.discard();
                return false;
            }
            stream.tracer.open && stream.tracer.at + event_len > stream.buf.capacity()
        };

        if must_close {
            platform.close_packet();
        }

        if !platform.stream_mut().tracer.open {
            if platform.is_backend_full() {
                platform.stream_mut().tracer.discard();
                return false;
            }
            platform.open_packet();
        }

        let timestamp = platform.clock_get();
        let stream = platform.stream_mut();
        stream.tracer.write_event(stream.buf, id, timestamp, payload);
        true
    }

    fn discard(&mut self) {
        self.events_discarded = self.events_discarded.wrapping_add(1);
        tracing::trace!(
            stream_id = self.stream_id,
            discarded = self.events_discarded,
            "event discarded"
        );
    }

    fn write_event(&mut self, buf: &mut PacketBuffer, id: u16, timestamp: u64, payload: &[u8]) {
        let at = self.at;
        put_u16(buf, at, id);
        put_u64(buf, at + 2, timestamp);
        // Length was bounded to u16 by the caller.
        put_u16(buf, at + 10, payload.len() as u16);
        buf[at + EVENT_HEADER_LEN..at + EVENT_HEADER_LEN + payload.len()].copy_from_slice(payload);
        self.at = at + EVENT_HEADER_LEN + payload.len();
    }
}

impl TracerCore for ReferenceTracer {
    fn open_packet(&mut self, buf: &mut PacketBuffer, timestamp: u64) {
        debug_assert!(!self.open);

        let packet_bits = (buf.capacity() as u64) * 8;
        put_u32(buf, offsets::MAGIC, PACKET_MAGIC);
        put_u32(buf, offsets::STREAM_ID, self.stream_id);
        put_u64(buf, offsets::PACKET_SIZE, packet_bits);
        put_u64(buf, offsets::CONTENT_SIZE, 0);
        put_u64(buf, offsets::BEGIN_TS, timestamp);
        put_u64(buf, offsets::END_TS, 0);
        put_u64(buf, offsets::EVENTS_DISCARDED, self.events_discarded);
        put_u64(buf, offsets::SEQUENCE, self.sequence_number);

        self.at = PACKET_HEADER_LEN;
        self.open = true;
    }

    fn close_packet(&mut self, buf: &mut PacketBuffer, timestamp: u64) {
        debug_assert!(self.open);

        put_u64(buf, offsets::CONTENT_SIZE, (self.at as u64) * 8);
        put_u64(buf, offsets::END_TS, timestamp);
        put_u64(buf, offsets::EVENTS_DISCARDED, self.events_discarded);
        buf[self.at..].fill(0);

        self.open = false;
        self.sequence_number = self.sequence_number.wrapping_add(1);
    }

    fn packet_is_open(&self) -> bool {
        self.open
    }

    fn packet_is_empty(&self) -> bool {
        self.at <= PACKET_HEADER_LEN
    }

    fn min_packet_size(&self) -> usize {
        PACKET_HEADER_LEN
    }
}

fn put_u16(buf: &mut [u8], at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_le_bytes());
}

fn put_u64(buf: &mut [u8], at: usize, v: u64) {
    buf[at..at + 8].copy_from_slice(&v.to_le_bytes());
}
