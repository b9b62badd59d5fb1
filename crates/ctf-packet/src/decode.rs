//! Reading [`ReferenceTracer`](crate::ReferenceTracer) packets back out of a stream file.

use std::io::{self, Read};

use serde::Serialize;

use crate::error::DecodeError;
use crate::reference::{offsets, EVENT_HEADER_LEN, PACKET_HEADER_LEN, PACKET_MAGIC};

/// Packets larger than this are rejected before allocating.
pub const MAX_PACKET_SIZE: usize = 1 << 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PacketHeader {
    pub stream_id: u32,
    pub packet_size_bits: u64,
    pub content_size_bits: u64,
    pub beginning_timestamp: u64,
    pub end_timestamp: u64,
    pub events_discarded: u64,
    pub sequence_number: u64,
}

impl PacketHeader {
    /// Packet size in bytes, padding included.
    pub fn packet_size(&self) -> usize {
        (self.packet_size_bits >> 3) as usize
    }

    /// Content size in bytes.
    pub fn content_size(&self) -> usize {
        (self.content_size_bits >> 3) as usize
    }

    fn parse(bytes: &[u8; PACKET_HEADER_LEN]) -> Result<Self, DecodeError> {
        let magic = get_u32(bytes, offsets::MAGIC);
        if magic != PACKET_MAGIC {
            return Err(DecodeError::InvalidMagic(magic));
        }

        let header = Self {
            stream_id: get_u32(bytes, offsets::STREAM_ID),
            packet_size_bits: get_u64(bytes, offsets::PACKET_SIZE),
            content_size_bits: get_u64(bytes, offsets::CONTENT_SIZE),
            beginning_timestamp: get_u64(bytes, offsets::BEGIN_TS),
            end_timestamp: get_u64(bytes, offsets::END_TS),
            events_discarded: get_u64(bytes, offsets::EVENTS_DISCARDED),
            sequence_number: get_u64(bytes, offsets::SEQUENCE),
        };

        let bits = header.packet_size_bits;
        if bits % 8 != 0
            || bits < (PACKET_HEADER_LEN as u64) * 8
            || bits > (MAX_PACKET_SIZE as u64) * 8
        {
            return Err(DecodeError::PacketSizeOutOfBounds { bits });
        }
        if header.content_size_bits > bits
            || header.content_size_bits < (PACKET_HEADER_LEN as u64) * 8
        {
            return Err(DecodeError::ContentSizeOutOfBounds {
                bits: header.content_size_bits,
                packet_bits: bits,
            });
        }

        Ok(header)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub id: u16,
    pub timestamp: u64,
    pub payload: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DecodedPacket {
    pub header: PacketHeader,
    pub events: Vec<EventRecord>,
}

/// Decode one complete packet (header, events and padding).
pub fn decode_packet(bytes: &[u8]) -> Result<DecodedPacket, DecodeError> {
    let header_bytes: &[u8; PACKET_HEADER_LEN] = bytes
        .get(..PACKET_HEADER_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or(DecodeError::TruncatedHeader {
            read: bytes.len(),
            expected: PACKET_HEADER_LEN,
        })?;
    let header = PacketHeader::parse(header_bytes)?;
    if bytes.len() < header.packet_size() {
        return Err(DecodeError::PacketSizeOutOfBounds {
            bits: header.packet_size_bits,
        });
    }
    let events = decode_events(&bytes[..header.content_size()])?;
    Ok(DecodedPacket { header, events })
}

fn decode_events(content: &[u8]) -> Result<Vec<EventRecord>, DecodeError> {
    let mut events = Vec::new();
    let mut at = PACKET_HEADER_LEN;
    while at < content.len() {
        if at + EVENT_HEADER_LEN > content.len() {
            return Err(DecodeError::TruncatedEvent { offset: at });
        }
        let id = u16::from_le_bytes([content[at], content[at + 1]]);
        let timestamp = get_u64(content, at + 2);
        let len = usize::from(u16::from_le_bytes([content[at + 10], content[at + 11]]));
        let start = at + EVENT_HEADER_LEN;
        let payload = content
            .get(start..start + len)
            .ok_or(DecodeError::TruncatedEvent { offset: at })?;
        events.push(EventRecord {
            id,
            timestamp,
            payload: payload.to_vec(),
        });
        at = start + len;
    }
    Ok(events)
}

/// Sequential packet reader over a stream file.
///
/// Each packet describes its own size, so the reader does not need to know the buffer size the
/// stream was written with.
pub struct PacketReader<R> {
    reader: R,
    packet: Vec<u8>,
}

impl<R: Read> PacketReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            packet: Vec::new(),
        }
    }

    /// Read the next packet. Returns `Ok(None)` at a clean end of stream.
    pub fn next_packet(&mut self) -> Result<Option<DecodedPacket>, DecodeError> {
        let mut header_bytes = [0u8; PACKET_HEADER_LEN];
        let read = read_full(&mut self.reader, &mut header_bytes)?;
        if read == 0 {
            return Ok(None);
        }
        if read < PACKET_HEADER_LEN {
            return Err(DecodeError::TruncatedHeader {
                read,
                expected: PACKET_HEADER_LEN,
            });
        }

        let header = PacketHeader::parse(&header_bytes)?;
        let len = header.packet_size();
        if len > self.packet.capacity() {
            self.packet
                .try_reserve_exact(len - self.packet.len())
                .map_err(|_| DecodeError::OutOfMemory { len })?;
        }
        self.packet.clear();
        self.packet.extend_from_slice(&header_bytes);
        self.packet.resize(len, 0);
        self.reader.read_exact(&mut self.packet[PACKET_HEADER_LEN..])?;

        tracing::trace!(
            sequence = header.sequence_number,
            packet_size = len,
            "read packet"
        );

        let events = decode_events(&self.packet[..header.content_size()])?;
        Ok(Some(DecodedPacket { header, events }))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for PacketReader<R> {
    type Item = Result<DecodedPacket, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}

fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

fn get_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

fn get_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header(packet_size: u64, content_size: u64) -> Vec<u8> {
        let mut bytes = vec![0u8; packet_size as usize];
        bytes[0..4].copy_from_slice(&PACKET_MAGIC.to_le_bytes());
        bytes[8..16].copy_from_slice(&(packet_size * 8).to_le_bytes());
        bytes[16..24].copy_from_slice(&(content_size * 8).to_le_bytes());
        bytes
    }

    #[test]
    fn empty_stream_yields_no_packets() {
        let mut reader = PacketReader::new(Cursor::new(Vec::new()));
        assert!(reader.next_packet().unwrap().is_none());
    }

    #[test]
    fn reader_consumes_exactly_one_packet_per_call() {
        let mut bytes = header(64, 56);
        bytes.extend(header(96, 56));
        let total = bytes.len() as u64;
        let mut reader = PacketReader::new(Cursor::new(bytes));

        let first = reader.next_packet().unwrap().unwrap();
        assert_eq!(first.header.packet_size(), 64);
        let second = reader.next_packet().unwrap().unwrap();
        assert_eq!(second.header.packet_size(), 96);
        assert!(second.events.is_empty());
        assert!(reader.next_packet().unwrap().is_none());
        assert_eq!(reader.into_inner().position(), total);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = header(64, 56);
        bytes[0] = 0;
        let err = decode_packet(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidMagic(_)));
    }

    #[test]
    fn partial_header_is_reported() {
        let bytes = header(64, 56);
        let mut reader = PacketReader::new(Cursor::new(bytes[..20].to_vec()));
        let err = reader.next_packet().unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TruncatedHeader {
                read: 20,
                expected: 56
            }
        ));
    }

    #[test]
    fn content_larger_than_packet_is_rejected() {
        let bytes = header(64, 80);
        let err = decode_packet(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::ContentSizeOutOfBounds { .. }));
    }

    #[test]
    fn event_overrunning_content_is_rejected() {
        let mut bytes = header(96, 56 + 12);
        // Payload length of 4 with no room left in the content.
        bytes[56 + 10..56 + 12].copy_from_slice(&4u16.to_le_bytes());
        let err = decode_packet(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::TruncatedEvent { offset: 56 }));
    }

    #[test]
    fn truncated_packet_body_is_an_io_error() {
        let bytes = header(128, 56);
        let mut reader = PacketReader::new(Cursor::new(bytes[..100].to_vec()));
        let err = reader.next_packet().unwrap_err();
        assert!(matches!(err, DecodeError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }
}
