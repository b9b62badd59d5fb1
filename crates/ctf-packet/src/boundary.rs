use crate::buffer::PacketBuffer;

/// Entry points a tracer core exposes to the platform backend.
///
/// The tracer core owns the packet bookkeeping (cursor, open flag, header fields inside the
/// buffer). The backend only drives the open/close transitions and asks the two questions below.
pub trait TracerCore {
    /// Write packet-open bookkeeping into `buf`. Only called while the packet is closed.
    fn open_packet(&mut self, buf: &mut PacketBuffer, timestamp: u64);

    /// Finalize the packet in `buf` so it can be flushed as-is. Only called while the packet is
    /// open.
    fn close_packet(&mut self, buf: &mut PacketBuffer, timestamp: u64);

    fn packet_is_open(&self) -> bool;

    /// `true` when no event bytes were appended since the packet was opened.
    fn packet_is_empty(&self) -> bool;

    /// Smallest buffer, in bytes, that [`TracerCore::open_packet`] can write into.
    fn min_packet_size(&self) -> usize {
        1
    }
}

/// The callback set a platform backend provides to its tracer core.
pub trait PlatformCallbacks {
    fn clock_get(&self) -> u64;

    fn is_backend_full(&self) -> bool;

    fn open_packet(&mut self);

    fn close_packet(&mut self);
}

/// Borrowed view of a stream's tracer state and packet buffer.
///
/// Both borrows are tied to the platform context, so the tracer core can never hold on to the
/// buffer past the context's lifetime.
pub struct StreamMut<'a, T> {
    pub tracer: &'a mut T,
    pub buf: &'a mut PacketBuffer,
}

/// Grants the tracer core access to its own state and the live packet buffer while it serializes
/// an event.
pub trait StreamAccess<T> {
    fn stream_mut(&mut self) -> StreamMut<'_, T>;
}
