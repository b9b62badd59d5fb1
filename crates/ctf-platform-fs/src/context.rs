use std::path::Path;

use ctf_clock::ManualClock;
use ctf_packet::{PacketBuffer, PlatformCallbacks, StreamAccess, StreamMut, TracerCore};

use crate::config::PlatformConfig;
use crate::error::{fatal, FatalError, PlatformError, Result};
use crate::kind::{ContextKind, StreamSlot};
use crate::policy::{BackendStats, CapacityPolicy, NeverFull};
use crate::sink::{FileSink, PacketSink};

/// One trace stream: packet buffer, tracer state, clock, capacity policy and sink.
///
/// The context exclusively owns every resource for its whole lifetime. The tracer core only ever
/// sees borrows of the buffer (through [`StreamAccess`]), and [`PlatformContext::finalize`]
/// consumes the context, so a stream cannot be finalized twice.
///
/// Packet states are `Closed`, `Open-Empty` and `Open-NonEmpty`; the tracer core moves
/// `Open-Empty` to `Open-NonEmpty` when it appends the first event.
#[derive(Debug)]
pub struct PlatformContext<T, S = FileSink, P = NeverFull> {
    slot: StreamSlot<T>,
    buf: PacketBuffer,
    clock: ManualClock,
    policy: P,
    sink: S,
    stats: BackendStats,
}

impl<T: TracerCore> PlatformContext<T> {
    /// Allocate the buffer, create the stream file and open the first packet.
    pub fn initialize(config: &PlatformConfig, tracer: T) -> Result<Self> {
        config.validate()?;
        Self::init(config.kind, config.buf_size, &config.stream_path, tracer)
    }

    pub fn init(
        kind: ContextKind,
        buf_size: usize,
        stream_path: impl AsRef<Path>,
        tracer: T,
    ) -> Result<Self> {
        check_buf_size(buf_size, &tracer)?;
        let buf = PacketBuffer::allocate(buf_size)?;
        // Dropping `buf` on failure releases it before the error reaches the caller.
        let sink = FileSink::create(stream_path.as_ref())?;
        tracing::info!(
            path = %stream_path.as_ref().display(),
            buf_size,
            "trace stream initialized"
        );
        Ok(Self::assemble(kind, buf, sink, NeverFull, tracer))
    }
}

impl<T, S, P> PlatformContext<T, S, P>
where
    T: TracerCore,
    S: PacketSink,
    P: CapacityPolicy,
{
    /// Build a context over an already-opened sink with a custom capacity policy.
    pub fn with_sink(
        kind: ContextKind,
        buf_size: usize,
        sink: S,
        policy: P,
        tracer: T,
    ) -> Result<Self> {
        check_buf_size(buf_size, &tracer)?;
        let buf = PacketBuffer::allocate(buf_size)?;
        Ok(Self::assemble(kind, buf, sink, policy, tracer))
    }

    fn assemble(kind: ContextKind, buf: PacketBuffer, sink: S, policy: P, tracer: T) -> Self {
        let mut ctx = Self {
            slot: StreamSlot::new(kind, tracer),
            buf,
            clock: ManualClock::new(),
            policy,
            sink,
            stats: BackendStats::default(),
        };
        ctx.open_packet();
        ctx
    }

    pub fn kind(&self) -> ContextKind {
        self.slot.kind()
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn advance_clock(&self, delta: u64) {
        self.clock.advance(delta);
    }

    pub fn tracer(&self) -> &T {
        self.slot.get()
    }

    pub fn tracer_mut(&mut self) -> &mut T {
        self.slot.get_mut()
    }

    pub fn packet_buf(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn packet_buf_size(&self) -> usize {
        self.buf.capacity()
    }

    pub fn stats(&self) -> BackendStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn packet_is_open(&self) -> bool {
        self.slot.get().packet_is_open()
    }

    pub fn packet_is_empty(&self) -> bool {
        self.slot.get().packet_is_empty()
    }

    pub fn is_backend_full(&self) -> bool {
        self.policy.is_backend_full(&self.stats)
    }

    /// `Closed -> Open-Empty`. Fatal if a packet is already open.
    pub fn open_packet(&mut self) {
        if self.packet_is_open() {
            fatal(FatalError::PacketAlreadyOpen);
        }

        let timestamp = self.clock.read();
        let StreamMut { tracer, buf } = self.stream_mut();
        tracer.open_packet(buf, timestamp);
        tracing::debug!(timestamp, "packet opened");
    }

    /// `Open-* -> Closed`, then flush the whole buffer to the sink. Fatal if no packet is open.
    pub fn close_packet(&mut self) {
        if !self.packet_is_open() {
            fatal(FatalError::PacketAlreadyClosed);
        }

        let timestamp = self.clock.read();
        let StreamMut { tracer, buf } = self.stream_mut();
        tracer.close_packet(buf, timestamp);
        tracing::debug!(timestamp, "packet closed");

        self.flush();
    }

    /// Close the current packet and immediately open the next one.
    pub fn rotate_packet(&mut self) {
        self.close_packet();
        self.open_packet();
    }

    fn flush(&mut self) {
        let expected = self.buf.capacity();
        match self.sink.write_packet(self.buf.as_slice()) {
            Ok(written) if written == expected => {}
            Ok(written) => fatal(FatalError::ShortWrite { expected, written }),
            Err(err) => fatal(FatalError::SinkWrite(err)),
        }

        self.stats.packets_flushed += 1;
        self.stats.bytes_flushed += expected as u64;
        tracing::debug!(
            packet_size = expected,
            packets_flushed = self.stats.packets_flushed,
            "packet flushed"
        );
    }

    /// Flush the last packet if it holds any event, then close the sink and release the buffer.
    ///
    /// An open but empty packet is dropped, so an idle stream leaves an empty file.
    pub fn finalize(mut self) -> S::Output {
        if self.packet_is_open() && !self.packet_is_empty() {
            self.close_packet();
        }

        let stats = self.stats;
        let output = match self.sink.close() {
            Ok(output) => output,
            Err(err) => fatal(FatalError::SinkClose(err)),
        };
        tracing::info!(
            packets_flushed = stats.packets_flushed,
            bytes_flushed = stats.bytes_flushed,
            "trace stream finalized"
        );
        output
    }
}

/// Reject buffers the tracer core cannot open a packet in. A zero size is left to
/// [`PacketBuffer::allocate`].
fn check_buf_size<T: TracerCore>(buf_size: usize, tracer: &T) -> Result<()> {
    let min = tracer.min_packet_size();
    if buf_size != 0 && buf_size < min {
        return Err(PlatformError::BufferTooSmall { len: buf_size, min });
    }
    Ok(())
}

impl<T, S, P> PlatformCallbacks for PlatformContext<T, S, P>
where
    T: TracerCore,
    S: PacketSink,
    P: CapacityPolicy,
{
    fn clock_get(&self) -> u64 {
        self.clock.read()
    }

    fn is_backend_full(&self) -> bool {
        PlatformContext::is_backend_full(self)
    }

    fn open_packet(&mut self) {
        PlatformContext::open_packet(self);
    }

    fn close_packet(&mut self) {
        PlatformContext::close_packet(self);
    }
}

impl<T, S, P> StreamAccess<T> for PlatformContext<T, S, P> {
    fn stream_mut(&mut self) -> StreamMut<'_, T> {
        StreamMut {
            tracer: self.slot.get_mut(),
            buf: &mut self.buf,
        }
    }
}
