use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Durable destination for closed packets.
pub trait PacketSink {
    /// Value handed back by [`PacketSink::close`].
    type Output;

    /// Write one closed packet with a single write call and return how many bytes were accepted.
    /// The caller treats anything short of `packet.len()` as fatal; implementations must not
    /// retry or buffer.
    fn write_packet(&mut self, packet: &[u8]) -> io::Result<usize>;

    fn close(self) -> io::Result<Self::Output>;
}

/// Stream file sink. The file is created (or truncated) once and kept open until
/// [`PacketSink::close`].
#[derive(Debug)]
pub struct FileSink {
    file: File,
    path: PathBuf,
}

impl FileSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PacketSink for FileSink {
    type Output = ();

    fn write_packet(&mut self, packet: &[u8]) -> io::Result<usize> {
        self.file.write(packet)
    }

    fn close(self) -> io::Result<()> {
        self.file.sync_all()
    }
}

/// Adapts any [`Write`] into a sink; `close` returns the writer.
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write> PacketSink for WriterSink<W> {
    type Output = W;

    fn write_packet(&mut self, packet: &[u8]) -> io::Result<usize> {
        self.inner.write(packet)
    }

    fn close(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_sink_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream");
        std::fs::write(&path, b"stale contents").unwrap();

        let sink = FileSink::create(&path).unwrap();
        assert_eq!(sink.path(), path.as_path());
        sink.close().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn file_sink_appends_each_packet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream");

        let mut sink = FileSink::create(&path).unwrap();
        assert_eq!(sink.write_packet(&[1u8; 8]).unwrap(), 8);
        assert_eq!(sink.write_packet(&[2u8; 8]).unwrap(), 8);
        sink.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], &[1u8; 8]);
        assert_eq!(&bytes[8..], &[2u8; 8]);
    }

    #[test]
    fn close_syncs_written_packets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream");

        let mut sink = FileSink::create(&path).unwrap();
        sink.write_packet(&[3u8; 16]).unwrap();
        sink.close().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![3u8; 16]);
    }

    #[test]
    fn missing_directory_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileSink::create(dir.path().join("missing/stream")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn writer_sink_returns_inner_writer() {
        let mut sink = WriterSink::new(Vec::new());
        sink.write_packet(&[9u8; 4]).unwrap();
        assert_eq!(sink.get_ref().len(), 4);
        assert_eq!(sink.close().unwrap(), vec![9u8; 4]);
    }
}
