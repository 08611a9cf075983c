use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use crate::error::{Result, TransportError};

/// A blocking, ordered byte stream to a CAN adapter.
///
/// This is the only I/O seam the framing layer depends on. Implementations
/// must deliver bytes in order and never split or reorder a single
/// `write_all` call relative to other writes on the same channel.
pub trait ByteChannel {
    /// Write every byte of `bytes` to the channel.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Block until `buf` is completely filled.
    ///
    /// Fails with [`TransportError::ChannelClosed`] if the peer goes away first
    /// and with [`TransportError::Timeout`] if a read timeout is configured and
    /// elapses.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Bound how long a single `read_exact` may block. `None` blocks forever.
    ///
    /// Channels without timeout support ignore this.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        let _ = timeout;
        Ok(())
    }
}

impl<C: ByteChannel + ?Sized> ByteChannel for &mut C {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_read_timeout(timeout)
    }
}

impl<C: ByteChannel + ?Sized> ByteChannel for Box<C> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact(buf)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        (**self).set_read_timeout(timeout)
    }
}

/// Adapts any `Read + Write` stream into a [`ByteChannel`].
///
/// Partial reads are accumulated internally. A read that reports
/// `ErrorKind::TimedOut` is treated as a poll tick: the channel keeps waiting
/// until its own read timeout (if any) has elapsed. Serial ports are opened
/// with a short port timeout so this loop stays responsive.
///
/// Bytes received before a timeout are kept and handed out first by the next
/// `read_exact`, so a timed-out read never consumes input.
pub struct IoChannel<T> {
    inner: T,
    read_timeout: Option<Duration>,
    pending: Vec<u8>,
}

impl<T: Read + Write> IoChannel<T> {
    /// Wrap a stream that blocks forever on reads.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            read_timeout: None,
            pending: Vec::new(),
        }
    }

    /// Wrap a stream with an overall read timeout.
    pub fn with_read_timeout(inner: T, read_timeout: Option<Duration>) -> Self {
        Self {
            inner,
            read_timeout,
            pending: Vec::new(),
        }
    }

    /// Current read timeout.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the channel and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T: Read + Write> ByteChannel for IoChannel<T> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::ChannelClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        self.flush()
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let started = Instant::now();
        let mut filled = self.pending.len().min(buf.len());
        buf[..filled].copy_from_slice(&self.pending[..filled]);
        self.pending.drain(..filled);

        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(TransportError::ChannelClosed),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => {
                    if let Some(limit) = self.read_timeout {
                        if started.elapsed() >= limit {
                            // `pending` was fully drained above, or the loop would not run.
                            self.pending.extend_from_slice(&buf[..filled]);
                            return Err(TransportError::Timeout(limit));
                        }
                    }
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }
}

impl<T> std::fmt::Debug for IoChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoChannel")
            .field("read_timeout", &self.read_timeout)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
