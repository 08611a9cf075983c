//! In-memory byte channel.
//!
//! Behaves like a serial link without hardware: reads block until enough bytes
//! have been written by the other end, and dropping one end closes the link.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::ByteChannel;

#[derive(Default)]
struct PipeState {
    buf: VecDeque<u8>,
    closed: bool,
}

#[derive(Default)]
struct Pipe {
    state: Mutex<PipeState>,
    ready: Condvar,
}

impl Pipe {
    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }
}

/// One end of an in-memory, thread-safe byte link.
pub struct MemoryChannel {
    rx: Arc<Pipe>,
    tx: Arc<Pipe>,
    read_timeout: Option<Duration>,
}

impl MemoryChannel {
    /// Create two connected ends: bytes written to one are read from the other.
    pub fn pair() -> (Self, Self) {
        let left_to_right = Arc::new(Pipe::default());
        let right_to_left = Arc::new(Pipe::default());

        let left = Self {
            rx: Arc::clone(&right_to_left),
            tx: Arc::clone(&left_to_right),
            read_timeout: None,
        };
        let right = Self {
            rx: left_to_right,
            tx: right_to_left,
            read_timeout: None,
        };
        (left, right)
    }

    /// Create a self-connected end: bytes written are read back in order.
    pub fn loopback() -> Self {
        let pipe = Arc::new(Pipe::default());
        Self {
            rx: Arc::clone(&pipe),
            tx: pipe,
            read_timeout: None,
        }
    }

    /// Number of bytes waiting to be read on this end.
    pub fn pending(&self) -> usize {
        self.rx.lock().buf.len()
    }

    /// Close both directions. Later reads drain what is buffered, then fail.
    pub fn close(&self) {
        self.tx.close();
        self.rx.close();
    }
}

impl ByteChannel for MemoryChannel {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.tx.lock();
        if state.closed {
            return Err(TransportError::ChannelClosed);
        }
        state.buf.extend(bytes.iter().copied());
        drop(state);

        trace!(len = bytes.len(), "memory channel write");
        self.tx.ready.notify_all();
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let deadline = self.read_timeout.map(|limit| (limit, Instant::now() + limit));
        let wanted = buf.len();
        let mut state = self.rx.lock();

        loop {
            if state.buf.len() >= wanted {
                for (slot, byte) in buf.iter_mut().zip(state.buf.drain(..wanted)) {
                    *slot = byte;
                }
                return Ok(());
            }
            if state.closed {
                return Err(TransportError::ChannelClosed);
            }

            state = match deadline {
                None => self
                    .rx
                    .ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some((limit, at)) => {
                    let now = Instant::now();
                    if now >= at {
                        return Err(TransportError::Timeout(limit));
                    }
                    self.rx
                        .ready
                        .wait_timeout(state, at - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }
}

impl Drop for MemoryChannel {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for MemoryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryChannel")
            .field("pending", &self.pending())
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}
