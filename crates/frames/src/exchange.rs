//! Handoff of processed frames from the producer context to the render
//! context.
//!
//! Three [`ProcessedFrame`] buffers rotate between the two sides: the
//! producer writes its back buffer, publishes it into a single-slot mailbox
//! and receives a free buffer in return; the consumer takes the published
//! buffer, uploads from it, and hands it back through the recycle mailbox.
//! Buffers move by value, so a frame is never written while it is being read.
//! The mailbox holds at most one frame: publishing over an unconsumed frame
//! replaces it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::buffer::ProcessedFrame;

const RECYCLE_CAPACITY: usize = 2;

/// Signals "a processed frame is waiting" across contexts.
///
/// Raised with release ordering after the frame is published; taken with
/// acquire ordering before the frame is read. Each raise is observed by at
/// most one successful [`DirtyFlag::take`].
#[derive(Debug, Default)]
pub struct DirtyFlag(AtomicBool);

impl DirtyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clears the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0
            .compare_exchange(true, false, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Counters describing traffic through the exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExchangeStats {
    pub published: u64,
    pub consumed: u64,
    pub replaced: u64,
}

#[derive(Debug)]
pub struct FrameExchange {
    ready_tx: Sender<ProcessedFrame>,
    ready_rx: Receiver<ProcessedFrame>,
    recycle_tx: Sender<ProcessedFrame>,
    recycle_rx: Receiver<ProcessedFrame>,
    dirty: DirtyFlag,
    closed: AtomicBool,
    published: AtomicU64,
    consumed: AtomicU64,
    replaced: AtomicU64,
}

impl Default for FrameExchange {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameExchange {
    pub fn new() -> Self {
        let (ready_tx, ready_rx) = bounded(1);
        let (recycle_tx, recycle_rx) = bounded(RECYCLE_CAPACITY);
        Self {
            ready_tx,
            ready_rx,
            recycle_tx,
            recycle_rx,
            dirty: DirtyFlag::new(),
            closed: AtomicBool::new(false),
            published: AtomicU64::new(0),
            consumed: AtomicU64::new(0),
            replaced: AtomicU64::new(0),
        }
    }

    /// Publishes a completed frame.
    ///
    /// On success returns a buffer for the next write. A refused frame (the
    /// exchange is closed or the mailbox is occupied) comes back as `Err`
    /// untouched. Must only be called from the single producer context.
    pub fn publish(&self, frame: ProcessedFrame) -> Result<ProcessedFrame, ProcessedFrame> {
        if self.is_closed() {
            return Err(frame);
        }

        // Reclaim a frame the consumer never picked up; the new one supersedes it.
        let stale = self.ready_rx.try_recv().ok();
        if stale.is_some() {
            self.replaced.fetch_add(1, Ordering::Relaxed);
        }

        match self.ready_tx.try_send(frame) {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
                self.dirty.raise();
            }
            Err(TrySendError::Full(frame)) | Err(TrySendError::Disconnected(frame)) => {
                tracing::warn!("frame mailbox unexpectedly occupied; dropping frame");
                return Err(frame);
            }
        }

        Ok(stale
            .or_else(|| self.recycle_rx.try_recv().ok())
            .unwrap_or_default())
    }

    /// Takes the published frame if the dirty flag is raised.
    ///
    /// Never blocks. The caller owns the returned buffer until it hands it
    /// back through [`FrameExchange::recycle`].
    pub fn take(&self) -> Option<ProcessedFrame> {
        if !self.dirty.take() {
            return None;
        }
        let frame = self.ready_rx.try_recv().ok()?;
        self.consumed.fetch_add(1, Ordering::Relaxed);
        Some(frame)
    }

    /// Returns a consumed buffer to the producer's free list.
    pub fn recycle(&self, frame: ProcessedFrame) {
        // A full free list just means the buffer is dropped.
        let _ = self.recycle_tx.try_send(frame);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_raised()
    }

    /// Stops accepting frames and drops any buffers held in the mailboxes.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        while self.ready_rx.try_recv().is_ok() {}
        while self.recycle_rx.try_recv().is_ok() {}
        self.dirty.take();
        tracing::debug!("frame exchange closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> ExchangeStats {
        ExchangeStats {
            published: self.published.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            replaced: self.replaced.load(Ordering::Relaxed),
        }
    }
}
