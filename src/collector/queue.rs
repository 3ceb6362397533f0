//! Work queue between the enumerator and the enrichment workers
//!
//! Unbounded so the enumerator never waits on slow enrichment. Closing the
//! queue is the "no more work will arrive" signal: workers drain whatever is
//! left and then see `None`.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Multi-producer, multi-consumer queue of logins
#[derive(Debug)]
pub struct WorkQueue {
    sender: Mutex<Option<UnboundedSender<String>>>,
    receiver: tokio::sync::Mutex<UnboundedReceiver<String>>,
    pending: AtomicUsize,
    closed: AtomicBool,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    /// Create an open, empty queue
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: tokio::sync::Mutex::new(receiver),
            pending: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Enqueue a login; returns `false` once the queue is closed
    pub fn push(&self, login: &str) -> bool {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        let Some(sender) = sender.as_ref() else {
            return false;
        };

        // Counted before sending so a fast consumer never decrements below zero.
        self.pending.fetch_add(1, Ordering::SeqCst);
        if sender.send(login.to_string()).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Signal that no more logins will arrive
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.sender.lock().unwrap_or_else(|e| e.into_inner()).take();
    }

    /// Whether [`close`](Self::close) was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Logins enqueued but not yet taken
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Whether no login is waiting
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for the next login; `None` once the queue is closed and drained
    pub async fn next(&self) -> Option<String> {
        let mut receiver = self.receiver.lock().await;
        let login = receiver.recv().await?;
        self.pending.fetch_sub(1, Ordering::SeqCst);
        Some(login)
    }
}
