//! Correlation table for in-flight requests
//!
//! Maps each pending request id to the sending half of a one-shot reply
//! channel. The dispatcher keeps the receiving half and waits on it; the
//! response intake takes the sender out of the table and fulfills it.

use crate::framework::core::{DispatchError, ResponseRecord};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::oneshot;

pub type ReplySender = oneshot::Sender<ResponseRecord>;
pub type ReplyReceiver = oneshot::Receiver<ResponseRecord>;

#[derive(Debug, Default)]
struct TableInner {
    next_id: u64,
    pending: HashMap<u64, ReplySender>,
}

/// Request id counter plus the id -> reply channel map, behind one lock
#[derive(Debug, Default)]
pub struct CorrelationTable {
    inner: Mutex<TableInner>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    // No user code runs under the lock, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, TableInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hand out the next request id
    pub fn next_id(&self) -> u64 {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id = inner.next_id.wrapping_add(1);
        id
    }

    /// Store a fresh reply channel under `id` and return its receiving half
    pub fn register(&self, id: u64) -> Result<ReplyReceiver, DispatchError> {
        let (tx, rx) = oneshot::channel();
        let mut inner = self.lock();
        if inner.pending.contains_key(&id) {
            return Err(DispatchError::DuplicateId(id));
        }
        inner.pending.insert(id, tx);
        Ok(rx)
    }

    /// Remove and return the reply sender for `id`, if it is still pending
    pub fn take(&self, id: u64) -> Option<ReplySender> {
        self.lock().pending.remove(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.lock().pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
