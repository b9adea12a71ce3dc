//! The pending-call table.
//!
//! Maps an in-flight call handle to a single-assignment slot that the
//! receive loop fulfils with the raw response payload (or a transport
//! error on disconnect). The map is guarded by a short-held std mutex
//! and never does I/O under the lock.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tokio::sync::oneshot;

use crate::error::{GbxError, Result};

type Slot = oneshot::Sender<Result<Bytes>>;

/// Table of in-flight calls, shared between the facade and the receive
/// loop. Cloning is cheap (one `Arc`).
#[derive(Debug, Clone, Default)]
pub struct PendingCalls {
    slots: Arc<Mutex<HashMap<u32, Slot>>>,
}

impl PendingCalls {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle and hand back the caller's side of the slot.
    ///
    /// Fails with [`GbxError::DuplicateHandle`] if the handle is already
    /// in flight; the caller allocates a fresh handle and retries.
    pub fn register(&self, handle: u32) -> Result<PendingCall> {
        let (tx, rx) = oneshot::channel();
        let mut slots = self.slots.lock().unwrap();
        match slots.entry(handle) {
            Entry::Occupied(_) => Err(GbxError::DuplicateHandle(handle)),
            Entry::Vacant(entry) => {
                entry.insert(tx);
                Ok(PendingCall {
                    handle,
                    rx,
                    table: self.clone(),
                    consumed: false,
                })
            }
        }
    }

    /// Deliver a response payload to the matching slot, exactly once.
    ///
    /// A payload with no matching entry is a stale reply (the caller
    /// timed out, cancelled, or the connection was torn down); it is
    /// dropped with a debug line.
    pub fn complete(&self, handle: u32, payload: Bytes) {
        let slot = self.slots.lock().unwrap().remove(&handle);
        match slot {
            Some(tx) => {
                if tx.send(Ok(payload)).is_err() {
                    tracing::debug!(handle = format_args!("{handle:#010x}"), "reply receiver gone");
                }
            }
            None => {
                tracing::debug!(
                    handle = format_args!("{handle:#010x}"),
                    "stale reply dropped"
                );
            }
        }
    }

    /// Drain the table on disconnect, delivering an error to every
    /// receiver.
    pub fn fail_all<F>(&self, make_err: F)
    where
        F: Fn() -> GbxError,
    {
        let drained: Vec<Slot> = {
            let mut slots = self.slots.lock().unwrap();
            slots.drain().map(|(_, tx)| tx).collect()
        };
        for tx in drained {
            let _ = tx.send(Err(make_err()));
        }
    }

    /// Number of calls currently in flight.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap().len()
    }

    /// Whether no calls are in flight.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn discard(&self, handle: u32) {
        self.slots.lock().unwrap().remove(&handle);
    }
}

/// The caller's side of one in-flight call.
///
/// Dropping it without awaiting removes the table entry, so a reply
/// arriving after cancellation finds no slot and is discarded.
#[derive(Debug)]
pub struct PendingCall {
    handle: u32,
    rx: oneshot::Receiver<Result<Bytes>>,
    table: PendingCalls,
    consumed: bool,
}

impl PendingCall {
    /// The handle this call was registered under.
    pub fn handle(&self) -> u32 {
        self.handle
    }

    /// Await the response payload or the transport error.
    ///
    /// A dropped sender (teardown racing slot delivery) surfaces as
    /// [`GbxError::Closed`].
    pub async fn wait(mut self) -> Result<Bytes> {
        let outcome = (&mut self.rx).await;
        self.consumed = true;
        match outcome {
            Ok(result) => result,
            Err(_) => Err(GbxError::Closed),
        }
    }
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if !self.consumed {
            self.table.discard(self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_complete() {
        let table = PendingCalls::new();
        let call = table.register(0x8000_0001).unwrap();
        assert_eq!(table.len(), 1);

        table.complete(0x8000_0001, Bytes::from_static(b"payload"));
        assert!(table.is_empty());

        let payload = call.wait().await.unwrap();
        assert_eq!(&payload[..], b"payload");
    }

    #[test]
    fn test_duplicate_handle_rejected() {
        let table = PendingCalls::new();
        let _first = table.register(0x8000_0001).unwrap();
        assert!(matches!(
            table.register(0x8000_0001),
            Err(GbxError::DuplicateHandle(0x8000_0001))
        ));
        // Same handle is free again after the first entry is gone.
        drop(_first);
        assert!(table.register(0x8000_0001).is_ok());
    }

    #[test]
    fn test_stale_reply_is_dropped() {
        let table = PendingCalls::new();
        // No entry: must not panic, payload silently (debug-logged) gone.
        table.complete(0x8000_0099, Bytes::from_static(b"late"));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_removes_entry() {
        let table = PendingCalls::new();
        let call = table.register(0x8000_0002).unwrap();
        assert_eq!(table.len(), 1);

        drop(call);
        assert!(table.is_empty());

        // The late reply finds no slot.
        table.complete(0x8000_0002, Bytes::from_static(b"late"));
    }

    #[tokio::test]
    async fn test_fail_all_reaches_every_receiver() {
        let table = PendingCalls::new();
        let calls: Vec<_> = (1..=5u32)
            .map(|i| table.register(0x8000_0000 + i).unwrap())
            .collect();

        table.fail_all(|| GbxError::Closed);
        assert!(table.is_empty());

        for call in calls {
            assert!(matches!(call.wait().await, Err(GbxError::Closed)));
        }
    }

    #[tokio::test]
    async fn test_wait_on_dropped_table_sender_is_closed() {
        let table = PendingCalls::new();
        let call = table.register(0x8000_0003).unwrap();

        // Remove the sender without delivering anything.
        table.discard(0x8000_0003);
        assert!(matches!(call.wait().await, Err(GbxError::Closed)));
    }

    #[tokio::test]
    async fn test_out_of_order_completion() {
        let table = PendingCalls::new();
        let first = table.register(0x8000_0010).unwrap();
        let second = table.register(0x8000_0011).unwrap();

        // Replies arrive in reverse order; each slot still gets its own.
        table.complete(0x8000_0011, Bytes::from_static(b"second"));
        table.complete(0x8000_0010, Bytes::from_static(b"first"));

        assert_eq!(&first.wait().await.unwrap()[..], b"first");
        assert_eq!(&second.wait().await.unwrap()[..], b"second");
    }
}
