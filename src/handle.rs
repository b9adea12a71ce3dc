//! Call-handle allocation.
//!
//! Handles with the top bit set identify client calls; the server
//! echoes the handle on the matching response frame. Callback frames
//! carry server-assigned handles with the top bit clear, so the
//! allocator only ever hands out values in `0x8000_0001..=0xFFFF_FFFE`.

use std::sync::Mutex;

use crate::protocol::{FIRST_CALL_HANDLE, RESPONSE_BIT};

/// Monotonic call-handle allocator with wrap.
///
/// Returns the current value and increments; when the next value would
/// reach `0xFFFF_FFFF` it wraps back to `0x8000_0000`. Wrap is safe in
/// practice because in-flight counts stay far below 2³¹; the pending
/// table additionally rejects a collision, in which case the facade
/// simply allocates again.
#[derive(Debug)]
pub struct HandleAllocator {
    next: Mutex<u32>,
}

impl HandleAllocator {
    /// Create an allocator starting at [`FIRST_CALL_HANDLE`].
    pub fn new() -> Self {
        Self::starting_at(FIRST_CALL_HANDLE)
    }

    /// Create an allocator starting at an arbitrary handle.
    pub fn starting_at(first: u32) -> Self {
        debug_assert!(first & RESPONSE_BIT != 0);
        Self {
            next: Mutex::new(first),
        }
    }

    /// Allocate the next handle.
    pub fn next(&self) -> u32 {
        let mut next = self.next.lock().unwrap();
        let handle = *next;
        *next = if handle == u32::MAX - 1 {
            RESPONSE_BIT
        } else {
            handle + 1
        };
        handle
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}
