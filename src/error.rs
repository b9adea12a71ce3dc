//! Error types for the GBXRemote client.

use thiserror::Error;

/// Main error type for all client operations.
#[derive(Debug, Error)]
pub enum GbxError {
    /// I/O error on the socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed (clean EOF mid-operation, or the
    /// transport went away while a call was outstanding).
    #[error("connection closed")]
    Closed,

    /// The handshake deadline (or a caller-imposed deadline) elapsed.
    #[error("timed out")]
    Timeout,

    /// The server announced a protocol other than `GBXRemote 2`.
    #[error("invalid protocol banner: {0:?}")]
    InvalidProtocol(String),

    /// A frame or banner length field exceeds the configured ceiling.
    #[error("frame of {len} bytes exceeds maximum {max}")]
    TooLarge { len: u32, max: u32 },

    /// The payload XML could not be parsed. Affects only the one call
    /// or callback that carried it.
    #[error("decode error: {0}")]
    Decode(String),

    /// A well-formed XML-RPC fault response. The connection stays up.
    #[error("fault {code}: {message}")]
    Fault { code: i32, message: String },

    /// `call` was issued while the client is not connected.
    #[error("not connected")]
    NotConnected,

    /// `connect` was issued while a connection is already established
    /// or being established.
    #[error("already connected")]
    AlreadyConnected,

    /// The caller dropped the awaiting future before the reply arrived.
    #[error("call cancelled")]
    Cancelled,

    /// A freshly allocated handle collided with a pending entry. The
    /// facade re-allocates; this never reaches callers in practice.
    #[error("duplicate call handle {0:#010x}")]
    DuplicateHandle(u32),
}

impl GbxError {
    /// Whether this error tears down the connection.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GbxError::Io(_)
                | GbxError::Closed
                | GbxError::InvalidProtocol(_)
                | GbxError::TooLarge { .. }
        )
    }

    /// Rebuild an equivalent error for fan-out to multiple receivers.
    ///
    /// `std::io::Error` is not `Clone`, so terminal errors delivered to
    /// every pending slot are reconstructed from kind and message.
    pub(crate) fn replicate(&self) -> GbxError {
        match self {
            GbxError::Io(e) => GbxError::Io(std::io::Error::new(e.kind(), e.to_string())),
            GbxError::Closed => GbxError::Closed,
            GbxError::Timeout => GbxError::Timeout,
            GbxError::InvalidProtocol(b) => GbxError::InvalidProtocol(b.clone()),
            GbxError::TooLarge { len, max } => GbxError::TooLarge {
                len: *len,
                max: *max,
            },
            GbxError::Cancelled => GbxError::Cancelled,
            _ => GbxError::Closed,
        }
    }
}

/// Result type alias using GbxError.
pub type Result<T> = std::result::Result<T, GbxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(GbxError::Closed.is_terminal());
        assert!(GbxError::InvalidProtocol("GBX 999".into()).is_terminal());
        assert!(GbxError::TooLarge { len: 9, max: 4 }.is_terminal());
        assert!(GbxError::Io(std::io::Error::other("boom")).is_terminal());

        assert!(!GbxError::Decode("bad xml".into()).is_terminal());
        assert!(!GbxError::Fault {
            code: -1000,
            message: "nope".into()
        }
        .is_terminal());
        assert!(!GbxError::NotConnected.is_terminal());
    }

    #[test]
    fn test_replicate_preserves_io_kind() {
        let original = GbxError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset by peer",
        ));
        match original.replicate() {
            GbxError::Io(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset);
                assert!(e.to_string().contains("reset by peer"));
            }
            other => panic!("unexpected replica: {other:?}"),
        }
    }

    #[test]
    fn test_fault_display() {
        let e = GbxError::Fault {
            code: -1000,
            message: "nope".into(),
        };
        assert_eq!(e.to_string(), "fault -1000: nope");
    }
}
