//! Domain-specific error types for zxvnc.
//!
//! All fallible operations return `Result<T, ZxError>`.
//! Nothing read from either socket is allowed to panic: malformed input
//! becomes a typed error and ends the session.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the bridge.
#[derive(Debug, Error)]
pub enum ZxError {
    // ── RFB Errors ───────────────────────────────────────────────
    /// The server greeting was not a `RFB xxx.yyy\n` version string.
    #[error("invalid protocol version string")]
    InvalidVersion,

    /// The server speaks a protocol version older than 3.3.
    #[error("unsupported protocol version: {major}.{minor}")]
    UnsupportedVersion { major: u32, minor: u32 },

    /// None of the offered security types can be handled.
    #[error("no supported security type offered (server offered {0:?})")]
    UnsupportedSecurity(Vec<u8>),

    /// The server refused the connection and gave a reason.
    #[error("server refused connection: {0}")]
    Refused(String),

    /// A rectangle arrived in an encoding that was never requested.
    #[error("unsupported rectangle encoding: {0}")]
    UnsupportedEncoding(i32),

    /// A server message type outside the core protocol.
    #[error("unknown server message type: {0:#x}")]
    UnknownMessage(u8),

    /// A message violated protocol rules.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    // ── Render Errors ────────────────────────────────────────────
    /// An extended palette table must have exactly 64 entries.
    #[error("invalid palette: expected 64 entries, got {0}")]
    InvalidPalette(usize),

    // ── Connection Errors ────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The peer closed the stream.
    #[error("connection closed by {0}")]
    Closed(&'static str),

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for ZxError {
    fn from(s: String) -> Self {
        ZxError::Other(s)
    }
}

impl From<&str> for ZxError {
    fn from(s: &str) -> Self {
        ZxError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ZxError::UnsupportedVersion { major: 3, minor: 2 };
        assert!(e.to_string().contains("3.2"));

        let e = ZxError::InvalidPalette(12);
        assert!(e.to_string().contains("64"));
        assert!(e.to_string().contains("12"));

        let e = ZxError::UnsupportedSecurity(vec![2, 16]);
        assert!(e.to_string().contains("[2, 16]"));
    }

    #[test]
    fn from_string() {
        let e: ZxError = "something broke".into();
        assert!(matches!(e, ZxError::Other(_)));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: ZxError = io_err.into();
        assert!(matches!(e, ZxError::Connection(_)));
    }
}
