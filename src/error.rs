//! Error types for GPSD client operations
//!
//! This module defines the error types that can occur when connecting to
//! GPSD, reading its report stream, or waiting for a position fix.

/// Main error type for GPSD client operations
///
/// This enum represents all possible errors surfaced through the public
/// lifecycle calls. Malformed individual reports are not among them: those
/// are recorded and skipped inside the pipeline without failing the stream.
#[derive(Debug)]
pub enum GpsdClientError {
    /// I/O error occurred during network communication
    ///
    /// This typically happens when the connection to GPSD is refused,
    /// reset, or the host cannot be resolved. Fatal to the in-flight
    /// connect/start call.
    IoError(std::io::Error),

    /// JSON deserialization error
    ///
    /// Occurs when a framed line is not a valid GPSD report. Inside the
    /// streaming pipeline this is non-fatal; the variant is surfaced only
    /// by direct parsing helpers.
    SerdeError(serde_json::Error),

    /// The first framed batch of reports carried no TPV message
    ///
    /// Returned by the one-shot read when a full read cycle completed
    /// without a position report.
    NoFixData,

    /// The transport closed or failed while a lifecycle call was pending
    ///
    /// Carries the underlying I/O error text when the stream ended with
    /// one, `None` on a clean EOF.
    StreamEnded(Option<String>),

    /// A read was attempted on an instance that was never connected
    NotConnected,

    /// The client has been closed and must not be reused
    ClientClosed,
}

impl core::fmt::Display for GpsdClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpsdClientError::IoError(err) => write!(f, "IoError: {}", err),
            GpsdClientError::SerdeError(err) => write!(f, "SerdeError: {}", err),
            GpsdClientError::NoFixData => {
                write!(f, "NoFixData: no TPV report in the first batch of data")
            }
            GpsdClientError::StreamEnded(Some(detail)) => {
                write!(f, "StreamEnded: {}", detail)
            }
            GpsdClientError::StreamEnded(None) => {
                write!(f, "StreamEnded: connection closed by GPSD")
            }
            GpsdClientError::NotConnected => {
                write!(f, "NotConnected: client has no established connection")
            }
            GpsdClientError::ClientClosed => {
                write!(f, "ClientClosed: client instance has been closed")
            }
        }
    }
}

impl core::error::Error for GpsdClientError {}
