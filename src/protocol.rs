//! GPSD JSON wire protocol support
//!
//! GPSD speaks newline-delimited JSON over TCP. Commands start with '?'
//! and responses are JSON objects with a "class" field indicating the
//! message type. This module covers the three protocol concerns the client
//! needs: recovering complete lines from an arbitrarily chunked byte
//! stream, encoding the watch policy command, and decoding report
//! messages.
//!
//! # References
//!
//! Based on the GPSD project protocol specification:
//! - [GPSD Protocol Documentation](https://gpsd.io/gpsd_json.html)

/// Line framing over the chunked byte stream
pub mod framer;
/// Report message types and parsers
pub mod response;
/// Watch policy and shared wire types
pub mod types;

/// A client-to-daemon command that can be rendered as a wire string.
pub trait GpsdRequestable {
    fn to_command(&self) -> String;
}
