//! Recovers newline-delimited messages from an unstructured byte stream
//!
//! GPSD emits one JSON object per line, but TCP delivers arbitrary byte
//! chunks: a single delivery may contain zero, one, or many complete
//! reports, and may end in the middle of one. The framer keeps the
//! unconsumed tail between deliveries and only ever emits complete lines.

/// Accumulates raw bytes and yields complete newline-terminated messages.
///
/// Lines are emitted in arrival order as soon as their terminator arrives.
/// Blank lines are dropped. Partial trailing input stays buffered verbatim
/// until a later push completes it.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        LineFramer { buf: Vec::new() }
    }

    /// Appends one delivery of bytes and returns every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim();
            if !line.is_empty() {
                lines.push(line.to_owned());
            }
        }
        lines
    }
}
