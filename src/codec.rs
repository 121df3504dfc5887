//! Line codec for the wire protocol
//!
//! UTF-8 text lines terminated by CR+LF. Decoding is delegated to
//! `LinesCodec`, which also accepts a bare LF and strips a trailing CR.

use std::io;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

/// Line terminator written after every outbound line
pub const LINE_TERMINATOR: &str = "\r\n";

/// Longest accepted inbound line, in bytes, counting a trailing CR but not the LF
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// CR+LF line codec
#[derive(Debug)]
pub struct LineCodec {
    inner: LinesCodec,
}

impl LineCodec {
    /// Create a new codec accepting lines up to `MAX_LINE_LENGTH`
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    /// Create a new codec with a custom inbound line limit
    ///
    /// A longer line is a decode error, which ends the receive loop.
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn into_io(err: LinesCodecError) -> io::Error {
    match err {
        LinesCodecError::Io(e) => e,
        LinesCodecError::MaxLineLengthExceeded => {
            io::Error::new(io::ErrorKind::InvalidData, "line length limit exceeded")
        }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        self.inner.decode(src).map_err(into_io)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        self.inner.decode_eof(src).map_err(into_io)
    }
}

impl Encoder<String> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), io::Error> {
        dst.reserve(line.len() + LINE_TERMINATOR.len());
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(LINE_TERMINATOR.as_bytes());
        Ok(())
    }
}
