//! Lazily readable message bodies.
//!
//! A [`Body`] is a byte stream plus an optional known length. When the length
//! is known it matches the stream's eventual byte count; when unknown the
//! consumer reads the stream to exhaustion. Construction decides once whether
//! a message carries a body; there is no repeated capability probing later.

use std::io;

use bytes::Bytes;
use futures_util::{StreamExt, stream, stream::BoxStream};
use thiserror::Error;

/// Error surfaced while reading a body stream
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BodyError {
    /// The underlying transport failed mid-stream
    #[error("Body read failed: {0}")]
    Read(#[from] io::Error),
}

/// A message body: a byte stream with an optionally known length.
pub struct Body {
    stream: BoxStream<'static, io::Result<Bytes>>,
    length: Option<u64>,
}

impl Body {
    /// The zero-length empty body
    pub fn empty() -> Self {
        Self {
            stream: stream::empty().boxed(),
            length: Some(0),
        }
    }

    /// A body backed by a stream, with its length if known up front
    pub fn from_stream(
        stream: impl futures_util::Stream<Item = io::Result<Bytes>> + Send + 'static,
        length: Option<u64>,
    ) -> Self {
        Self {
            stream: stream.boxed(),
            length,
        }
    }

    /// Known byte count, or `None` when the stream must be read to its end
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    /// Split into the known length and the raw stream
    pub fn into_parts(self) -> (Option<u64>, BoxStream<'static, io::Result<Bytes>>) {
        (self.length, self.stream)
    }

    /// Read the stream to exhaustion and return the collected bytes
    pub async fn collect(mut self) -> Result<Bytes, BodyError> {
        // The declared length comes from the peer; cap the pre-allocation
        // and let the buffer grow with the bytes that actually arrive.
        const PREALLOC_CAP: u64 = 64 * 1024;
        let mut buf = Vec::with_capacity(self.length.unwrap_or(0).min(PREALLOC_CAP) as usize);
        while let Some(chunk) = self.stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(buf))
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        let length = Some(bytes.len() as u64);
        Self {
            stream: stream::once(async move { Ok(bytes) }).boxed(),
            length,
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes::from(bytes).into()
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Bytes::from(text.into_bytes()).into()
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Bytes::from_static(text.as_bytes()).into()
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body").field("length", &self.length).finish()
    }
}
