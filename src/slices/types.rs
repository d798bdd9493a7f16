//! Data types for slice streaming.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

/// Batch request issued by the prefetch window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    /// First slice index of the batch.
    pub begin: u32,
    /// Number of slices requested.
    pub count: u32,
    /// True when the batch should be delivered highest index first.
    pub reversed: bool,
}

/// Pixel payload of one delivered slice.
#[derive(Debug, Clone, PartialEq)]
pub enum SlicePayload {
    /// Encoded image bytes as produced by the source.
    Raw(Vec<u8>),
    /// Base64-wrapped image bytes, as delivered by text transports.
    Base64(String),
}

impl SlicePayload {
    /// Raw image bytes, unwrapping base64 transport framing when present.
    pub fn bytes(&self) -> Result<Vec<u8>, SliceError> {
        match self {
            SlicePayload::Raw(bytes) => Ok(bytes.clone()),
            SlicePayload::Base64(text) => Ok(STANDARD.decode(text)?),
        }
    }
}

/// One slice delivery from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceMessage {
    /// Index of the delivered slice.
    pub index: u32,
    /// Index of the final slice of this batch.
    pub last_in_batch: u32,
    /// Pixel payload.
    pub source: SlicePayload,
}

impl SliceMessage {
    /// True for the batch's final delivery; receiving it means the fetch
    /// that produced this batch is no longer outstanding.
    pub fn is_last_in_batch(&self) -> bool {
        self.index == self.last_in_batch
    }
}

/// Event handed from the fetch worker back to the session.
#[derive(Debug)]
pub struct FetchEvent {
    /// Session token the originating request was tagged with.
    pub token: u64,
    pub outcome: Result<SliceMessage, SliceError>,
}

/// Errors on the slice streaming path.
#[derive(Debug, Error)]
pub enum SliceError {
    #[error("requested slices {begin}..{end} outside volume of {total}")]
    OutOfRange { begin: u32, end: u32, total: u32 },
    #[error("invalid base64 slice payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to decode slice image: {0}")]
    Image(String),
    #[error("failed to read slice data: {0}")]
    Io(#[from] std::io::Error),
    #[error("no usable slice files in {0}")]
    EmptyVolume(String),
    #[error("slice source is no longer running")]
    ChannelClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_payload_unwraps() {
        let payload = SlicePayload::Base64(STANDARD.encode(b"pixels"));
        assert_eq!(payload.bytes().expect("decodes"), b"pixels");
    }

    #[test]
    fn base64_garbage_is_a_typed_error() {
        let payload = SlicePayload::Base64("not/base64!!".to_string());
        assert!(matches!(payload.bytes(), Err(SliceError::Base64(_))));
    }

    #[test]
    fn raw_payload_passes_through() {
        let payload = SlicePayload::Raw(vec![1, 2, 3]);
        assert_eq!(payload.bytes().expect("raw is infallible"), vec![1, 2, 3]);
    }

    #[test]
    fn last_in_batch_compares_indices() {
        let message = SliceMessage {
            index: 14,
            last_in_batch: 19,
            source: SlicePayload::Raw(vec![]),
        };
        assert!(!message.is_last_in_batch());
        let tail = SliceMessage {
            index: 19,
            last_in_batch: 19,
            source: SlicePayload::Raw(vec![]),
        };
        assert!(tail.is_last_in_batch());
    }
}
