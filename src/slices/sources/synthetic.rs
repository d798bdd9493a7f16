//! Procedurally generated volumes for demos and tests.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tiny_skia::Pixmap;

use crate::slices::types::{FetchRequest, SliceError, SliceMessage, SlicePayload};

use super::{batch_bounds, last_index, ordered_indices, SliceSource};

/// Volume of gradient slices rendered on demand.
///
/// Neighboring slices get visibly different shading so scrolling through a
/// synthetic volume actually looks like scrolling. With base64 framing
/// enabled the payload mimics a text transport.
pub struct SyntheticSource {
    count: u32,
    width: u32,
    height: u32,
    base64: bool,
}

impl SyntheticSource {
    pub fn new(count: u32, width: u32, height: u32) -> Self {
        Self {
            count,
            width: width.max(1),
            height: height.max(1),
            base64: false,
        }
    }

    /// Wraps every payload in base64 transport framing.
    pub fn with_base64(mut self) -> Self {
        self.base64 = true;
        self
    }

    fn render_slice(&self, index: u32) -> Result<Vec<u8>, SliceError> {
        let (width, height) = (self.width, self.height);
        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| SliceError::Image(format!("unusable dimensions {width}x{height}")))?;
        let shift = (index * 7 % 256) as u8;
        for (i, pixel) in pixmap.pixels_mut().iter_mut().enumerate() {
            let x = i as u32 % width;
            let y = i as u32 / width;
            let vertical = (y * 255 / height) as u8;
            let horizontal = (x * 255 / width) as u8;
            let shade = vertical.wrapping_add(shift);
            *pixel = tiny_skia::ColorU8::from_rgba(shade, shade, horizontal, 255).premultiply();
        }
        pixmap
            .encode_png()
            .map_err(|err| SliceError::Image(err.to_string()))
    }
}

#[async_trait]
impl SliceSource for SyntheticSource {
    fn slice_count(&self) -> u32 {
        self.count
    }

    async fn fetch(&self, request: FetchRequest) -> Result<Vec<SliceMessage>, SliceError> {
        let (begin, end) = batch_bounds(request, self.count)?;
        let last_in_batch = last_index(begin, end, request.reversed);
        let mut batch = Vec::with_capacity((end - begin) as usize);
        for index in ordered_indices(begin, end, request.reversed) {
            let bytes = self.render_slice(index)?;
            let source = if self.base64 {
                SlicePayload::Base64(STANDARD.encode(&bytes))
            } else {
                SlicePayload::Raw(bytes)
            };
            batch.push(SliceMessage {
                index,
                last_in_batch,
                source,
            });
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slices::cache::decode_slice;

    #[tokio::test]
    async fn forward_batches_arrive_ascending() {
        let source = SyntheticSource::new(20, 16, 16);
        let batch = source
            .fetch(FetchRequest {
                begin: 3,
                count: 4,
                reversed: false,
            })
            .await
            .expect("fetch succeeds");
        let indices: Vec<u32> = batch.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![3, 4, 5, 6]);
        assert!(batch.iter().all(|m| m.last_in_batch == 6));
        assert!(batch.last().expect("non-empty").is_last_in_batch());
    }

    #[tokio::test]
    async fn reversed_batches_arrive_descending() {
        let source = SyntheticSource::new(20, 16, 16);
        let batch = source
            .fetch(FetchRequest {
                begin: 3,
                count: 4,
                reversed: true,
            })
            .await
            .expect("fetch succeeds");
        let indices: Vec<u32> = batch.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![6, 5, 4, 3]);
        assert!(batch.iter().all(|m| m.last_in_batch == 3));
        assert!(batch.last().expect("non-empty").is_last_in_batch());
    }

    #[tokio::test]
    async fn payloads_decode_to_requested_dimensions() {
        let source = SyntheticSource::new(5, 24, 18);
        let batch = source
            .fetch(FetchRequest {
                begin: 0,
                count: 1,
                reversed: false,
            })
            .await
            .expect("fetch succeeds");
        let bytes = batch[0].source.bytes().expect("payload bytes");
        let pixmap = decode_slice(&bytes).expect("decodes");
        assert_eq!((pixmap.width(), pixmap.height()), (24, 18));
    }

    #[tokio::test]
    async fn base64_framing_round_trips() {
        let source = SyntheticSource::new(5, 8, 8).with_base64();
        let batch = source
            .fetch(FetchRequest {
                begin: 2,
                count: 1,
                reversed: false,
            })
            .await
            .expect("fetch succeeds");
        assert!(matches!(batch[0].source, SlicePayload::Base64(_)));
        let bytes = batch[0].source.bytes().expect("unwraps");
        assert!(decode_slice(&bytes).is_ok());
    }

    #[tokio::test]
    async fn out_of_range_requests_are_rejected() {
        let source = SyntheticSource::new(5, 8, 8);
        let result = source
            .fetch(FetchRequest {
                begin: 5,
                count: 3,
                reversed: false,
            })
            .await;
        assert!(matches!(result, Err(SliceError::OutOfRange { .. })));
    }
}
