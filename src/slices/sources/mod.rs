//! Slice sources: where volumes come from.
//!
//! A source answers batch fetch requests with ordered slice messages.
//! Forward batches arrive in ascending index order; reversed batches in
//! descending order. Either way the final message of a batch is the one
//! whose index equals `last_in_batch`, which is what releases the window's
//! in-flight guard.

mod directory;
mod synthetic;

use async_trait::async_trait;

use super::types::{FetchRequest, SliceError, SliceMessage};

pub use directory::DirectorySource;
pub use synthetic::SyntheticSource;

/// Abstraction over fetching batches of slice images.
#[async_trait]
pub trait SliceSource: Send + Sync {
    /// Total slice count of the volume.
    fn slice_count(&self) -> u32;

    /// Fetches one batch of slices.
    async fn fetch(&self, request: FetchRequest) -> Result<Vec<SliceMessage>, SliceError>;
}

/// Validates a request against the volume and returns its `[begin, end)`
/// index range, truncated to the volume.
pub(crate) fn batch_bounds(request: FetchRequest, total: u32) -> Result<(u32, u32), SliceError> {
    if request.count == 0 || request.begin >= total {
        return Err(SliceError::OutOfRange {
            begin: request.begin,
            end: request.begin.saturating_add(request.count),
            total,
        });
    }
    let end = request.begin.saturating_add(request.count).min(total);
    Ok((request.begin, end))
}

/// Delivery order for a batch.
pub(crate) fn ordered_indices(begin: u32, end: u32, reversed: bool) -> Vec<u32> {
    let mut indices: Vec<u32> = (begin..end).collect();
    if reversed {
        indices.reverse();
    }
    indices
}

/// Index whose arrival marks the batch as complete.
pub(crate) fn last_index(begin: u32, end: u32, reversed: bool) -> u32 {
    if reversed {
        begin
    } else {
        end - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_truncate_to_volume() {
        let request = FetchRequest {
            begin: 45,
            count: 10,
            reversed: false,
        };
        assert_eq!(batch_bounds(request, 50).expect("in range"), (45, 50));
    }

    #[test]
    fn bounds_reject_out_of_volume() {
        let request = FetchRequest {
            begin: 50,
            count: 10,
            reversed: false,
        };
        assert!(matches!(
            batch_bounds(request, 50),
            Err(SliceError::OutOfRange { begin: 50, .. })
        ));
    }

    #[test]
    fn reversed_batches_end_on_begin() {
        assert_eq!(ordered_indices(10, 13, true), vec![12, 11, 10]);
        assert_eq!(last_index(10, 13, true), 10);
        assert_eq!(ordered_indices(10, 13, false), vec![10, 11, 12]);
        assert_eq!(last_index(10, 13, false), 12);
    }
}
