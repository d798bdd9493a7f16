//! Bidirectional prefetch window over the slice axis.
//!
//! Tracks which slice indices have arrived and decides when scrolling has
//! reached the edge of loaded data. Forward motion past the highest loaded
//! index requests the next batch; backward motion past the lowest requests a
//! reversed batch ending just below it. Exactly one fetch may be outstanding
//! at a time: the in-flight flag is set on dispatch and cleared only when
//! the batch's final slice arrives, so repeated boundary triggers while a
//! batch streams in collapse into a single request.

use std::collections::BTreeSet;

use super::types::FetchRequest;

pub struct SliceWindow {
    batch: u32,
    total: u32,
    loaded: BTreeSet<u32>,
    in_flight: bool,
}

impl SliceWindow {
    /// Window over `total` slices fetching `batch` at a time.
    pub fn new(batch: u32, total: u32) -> Self {
        Self {
            batch: batch.max(1),
            total,
            loaded: BTreeSet::new(),
            in_flight: false,
        }
    }

    /// First fetch of a session, anchored at the starting slice.
    pub fn initial_request(&mut self, start: u32) -> Option<FetchRequest> {
        if start >= self.total {
            return None;
        }
        let count = self.batch.min(self.total - start);
        self.emit(FetchRequest {
            begin: start,
            count,
            reversed: false,
        })
    }

    /// Reacts to the canvas landing on `position`.
    ///
    /// Returns a request when the position sits on the boundary of the
    /// loaded window and more slices exist in that direction. Requests whose
    /// truncation leaves `count == 0` are dropped, as are triggers while a
    /// fetch is already outstanding.
    pub fn on_position(&mut self, position: u32) -> Option<FetchRequest> {
        if self.in_flight {
            log::debug!("fetch already in flight, suppressing trigger at {position}");
            return None;
        }
        let (&min, &max) = match (self.loaded.first(), self.loaded.last()) {
            (Some(min), Some(max)) => (min, max),
            _ => return None,
        };
        if position == max {
            let begin = position + 1;
            if begin >= self.total {
                log::debug!("dropping empty forward fetch past slice {position}");
                return None;
            }
            let count = self.batch.min(self.total - begin);
            return self.emit(FetchRequest {
                begin,
                count,
                reversed: false,
            });
        }
        if position == min {
            let begin = position.saturating_sub(self.batch);
            // the clamp eats into the count
            let count = position - begin;
            if count == 0 {
                log::debug!("dropping empty reversed fetch below slice {position}");
                return None;
            }
            return self.emit(FetchRequest {
                begin,
                count,
                reversed: true,
            });
        }
        None
    }

    /// Records a delivered slice; the batch's final slice releases the
    /// in-flight guard.
    pub fn note_arrival(&mut self, index: u32, is_last_in_batch: bool) {
        self.loaded.insert(index);
        if is_last_in_batch {
            self.in_flight = false;
        }
    }

    /// Releases the in-flight guard after a failed fetch so a later
    /// boundary trigger can retry.
    pub fn note_failure(&mut self) {
        self.in_flight = false;
    }

    pub fn is_loaded(&self, index: u32) -> bool {
        self.loaded.contains(&index)
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn loaded_len(&self) -> usize {
        self.loaded.len()
    }

    /// Forgets all window state for a fresh session.
    pub fn reset(&mut self) {
        self.loaded.clear();
        self.in_flight = false;
    }

    fn emit(&mut self, request: FetchRequest) -> Option<FetchRequest> {
        if request.count == 0 {
            log::debug!("dropping empty fetch at slice {}", request.begin);
            return None;
        }
        self.in_flight = true;
        Some(request)
    }
}
