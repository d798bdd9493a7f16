//! Canonical per-slice selection storage.
//!
//! The store is the single owner of committed selections, bucketed by slice
//! index. Tools and the explorer view mutate it through the operations below.
//! Every logical create or delete emits exactly one change note on the
//! channel handed in at construction; drag-frame updates and draft staging
//! stay silent. Ids are session-monotonic starting at 1 and reset together
//! with the rest of the session.

use std::collections::BTreeMap;

use crate::notify::{ChangeNote, ChangeSender};
use crate::selection::{Geometry, Selection, Status};

pub struct SelectionStore {
    buckets: BTreeMap<u32, Vec<Selection>>,
    next_id: u64,
    notes: ChangeSender,
}

impl SelectionStore {
    pub fn new(notes: ChangeSender) -> Self {
        Self {
            buckets: BTreeMap::new(),
            next_id: 1,
            notes,
        }
    }

    /// Appends a committed selection and announces it.
    ///
    /// Mask selections go through [`SelectionStore::add_mask`] so the layer
    /// key and the id stay equal.
    pub fn add(&mut self, slice_index: u32, tag: &str, geometry: Geometry) -> u64 {
        let id = self.allocate_id();
        let selection = Selection::new(id, slice_index, tag, Status::Normal, geometry);
        self.notes.send(ChangeNote::created(&selection));
        self.insert(selection);
        id
    }

    /// Appends a committed brush mask whose layer key equals its id.
    ///
    /// At most one non-archived mask lives per (tag, slice); a stale one is
    /// replaced rather than duplicated.
    pub fn add_mask(&mut self, slice_index: u32, tag: &str) -> u64 {
        if let Some(existing) = self.mask_on(slice_index, tag) {
            self.remove(existing);
        }
        let id = self.allocate_id();
        let selection = Selection::new(
            id,
            slice_index,
            tag,
            Status::Normal,
            Geometry::Mask { layer: id },
        );
        self.notes.send(ChangeNote::created(&selection));
        self.insert(selection);
        id
    }

    /// Appends a draft selection without announcing it.
    ///
    /// Drafts render like committed selections but reach the explorer only
    /// once [`SelectionStore::commit`] promotes them.
    pub fn stage(&mut self, slice_index: u32, tag: &str, geometry: Geometry) -> u64 {
        let id = self.allocate_id();
        let selection = Selection::new(id, slice_index, tag, Status::Draft, geometry);
        self.insert(selection);
        id
    }

    /// Promotes a draft to a committed selection and announces it.
    pub fn commit(&mut self, id: u64) -> bool {
        let Some(selection) = Self::find_in(&mut self.buckets, id) else {
            return false;
        };
        if selection.status != Status::Draft {
            return false;
        }
        selection.status = Status::Normal;
        let note = ChangeNote::created(selection);
        self.notes.send(note);
        true
    }

    /// Silently removes a draft, e.g. when a drag ends with zero extent.
    ///
    /// The only removal path that never emits a delete note.
    pub fn discard(&mut self, id: u64) -> bool {
        let Some((slice_index, position)) = self.locate(id) else {
            return false;
        };
        let Some(bucket) = self.buckets.get_mut(&slice_index) else {
            return false;
        };
        if bucket.get(position).map(|s| s.status) != Some(Status::Draft) {
            return false;
        }
        bucket.remove(position);
        if bucket.is_empty() {
            self.buckets.remove(&slice_index);
        }
        true
    }

    /// Replaces a selection's geometry without announcing anything.
    ///
    /// Archived selections are read-only and refuse the update.
    pub fn update_geometry(&mut self, id: u64, geometry: Geometry) -> bool {
        match Self::find_in(&mut self.buckets, id) {
            Some(selection) if selection.status != Status::Archived => {
                selection.geometry = geometry;
                true
            }
            _ => false,
        }
    }

    /// Removes a selection and announces the deletion.
    ///
    /// Archived selections are never user-removable; asking is not an error,
    /// the request just reports not-found.
    pub fn remove(&mut self, id: u64) -> bool {
        let Some((slice_index, position)) = self.locate(id) else {
            return false;
        };
        let Some(bucket) = self.buckets.get_mut(&slice_index) else {
            return false;
        };
        if bucket.get(position).map(|s| s.status) == Some(Status::Archived) {
            log::debug!("refusing to remove archived selection {id}");
            return false;
        }
        let selection = bucket.remove(position);
        if bucket.is_empty() {
            self.buckets.remove(&slice_index);
        }
        self.notes.send(ChangeNote::deleted(&selection));
        true
    }

    /// Sets the pinned flag. Silent; the explorer initiated the change.
    pub fn pin(&mut self, id: u64, pinned: bool) -> bool {
        match Self::find_in(&mut self.buckets, id) {
            Some(selection) if selection.status != Status::Archived => {
                selection.pinned = pinned;
                true
            }
            _ => false,
        }
    }

    /// Sets the hidden flag. Silent; rendering picks it up on the next paint.
    pub fn hide(&mut self, id: u64, hidden: bool) -> bool {
        match Self::find_in(&mut self.buckets, id) {
            Some(selection) if selection.status != Status::Archived => {
                selection.hidden = hidden;
                true
            }
            _ => false,
        }
    }

    /// Removes every non-archived selection on one slice, announcing each
    /// deletion individually.
    pub fn remove_on_slice(&mut self, slice_index: u32) -> usize {
        let Some(bucket) = self.buckets.get_mut(&slice_index) else {
            return 0;
        };
        let drained = std::mem::take(bucket);
        let mut kept = Vec::new();
        let mut removed = 0;
        for selection in drained {
            if selection.status == Status::Archived {
                kept.push(selection);
            } else {
                self.notes.send(ChangeNote::deleted(&selection));
                removed += 1;
            }
        }
        if kept.is_empty() {
            self.buckets.remove(&slice_index);
        } else if let Some(bucket) = self.buckets.get_mut(&slice_index) {
            *bucket = kept;
        }
        removed
    }

    /// Removes every non-archived selection in the volume, slice by slice.
    pub fn clear_all(&mut self) -> usize {
        let slices: Vec<u32> = self.buckets.keys().copied().collect();
        slices
            .into_iter()
            .map(|slice| self.remove_on_slice(slice))
            .sum()
    }

    /// Freezes selections into read-only reference overlays.
    ///
    /// With `ids` the named committed selections are archived; without, all
    /// of them. Drafts are mid-gesture and stay untouched. Archiving emits
    /// no notes: the selections still exist, they just stop being editable.
    pub fn archive(&mut self, ids: Option<&[u64]>) -> usize {
        let mut archived = 0;
        for bucket in self.buckets.values_mut() {
            for selection in bucket.iter_mut() {
                if selection.status != Status::Normal {
                    continue;
                }
                if let Some(ids) = ids {
                    if !ids.contains(&selection.id) {
                        continue;
                    }
                }
                selection.status = Status::Archived;
                archived += 1;
            }
        }
        archived
    }

    /// Inserts an imported selection directly in the archived state.
    ///
    /// Mask geometry is re-keyed to the fresh id so the caller can file the
    /// raster bytes under the returned value.
    pub fn insert_archived(&mut self, slice_index: u32, tag: &str, geometry: Geometry) -> u64 {
        let id = self.allocate_id();
        let geometry = match geometry {
            Geometry::Mask { .. } => Geometry::Mask { layer: id },
            other => other,
        };
        self.insert(Selection::new(id, slice_index, tag, Status::Archived, geometry));
        id
    }

    /// Drops everything and restarts the id counter at 1.
    pub fn reset(&mut self) {
        self.buckets.clear();
        self.next_id = 1;
    }

    /// Selections on one slice in insertion order.
    pub fn on_slice(&self, slice_index: u32) -> &[Selection] {
        self.buckets
            .get(&slice_index)
            .map_or(&[], |bucket| bucket.as_slice())
    }

    pub fn get(&self, id: u64) -> Option<&Selection> {
        self.buckets
            .values()
            .flatten()
            .find(|selection| selection.id == id)
    }

    /// Id of the non-archived mask for a (tag, slice) pair, if one exists.
    ///
    /// At most one such mask exists at a time; the brush tool replaces its
    /// pixels in place instead of stacking new selections.
    pub fn mask_on(&self, slice_index: u32, tag: &str) -> Option<u64> {
        self.on_slice(slice_index)
            .iter()
            .find(|selection| {
                selection.status != Status::Archived
                    && selection.tag == tag
                    && matches!(selection.geometry, Geometry::Mask { .. })
            })
            .map(|selection| selection.id)
    }

    /// All selections, ascending by slice then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Selection> {
        self.buckets.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn insert(&mut self, selection: Selection) {
        self.buckets
            .entry(selection.slice_index)
            .or_default()
            .push(selection);
    }

    fn find_in(buckets: &mut BTreeMap<u32, Vec<Selection>>, id: u64) -> Option<&mut Selection> {
        buckets
            .values_mut()
            .flatten()
            .find(|selection| selection.id == id)
    }

    fn locate(&self, id: u64) -> Option<(u32, usize)> {
        for (slice_index, bucket) in &self.buckets {
            if let Some(position) = bucket.iter().position(|s| s.id == id) {
                return Some((*slice_index, position));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{change_channel, ChangeReceiver};

    fn store_with_notes() -> (SelectionStore, ChangeReceiver) {
        let (tx, rx) = change_channel();
        (SelectionStore::new(tx), rx)
    }

    fn point(x: f64, y: f64) -> Geometry {
        Geometry::Point { x, y }
    }

    #[test]
    fn ids_start_at_one_and_grow() {
        let (mut store, _rx) = store_with_notes();
        assert_eq!(store.add(0, "a", point(0.1, 0.1)), 1);
        assert_eq!(store.add(0, "a", point(0.2, 0.2)), 2);
        assert_eq!(store.stage(1, "a", point(0.3, 0.3)), 3);
    }

    #[test]
    fn reset_restarts_id_counter() {
        let (mut store, _rx) = store_with_notes();
        store.add(0, "a", point(0.1, 0.1));
        store.add(0, "a", point(0.2, 0.2));
        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.add(0, "a", point(0.1, 0.1)), 1);
    }

    #[test]
    fn add_emits_single_create_note() {
        let (mut store, rx) = store_with_notes();
        let id = store.add(5, "lesion", point(0.5, 0.5));
        let notes = rx.drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].selection_id, id);
        assert_eq!(notes[0].slice_index, 5);
        assert!(!notes[0].to_delete);
    }

    #[test]
    fn drafts_are_silent_until_commit() {
        let (mut store, rx) = store_with_notes();
        let id = store.stage(0, "a", point(0.1, 0.1));
        store.update_geometry(id, point(0.2, 0.2));
        store.update_geometry(id, point(0.3, 0.3));
        assert!(rx.drain().is_empty());
        assert!(store.commit(id));
        let notes = rx.drain();
        assert_eq!(notes.len(), 1);
        assert!(!notes[0].to_delete);
        // a second commit is a no-op
        assert!(!store.commit(id));
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn discard_is_the_only_silent_removal() {
        let (mut store, rx) = store_with_notes();
        let draft = store.stage(0, "a", point(0.1, 0.1));
        assert!(store.discard(draft));
        assert!(store.is_empty());
        assert!(rx.drain().is_empty());

        let committed = store.add(0, "a", point(0.1, 0.1));
        // discard refuses committed selections
        assert!(!store.discard(committed));
        assert!(store.remove(committed));
        let notes = rx.drain();
        assert_eq!(notes.len(), 2);
        assert!(notes[1].to_delete);
    }

    #[test]
    fn remove_reports_found_flag() {
        let (mut store, rx) = store_with_notes();
        let id = store.add(0, "a", point(0.1, 0.1));
        assert!(store.remove(id));
        assert!(!store.remove(id));
        assert!(!store.remove(999));
        let deletions: Vec<_> = rx.drain().into_iter().filter(|n| n.to_delete).collect();
        assert_eq!(deletions.len(), 1);
    }

    #[test]
    fn pin_and_hide_mutate_flags_silently() {
        let (mut store, rx) = store_with_notes();
        let id = store.add(0, "a", point(0.1, 0.1));
        rx.drain();
        assert!(store.pin(id, true));
        assert!(store.hide(id, true));
        let selection = store.get(id).expect("selection exists");
        assert!(selection.pinned);
        assert!(selection.hidden);
        assert!(!store.pin(999, true));
        assert!(!store.hide(999, true));
        assert!(rx.drain().is_empty());
    }

    #[test]
    fn remove_on_slice_notes_each_selection() {
        let (mut store, rx) = store_with_notes();
        store.add(3, "a", point(0.1, 0.1));
        store.add(3, "b", point(0.2, 0.2));
        store.add(4, "a", point(0.3, 0.3));
        rx.drain();
        assert_eq!(store.remove_on_slice(3), 2);
        let notes = rx.drain();
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.to_delete && n.slice_index == 3));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_all_walks_slices_in_order() {
        let (mut store, rx) = store_with_notes();
        store.add(6, "b", point(0.2, 0.2));
        store.add(5, "a", point(0.1, 0.1));
        rx.drain();
        assert_eq!(store.clear_all(), 2);
        let notes = rx.drain();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].slice_index, 5);
        assert_eq!(notes[1].slice_index, 6);
        assert!(store.is_empty());
    }

    #[test]
    fn archived_survive_bulk_removal() {
        let (mut store, rx) = store_with_notes();
        let keep = store.add(2, "a", point(0.1, 0.1));
        store.add(2, "b", point(0.2, 0.2));
        assert_eq!(store.archive(Some(&[keep])), 1);
        rx.drain();
        assert_eq!(store.remove_on_slice(2), 1);
        assert_eq!(store.clear_all(), 0);
        assert_eq!(store.len(), 1);
        let survivor = store.get(keep).expect("archived survives");
        assert_eq!(survivor.status, Status::Archived);
        // and stays out of reach of targeted removal and edits
        assert!(!store.remove(keep));
        assert!(!store.update_geometry(keep, point(0.9, 0.9)));
    }

    #[test]
    fn archive_all_skips_drafts() {
        let (mut store, _rx) = store_with_notes();
        store.add(0, "a", point(0.1, 0.1));
        let draft = store.stage(0, "a", point(0.2, 0.2));
        assert_eq!(store.archive(None), 1);
        assert_eq!(
            store.get(draft).map(|s| s.status),
            Some(Status::Draft)
        );
    }

    #[test]
    fn mask_layer_key_equals_id() {
        let (mut store, _rx) = store_with_notes();
        let id = store.add_mask(4, "tumor");
        let selection = store.get(id).expect("mask exists");
        assert_eq!(selection.geometry, Geometry::Mask { layer: id });
        assert_eq!(store.mask_on(4, "tumor"), Some(id));
        assert_eq!(store.mask_on(4, "other"), None);
        assert_eq!(store.mask_on(5, "tumor"), None);
    }

    #[test]
    fn add_mask_replaces_stale_mask_on_same_tag_and_slice() {
        let (mut store, rx) = store_with_notes();
        let first = store.add_mask(4, "tumor");
        rx.drain();
        let second = store.add_mask(4, "tumor");
        assert_ne!(first, second);
        assert_eq!(store.mask_on(4, "tumor"), Some(second));
        assert_eq!(store.len(), 1);
        let notes = rx.drain();
        assert_eq!(notes.len(), 2);
        assert!(notes[0].to_delete);
        assert!(!notes[1].to_delete);
    }

    #[test]
    fn insert_archived_rekeys_mask_layer() {
        let (mut store, rx) = store_with_notes();
        let id = store.insert_archived(1, "old", Geometry::Mask { layer: 777 });
        assert_eq!(
            store.get(id).map(|s| &s.geometry),
            Some(&Geometry::Mask { layer: id })
        );
        assert!(rx.drain().is_empty());
        // archived masks are invisible to the brush's replace lookup
        assert_eq!(store.mask_on(1, "old"), None);
    }
}
