//! Session orchestration for the annotation engine.
//!
//! [`AnnotationSession`] owns every moving part of one annotation run: the
//! selection store, the tool set, the slice streaming pipeline, and the
//! render surface. Callers feed it pointer and wheel events plus explorer
//! commands, call [`pump`](AnnotationSession::pump) to absorb async slice
//! deliveries, and read frames back out with
//! [`render`](AnnotationSession::render).

pub mod replay;

use crate::config::Config;
use crate::notify::{ChangeNote, ChangeReceiver, RedrawSignal, change_channel};
use crate::raster::draw::{DrawStyle, draw_selection, draw_slice};
use crate::raster::{self, CompositeOp, LayerCache, RasterError};
use crate::selection::{Geometry, Status, ViewSize, WireSelection};
use crate::slices::{
    SliceCache, SliceError, SliceFetcher, SliceMessage, SliceSource, SliceWindow, decode_slice,
};
use crate::store::SelectionStore;
use crate::tools::{MouseButton, Tool, ToolCtx, ToolKind, ToolOptions, ToolSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tiny_skia::Pixmap;
use tokio::runtime::Handle;

/// Errors that can stop a session from being constructed or exported.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Slice(#[from] SliceError),
}

/// Receiver half of the session-to-explorer mirror.
///
/// The session is the sole subscriber of the store's change notes; it relays
/// every create and delete here so an external list view can stay in sync
/// without touching the store.
pub trait ExplorerPort {
    fn on_change(&mut self, note: &ChangeNote);
}

/// Commands an external explorer list sends back into the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ExplorerCommand {
    /// Toggle the pinned flag of one selection.
    Pin { id: u64, pinned: bool },
    /// Toggle the hidden flag of one selection.
    Hide { id: u64, hidden: bool },
    /// Delete one selection.
    Delete { id: u64 },
    /// Delete every non-archived selection on one slice.
    ClearSlice { slice_index: u32 },
    /// Delete every non-archived selection in the volume.
    ClearAll,
    /// Freeze every committed selection into read-only archive state.
    Archive,
}

/// One interactive annotation run over a volume.
pub struct AnnotationSession {
    store: SelectionStore,
    /// Change notes drained on every pump and relayed to the explorer.
    notes: ChangeReceiver,
    redraw: RedrawSignal,
    layers: LayerCache,
    tools: ToolSet,
    /// Label tag stamped on new selections.
    tag: String,
    slices: SliceCache,
    window: SliceWindow,
    fetcher: SliceFetcher,
    /// Slice the canvas currently shows.
    position: u32,
    /// Bumped on reset so deliveries from the previous run are dropped.
    session_token: u64,
    explorer: Option<Box<dyn ExplorerPort>>,
    options: ToolOptions,
    style: DrawStyle,
    view: ViewSize,
    /// Composited output canvas.
    frame: Pixmap,
}

impl AnnotationSession {
    /// Builds a session over `source` and dispatches the initial slice fetch.
    ///
    /// # Errors
    /// Fails if the configured canvas cannot be allocated or the fetch worker
    /// refuses the initial request. A session without a canvas is unusable,
    /// so this is the one place raster failure is fatal.
    pub fn new(
        config: &Config,
        runtime: &Handle,
        source: Arc<dyn SliceSource>,
    ) -> Result<Self, EngineError> {
        let frame = raster::new_canvas(config.canvas.width, config.canvas.height)?;
        let view = ViewSize::new(config.canvas.width as f64, config.canvas.height as f64);

        let total = source.slice_count();
        let position = if total == 0 {
            0
        } else {
            config.streaming.initial_slice.min(total - 1)
        };

        let (notes_tx, notes_rx) = change_channel();

        let mut session = Self {
            store: SelectionStore::new(notes_tx),
            notes: notes_rx,
            redraw: RedrawSignal::new(),
            layers: LayerCache::new(),
            tools: ToolSet::new(config.tools.default_tool),
            tag: config.tools.default_tag.clone(),
            slices: SliceCache::new(),
            window: SliceWindow::new(config.streaming.batch_size, total),
            fetcher: SliceFetcher::new(runtime, source),
            position,
            session_token: 1,
            explorer: None,
            options: ToolOptions {
                hit_radius: config.tools.hit_radius,
                brush_width: config.tools.brush_width,
                brush_color: config.tools.brush_color.to_color(),
                mask_opacity: config.render.mask_opacity,
            },
            style: DrawStyle {
                background: config.render.background.to_color(),
                stroke: config.render.stroke_color.to_color(),
                draft: config.render.draft_color.to_color(),
                archived: config.render.archive_color.to_color(),
                stroke_width: config.render.stroke_width,
                vertex_radius: config.render.vertex_radius,
                mask_opacity: config.render.mask_opacity,
            },
            view,
            frame,
        };

        if let Some(request) = session.window.initial_request(session.position) {
            session.fetcher.dispatch(session.session_token, request)?;
        }
        session.redraw.mark();

        Ok(session)
    }

    /// Attaches the external explorer list; change notes flow to it from the
    /// next [`pump`](Self::pump) on.
    pub fn set_explorer(&mut self, explorer: Box<dyn ExplorerPort>) {
        self.explorer = Some(explorer);
    }

    // =========================================================================
    // Pointer and wheel input
    // =========================================================================

    pub fn pointer_down(&mut self, x: f64, y: f64, button_code: u8) {
        let Some(button) = MouseButton::from_code(button_code) else {
            debug!("Ignoring pointer down with button code {}", button_code);
            return;
        };
        self.with_active_tool(|tool, ctx| tool.on_mouse_down(ctx, x, y, button));
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        self.with_active_tool(|tool, ctx| tool.on_mouse_move(ctx, x, y));
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, button_code: u8) {
        let Some(button) = MouseButton::from_code(button_code) else {
            debug!("Ignoring pointer up with button code {}", button_code);
            return;
        };
        self.with_active_tool(|tool, ctx| tool.on_mouse_up(ctx, x, y, button));
    }

    /// Steps through the volume. Positive deltas advance to deeper slices,
    /// negative deltas go back; the position saturates at both ends.
    ///
    /// A tool holding an open gesture can veto the change, in which case the
    /// wheel event is swallowed.
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }
        if !self.tools.active_tool().can_change_slice() {
            debug!(
                "Slice change blocked by open {} gesture",
                self.tools.active()
            );
            return;
        }

        let total = self.window.total();
        if total == 0 {
            return;
        }
        let next = if delta_y > 0.0 {
            self.position.saturating_add(1).min(total - 1)
        } else {
            self.position.saturating_sub(1)
        };
        if next == self.position {
            return;
        }

        self.position = next;
        // Settle lingering cross-slice state such as a held vertex drag.
        self.with_active_tool(|tool, ctx| tool.on_tool_change(ctx));
        self.redraw.mark();
        self.maybe_fetch();
    }

    // =========================================================================
    // Tool, tag, and brush mode switching
    // =========================================================================

    /// Switches the active tool, force-committing any gesture the outgoing
    /// tool still has open.
    pub fn set_tool(&mut self, kind: ToolKind) {
        if kind == self.tools.active() {
            return;
        }
        self.with_active_tool(|tool, ctx| tool.on_tool_change(ctx));
        self.tools.set_active(kind);
    }

    /// Switches the label tag for new selections. The outgoing gesture is
    /// committed first so it keeps the tag it was started under.
    pub fn set_tag(&mut self, tag: &str) {
        if tag == self.tag {
            return;
        }
        self.with_active_tool(|tool, ctx| tool.on_tool_change(ctx));
        self.tag = tag.to_string();
    }

    /// Flips the brush between painting and erasing. Returns false when the
    /// switch is refused, i.e. erase mode without a mask to erase on the
    /// current slice and tag.
    pub fn set_brush_mode(&mut self, mode: CompositeOp) -> bool {
        let AnnotationSession {
            tools,
            store,
            layers,
            redraw,
            options,
            tag,
            position,
            view,
            ..
        } = self;
        let mut ctx = ToolCtx {
            view: *view,
            slice_index: *position,
            tag: tag.as_str(),
            store,
            layers,
            redraw,
            options,
        };
        tools.brush_mut().set_mode(&mut ctx, mode)
    }

    // =========================================================================
    // Explorer commands
    // =========================================================================

    /// Applies one command sent back from the explorer list. Commands aimed
    /// at ids that no longer exist (or were archived) are logged and dropped.
    pub fn apply(&mut self, command: ExplorerCommand) {
        let applied = match command {
            ExplorerCommand::Pin { id, pinned } => self.store.pin(id, pinned),
            ExplorerCommand::Hide { id, hidden } => self.store.hide(id, hidden),
            ExplorerCommand::Delete { id } => {
                let layer = self.mask_layer_of(id);
                let removed = self.store.remove(id);
                if removed {
                    if let Some(layer) = layer {
                        self.layers.remove(layer);
                    }
                }
                removed
            }
            ExplorerCommand::ClearSlice { slice_index } => {
                let layers = self.mask_layers_on(slice_index);
                let removed = self.store.remove_on_slice(slice_index);
                for key in layers {
                    self.layers.remove(key);
                }
                removed > 0
            }
            ExplorerCommand::ClearAll => {
                let layers: Vec<u64> = self
                    .store
                    .iter()
                    .filter(|s| s.status != Status::Archived)
                    .filter_map(|s| match &s.geometry {
                        Geometry::Mask { layer } => Some(*layer),
                        _ => None,
                    })
                    .collect();
                let removed = self.store.clear_all();
                for key in layers {
                    self.layers.remove(key);
                }
                removed > 0
            }
            ExplorerCommand::Archive => self.store.archive(None) > 0,
        };

        if applied {
            self.redraw.mark();
        } else {
            debug!("Explorer command had no effect");
        }
    }

    /// Archives the given committed selections in place.
    pub fn archive_selections(&mut self, ids: &[u64]) -> usize {
        let archived = self.store.archive(Some(ids));
        if archived > 0 {
            self.redraw.mark();
        }
        archived
    }

    // =========================================================================
    // Slice streaming
    // =========================================================================

    /// Absorbs pending fetch deliveries and relays queued change notes to the
    /// explorer. Call once per host event-loop turn.
    pub fn pump(&mut self) {
        while let Some(event) = self.fetcher.try_take() {
            if event.token != self.session_token {
                debug!("Dropping slice delivery from stale session {}", event.token);
                continue;
            }
            match event.outcome {
                Ok(message) => self.accept_slice(message),
                Err(e) => {
                    warn!("Slice fetch failed: {}", e);
                    self.window.note_failure();
                }
            }
        }

        // Drain notes even with no explorer attached so the channel never
        // backs up.
        for note in self.notes.drain() {
            if let Some(explorer) = self.explorer.as_mut() {
                explorer.on_change(&note);
            }
        }
    }

    fn accept_slice(&mut self, message: SliceMessage) {
        // The guard must release even if this payload turns out undecodable.
        self.window
            .note_arrival(message.index, message.is_last_in_batch());

        let bytes = match message.source.bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Slice {} payload unreadable: {}", message.index, e);
                return;
            }
        };
        match decode_slice(&bytes) {
            Ok(pixmap) => {
                self.slices.insert(message.index, pixmap);
                if message.index == self.position {
                    self.redraw.mark();
                }
            }
            Err(e) => warn!("Slice {} decode failed: {}", message.index, e),
        }
    }

    fn maybe_fetch(&mut self) {
        if let Some(request) = self.window.on_position(self.position) {
            if let Err(e) = self.fetcher.dispatch(self.session_token, request) {
                warn!("Failed to dispatch slice fetch: {}", e);
                self.window.note_failure();
            }
        }
    }

    // =========================================================================
    // Session lifecycle and wire exchange
    // =========================================================================

    /// Drops every selection, layer, and cached slice, then restarts the
    /// stream at `start`. In-flight deliveries from before the reset carry
    /// the old session token and are discarded on arrival.
    pub fn reset_session(&mut self, start: u32) {
        self.session_token += 1;
        self.store.reset();
        self.layers.clear();
        self.slices.clear();
        self.window.reset();
        self.tools = ToolSet::new(self.tools.active());

        let total = self.window.total();
        self.position = if total == 0 { 0 } else { start.min(total - 1) };

        if let Some(request) = self.window.initial_request(self.position) {
            if let Err(e) = self.fetcher.dispatch(self.session_token, request) {
                warn!("Failed to dispatch slice fetch: {}", e);
                self.window.note_failure();
            }
        }
        self.redraw.mark();
    }

    /// Loads previously exported selections as read-only archive entries.
    /// Mask entries without image bytes are skipped. Returns how many
    /// selections were imported.
    pub fn import_archived(&mut self, items: Vec<(WireSelection, Option<Vec<u8>>)>) -> usize {
        let mut imported = 0;
        for (wire, png) in items {
            let (slice_index, tag, geometry) = wire.into_parts();
            let is_mask = matches!(geometry, Geometry::Mask { .. });
            if is_mask && png.is_none() {
                warn!("Skipping archived mask without image bytes");
                continue;
            }

            let id = self.store.insert_archived(slice_index, &tag, geometry);
            if is_mask {
                if let Some(bytes) = png {
                    // The store re-keyed the mask layer to the fresh id.
                    self.layers.insert_png(id, bytes);
                }
            }
            imported += 1;
        }
        if imported > 0 {
            self.redraw.mark();
        }
        imported
    }

    /// Serializes every committed selection for persistence, pairing mask
    /// selections with their PNG-encoded layers. Drafts and archived imports
    /// stay out of the export.
    pub fn export_wire(&self) -> Result<(Vec<WireSelection>, HashMap<u64, Vec<u8>>), RasterError> {
        let mut wires = Vec::new();
        let mut images = HashMap::new();

        for selection in self.store.iter() {
            if selection.status != Status::Normal {
                continue;
            }
            if let Geometry::Mask { layer } = &selection.geometry {
                match self.layers.png_bytes(*layer)? {
                    Some(bytes) => {
                        images.insert(*layer, bytes);
                    }
                    None => {
                        warn!("Mask selection {} has no backing layer, skipping", selection.id);
                        continue;
                    }
                }
            }
            wires.push(WireSelection::from_selection(selection));
        }

        Ok((wires, images))
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Composites the current slice, its visible selections, and any active
    /// gesture overlay into the frame. Selections that fail to draw (e.g. a
    /// corrupt mask layer) are logged and skipped rather than aborting the
    /// frame.
    pub fn render(&mut self) -> &Pixmap {
        let AnnotationSession {
            frame,
            slices,
            store,
            layers,
            tools,
            style,
            position,
            view,
            ..
        } = self;

        frame.fill(style.background.to_skia());
        if let Some(slice) = slices.get(*position) {
            draw_slice(frame, slice);
        }

        for selection in store.on_slice(*position) {
            if selection.hidden {
                continue;
            }
            if let Err(e) = draw_selection(frame, *view, selection, layers, style) {
                warn!("Skipping selection {}: {}", selection.id, e);
            }
        }

        tools.active_tool().draw_overlay(frame, *view);
        &self.frame
    }

    /// True when a repaint is due; clears the flag.
    pub fn take_redraw(&mut self) -> bool {
        self.redraw.take()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn total_slices(&self) -> u32 {
        self.window.total()
    }

    pub fn view(&self) -> ViewSize {
        self.view
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn active_tool(&self) -> ToolKind {
        self.tools.active()
    }

    pub fn brush_mode(&self) -> CompositeOp {
        self.tools.brush().mode()
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// True when no slice fetch is outstanding.
    pub fn fetch_idle(&self) -> bool {
        !self.window.in_flight()
    }

    pub fn slice_ready(&self, index: u32) -> bool {
        self.slices.contains(index)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Runs one closure against the active tool with a context borrowing the
    /// session's disjoint parts.
    fn with_active_tool(&mut self, f: impl FnOnce(&mut dyn Tool, &mut ToolCtx<'_>)) {
        let AnnotationSession {
            tools,
            store,
            layers,
            redraw,
            options,
            tag,
            position,
            view,
            ..
        } = self;
        let mut ctx = ToolCtx {
            view: *view,
            slice_index: *position,
            tag: tag.as_str(),
            store,
            layers,
            redraw,
            options,
        };
        f(tools.active_tool_mut(), &mut ctx);
    }

    fn mask_layer_of(&self, id: u64) -> Option<u64> {
        self.store.get(id).and_then(|s| match &s.geometry {
            Geometry::Mask { layer } => Some(*layer),
            _ => None,
        })
    }

    fn mask_layers_on(&self, slice_index: u32) -> Vec<u64> {
        self.store
            .on_slice(slice_index)
            .iter()
            .filter(|s| s.status != Status::Archived)
            .filter_map(|s| match &s.geometry {
                Geometry::Mask { layer } => Some(*layer),
                _ => None,
            })
            .collect()
    }
}
