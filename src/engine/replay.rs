//! Headless script replay.
//!
//! Drives a full [`AnnotationSession`] over a synthetic volume from a JSON
//! event script, with no UI attached. Used by the CLI to reproduce reported
//! interaction bugs and to smoke-test the whole pipeline from pointer events
//! down to PNG export.

use super::{AnnotationSession, ExplorerCommand, ExplorerPort};
use crate::config::Config;
use crate::notify::ChangeNote;
use crate::raster::CompositeOp;
use crate::slices::SyntheticSource;
use crate::tools::ToolKind;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A replayable interaction script.
///
/// # Example
/// ```json
/// {
///   "slices": 50,
///   "events": [
///     { "event": "set_tool", "tool": "rectangle" },
///     { "event": "pointer_down", "x": 10.0, "y": 10.0 },
///     { "event": "pointer_move", "x": 60.0, "y": 40.0 },
///     { "event": "pointer_up", "x": 60.0, "y": 40.0 },
///     { "event": "settle" }
///   ]
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct Script {
    /// Number of slices in the synthetic volume backing the replay.
    #[serde(default = "default_slices")]
    pub slices: u32,

    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

fn default_slices() -> u32 {
    50
}

/// One scripted session input.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    PointerDown {
        x: f64,
        y: f64,
        /// Pointer button code; 0 = primary (default), 2 = secondary.
        #[serde(default)]
        button: u8,
    },
    PointerMove {
        x: f64,
        y: f64,
    },
    PointerUp {
        x: f64,
        y: f64,
        #[serde(default)]
        button: u8,
    },
    Wheel {
        delta_y: f64,
    },
    SetTool {
        tool: ToolKind,
    },
    SetTag {
        tag: String,
    },
    SetBrushMode {
        mode: CompositeOp,
    },
    /// An explorer list command echoed back into the session.
    Explorer {
        #[serde(flatten)]
        command: ExplorerCommand,
    },
    Reset {
        #[serde(default)]
        start: u32,
    },
    /// Blocks until the slice fetch pipeline drains.
    Settle,
}

/// Counters summarizing a finished replay.
#[derive(Debug)]
pub struct ReplayReport {
    /// Selections alive in the store when the script finished.
    pub selections: usize,
    /// Create notes relayed to the explorer.
    pub created: usize,
    /// Delete notes relayed to the explorer.
    pub deleted: usize,
}

/// Explorer port that appends every relayed note to a shared log.
pub struct RecordingExplorer {
    log: Rc<RefCell<Vec<ChangeNote>>>,
}

impl RecordingExplorer {
    /// Returns the port and a handle to the log it records into.
    pub fn new() -> (Self, Rc<RefCell<Vec<ChangeNote>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (Self { log: Rc::clone(&log) }, log)
    }
}

impl ExplorerPort for RecordingExplorer {
    fn on_change(&mut self, note: &ChangeNote) {
        self.log.borrow_mut().push(note.clone());
    }
}

/// Replays `script` against a fresh session and returns the note counters.
///
/// When `out_dir` is given, the committed selections are exported there as
/// `selections.json`, mask layers as `mask-<key>.png`, and the final frame
/// as `render.png`.
pub fn run_script(config: &Config, script: &Script, out_dir: Option<&Path>) -> Result<ReplayReport> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let source = Arc::new(SyntheticSource::new(
        script.slices,
        config.canvas.width,
        config.canvas.height,
    ));

    let mut session = AnnotationSession::new(config, runtime.handle(), source)?;
    let (recorder, log) = RecordingExplorer::new();
    session.set_explorer(Box::new(recorder));

    // Absorb the initial batch before the first scripted event.
    settle(&mut session);

    for event in &script.events {
        match event {
            ScriptEvent::PointerDown { x, y, button } => session.pointer_down(*x, *y, *button),
            ScriptEvent::PointerMove { x, y } => session.pointer_move(*x, *y),
            ScriptEvent::PointerUp { x, y, button } => session.pointer_up(*x, *y, *button),
            ScriptEvent::Wheel { delta_y } => session.wheel(*delta_y),
            ScriptEvent::SetTool { tool } => session.set_tool(*tool),
            ScriptEvent::SetTag { tag } => session.set_tag(tag),
            ScriptEvent::SetBrushMode { mode } => {
                session.set_brush_mode(*mode);
            }
            ScriptEvent::Explorer { command } => session.apply(command.clone()),
            ScriptEvent::Reset { start } => {
                session.reset_session(*start);
                settle(&mut session);
            }
            ScriptEvent::Settle => settle(&mut session),
        }
        // One pump per event mirrors a host loop turn.
        session.pump();
    }
    settle(&mut session);

    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let (wires, images) = session.export_wire()?;
        let json =
            serde_json::to_string_pretty(&wires).context("Failed to serialize selections")?;
        let path = dir.join("selections.json");
        fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        for (key, bytes) in &images {
            let path = dir.join(format!("mask-{}.png", key));
            fs::write(&path, bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        let path = dir.join("render.png");
        session
            .render()
            .save_png(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let notes = log.borrow();
    Ok(ReplayReport {
        selections: session.store().len(),
        created: notes.iter().filter(|n| !n.to_delete).count(),
        deleted: notes.iter().filter(|n| n.to_delete).count(),
    })
}

/// Pumps until no fetch is outstanding, bounded so a stuck worker cannot
/// hang the replay.
fn settle(session: &mut AnnotationSession) {
    for _ in 0..200 {
        session.pump();
        if session.fetch_idle() {
            return;
        }
        thread::sleep(Duration::from_millis(2));
    }
    log::warn!("Fetch pipeline did not settle");
}
