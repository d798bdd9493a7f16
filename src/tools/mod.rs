//! Tool engine: gesture state machines over the annotation canvas.
//!
//! Exactly one tool is active at a time. Tools receive pointer events in
//! canvas pixels, normalize them through the shared context, and mutate the
//! selection store. They keep selection ids across events but never hold
//! references into the store.

pub mod context;

mod brush;
mod chain;
mod point;
mod rect;


use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

use crate::selection::ViewSize;

pub use brush::BrushTool;
pub use chain::ChainTool;
pub use context::{ToolCtx, ToolOptions};
pub use point::PointTool;
pub use rect::RectangleTool;

/// Identifies a tool and names it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Point,
    Rectangle,
    Chain,
    Brush,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Point => "point",
            ToolKind::Rectangle => "rectangle",
            ToolKind::Chain => "chain",
            ToolKind::Brush => "brush",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Mouse buttons the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Primary,
    Secondary,
}

impl MouseButton {
    /// Maps DOM-style button codes: 0 primary, 2 secondary. Other codes are
    /// not gestures and map to nothing.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(MouseButton::Primary),
            2 => Some(MouseButton::Secondary),
            _ => None,
        }
    }
}

/// Capability set every tool implements.
///
/// Pointer coordinates arrive in canvas pixels; tools normalize them before
/// storing geometry.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    fn on_mouse_down(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64, button: MouseButton);

    fn on_mouse_move(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64);

    fn on_mouse_up(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64, button: MouseButton);

    /// Paints gesture state the store does not hold yet. Default: nothing.
    fn draw_overlay(&self, _frame: &mut Pixmap, _view: ViewSize) {}

    /// False while an open gesture must keep the canvas on the current slice.
    fn can_change_slice(&self) -> bool {
        true
    }

    /// Finalizes any in-progress gesture. Called when the active tool, tag,
    /// or slice changes; a tool with no open gesture treats this as a no-op.
    fn on_tool_change(&mut self, _ctx: &mut ToolCtx<'_>) {}
}

/// The four engine tools, owned together so switching preserves per-tool
/// state such as the brush composite mode.
pub struct ToolSet {
    point: PointTool,
    rectangle: RectangleTool,
    chain: ChainTool,
    brush: BrushTool,
    active: ToolKind,
}

impl ToolSet {
    pub fn new(active: ToolKind) -> Self {
        Self {
            point: PointTool::new(),
            rectangle: RectangleTool::new(),
            chain: ChainTool::new(),
            brush: BrushTool::new(),
            active,
        }
    }

    pub fn active(&self) -> ToolKind {
        self.active
    }

    pub fn set_active(&mut self, kind: ToolKind) {
        self.active = kind;
    }

    pub fn active_tool(&self) -> &dyn Tool {
        match self.active {
            ToolKind::Point => &self.point,
            ToolKind::Rectangle => &self.rectangle,
            ToolKind::Chain => &self.chain,
            ToolKind::Brush => &self.brush,
        }
    }

    pub fn active_tool_mut(&mut self) -> &mut dyn Tool {
        match self.active {
            ToolKind::Point => &mut self.point,
            ToolKind::Rectangle => &mut self.rectangle,
            ToolKind::Chain => &mut self.chain,
            ToolKind::Brush => &mut self.brush,
        }
    }

    pub fn brush(&self) -> &BrushTool {
        &self.brush
    }

    pub fn brush_mut(&mut self) -> &mut BrushTool {
        &mut self.brush
    }
}
