//! Chain tool: click out contours, close them into loops, or leave them open.
//!
//! Building a chain is a multi-click gesture. The first click stages a draft
//! with two coincident points: the anchor and a trailing ghost that follows
//! the cursor. Each further click freezes the ghost and pushes a new one.
//! Clicking back onto the first vertex closes the loop once the chain has
//! more than two real vertices; with exactly two the click appends instead,
//! so a triangle is the smallest loop. Right-click finishes the gesture:
//! short chains are torn down, longer ones commit as open contours.
//!
//! Outside of building, a click on any chain vertex picks it up for
//! dragging, which lets finished contours be touched up point by point.

use crate::selection::Geometry;
use crate::util;

use super::{MouseButton, Tool, ToolCtx, ToolKind};

#[derive(Debug, Clone, Copy)]
enum ChainState {
    Idle,
    Building { id: u64 },
    DraggingVertex { id: u64, index: usize },
}

pub struct ChainTool {
    state: ChainState,
}

impl ChainTool {
    pub fn new() -> Self {
        Self {
            state: ChainState::Idle,
        }
    }

    fn start(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64) {
        let hit = ctx
            .store
            .on_slice(ctx.slice_index)
            .iter()
            .filter(|selection| selection.is_interactive())
            .find_map(|selection| {
                selection
                    .geometry
                    .vertex_near(ctx.view, x, y, ctx.options.hit_radius)
                    .map(|index| (selection.id, index))
            });
        if let Some((id, index)) = hit {
            self.state = ChainState::DraggingVertex { id, index };
            return;
        }
        let (nx, ny) = ctx.normalize(x, y);
        let id = ctx.store.stage(
            ctx.slice_index,
            ctx.tag,
            Geometry::Chain {
                points: vec![(nx, ny), (nx, ny)],
                closed: false,
            },
        );
        self.state = ChainState::Building { id };
        ctx.redraw.mark();
    }

    fn extend(&mut self, ctx: &mut ToolCtx<'_>, id: u64, x: f64, y: f64) {
        let Some(mut points) = chain_points(ctx, id) else {
            self.state = ChainState::Idle;
            return;
        };
        let (fx, fy) = ctx.view.scale_to_view(points[0].0, points[0].1);
        // the trailing ghost does not count as a real vertex
        let closes = points.len() > 3 && util::distance(fx, fy, x, y) < ctx.options.hit_radius;
        if closes {
            points.pop();
            ctx.store.update_geometry(
                id,
                Geometry::Chain {
                    points,
                    closed: true,
                },
            );
            ctx.store.commit(id);
            self.state = ChainState::Idle;
        } else {
            let (nx, ny) = ctx.normalize(x, y);
            let last = points.len() - 1;
            points[last] = (nx, ny);
            points.push((nx, ny));
            ctx.store.update_geometry(
                id,
                Geometry::Chain {
                    points,
                    closed: false,
                },
            );
        }
        ctx.redraw.mark();
    }

    fn finish(&mut self, ctx: &mut ToolCtx<'_>, id: u64) {
        self.state = ChainState::Idle;
        let Some(mut points) = chain_points(ctx, id) else {
            return;
        };
        points.pop();
        if points.len() <= 2 {
            ctx.store.remove(id);
        } else {
            ctx.store.update_geometry(
                id,
                Geometry::Chain {
                    points,
                    closed: false,
                },
            );
            ctx.store.commit(id);
        }
        ctx.redraw.mark();
    }
}

impl Default for ChainTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for ChainTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Chain
    }

    fn on_mouse_down(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64, button: MouseButton) {
        match (self.state, button) {
            (ChainState::Idle, MouseButton::Primary) => self.start(ctx, x, y),
            (ChainState::Building { id }, MouseButton::Primary) => self.extend(ctx, id, x, y),
            (ChainState::Building { id }, MouseButton::Secondary) => self.finish(ctx, id),
            _ => {}
        }
    }

    fn on_mouse_move(&mut self, ctx: &mut ToolCtx<'_>, x: f64, y: f64) {
        match self.state {
            ChainState::Building { id } => {
                let Some(mut points) = chain_points(ctx, id) else {
                    self.state = ChainState::Idle;
                    return;
                };
                let (nx, ny) = ctx.normalize(x, y);
                let last = points.len() - 1;
                points[last] = (nx, ny);
                ctx.store.update_geometry(
                    id,
                    Geometry::Chain {
                        points,
                        closed: false,
                    },
                );
                ctx.redraw.mark();
            }
            ChainState::DraggingVertex { id, index } => {
                let Some(mut points) = chain_points(ctx, id) else {
                    self.state = ChainState::Idle;
                    return;
                };
                if index >= points.len() {
                    self.state = ChainState::Idle;
                    return;
                }
                let (nx, ny) = ctx.normalize(x, y);
                points[index] = (nx, ny);
                let closed = chain_closed(ctx, id);
                ctx.store
                    .update_geometry(id, Geometry::Chain { points, closed });
                ctx.redraw.mark();
            }
            ChainState::Idle => {}
        }
    }

    fn on_mouse_up(&mut self, _ctx: &mut ToolCtx<'_>, _x: f64, _y: f64, _button: MouseButton) {
        if matches!(self.state, ChainState::DraggingVertex { .. }) {
            self.state = ChainState::Idle;
        }
    }

    fn can_change_slice(&self) -> bool {
        !matches!(self.state, ChainState::Building { .. })
    }

    /// Force-finalizes a build in progress: the ghost is dropped and the
    /// chain commits as an open contour. Without a surviving draft this is a
    /// no-op rather than an error.
    fn on_tool_change(&mut self, ctx: &mut ToolCtx<'_>) {
        match self.state {
            ChainState::Building { id } => {
                self.state = ChainState::Idle;
                let Some(mut points) = chain_points(ctx, id) else {
                    return;
                };
                points.pop();
                ctx.store.update_geometry(
                    id,
                    Geometry::Chain {
                        points,
                        closed: false,
                    },
                );
                ctx.store.commit(id);
                ctx.redraw.mark();
            }
            ChainState::DraggingVertex { .. } => {
                self.state = ChainState::Idle;
            }
            ChainState::Idle => {}
        }
    }
}

fn chain_points(ctx: &ToolCtx<'_>, id: u64) -> Option<Vec<(f64, f64)>> {
    match ctx.store.get(id).map(|s| &s.geometry) {
        Some(Geometry::Chain { points, .. }) => Some(points.clone()),
        _ => None,
    }
}

fn chain_closed(ctx: &ToolCtx<'_>, id: u64) -> bool {
    matches!(
        ctx.store.get(id).map(|s| &s.geometry),
        Some(Geometry::Chain { closed: true, .. })
    )
}
