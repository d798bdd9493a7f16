//! Selection model: geometry, coordinate mapping, and wire format.

pub mod shape;
pub mod view;
pub mod wire;

pub use shape::{Geometry, Selection, Status};
pub use view::ViewSize;
pub use wire::{WirePoint, WireSelection};
