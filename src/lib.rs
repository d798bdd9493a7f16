//! Library exports for embedding the slicemarker engine.
//!
//! Exposes the annotation session alongside the subsystems it is built from
//! so that host shells (native viewers, web bridges, script harnesses) can
//! drive the engine directly and share configuration validation with the
//! command-line binary.

pub mod config;
pub mod engine;
pub mod notify;
pub mod raster;
pub mod selection;
pub mod slices;
pub mod store;
pub mod tools;
pub mod util;

pub use config::Config;
pub use engine::AnnotationSession;
