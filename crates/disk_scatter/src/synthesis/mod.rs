//! Category dependency graph and the synthesis controller.
use crate::geometry::Disk;

pub mod category;
pub mod controller;

pub use category::Category;
pub use controller::Synthesizer;

/// Snapshot bundle consumed by plotting layers: the self-relation rmax, a
/// copy of a disk set, and the parent ids.
#[derive(Debug, Clone)]
pub struct ComputeStatus {
    pub rmax: f32,
    pub disks: Vec<Disk>,
    pub parents: Vec<usize>,
}
