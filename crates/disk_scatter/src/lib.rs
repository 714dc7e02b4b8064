#![forbid(unsafe_code)]
//! disk_scatter: Example-based synthesis of multi-class 2D disk distributions.
//!
//! Given a set of target point patterns (disks with position and radius) and
//! dependency relations between object classes ("grass avoids trees",
//! "mushrooms cluster near trees"), this crate synthesizes new patterns whose
//! pair correlation functions match the targets, in a domain of arbitrary
//! length.
//!
//! Modules:
//! - geometry: disk primitive, size-aware distance metric, edge-correction weights
//! - pcf: kernel-density pair correlation estimation and incremental contributions
//! - synthesis: category graph, target statistics, dart-throwing initialization
//! - plot: read-side plot series for external display layers
pub mod error;
pub mod geometry;
mod io;
pub mod params;
pub mod pcf;
pub mod plot;
mod sampling;
pub mod synthesis;

/// Convenient re-exports for common types. Import with `use disk_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{
        compute_rmax, disk_distance, gaussian_kernel, perimeter_weight, Disk,
    };
    pub use crate::params::SynthesisParams;
    pub use crate::pcf::{
        compute_contribution, compute_error, compute_pcf, Contribution, PcfEntry, RadiusSchedule,
    };
    pub use crate::plot::PlotSeries;
    pub use crate::synthesis::{Category, ComputeStatus, Synthesizer};
}
