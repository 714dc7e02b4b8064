//! Read-side plot series for external display layers.
//!
//! Nothing here feeds back into synthesis state; the types exist so a
//! rendering or plotting layer can consume PCF curves without touching the
//! category internals.
use crate::pcf::PcfEntry;

/// One PCF curve flattened for display: the mean value per radius bin,
/// keyed by the `(relation, category)` pair it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    /// Relation (self or parent) id of the curve.
    pub relation: usize,
    /// Category the curve belongs to.
    pub category: usize,
    /// `(radius, mean)` points.
    pub points: Vec<(f32, f32)>,
}

impl PlotSeries {
    pub(crate) fn from_entries(relation: usize, category: usize, entries: &[PcfEntry]) -> Self {
        Self {
            relation,
            category,
            points: entries.iter().map(|e| (e.radius, e.mean)).collect(),
        }
    }
}
