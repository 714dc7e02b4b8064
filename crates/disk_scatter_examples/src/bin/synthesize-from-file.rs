//! Loads a two-class forest example (trees and mushrooms clustered near
//! them), synthesizes a new pattern matching its statistics, and writes PNG
//! snapshots of the target and the result.
use disk_scatter::prelude::*;
use disk_scatter_examples::{init_tracing, render_pattern_to_png, ClassStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

const TREES: ClassStyle = ClassStyle {
    color: [96, 160, 80],
};
const MUSHROOMS: ClassStyle = ClassStyle {
    color: [225, 110, 90],
};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/data/forest.txt").to_owned());

    let params = SynthesisParams::default();
    let domain_length = params.domain_length;
    let error_delta = params.error_delta;

    let mut synthesizer = Synthesizer::load_file(&path, params)?;
    // Mushrooms depend on trees.
    synthesizer.add_dependency(0, 1)?;

    synthesizer.compute_target();
    info!(sizes = ?synthesizer.final_sizes(domain_length), "expected output sizes");

    let mut rng = StdRng::seed_from_u64(2026);
    synthesizer.initialize(domain_length, error_delta, &mut rng)?;

    render_pattern_to_png(
        "forest-target.png",
        &[
            (synthesizer.target_disks(0)?, TREES),
            (synthesizer.target_disks(1)?, MUSHROOMS),
        ],
        1.0,
        1000,
    )?;
    render_pattern_to_png(
        "forest-synthesized.png",
        &[
            (synthesizer.current_disks(0)?, TREES),
            (synthesizer.current_disks(1)?, MUSHROOMS),
        ],
        domain_length,
        1000,
    )?;

    for series in synthesizer.current_pcf_plot() {
        let peak = series
            .points
            .iter()
            .map(|&(_, v)| v)
            .fold(0.0f32, f32::max);
        info!(
            category = series.category,
            relation = series.relation,
            peak,
            "synthesized PCF"
        );
    }

    Ok(())
}
