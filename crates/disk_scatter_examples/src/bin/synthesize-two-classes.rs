//! Authors two small target classes in code, registers a dependency, and
//! synthesizes into a larger domain to show count scaling.
use disk_scatter::prelude::*;
use disk_scatter_examples::{init_tracing, render_pattern_to_png, ClassStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let rocks = vec![
        Disk::new(0.22, 0.31, 0.035),
        Disk::new(0.58, 0.18, 0.030),
        Disk::new(0.79, 0.52, 0.040),
        Disk::new(0.41, 0.66, 0.032),
        Disk::new(0.15, 0.82, 0.036),
        Disk::new(0.69, 0.87, 0.030),
    ];
    let moss = vec![
        Disk::new(0.26, 0.36, 0.012),
        Disk::new(0.18, 0.27, 0.010),
        Disk::new(0.62, 0.23, 0.011),
        Disk::new(0.54, 0.14, 0.012),
        Disk::new(0.83, 0.57, 0.010),
        Disk::new(0.75, 0.47, 0.012),
        Disk::new(0.45, 0.70, 0.011),
        Disk::new(0.37, 0.62, 0.010),
        Disk::new(0.19, 0.87, 0.012),
        Disk::new(0.73, 0.91, 0.011),
    ];

    let domain_length = 1.5;
    let params = SynthesisParams::default().with_domain_length(domain_length);
    let error_delta = params.error_delta;

    let mut synthesizer = Synthesizer::new(params);
    let rocks_id = synthesizer.add_target_class(rocks);
    let moss_id = synthesizer.add_target_class(moss);
    synthesizer.add_dependency(rocks_id, moss_id)?;

    synthesizer.compute_target();
    info!(
        sizes = ?synthesizer.final_sizes(domain_length),
        "expected output sizes for the resized domain"
    );

    let mut rng = StdRng::seed_from_u64(7);
    synthesizer.initialize(domain_length, error_delta, &mut rng)?;

    render_pattern_to_png(
        "rocks-moss-synthesized.png",
        &[
            (
                synthesizer.current_disks(rocks_id)?,
                ClassStyle {
                    color: [150, 150, 160],
                },
            ),
            (
                synthesizer.current_disks(moss_id)?,
                ClassStyle {
                    color: [110, 190, 90],
                },
            ),
        ],
        domain_length,
        1000,
    )?;

    // Rescale back into the unit domain and report the pretty curves.
    synthesizer.normalize(domain_length);
    let curve = synthesizer.pretty_pcf(rocks_id, moss_id, 1.0)?;
    let peak = curve.iter().map(|&(_, v)| v).fold(0.0f32, f32::max);
    info!(peak, "pretty cross-class PCF after normalization");

    Ok(())
}
