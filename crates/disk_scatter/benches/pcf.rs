use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use disk_scatter::prelude::*;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

const SET_SIZES: [usize; 3] = [50, 100, 200];

fn random_disks(count: usize, radius: f32, rng: &mut StdRng) -> Vec<Disk> {
    (0..count)
        .map(|_| {
            let x = (rng.next_u32() as f32) / (u32::MAX as f32 + 1.0);
            let y = (rng.next_u32() as f32) / (u32::MAX as f32 + 1.0);
            Disk::new(x, y, radius)
        })
        .collect()
}

fn pcf_full_benches(c: &mut Criterion) {
    let params = SynthesisParams::default();
    let mut group = c.benchmark_group("pcf/compute_pcf");

    for &size in &SET_SIZES {
        let mut rng = StdRng::seed_from_u64(0xD15C ^ size as u64);
        let disks = random_disks(size, 0.01, &mut rng);
        let schedule = RadiusSchedule::new(compute_rmax(size), &params);

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let out = compute_pcf(&disks, &disks, &schedule, &params, true);
                black_box(out.len());
            });
        });
    }

    group.finish();
}

fn pcf_contribution_benches(c: &mut Criterion) {
    let params = SynthesisParams::default();
    let mut group = c.benchmark_group("pcf/compute_contribution");

    for &size in &SET_SIZES {
        let mut rng = StdRng::seed_from_u64(0xCAB ^ size as u64);
        let disks = random_disks(size, 0.01, &mut rng);
        let schedule = RadiusSchedule::new(compute_rmax(size), &params);
        let weights = disk_scatter::pcf::get_weights(&disks, &schedule.radii, 1.0);
        let candidate = Disk::new(0.42, 0.58, 0.01);
        let normalization = 2.0 * (size * size) as f32;

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let out = compute_contribution(
                    &candidate,
                    &disks,
                    &weights,
                    &schedule,
                    &params,
                    normalization,
                    1.0,
                );
                black_box(out.contribution.len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, pcf_full_benches, pcf_contribution_benches);
criterion_main!(benches);
