//! One object class: reference pattern, dependency edges, target statistics,
//! and the dart-throwing initialization of its working disk set.
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rand_core::RngCore;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geometry::{compute_rmax, Disk};
use crate::params::SynthesisParams;
use crate::pcf::{
    compute_contribution, compute_error, compute_pcf, compute_pretty_pcf, get_weights,
    Contribution, PcfEntry, RadiusSchedule,
};
use crate::plot::PlotSeries;
use crate::sampling::{rand01, shuffle};
use crate::synthesis::ComputeStatus;

/// One object class in the dependency graph.
///
/// Categories are owned by the [`crate::synthesis::Synthesizer`] arena and
/// refer to each other only by dense integer id. The working disk set lives
/// behind its own lock so an observer thread can snapshot a growing pattern
/// while the synthesis thread appends to it.
#[derive(Debug, Default)]
pub struct Category {
    id: usize,
    parents: Vec<usize>,
    children: Vec<usize>,
    target_disks: Vec<Disk>,
    disks: Arc<Mutex<Vec<Disk>>>,
    pcf: HashMap<usize, Vec<PcfEntry>>,
    target_pcf: HashMap<usize, Vec<PcfEntry>>,
    target_schedules: HashMap<usize, RadiusSchedule>,
    initialized: bool,
}

impl Category {
    pub(crate) fn new(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn set_target_disks(&mut self, target: Vec<Disk>) {
        self.target_disks = target;
    }

    pub(crate) fn add_target_disk(&mut self, disk: Disk) {
        self.target_disks.push(disk);
    }

    pub(crate) fn add_parent(&mut self, parent_id: usize) {
        if !self.parents.contains(&parent_id) {
            self.parents.push(parent_id);
        }
    }

    pub(crate) fn add_child(&mut self, child_id: usize) {
        if !self.children.contains(&child_id) {
            self.children.push(child_id);
        }
    }

    /// Relation ids this category computes PCFs for: itself, then its parents.
    pub fn relations(&self) -> Vec<usize> {
        let mut relations = Vec::with_capacity(1 + self.parents.len());
        relations.push(self.id);
        relations.extend_from_slice(&self.parents);
        relations
    }

    /// Computes the per-relation target statistics from the reference
    /// patterns. Idempotent; reads only `target_disks` of itself and its
    /// parents, so categories can be processed in any order.
    pub(crate) fn compute_target(&mut self, arena: &[Category], params: &SynthesisParams) {
        self.target_pcf.clear();
        self.target_schedules.clear();

        if self.target_disks.is_empty() {
            warn!(
                category = self.id,
                "category has no target disks; skipping target statistics"
            );
            return;
        }

        let rmax = compute_rmax(self.target_disks.len());
        for rel in self.relations() {
            let schedule = RadiusSchedule::new(rmax, params);
            let (other, same): (&[Disk], bool) = if rel == self.id {
                (&self.target_disks, true)
            } else {
                (&arena[rel].target_disks, false)
            };
            let target = compute_pcf(&self.target_disks, other, &schedule, params, same);
            self.target_pcf.insert(rel, target);
            self.target_schedules.insert(rel, schedule);
        }
        debug!(
            category = self.id,
            relations = self.target_pcf.len(),
            "target statistics computed"
        );
    }

    /// Dart-throwing initialization of the working disk set.
    ///
    /// The caller (the controller) runs categories parents-first, so every
    /// parent's working set is complete when this executes. Candidates are
    /// sampled uniformly in `[0, domain_length]²` and accepted when the
    /// incremental PCF error against every relation stays within the growing
    /// tolerance `fails * e_delta`; after `max_fails` consecutive rejections
    /// a parallel grid search over the interior lattice cells takes over and
    /// accepts the minimum-error cell unconditionally.
    pub(crate) fn initialize(
        &mut self,
        arena: &[Category],
        domain_length: f32,
        e_delta: f32,
        params: &SynthesisParams,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        if self.initialized {
            debug!(category = self.id, "already initialized; skipping");
            return Ok(());
        }

        self.pcf.clear();
        self.disks.lock().clear();

        let total = self.final_size(domain_length);
        if total == 0 {
            warn!(
                category = self.id,
                "no disks to place for this domain size"
            );
            self.initialized = true;
            return Ok(());
        }

        // Resample the target radii to the output count, largest first: big
        // disks are the hardest to fit once the pattern fills up.
        let n_repeat = (domain_length * domain_length).ceil() as usize;
        let mut radii: Vec<f32> = Vec::with_capacity(n_repeat * self.target_disks.len());
        for d in &self.target_disks {
            for _ in 0..n_repeat {
                radii.push(d.r);
            }
        }
        shuffle(&mut radii, rng);
        radii.truncate(total);
        radii.sort_by(|a, b| b.total_cmp(a));

        let id = self.id;
        let relations = self.relations();
        let diskfact = 1.0 / domain_length;
        let n_steps = params.n_steps();

        // Per-relation target data, aligned with `relations`.
        let mut schedules: Vec<&RadiusSchedule> = Vec::with_capacity(relations.len());
        let mut target_pcfs: Vec<&[PcfEntry]> = Vec::with_capacity(relations.len());
        for &rel in &relations {
            let schedule = self.target_schedules.get(&rel).ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "category {id} has no target statistics for relation {rel}; compute_target must run first"
                ))
            })?;
            let target = self.target_pcf.get(&rel).ok_or(Error::UnknownRelation {
                category: id,
                relation: rel,
            })?;
            schedules.push(schedule);
            target_pcfs.push(target.as_slice());
        }

        // Parents are fully initialized before this runs; snapshot their
        // working sets once. The self slot stays empty and mirrors `placed`.
        let relation_disks: Vec<Vec<Disk>> = relations
            .iter()
            .map(|&rel| {
                if rel == id {
                    Vec::new()
                } else {
                    arena[rel].disks.lock().clone()
                }
            })
            .collect();

        let mut weights: Vec<Vec<Vec<f32>>> = Vec::with_capacity(relations.len());
        let mut current_pcf: Vec<Vec<f32>> = Vec::with_capacity(relations.len());
        for ri in 0..relations.len() {
            weights.push(get_weights(
                &relation_disks[ri],
                &schedules[ri].radii,
                diskfact,
            ));
            current_pcf.push(vec![0.0; n_steps]);
        }

        let mut placed: Vec<Disk> = Vec::with_capacity(total);
        let mut contributions: Vec<Contribution> = Vec::with_capacity(relations.len());
        let mut fails: usize = 0;
        let mut n_accepted: usize = 0;

        while n_accepted < total {
            let e = e_delta * fails as f32;
            let candidate = Disk::new(
                rand01(rng) * domain_length,
                rand01(rng) * domain_length,
                radii[n_accepted],
            );
            contributions.clear();
            let mut rejected = false;
            for (ri, &rel) in relations.iter().enumerate() {
                let others: &[Disk] = if rel == id { &placed } else { &relation_disks[ri] };
                if others.is_empty() && rel == id {
                    // The very first disk of a class has nothing to relate to.
                    contributions.push(Contribution::empty(
                        &candidate,
                        &schedules[ri].radii,
                        diskfact,
                    ));
                    continue;
                }
                let normalization = if rel == id {
                    2.0 * (total * total) as f32
                } else {
                    2.0 * (total * others.len()) as f32
                };
                let contribution = compute_contribution(
                    &candidate,
                    others,
                    &weights[ri],
                    schedules[ri],
                    params,
                    normalization,
                    diskfact,
                );
                if e < compute_error(&contribution, &current_pcf[ri], target_pcfs[ri]) {
                    rejected = true;
                    break;
                }
                contributions.push(contribution);
            }

            if rejected {
                fails += 1;
            } else {
                self.disks.lock().push(candidate);
                placed.push(candidate);
                for (ri, &rel) in relations.iter().enumerate() {
                    if rel == id {
                        weights[ri].push(contributions[ri].weights.clone());
                    }
                    for k in 0..n_steps {
                        current_pcf[ri][k] += contributions[ri].contribution[k];
                    }
                }
                n_accepted += 1;
                fails = 0;
            }

            if fails > params.max_fails {
                info!(
                    category = id,
                    placed = n_accepted,
                    total,
                    "dart throwing stalled; grid searching"
                );
                let res = params.grid_resolution;
                let cell = domain_length / res as f32;
                while n_accepted < total {
                    let radius = radii[n_accepted];
                    let placed_ref = &placed;
                    let relation_disks_ref = &relation_disks;
                    let weights_ref = &weights;
                    let current_ref = &current_pcf;
                    let schedules_ref = &schedules;
                    let targets_ref = &target_pcfs;
                    let relations_ref = &relations;
                    // Interior lattice cells, evaluated independently; the
                    // reduction key includes the linear index so ties resolve
                    // to the first cell in row-major order.
                    let (_, best_idx, best_contribs) = (1..res)
                        .into_par_iter()
                        .flat_map_iter(|i| (1..res).map(move |j| (i, j)))
                        .map(|(i, j)| {
                            let cell_candidate =
                                Disk::new(cell * i as f32, cell * j as f32, radius);
                            let mut cell_error = 0.0f32;
                            let mut cell_contribs = Vec::with_capacity(relations_ref.len());
                            for (ri, &rel) in relations_ref.iter().enumerate() {
                                let others: &[Disk] = if rel == id {
                                    placed_ref
                                } else {
                                    &relation_disks_ref[ri]
                                };
                                let normalization = if rel == id {
                                    (total * total) as f32
                                } else {
                                    (total * others.len()) as f32
                                };
                                let contribution = compute_contribution(
                                    &cell_candidate,
                                    others,
                                    &weights_ref[ri],
                                    schedules_ref[ri],
                                    params,
                                    normalization,
                                    diskfact,
                                );
                                cell_error = cell_error.max(compute_error(
                                    &contribution,
                                    &current_ref[ri],
                                    targets_ref[ri],
                                ));
                                cell_contribs.push(contribution);
                            }
                            (cell_error, i * res + j, cell_contribs)
                        })
                        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
                        .expect("grid has at least one interior cell");

                    let i = best_idx / res;
                    let j = best_idx % res;
                    let jitter_x = (rand01(rng) * domain_length - domain_length / 2.0)
                        / (res as f32 * 10.0);
                    let jitter_y = (rand01(rng) * domain_length - domain_length / 2.0)
                        / (res as f32 * 10.0);
                    let accepted = Disk::new(
                        cell * i as f32 + jitter_x,
                        cell * j as f32 + jitter_y,
                        radius,
                    );
                    self.disks.lock().push(accepted);
                    placed.push(accepted);
                    for (ri, &rel) in relations.iter().enumerate() {
                        if rel == id {
                            weights[ri].push(best_contribs[ri].weights.clone());
                        }
                        for k in 0..n_steps {
                            current_pcf[ri][k] += best_contribs[ri].contribution[k];
                        }
                    }
                    n_accepted += 1;
                }
                fails = 0;
            }
        }

        // The incremental accumulators drift from the true statistics; the
        // final curves come from a full recomputation over the complete set.
        for (ri, &rel) in relations.iter().enumerate() {
            let (others, same): (&[Disk], bool) = if rel == id {
                (&placed, true)
            } else {
                (&relation_disks[ri], false)
            };
            let full = compute_pcf(&placed, others, schedules[ri], params, same);
            self.pcf.insert(rel, full);
        }
        self.initialized = true;
        info!(category = id, disks = placed.len(), "category initialized");
        Ok(())
    }

    /// Current PCF for a relation. An unknown relation id is a precondition
    /// violation surfaced as [`Error::UnknownRelation`].
    pub fn current_pcf(&self, relation: usize) -> Result<Vec<PcfEntry>> {
        self.pcf
            .get(&relation)
            .cloned()
            .ok_or(Error::UnknownRelation {
                category: self.id,
                relation,
            })
    }

    /// Target PCF for a relation.
    pub fn target_pcf(&self, relation: usize) -> Result<Vec<PcfEntry>> {
        self.target_pcf
            .get(&relation)
            .cloned()
            .ok_or(Error::UnknownRelation {
                category: self.id,
                relation,
            })
    }

    /// Snapshot of the working disk set (locks briefly).
    pub fn current_disks(&self) -> Vec<Disk> {
        self.disks.lock().clone()
    }

    /// Shared handle to the working set, for observers that want to watch a
    /// pattern grow while initialization runs on another thread.
    pub fn disks_handle(&self) -> Arc<Mutex<Vec<Disk>>> {
        Arc::clone(&self.disks)
    }

    /// Copy of the reference pattern.
    pub fn target_disks(&self) -> Vec<Disk> {
        self.target_disks.clone()
    }

    /// Expected working-set size for a given domain length.
    pub fn final_size(&self, domain_length: f32) -> usize {
        (self.target_disks.len() as f32 * domain_length * domain_length).round() as usize
    }

    pub fn compute_status(&self) -> ComputeStatus {
        ComputeStatus {
            rmax: self.own_rmax(),
            disks: self.current_disks(),
            parents: self.parents.clone(),
        }
    }

    pub fn target_compute_status(&self) -> ComputeStatus {
        ComputeStatus {
            rmax: self.own_rmax(),
            disks: self.target_disks.clone(),
            parents: self.parents.clone(),
        }
    }

    fn own_rmax(&self) -> f32 {
        self.target_schedules
            .get(&self.id)
            .map(|s| s.rmax)
            .unwrap_or(0.0)
    }

    /// Rescales the working set in place. Destructive: the synthesized
    /// coordinates are overwritten.
    pub(crate) fn normalize(&mut self, domain_length: f32) {
        for d in self.disks.lock().iter_mut() {
            *d = d.normalized(domain_length);
        }
    }

    /// Current PCF curves flattened for display, ordered by relation id.
    pub fn current_pcf_series(&self) -> Vec<PlotSeries> {
        let mut series: Vec<PlotSeries> = self
            .pcf
            .iter()
            .map(|(&rel, entries)| PlotSeries::from_entries(rel, self.id, entries))
            .collect();
        series.sort_by_key(|s| s.relation);
        series
    }

    /// Target PCF curves flattened for display, ordered by relation id.
    pub fn target_pcf_series(&self) -> Vec<PlotSeries> {
        let mut series: Vec<PlotSeries> = self
            .target_pcf
            .iter()
            .map(|(&rel, entries)| PlotSeries::from_entries(rel, self.id, entries))
            .collect();
        series.sort_by_key(|s| s.relation);
        series
    }

    /// Display-only PCF of the working set against one relation.
    pub(crate) fn pretty_pcf(
        &self,
        arena: &[Category],
        relation: usize,
        params: &SynthesisParams,
        diskfactor: f32,
    ) -> Result<Vec<(f32, f32)>> {
        let schedule = self
            .target_schedules
            .get(&relation)
            .ok_or(Error::UnknownRelation {
                category: self.id,
                relation,
            })?;
        let own = self.current_disks();
        let (other, same): (Vec<Disk>, bool) = if relation == self.id {
            (own.clone(), true)
        } else {
            (arena[relation].current_disks(), false)
        };
        let values = compute_pretty_pcf(&own, &other, schedule, params, diskfactor, same);
        Ok(schedule
            .radii
            .iter()
            .map(|&r| r / schedule.rmax)
            .zip(values)
            .collect())
    }
}
