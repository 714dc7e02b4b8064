//! The synthesis controller: owns the category arena and drives the
//! load -> target -> initialize -> query pipeline.
use std::fs::File;
use std::io::{BufReader, Read};
use std::mem;
use std::path::Path;

use rand::rand_core::RngCore;
use tracing::info;

use crate::error::{Error, Result};
use crate::geometry::Disk;
use crate::io::parse_example;
use crate::params::SynthesisParams;
use crate::pcf::PcfEntry;
use crate::plot::PlotSeries;
use crate::synthesis::{Category, ComputeStatus};

/// Owns the category arena and the shared parameters, and orchestrates the
/// synthesis pipeline: load target classes, register dependencies, compute
/// target statistics, initialize every category, query the results.
///
/// Categories reference each other only by dense integer id through the
/// arena, so the dependency graph carries no shared-ownership cycles.
#[derive(Debug, Default)]
pub struct Synthesizer {
    categories: Vec<Category>,
    params: SynthesisParams,
}

impl Synthesizer {
    pub fn new(params: SynthesisParams) -> Self {
        Self {
            categories: Vec::new(),
            params,
        }
    }

    /// Loads target classes from an example file: a class count, the list of
    /// external class ids, then one `<class> <x> <y> <r>` record per disk,
    /// whitespace-delimited, with values scaled by 10000. A malformed file is
    /// unrecoverable for a synthesis run; the returned error is meant to be
    /// fatal at the caller's boundary.
    pub fn load_file(path: impl AsRef<Path>, params: SynthesisParams) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut synthesizer = Self::from_reader(BufReader::new(file), params)?;
        synthesizer.params.example_filename = Some(path.display().to_string());
        info!(
            path = %path.display(),
            classes = synthesizer.class_count(),
            "example file loaded"
        );
        Ok(synthesizer)
    }

    /// Loads target classes from any reader of the example format.
    pub fn from_reader(reader: impl Read, params: SynthesisParams) -> Result<Self> {
        let classes = parse_example(reader)?;
        let mut synthesizer = Self::new(params);
        for target in classes {
            synthesizer.add_target_class(target);
        }
        Ok(synthesizer)
    }

    /// Registers a new class from its reference pattern, returning its id.
    pub fn add_target_class(&mut self, target: Vec<Disk>) -> usize {
        let id = self.categories.len();
        let mut category = Category::new(id);
        category.set_target_disks(target);
        self.categories.push(category);
        id
    }

    /// Appends a single disk to a class's reference pattern.
    pub fn add_target_disk(&mut self, id: usize, disk: Disk) -> Result<()> {
        self.category_mut(id)?.add_target_disk(disk);
        Ok(())
    }

    /// Declares that `child` statistically depends on `parent`. Registers
    /// both directions: the child gains a parent relation, the parent gains
    /// a child edge.
    pub fn add_dependency(&mut self, parent: usize, child: usize) -> Result<()> {
        if parent == child {
            return Err(Error::InvalidConfig(
                "a category's relation to itself is implicit".into(),
            ));
        }
        self.ensure_exists(parent)?;
        self.ensure_exists(child)?;
        self.categories[parent].add_child(child);
        self.categories[child].add_parent(parent);
        Ok(())
    }

    pub fn set_params(&mut self, params: SynthesisParams) {
        self.params = params;
    }

    pub fn params(&self) -> &SynthesisParams {
        &self.params
    }

    pub fn class_count(&self) -> usize {
        self.categories.len()
    }

    pub fn category(&self, id: usize) -> Result<&Category> {
        self.categories.get(id).ok_or(Error::UnknownCategory { id })
    }

    fn category_mut(&mut self, id: usize) -> Result<&mut Category> {
        self.categories
            .get_mut(id)
            .ok_or(Error::UnknownCategory { id })
    }

    fn ensure_exists(&self, id: usize) -> Result<()> {
        self.category(id).map(|_| ())
    }

    /// Computes target statistics for every category. Order-independent:
    /// only the reference patterns are read.
    pub fn compute_target(&mut self) {
        for id in 0..self.categories.len() {
            // Detach the category so it can read its siblings through the arena.
            let mut category = mem::take(&mut self.categories[id]);
            category.compute_target(&self.categories, &self.params);
            self.categories[id] = category;
        }
        info!(classes = self.categories.len(), "target statistics computed");
    }

    /// Initializes every category in dependency order, parents before
    /// children. Re-entrant: already-initialized categories are skipped, so
    /// a second call leaves every working set untouched.
    pub fn initialize(
        &mut self,
        domain_length: f32,
        e_delta: f32,
        rng: &mut dyn RngCore,
    ) -> Result<()> {
        self.params.validate()?;
        for id in self.initialization_order()? {
            let mut category = mem::take(&mut self.categories[id]);
            let outcome =
                category.initialize(&self.categories, domain_length, e_delta, &self.params, rng);
            self.categories[id] = category;
            outcome?;
        }
        Ok(())
    }

    /// Topological order over the dependency graph, parents first. A cycle
    /// has no valid initialization order and is reported as invalid
    /// configuration.
    fn initialization_order(&self) -> Result<Vec<usize>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        fn visit(
            id: usize,
            categories: &[Category],
            marks: &mut [Mark],
            order: &mut Vec<usize>,
        ) -> Result<()> {
            match marks[id] {
                Mark::Done => Ok(()),
                Mark::InProgress => Err(Error::InvalidConfig(format!(
                    "dependency cycle involving category {id}"
                ))),
                Mark::Unvisited => {
                    marks[id] = Mark::InProgress;
                    for &parent in categories[id].parents() {
                        visit(parent, categories, marks, order)?;
                    }
                    marks[id] = Mark::Done;
                    order.push(id);
                    Ok(())
                }
            }
        }

        let mut marks = vec![Mark::Unvisited; self.categories.len()];
        let mut order = Vec::with_capacity(self.categories.len());
        for id in 0..self.categories.len() {
            visit(id, &self.categories, &mut marks, &mut order)?;
        }
        Ok(order)
    }

    /// Refinement pass over the synthesized patterns.
    ///
    /// Currently a no-op returning success: the refinement algorithm has no
    /// published specification, and this method only keeps the pipeline
    /// shape stable for callers that sequence load, target, initialize and
    /// refine.
    pub fn refine(
        &mut self,
        _max_iter: usize,
        _threshold: f32,
        _distance_threshold: bool,
    ) -> Result<()> {
        Ok(())
    }

    /// Rescales every category's working set into the unit domain.
    /// Destructive: the synthesized coordinates are overwritten.
    pub fn normalize(&mut self, domain_length: f32) {
        for category in &mut self.categories {
            category.normalize(domain_length);
        }
    }

    pub fn target_pcf(&self, parent: usize, child: usize) -> Result<Vec<PcfEntry>> {
        self.category(child)?.target_pcf(parent)
    }

    pub fn current_pcf(&self, parent: usize, child: usize) -> Result<Vec<PcfEntry>> {
        self.category(child)?.current_pcf(parent)
    }

    /// Self-relation target PCF of one class.
    pub fn own_target_pcf(&self, id: usize) -> Result<Vec<PcfEntry>> {
        self.target_pcf(id, id)
    }

    /// Self-relation current PCF of one class.
    pub fn own_current_pcf(&self, id: usize) -> Result<Vec<PcfEntry>> {
        self.current_pcf(id, id)
    }

    /// Every current PCF curve flattened into `(relation, category)` series.
    pub fn current_pcf_plot(&self) -> Vec<PlotSeries> {
        self.categories
            .iter()
            .flat_map(Category::current_pcf_series)
            .collect()
    }

    /// Every target PCF curve flattened into `(relation, category)` series.
    pub fn target_pcf_plot(&self) -> Vec<PlotSeries> {
        self.categories
            .iter()
            .flat_map(Category::target_pcf_series)
            .collect()
    }

    /// Display-only Euclidean-distance PCF of the synthesized pattern; never
    /// feeds back into synthesis state.
    pub fn pretty_pcf(
        &self,
        parent: usize,
        child: usize,
        diskfactor: f32,
    ) -> Result<Vec<(f32, f32)>> {
        self.ensure_exists(parent)?;
        self.category(child)?
            .pretty_pcf(&self.categories, parent, &self.params, diskfactor)
    }

    pub fn current_disks(&self, id: usize) -> Result<Vec<Disk>> {
        Ok(self.category(id)?.current_disks())
    }

    pub fn target_disks(&self, id: usize) -> Result<Vec<Disk>> {
        Ok(self.category(id)?.target_disks())
    }

    pub fn compute_status(&self, id: usize) -> Result<ComputeStatus> {
        Ok(self.category(id)?.compute_status())
    }

    pub fn target_compute_status(&self, id: usize) -> Result<ComputeStatus> {
        Ok(self.category(id)?.target_compute_status())
    }

    /// Expected working-set size of every class for a given domain length.
    pub fn final_sizes(&self, domain_length: f32) -> Vec<usize> {
        self.categories
            .iter()
            .map(|c| c.final_size(domain_length))
            .collect()
    }
}
