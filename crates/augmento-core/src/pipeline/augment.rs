//! Ordered, probability-gated operation sequence with per-image seeding.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::OperationSpec;
use crate::error::{OperationError, PipelineResult};
use crate::image::Image;
use crate::ops::{Operation, OperationFactory};

/// An operation paired with the chance that it runs.
#[derive(Debug, Clone)]
pub struct OperationEntry {
    pub operation: Arc<Operation>,
    /// Chance in `[0, 1]`; values outside are effectively clamped by the gate
    pub probability: f64,
}

impl OperationEntry {
    pub fn new(operation: Operation, probability: f64) -> Self {
        Self {
            operation: Arc::new(operation),
            probability,
        }
    }
}

/// Ordered list of operations applied to every image.
///
/// Built once, then shared read-only by all producer threads. Each call to
/// [`Pipeline::apply`] owns a fresh RNG seeded from the pipeline's base seed
/// and the image id, so results do not depend on thread scheduling.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    entries: Vec<OperationEntry>,
    base_seed: u64,
}

impl Pipeline {
    pub fn new(base_seed: u64) -> Self {
        Self {
            entries: Vec::new(),
            base_seed,
        }
    }

    /// Build a pipeline from config entries, failing on the first bad entry.
    pub fn from_specs(specs: &[OperationSpec], base_seed: u64) -> Result<Self, OperationError> {
        let mut pipeline = Self::new(base_seed);
        for spec in specs {
            pipeline.add(OperationFactory::from_spec(spec)?);
        }
        Ok(pipeline)
    }

    /// Append an entry; it runs after every entry added before it.
    pub fn add(&mut self, entry: OperationEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[OperationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Seed used for the image with this id.
    pub fn seed_for(&self, image_id: u64) -> u64 {
        self.base_seed.wrapping_add(stable_hash(image_id))
    }

    /// Apply the pipeline with the seed derived from the image id.
    pub fn apply(&self, image: &mut Image) -> PipelineResult<()> {
        let seed = self.seed_for(image.id());
        self.apply_with_seed(image, seed)
    }

    /// Apply the pipeline from an explicit seed, ignoring the image id.
    pub fn apply_with_seed(&self, image: &mut Image, seed: u64) -> PipelineResult<()> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.run(image, &mut rng)
    }

    /// Apply identical augmentation to two images, e.g. an input and its
    /// segmentation mask. Both use the seed derived from `first`.
    pub fn apply_paired(&self, first: &mut Image, second: &mut Image) -> PipelineResult<()> {
        let seed = self.seed_for(first.id());
        self.apply_with_seed(first, seed)?;
        self.apply_with_seed(second, seed)
    }

    fn run(&self, image: &mut Image, rng: &mut StdRng) -> PipelineResult<()> {
        for entry in &self.entries {
            let draw: f64 = rng.gen();
            if draw < entry.probability {
                entry.operation.apply(image, rng)?;
            }
        }
        Ok(())
    }
}

/// Platform-independent 64-bit hash of an image id.
fn stable_hash(id: u64) -> u64 {
    let digest = blake3::hash(&id.to_le_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
