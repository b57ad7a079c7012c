//! Session orchestration: settings application, spawning and frame stepping.
//!
//! A [`Simulation`] owns the parameter bank, the shape weights, the three
//! random streams and the live objects. The renderer drives it:
//!
//! 1. edit pending parameters through [`Simulation::params_mut`],
//! 2. call [`Simulation::apply_settings`] to commit them and respawn the
//!    whole population,
//! 3. call [`Simulation::advance_frame`] once per frame, and
//!    [`Simulation::respawn`] whenever an object leaves the view.
//!
//! Objects are spawned in index order from the single transform stream, so
//! a seed fixes the entire population.

use tracing::{debug, info};

use crate::config::{ConfigError, SimulationConfig};
use crate::object::SpawnedObjectState;
use crate::params::ParameterBank;
use crate::random::{RngStreams, UniformSource};
use crate::sampler::{self, SamplingContext};
use crate::scorer;
use crate::shape::ShapeWeights;

/// Upper bound on the number of live objects.
pub const MAX_OBJECTS: u32 = 1024;

/// Bounds of the skybox noise seed components.
const SKYBOX_SEED_RANGE: (i64, i64) = (-100_000, 100_000);

/// Clamps the configured object-count bounds to `1 ≤ min ≤ max ≤ 1024`.
///
/// # Examples
/// ```
/// use anomaly_synth::simulation::clamp_object_bounds;
/// assert_eq!(clamp_object_bounds(3, 9), (3, 9));
/// assert_eq!(clamp_object_bounds(12, 4), (4, 4));
/// assert_eq!(clamp_object_bounds(0, 5000), (1, 1024));
/// ```
pub fn clamp_object_bounds(min: u32, max: u32) -> (u32, u32) {
    let max = max.clamp(1, MAX_OBJECTS);
    let min = min.clamp(1, max);
    (min, max)
}

/// Draws the object count for one settings application.
///
/// Consumes one `next_int` draw only when the bounds differ.
pub fn draw_object_count<S: UniformSource + ?Sized>(min: u32, max: u32, rng: &mut S) -> usize {
    let (min, max) = clamp_object_bounds(min, max);
    let count = if min != max {
        rng.next_int(i64::from(min), i64::from(max) + 1)
    } else {
        i64::from(min)
    };
    usize::try_from(count).unwrap_or(1)
}

fn spawn_object<S: UniformSource + ?Sized>(
    params: &ParameterBank,
    weights: &ShapeWeights,
    rng: &mut S,
    ctx: &SamplingContext,
) -> SpawnedObjectState {
    let shape = weights.choose(rng);
    let (local, global) = params.stores_for(shape);
    let mut state = sampler::resample(shape, local, global, rng, ctx);
    state.p_value = scorer::score(&state, local, global, weights);
    state
}

/// A running generator session.
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimulationConfig,
    params: ParameterBank,
    weights: ShapeWeights,
    streams: RngStreams,
    objects: Vec<SpawnedObjectState>,
    skybox_seed: [i64; 3],
    frame: u64,
}

impl Simulation {
    /// Builds a session from `config` and applies it once.
    ///
    /// Parameter overrides from the config land in the pending buffers and
    /// are committed by the initial [`apply_settings`](Self::apply_settings).
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] if the config fails validation.
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::config::SimulationConfig;
    /// use anomaly_synth::simulation::Simulation;
    /// let sim = Simulation::new(SimulationConfig::default()).unwrap();
    /// assert_eq!(sim.objects().len(), 1);
    /// assert!(sim.objects()[0].p_value > 0.0);
    /// ```
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut params = ParameterBank::new();
        config.apply_overrides(&mut params)?;
        let mut sim = Self {
            weights: config.shape_weights,
            streams: RngStreams::new(config.seed, config.cosmetic_seed),
            params,
            config,
            objects: Vec::new(),
            skybox_seed: [0; 3],
            frame: 0,
        };
        sim.apply_settings();
        Ok(sim)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn params(&self) -> &ParameterBank {
        &self.params
    }

    /// Parameter bank for edits; pending values take effect on the next
    /// [`apply_settings`](Self::apply_settings).
    pub fn params_mut(&mut self) -> &mut ParameterBank {
        &mut self.params
    }

    pub fn shape_weights(&self) -> &ShapeWeights {
        &self.weights
    }

    pub fn set_shape_weights(&mut self, weights: ShapeWeights) {
        self.weights = weights;
    }

    /// Redraws every shape weight from the cosmetic stream.
    pub fn randomize_shape_weights(&mut self) {
        self.weights.randomize(&mut self.streams.cosmetic);
    }

    pub fn zero_shape_weights(&mut self) {
        self.weights = ShapeWeights::zero();
    }

    /// Seed used by the next settings application.
    pub fn set_seed(&mut self, seed: u64) {
        self.config.seed = seed;
    }

    pub fn set_object_bounds(&mut self, min: u32, max: u32) {
        self.config.objects.min = min;
        self.config.objects.max = max;
    }

    pub fn sampling_context(&self) -> SamplingContext {
        self.config.sampling_context()
    }

    /// Commits pending parameters and rebuilds the whole population.
    ///
    /// Reseeds the transform and object-count streams, draws the object
    /// count, spawns every object in index order, draws a new skybox seed
    /// from the cosmetic stream and resets the frame counter.
    pub fn apply_settings(&mut self) {
        self.params.commit();
        self.streams.reseed(self.config.seed);

        let count = draw_object_count(
            self.config.objects.min,
            self.config.objects.max,
            &mut self.streams.object_count,
        );
        info!(seed = self.config.seed, count, "applying settings");

        let ctx = self.sampling_context();
        self.objects.clear();
        for index in 0..count {
            let state = spawn_object(&self.params, &self.weights, &mut self.streams.transform, &ctx);
            debug!(index, shape = %state.shape, score = state.p_value, "spawned");
            self.objects.push(state);
        }

        let (lo, hi) = SKYBOX_SEED_RANGE;
        let cosmetic = &mut self.streams.cosmetic;
        self.skybox_seed = [
            cosmetic.next_int(lo, hi),
            cosmetic.next_int(lo, hi),
            cosmetic.next_int(lo, hi),
        ];
        self.frame = 0;
    }

    /// Replaces object `index` with a freshly sampled and scored one.
    ///
    /// The new state has its respawning flag set; the renderer clears it
    /// once the object is back in view. Returns `None` for an index outside
    /// the population.
    pub fn respawn(&mut self, index: usize) -> Option<&SpawnedObjectState> {
        if index >= self.objects.len() {
            return None;
        }
        let ctx = self.sampling_context();
        let mut state = spawn_object(&self.params, &self.weights, &mut self.streams.transform, &ctx);
        state.respawning = true;
        debug!(index, shape = %state.shape, score = state.p_value, "respawned");
        self.objects[index] = state;
        self.objects.get(index)
    }

    /// Applies the renderer's visibility report for object `index`.
    ///
    /// The first out-of-view report respawns the object; further reports
    /// while it is still respawning draw nothing. An in-view report clears
    /// the flag. Returns whether a respawn happened.
    pub fn report_view(&mut self, index: usize, out_of_view: bool) -> bool {
        let Some(object) = self.objects.get_mut(index) else {
            return false;
        };
        if !out_of_view {
            object.clear_respawning();
            return false;
        }
        if object.respawning {
            return false;
        }
        self.respawn(index).is_some()
    }

    /// Steps every object by one frame.
    ///
    /// `rebound_hits[i]` is the per-axis boundary contact of object `i`;
    /// objects without an entry see no contact.
    pub fn advance_frame(&mut self, rebound_hits: &[[bool; 3]]) {
        let time_scale = self.config.scene.time_scale;
        for (i, object) in self.objects.iter_mut().enumerate() {
            let hits = rebound_hits.get(i).copied().unwrap_or([false; 3]);
            object.advance(time_scale, hits);
        }
        self.frame += 1;
    }

    pub fn objects(&self) -> &[SpawnedObjectState] {
        &self.objects
    }

    pub fn object(&self, index: usize) -> Option<&SpawnedObjectState> {
        self.objects.get(index)
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut SpawnedObjectState> {
        self.objects.get_mut(index)
    }

    /// Anomaly flag per object, in index order.
    pub fn anomaly_labels(&self) -> Vec<bool> {
        let threshold = self.config.anomaly.p_threshold;
        self.objects
            .iter()
            .map(|o| scorer::is_anomalous(o.p_value, threshold))
            .collect()
    }

    pub fn skybox_seed(&self) -> [i64; 3] {
        self.skybox_seed
    }

    /// Frames advanced since the last settings application.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
