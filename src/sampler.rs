//! Per-object kinematic sampling.
//!
//! [`resample`] draws one standard normal per channel and store, shapes it
//! through the group's transform, and folds the local and global results
//! into the pose the renderer consumes.
//!
//! # Draw order
//!
//! Groups are visited in [`ChannelGroup::ALL`] order. Within a group the
//! local store is sampled before the global store, and each store draws its
//! channels in X, Y, Z order. A seed therefore fixes every value.
//!
//! # Transforms
//!
//! Fuzzy channels (rotation, translation, scale, surface noise):
//!
//! ```text
//! pow(v)    = (v + p)^3   if v <= -p
//!           = (v - p)^3   if v >=  p
//!           = 0           otherwise
//! effective = (pow(raw)·(1 - f) + (raw - p)·f)·std + mean
//! ```
//!
//! with `p` the p-threshold and `f` the fuzziness. Initial rotation and
//! initial position use `raw·std + mean`.

use crate::channel::{ChannelGroup, CombineRule, TransformKind};
use crate::object::{ChannelValues, SpawnedObjectState, Vec3};
use crate::params::ParameterSet;
use crate::random::{standard_normal, UniformSource};
use crate::shape::Shape;

/// Factor from combined translation to per-frame velocity.
pub const TRANSLATION_SPEED: f64 = 0.037;

/// Lower bound of each final scale component.
pub const SCALE_MIN: f64 = 0.25;

/// Upper bound of each final scale component.
pub const SCALE_MAX: f64 = 2.0;

/// How a normalized spawn point maps to scene depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthMapping {
    /// Depth span the normalized Z covers.
    pub scene_depth: f64,
    /// Depth of the near spawn boundary.
    pub z_close_boundary: f64,
}

impl Default for DepthMapping {
    fn default() -> Self {
        Self {
            scene_depth: 25.0,
            z_close_boundary: 5.0,
        }
    }
}

impl DepthMapping {
    /// Clamps X/Y to `[0, 1]` and maps Z to
    /// `scene_depth·clamp01(z) + z_close_boundary`.
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::sampler::DepthMapping;
    /// let depth = DepthMapping { scene_depth: 20.0, z_close_boundary: 4.0 };
    /// assert_eq!(depth.map([1.5, -0.2, 0.5]), [1.0, 0.0, 14.0]);
    /// ```
    pub fn map(&self, normalized: Vec3) -> Vec3 {
        [
            clamp01(normalized[0]),
            clamp01(normalized[1]),
            self.scene_depth * clamp01(normalized[2]) + self.z_close_boundary,
        ]
    }
}

/// Scalars shared by every object sampled in one settings application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingContext {
    /// Blend between the dead-zone cubic (0) and the linear rescale (1).
    pub fuzziness: f64,
    /// Dead-zone half-width, also the anomaly threshold on scores.
    pub p_threshold: f64,
    pub depth: DepthMapping,
}

impl Default for SamplingContext {
    fn default() -> Self {
        Self {
            fuzziness: 0.5,
            p_threshold: 0.01,
            depth: DepthMapping::default(),
        }
    }
}

// ============================================================================
// Transforms
// ============================================================================

/// Dead-zone cubic: zero on `(-p, p)`, shifted cube outside.
///
/// # Examples
/// ```
/// use anomaly_synth::sampler::pow_transform;
/// assert_eq!(pow_transform(0.005, 0.01), 0.0);
/// assert_eq!(pow_transform(2.5, 0.5), 8.0);
/// assert_eq!(pow_transform(-2.5, 0.5), -8.0);
/// ```
pub fn pow_transform(value: f64, p_threshold: f64) -> f64 {
    if value <= -p_threshold {
        (value + p_threshold).powi(3)
    } else if value >= p_threshold {
        (value - p_threshold).powi(3)
    } else {
        0.0
    }
}

/// Fuzziness-weighted blend of [`pow_transform`] and the shifted linear
/// term, rescaled by `std` and offset by `mean`.
///
/// # Examples
/// ```
/// use anomaly_synth::sampler::fuzzy_transform;
/// // fully fuzzy: plain linear rescale of the shifted raw value
/// assert_eq!(fuzzy_transform(1.5, 2.0, 3.0, 1.0, 0.5), 2.0 + 3.0 * 1.0);
/// // crisp inside the dead zone: exactly the mean
/// assert_eq!(fuzzy_transform(0.2, 2.0, 3.0, 0.0, 0.5), 2.0);
/// ```
pub fn fuzzy_transform(raw: f64, mean: f64, std: f64, fuzziness: f64, p_threshold: f64) -> f64 {
    let cubic = pow_transform(raw, p_threshold);
    let linear = raw - p_threshold;
    let blended = cubic * (1.0 - fuzziness) + linear * fuzziness;
    blended * std + mean
}

/// Plain rescale `raw·std + mean`, used for the spawn-pose groups.
///
/// # Examples
/// ```
/// use anomaly_synth::sampler::linear_transform;
/// assert_eq!(linear_transform(0.5, 1.0, 2.0), 2.0);
/// assert_eq!(linear_transform(-1.0, 0.5, 0.0), 0.5);
/// ```
pub fn linear_transform(raw: f64, mean: f64, std: f64) -> f64 {
    raw * std + mean
}

fn apply_transform(kind: TransformKind, raw: f64, mean: f64, std: f64, ctx: &SamplingContext) -> f64 {
    match kind {
        TransformKind::Fuzzy => fuzzy_transform(raw, mean, std, ctx.fuzziness, ctx.p_threshold),
        TransformKind::Linear => linear_transform(raw, mean, std),
    }
}

// ============================================================================
// Sampling
// ============================================================================

fn sample_group<S: UniformSource + ?Sized>(
    group: ChannelGroup,
    store: &ParameterSet,
    values: &mut ChannelValues,
    rng: &mut S,
    ctx: &SamplingContext,
) {
    let kind = group.transform();
    for &channel in group.channels() {
        let raw = standard_normal(rng);
        let i = channel.index();
        values.raw[i] = raw;
        values.effective[i] = apply_transform(kind, raw, store.mean(channel), store.std(channel), ctx);
    }
}

fn combine(group: ChannelGroup, local: &ChannelValues, global: &ChannelValues) -> Vec3 {
    let rule = group.combine_rule();
    let (l, g) = (local.effective_group(group), global.effective_group(group));
    [
        rule.combine(l[0], g[0]),
        rule.combine(l[1], g[1]),
        rule.combine(l[2], g[2]),
    ]
}

fn initial_position(local: &ChannelValues, global: &ChannelValues, depth: &DepthMapping) -> Vec3 {
    let group = ChannelGroup::InitialPosition;
    let l = depth.map(local.effective_group(group));
    let g = depth.map(global.effective_group(group));
    let rule = CombineRule::Average;
    [
        clamp01(rule.combine(l[0], g[0])),
        clamp01(rule.combine(l[1], g[1])),
        rule.combine(l[2], g[2]),
    ]
}

/// Draws a fresh state for one object of `shape`.
///
/// Consumes `2 × 16` standard normals from `rng` (more only if a uniform
/// of exactly 0 has to be redrawn). The returned state has
/// `respawning == false` and `p_value == 1.0`; scoring is a separate step.
///
/// # Examples
/// ```
/// use anomaly_synth::params::ParameterSet;
/// use anomaly_synth::random::create_rng;
/// use anomaly_synth::sampler::{resample, SamplingContext};
/// use anomaly_synth::shape::{ParamLabel, Shape};
///
/// let local = ParameterSet::with_defaults(ParamLabel::Shape(Shape::Cone));
/// let global = ParameterSet::with_defaults(ParamLabel::Global);
/// let a = resample(Shape::Cone, &local, &global, &mut create_rng(3), &SamplingContext::default());
/// let b = resample(Shape::Cone, &local, &global, &mut create_rng(3), &SamplingContext::default());
/// assert_eq!(a, b);
/// ```
pub fn resample<S: UniformSource + ?Sized>(
    shape: Shape,
    local: &ParameterSet,
    global: &ParameterSet,
    rng: &mut S,
    ctx: &SamplingContext,
) -> SpawnedObjectState {
    let mut local_values = ChannelValues::default();
    let mut global_values = ChannelValues::default();
    for group in ChannelGroup::ALL {
        sample_group(group, local, &mut local_values, rng, ctx);
        sample_group(group, global, &mut global_values, rng, ctx);
    }

    let rotation = combine(ChannelGroup::Rotation, &local_values, &global_values);
    let initial_rotation = combine(ChannelGroup::InitialRotation, &local_values, &global_values);
    let translation = combine(ChannelGroup::Translation, &local_values, &global_values)
        .map(|v| v * TRANSLATION_SPEED);
    let initial_position = initial_position(&local_values, &global_values, &ctx.depth);
    let scale = combine(ChannelGroup::Scale, &local_values, &global_values)
        .map(|v| v.clamp(SCALE_MIN, SCALE_MAX));
    let surface_noise = clamp01(combine(ChannelGroup::SurfaceNoise, &local_values, &global_values)[0]);

    SpawnedObjectState {
        shape,
        local: local_values,
        global: global_values,
        rotation,
        target_rotation: rotation,
        translation,
        initial_rotation,
        initial_position,
        orientation: initial_rotation,
        position: initial_position,
        scale,
        surface_noise,
        rebounding: [false; 3],
        respawning: false,
        p_value: 1.0,
    }
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}
