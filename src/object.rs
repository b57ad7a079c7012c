//! Per-object sampled state and its per-frame kinematics.
//!
//! A [`SpawnedObjectState`] is produced whole by
//! [`sampler::resample`](crate::sampler::resample) and replaced whole on
//! every respawn. Between respawns only the pose integrates; the sampled
//! channel arrays are read by the scorer and otherwise left alone.

use crate::channel::{Axis, Channel, ChannelGroup, CHANNEL_COUNT};
use crate::shape::Shape;

/// A 3-vector in `[x, y, z]` order.
pub type Vec3 = [f64; 3];

/// Raw and effective values of all 16 channels from one parameter store.
///
/// `raw` holds the standard-normal draw before any transform; `effective`
/// holds the transformed value for this store alone, before the local and
/// global contributions are combined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelValues {
    pub raw: [f64; CHANNEL_COUNT],
    pub effective: [f64; CHANNEL_COUNT],
}

impl Default for ChannelValues {
    fn default() -> Self {
        Self {
            raw: [0.0; CHANNEL_COUNT],
            effective: [0.0; CHANNEL_COUNT],
        }
    }
}

impl ChannelValues {
    pub fn raw(&self, channel: Channel) -> f64 {
        self.raw[channel.index()]
    }

    pub fn effective(&self, channel: Channel) -> f64 {
        self.effective[channel.index()]
    }

    /// Raw values of a group's channels, zero-padded for the scalar group.
    pub fn raw_group(&self, group: ChannelGroup) -> Vec3 {
        gather(group, &self.raw)
    }

    /// Effective values of a group's channels, zero-padded for the scalar
    /// group.
    pub fn effective_group(&self, group: ChannelGroup) -> Vec3 {
        gather(group, &self.effective)
    }
}

fn gather(group: ChannelGroup, values: &[f64; CHANNEL_COUNT]) -> Vec3 {
    let mut out = [0.0; 3];
    for (slot, &channel) in out.iter_mut().zip(group.channels()) {
        *slot = values[channel.index()];
    }
    out
}

/// Everything the sampler decided for one object, plus its live pose.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnedObjectState {
    pub shape: Shape,
    /// Values drawn against the shape's own parameter set.
    pub local: ChannelValues,
    /// Values drawn against the global parameter set.
    pub global: ChannelValues,
    /// Current angular velocity in degrees per frame.
    pub rotation: Vec3,
    /// Angular velocity the current one eases toward.
    pub target_rotation: Vec3,
    /// Linear velocity per frame.
    pub translation: Vec3,
    /// Spawn orientation as Euler angles in degrees.
    pub initial_rotation: Vec3,
    /// Spawn point: viewport X/Y in `[0, 1]`, Z as scene depth.
    pub initial_position: Vec3,
    /// Current Euler angles, starting at `initial_rotation`.
    pub orientation: Vec3,
    /// Current position, starting at `initial_position`.
    pub position: Vec3,
    /// Per-axis scale in `[0.25, 2]`.
    pub scale: Vec3,
    /// Surface-noise amount in `[0, 1]`.
    pub surface_noise: f64,
    /// Rebound latch per axis; set while the object touches a boundary.
    pub rebounding: [bool; 3],
    pub respawning: bool,
    /// Anomaly score; `1.0` until the scorer has run.
    pub p_value: f64,
}

impl SpawnedObjectState {
    /// Steps the object by one frame.
    ///
    /// `rebound_hits[axis]` reports whether the renderer found the object
    /// pressing against a rebounding boundary on that axis this frame. On a
    /// rising edge the translation component on that axis flips sign, as
    /// does the target rotation about the axis that keeps the tumble
    /// looking reflected (Y for X and Z contacts, X for Y contacts).
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::params::ParameterSet;
    /// use anomaly_synth::random::create_rng;
    /// use anomaly_synth::sampler::{resample, SamplingContext};
    /// use anomaly_synth::shape::{ParamLabel, Shape};
    ///
    /// let local = ParameterSet::with_defaults(ParamLabel::Shape(Shape::Cube));
    /// let global = ParameterSet::with_defaults(ParamLabel::Global);
    /// let mut state = resample(Shape::Cube, &local, &global, &mut create_rng(0), &SamplingContext::default());
    /// let before = state.position;
    /// state.advance(1.0, [false; 3]);
    /// assert_eq!(state.position[0], before[0] + state.translation[0]);
    /// ```
    pub fn advance(&mut self, time_scale: f64, rebound_hits: [bool; 3]) {
        for axis in Axis::ALL {
            let i = axis.index();
            if rebound_hits[i] {
                if !self.rebounding[i] {
                    self.translation[i] = -self.translation[i];
                    let mirrored = mirrored_rotation_axis(axis).index();
                    self.target_rotation[mirrored] = -self.target_rotation[mirrored];
                    self.rebounding[i] = true;
                }
            } else {
                self.rebounding[i] = false;
            }
        }

        let t = time_scale.clamp(0.0, 1.0);
        for i in 0..3 {
            self.rotation[i] = lerp(self.rotation[i], self.target_rotation[i], t);
            self.orientation[i] = (self.orientation[i] + self.rotation[i] * time_scale) % 360.0;
            self.position[i] += self.translation[i] * time_scale;
        }
    }

    /// Marks the object as back in view after a respawn.
    pub fn clear_respawning(&mut self) {
        self.respawning = false;
    }
}

fn mirrored_rotation_axis(contact: Axis) -> Axis {
    match contact {
        Axis::X | Axis::Z => Axis::Y,
        Axis::Y => Axis::X,
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
