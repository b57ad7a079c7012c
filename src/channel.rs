//! Kinematic channels and their parameter layout.
//!
//! An object's behavior is described by 16 channels: five axis triples
//! (rotation, initial rotation, translation, initial position, scale) and
//! the scalar surface noise. Every parameter set stores a
//! `(mean, std, include)` triple per channel in a flat 48-slot array;
//! [`ParamSlot::index`] and [`ParamSlot::from_index`] are the bijection
//! between the two.
//!
//! Per-group behavior is kept in tables rather than spread over call sites:
//!
//! | Group | Transform | Combine | Mean range | Std range |
//! |---|---|---|---|---|
//! | Rotation | fuzzy | add | [-2, 2] | [0, 2] |
//! | Initial rotation | linear | add | [-180, 180] | [0, 180] |
//! | Translation | fuzzy | add | [-2, 2] | [0, 2] |
//! | Initial position | linear | average | [0, 1] | [0, 0.15] |
//! | Scale | fuzzy | add | [0.25, 2] | [0, 2] |
//! | Surface noise | fuzzy | add | [0, 1] | [0, 1] |

use serde::{Deserialize, Serialize};

/// Number of kinematic channels.
pub const CHANNEL_COUNT: usize = 16;

/// Number of scalars stored per channel (mean, std, include).
pub const FIELDS_PER_CHANNEL: usize = 3;

/// Length of a parameter set's flat value array.
pub const SLOT_COUNT: usize = CHANNEL_COUNT * FIELDS_PER_CHANNEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    XRotation,
    YRotation,
    ZRotation,
    XInitRotation,
    YInitRotation,
    ZInitRotation,
    XTranslation,
    YTranslation,
    ZTranslation,
    XInitPosition,
    YInitPosition,
    ZInitPosition,
    XScale,
    YScale,
    ZScale,
    SurfaceNoise,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::XRotation,
        Channel::YRotation,
        Channel::ZRotation,
        Channel::XInitRotation,
        Channel::YInitRotation,
        Channel::ZInitRotation,
        Channel::XTranslation,
        Channel::YTranslation,
        Channel::ZTranslation,
        Channel::XInitPosition,
        Channel::YInitPosition,
        Channel::ZInitPosition,
        Channel::XScale,
        Channel::YScale,
        Channel::ZScale,
        Channel::SurfaceNoise,
    ];

    /// Dense index in `0..16`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Group the channel belongs to.
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::channel::{Channel, ChannelGroup};
    /// assert_eq!(Channel::YInitPosition.group(), ChannelGroup::InitialPosition);
    /// assert_eq!(Channel::SurfaceNoise.group(), ChannelGroup::SurfaceNoise);
    /// ```
    pub fn group(self) -> ChannelGroup {
        match self {
            Channel::XRotation | Channel::YRotation | Channel::ZRotation => ChannelGroup::Rotation,
            Channel::XInitRotation | Channel::YInitRotation | Channel::ZInitRotation => {
                ChannelGroup::InitialRotation
            }
            Channel::XTranslation | Channel::YTranslation | Channel::ZTranslation => {
                ChannelGroup::Translation
            }
            Channel::XInitPosition | Channel::YInitPosition | Channel::ZInitPosition => {
                ChannelGroup::InitialPosition
            }
            Channel::XScale | Channel::YScale | Channel::ZScale => ChannelGroup::Scale,
            Channel::SurfaceNoise => ChannelGroup::SurfaceNoise,
        }
    }

    /// Axis within the group, `None` for the scalar surface-noise channel.
    pub fn axis(self) -> Option<Axis> {
        if self == Channel::SurfaceNoise {
            return None;
        }
        Axis::ALL.get(self.index() % 3).copied()
    }

    /// Snake-case name, as used in config files and log fields.
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::channel::Channel;
    /// assert_eq!(Channel::ZTranslation.name(), "z_translation");
    /// assert_eq!(Channel::SurfaceNoise.to_string(), "surface_noise");
    /// ```
    pub fn name(self) -> &'static str {
        match self {
            Channel::XRotation => "x_rotation",
            Channel::YRotation => "y_rotation",
            Channel::ZRotation => "z_rotation",
            Channel::XInitRotation => "x_init_rotation",
            Channel::YInitRotation => "y_init_rotation",
            Channel::ZInitRotation => "z_init_rotation",
            Channel::XTranslation => "x_translation",
            Channel::YTranslation => "y_translation",
            Channel::ZTranslation => "z_translation",
            Channel::XInitPosition => "x_init_position",
            Channel::YInitPosition => "y_init_position",
            Channel::ZInitPosition => "z_init_position",
            Channel::XScale => "x_scale",
            Channel::YScale => "y_scale",
            Channel::ZScale => "z_scale",
            Channel::SurfaceNoise => "surface_noise",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How a sampled raw value becomes an effective value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// Dead-zone cubic blended with a linear rescale by the fuzziness.
    Fuzzy,
    /// Plain `raw·std + mean`.
    Linear,
}

/// How the local (shape) and global effective values merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineRule {
    Add,
    Average,
}

impl CombineRule {
    /// # Examples
    /// ```
    /// use anomaly_synth::channel::CombineRule;
    /// assert_eq!(CombineRule::Add.combine(1.0, 0.5), 1.5);
    /// assert_eq!(CombineRule::Average.combine(1.0, 0.5), 0.75);
    /// ```
    pub fn combine(self, local: f64, global: f64) -> f64 {
        match self {
            CombineRule::Add => local + global,
            CombineRule::Average => (local + global) / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelGroup {
    Rotation,
    InitialRotation,
    Translation,
    InitialPosition,
    Scale,
    SurfaceNoise,
}

impl ChannelGroup {
    /// Groups in sampling order. This order is part of the draw sequence
    /// a seed reproduces.
    pub const ALL: [ChannelGroup; 6] = [
        ChannelGroup::Rotation,
        ChannelGroup::InitialRotation,
        ChannelGroup::Translation,
        ChannelGroup::InitialPosition,
        ChannelGroup::Scale,
        ChannelGroup::SurfaceNoise,
    ];

    /// Member channels in X, Y, Z order.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            ChannelGroup::Rotation => &Channel::ALL[0..3],
            ChannelGroup::InitialRotation => &Channel::ALL[3..6],
            ChannelGroup::Translation => &Channel::ALL[6..9],
            ChannelGroup::InitialPosition => &Channel::ALL[9..12],
            ChannelGroup::Scale => &Channel::ALL[12..15],
            ChannelGroup::SurfaceNoise => &Channel::ALL[15..16],
        }
    }

    pub fn transform(self) -> TransformKind {
        match self {
            // one-shot spawn placements
            ChannelGroup::InitialRotation | ChannelGroup::InitialPosition => TransformKind::Linear,
            _ => TransformKind::Fuzzy,
        }
    }

    pub fn combine_rule(self) -> CombineRule {
        match self {
            ChannelGroup::InitialPosition => CombineRule::Average,
            _ => CombineRule::Add,
        }
    }

    /// Range a randomized mean is mapped into.
    pub fn mean_range(self) -> (f64, f64) {
        match self {
            ChannelGroup::Rotation | ChannelGroup::Translation => (-2.0, 2.0),
            ChannelGroup::InitialRotation => (-180.0, 180.0),
            ChannelGroup::InitialPosition => (0.0, 1.0),
            ChannelGroup::Scale => (0.25, 2.0),
            ChannelGroup::SurfaceNoise => (0.0, 1.0),
        }
    }

    /// Range a randomized standard deviation is mapped into.
    pub fn std_range(self) -> (f64, f64) {
        match self {
            ChannelGroup::Rotation | ChannelGroup::Translation | ChannelGroup::Scale => (0.0, 2.0),
            ChannelGroup::InitialRotation => (0.0, 180.0),
            ChannelGroup::InitialPosition => (0.0, 0.15),
            ChannelGroup::SurfaceNoise => (0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamField {
    Mean,
    Std,
    Include,
}

impl ParamField {
    pub const ALL: [ParamField; FIELDS_PER_CHANNEL] =
        [ParamField::Mean, ParamField::Std, ParamField::Include];

    pub fn offset(self) -> usize {
        self as usize
    }
}

/// One scalar of a parameter set: a channel's mean, std or include flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamSlot {
    pub channel: Channel,
    pub field: ParamField,
}

impl ParamSlot {
    pub fn new(channel: Channel, field: ParamField) -> Self {
        Self { channel, field }
    }

    pub fn mean(channel: Channel) -> Self {
        Self::new(channel, ParamField::Mean)
    }

    pub fn std(channel: Channel) -> Self {
        Self::new(channel, ParamField::Std)
    }

    pub fn include(channel: Channel) -> Self {
        Self::new(channel, ParamField::Include)
    }

    /// Position in the flat array: `channel·3 + field`.
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::channel::{Channel, ParamSlot};
    /// assert_eq!(ParamSlot::mean(Channel::XRotation).index(), 0);
    /// assert_eq!(ParamSlot::include(Channel::SurfaceNoise).index(), 47);
    /// ```
    pub fn index(self) -> usize {
        self.channel.index() * FIELDS_PER_CHANNEL + self.field.offset()
    }

    pub fn from_index(index: usize) -> Option<Self> {
        let channel = Channel::from_index(index / FIELDS_PER_CHANNEL)?;
        let field = *ParamField::ALL.get(index % FIELDS_PER_CHANNEL)?;
        Some(Self { channel, field })
    }

    /// All 48 slots in array order.
    pub fn all() -> impl Iterator<Item = ParamSlot> {
        (0..SLOT_COUNT).filter_map(Self::from_index)
    }
}

impl std::fmt::Display for ParamSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let field = match self.field {
            ParamField::Mean => "mean",
            ParamField::Std => "std",
            ParamField::Include => "include",
        };
        write!(f, "{}.{}", self.channel, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_index_roundtrip() {
        for (i, ch) in Channel::ALL.iter().enumerate() {
            assert_eq!(ch.index(), i);
            assert_eq!(Channel::from_index(i), Some(*ch));
        }
        assert_eq!(Channel::from_index(CHANNEL_COUNT), None);
    }

    #[test]
    fn test_slot_mapping_is_bijective() {
        let mut seen = [false; SLOT_COUNT];
        for ch in Channel::ALL {
            for field in ParamField::ALL {
                let slot = ParamSlot::new(ch, field);
                let idx = slot.index();
                assert!(idx < SLOT_COUNT);
                assert!(!seen[idx], "slot {slot} collides at {idx}");
                seen[idx] = true;
                assert_eq!(ParamSlot::from_index(idx), Some(slot));
            }
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(ParamSlot::from_index(SLOT_COUNT), None);
    }

    #[test]
    fn test_slot_all_order() {
        let slots: Vec<ParamSlot> = ParamSlot::all().collect();
        assert_eq!(slots.len(), SLOT_COUNT);
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
    }

    #[test]
    fn test_known_slot_offsets() {
        assert_eq!(ParamSlot::std(Channel::XRotation).index(), 1);
        assert_eq!(ParamSlot::mean(Channel::XInitPosition).index(), 27);
        assert_eq!(ParamSlot::mean(Channel::SurfaceNoise).index(), 45);
    }

    #[test]
    fn test_groups_partition_channels() {
        let mut covered = Vec::new();
        for group in ChannelGroup::ALL {
            for &ch in group.channels() {
                assert_eq!(ch.group(), group);
                covered.push(ch);
            }
        }
        assert_eq!(covered, Channel::ALL.to_vec());
    }

    #[test]
    fn test_axis() {
        assert_eq!(Channel::XRotation.axis(), Some(Axis::X));
        assert_eq!(Channel::YInitPosition.axis(), Some(Axis::Y));
        assert_eq!(Channel::ZScale.axis(), Some(Axis::Z));
        assert_eq!(Channel::SurfaceNoise.axis(), None);
    }

    #[test]
    fn test_transform_table() {
        use TransformKind::*;
        let expected = [Fuzzy, Linear, Fuzzy, Linear, Fuzzy, Fuzzy];
        for (group, kind) in ChannelGroup::ALL.iter().zip(expected) {
            assert_eq!(group.transform(), kind, "{group:?}");
        }
    }

    #[test]
    fn test_combine_table() {
        for group in ChannelGroup::ALL {
            let expected = if group == ChannelGroup::InitialPosition {
                CombineRule::Average
            } else {
                CombineRule::Add
            };
            assert_eq!(group.combine_rule(), expected, "{group:?}");
        }
        assert_eq!(CombineRule::Add.combine(1.5, 0.25), 1.75);
        assert_eq!(CombineRule::Average.combine(0.25, 0.75), 0.5);
    }

    #[test]
    fn test_ranges_are_ordered() {
        for group in ChannelGroup::ALL {
            let (lo, hi) = group.mean_range();
            assert!(lo < hi);
            let (lo, hi) = group.std_range();
            assert!(lo >= 0.0 && lo < hi);
        }
    }

    #[test]
    fn test_channel_serde_names() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            channel: Channel,
        }
        for ch in Channel::ALL {
            let text = toml::to_string(&Wrapper { channel: ch }).unwrap();
            assert!(text.contains(ch.name()), "{text}");
            let back: Wrapper = toml::from_str(&text).unwrap();
            assert_eq!(back.channel, ch);
        }
    }
}
