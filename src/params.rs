//! Per-shape and global distribution parameters.
//!
//! A [`ParameterSet`] holds `(mean, std, include)` for each of the 16
//! channels in a flat array addressed through [`ParamSlot`]. A
//! [`ParameterBank`] owns the 13 sets a session needs (12 shapes plus
//! global) twice over: a pending buffer that edits go into, and the active
//! store the sampler reads, refreshed by [`ParameterBank::commit`].
//!
//! # Defaults
//!
//! | Slot | Shape set | Global set |
//! |---|---|---|
//! | rotation mean | 0 | 1 |
//! | initial-position mean | 0.5 | 0.5 |
//! | scale mean | 1 | 1 |
//! | every include flag | 1 | 1 |
//! | everything else | 0 | 0 |

use crate::channel::{Channel, ChannelGroup, ParamField, ParamSlot, SLOT_COUNT};
use crate::random::UniformSource;
use crate::shape::{ParamLabel, Shape, LABEL_COUNT};

/// Error type for rejected parameter edits.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// The value violates the slot's constraint.
    InvalidValue {
        slot: ParamSlot,
        value: f64,
        reason: &'static str,
    },
    /// Paste was requested before anything was copied.
    EmptyClipboard,
}

impl std::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterError::InvalidValue {
                slot,
                value,
                reason,
            } => write!(f, "invalid value {value} for {slot}: {reason}"),
            ParameterError::EmptyClipboard => f.write_str("clipboard is empty"),
        }
    }
}

impl std::error::Error for ParameterError {}

/// Distribution parameters of one shape (or the global set).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    label: ParamLabel,
    values: [f64; SLOT_COUNT],
}

impl ParameterSet {
    /// Creates a set populated with the defaults for `label`.
    pub fn with_defaults(label: ParamLabel) -> Self {
        let mut set = Self {
            label,
            values: [0.0; SLOT_COUNT],
        };
        set.reset_to_default();
        set
    }

    /// Default value of `slot` for a set labelled `label`.
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::channel::{Channel, ParamSlot};
    /// use anomaly_synth::params::ParameterSet;
    /// use anomaly_synth::shape::{ParamLabel, Shape};
    /// let slot = ParamSlot::mean(Channel::XScale);
    /// let rotation = ParamSlot::mean(Channel::XRotation);
    /// assert_eq!(ParameterSet::default_value(ParamLabel::Global, rotation), 1.0);
    /// assert_eq!(ParameterSet::default_value(ParamLabel::Shape(Shape::Cube), rotation), 0.0);
    /// assert_eq!(ParameterSet::default_value(ParamLabel::Shape(Shape::Cube), slot), 1.0);
    /// ```
    pub fn default_value(label: ParamLabel, slot: ParamSlot) -> f64 {
        match slot.field {
            ParamField::Include => 1.0,
            ParamField::Std => 0.0,
            ParamField::Mean => match slot.channel.group() {
                ChannelGroup::InitialPosition => 0.5,
                ChannelGroup::Scale => 1.0,
                // kept from the multiplicative-mean era
                ChannelGroup::Rotation if label.is_global() => 1.0,
                _ => 0.0,
            },
        }
    }

    pub fn label(&self) -> ParamLabel {
        self.label
    }

    pub fn get_value(&self, slot: ParamSlot) -> f64 {
        self.values[slot.index()]
    }

    /// Writes one slot.
    ///
    /// # Errors
    /// Returns [`ParameterError::InvalidValue`] if the value is not finite,
    /// a std is negative, or an include flag is neither 0 nor 1.
    pub fn set_value(&mut self, slot: ParamSlot, value: f64) -> Result<(), ParameterError> {
        let reason = if !value.is_finite() {
            Some("value must be finite")
        } else {
            match slot.field {
                ParamField::Std if value < 0.0 => Some("std must be non-negative"),
                ParamField::Include if value != 0.0 && value != 1.0 => {
                    Some("include must be 0 or 1")
                }
                _ => None,
            }
        };
        if let Some(reason) = reason {
            return Err(ParameterError::InvalidValue {
                slot,
                value,
                reason,
            });
        }
        self.values[slot.index()] = value;
        Ok(())
    }

    pub fn mean(&self, channel: Channel) -> f64 {
        self.get_value(ParamSlot::mean(channel))
    }

    pub fn std(&self, channel: Channel) -> f64 {
        self.get_value(ParamSlot::std(channel))
    }

    /// Whether `channel` contributes to anomaly scoring from this set.
    pub fn is_included(&self, channel: Channel) -> bool {
        self.get_value(ParamSlot::include(channel)) > 0.0
    }

    pub fn set_included(&mut self, channel: Channel, included: bool) {
        self.values[ParamSlot::include(channel).index()] = if included { 1.0 } else { 0.0 };
    }

    /// A new set with identical label and values.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Overwrites every value with `other`'s, keeping this set's label.
    pub fn copy_values_from(&mut self, other: &ParameterSet) {
        self.values = other.values;
    }

    pub fn reset_to_default(&mut self) {
        for slot in ParamSlot::all() {
            self.values[slot.index()] = Self::default_value(self.label, slot);
        }
    }

    /// Restores mean, std and include of one channel.
    pub fn reset_channel_to_default(&mut self, channel: Channel) {
        for field in ParamField::ALL {
            let slot = ParamSlot::new(channel, field);
            self.values[slot.index()] = Self::default_value(self.label, slot);
        }
    }

    /// Draws a new mean and std for `channel`.
    ///
    /// Two uniforms are consumed, mean first, and mapped into the group's
    /// [`ChannelGroup::mean_range`] and [`ChannelGroup::std_range`]. The
    /// include flag is left untouched.
    pub fn randomize_channel<S: UniformSource + ?Sized>(&mut self, channel: Channel, rng: &mut S) {
        let group = channel.group();
        let (mean_lo, mean_hi) = group.mean_range();
        let (std_lo, std_hi) = group.std_range();
        let mean = mean_lo + (mean_hi - mean_lo) * rng.next_uniform();
        let std = std_lo + (std_hi - std_lo) * rng.next_uniform();
        self.values[ParamSlot::mean(channel).index()] = mean;
        self.values[ParamSlot::std(channel).index()] = std;
    }

    /// [`randomize_channel`](Self::randomize_channel) for every channel in
    /// channel order.
    pub fn randomize_all<S: UniformSource + ?Sized>(&mut self, rng: &mut S) {
        for channel in Channel::ALL {
            self.randomize_channel(channel, rng);
        }
    }
}

/// Active and pending parameter sets for every label, plus a clipboard.
#[derive(Debug, Clone)]
pub struct ParameterBank {
    active: [ParameterSet; LABEL_COUNT],
    pending: [ParameterSet; LABEL_COUNT],
    clipboard: Option<ParameterSet>,
}

impl Default for ParameterBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterBank {
    pub fn new() -> Self {
        let sets = || std::array::from_fn(|i| ParameterSet::with_defaults(label_at(i)));
        Self {
            active: sets(),
            pending: sets(),
            clipboard: None,
        }
    }

    /// The set the sampler and scorer read.
    pub fn active(&self, label: ParamLabel) -> &ParameterSet {
        &self.active[label.index()]
    }

    /// The `(local, global)` active sets an object of `shape` samples from.
    pub fn stores_for(&self, shape: Shape) -> (&ParameterSet, &ParameterSet) {
        (
            self.active(ParamLabel::Shape(shape)),
            self.active(ParamLabel::Global),
        )
    }

    pub fn pending(&self, label: ParamLabel) -> &ParameterSet {
        &self.pending[label.index()]
    }

    pub fn pending_mut(&mut self, label: ParamLabel) -> &mut ParameterSet {
        &mut self.pending[label.index()]
    }

    /// Writes into the pending buffer; takes effect on [`commit`](Self::commit).
    pub fn write_pending(
        &mut self,
        label: ParamLabel,
        slot: ParamSlot,
        value: f64,
    ) -> Result<(), ParameterError> {
        self.pending_mut(label).set_value(slot, value)
    }

    /// Copies every pending set into the active store.
    pub fn commit(&mut self) {
        self.active = self.pending.clone();
    }

    /// Whether pending edits differ from the active store.
    pub fn has_uncommitted_changes(&self) -> bool {
        self.active != self.pending
    }

    /// Resets all pending sets to their defaults.
    pub fn reset_pending_to_default(&mut self) {
        for set in self.pending.iter_mut() {
            set.reset_to_default();
        }
    }

    pub fn copy_to_clipboard(&mut self, label: ParamLabel) {
        self.clipboard = Some(self.pending(label).copy());
    }

    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }

    /// Overwrites the pending values of `label` with the clipboard's.
    ///
    /// # Errors
    /// Returns [`ParameterError::EmptyClipboard`] if nothing was copied.
    pub fn paste_from_clipboard(&mut self, label: ParamLabel) -> Result<(), ParameterError> {
        let Some(source) = self.clipboard.as_ref() else {
            return Err(ParameterError::EmptyClipboard);
        };
        self.pending[label.index()].copy_values_from(source);
        Ok(())
    }
}

fn label_at(index: usize) -> ParamLabel {
    ParamLabel::from_index(index).unwrap_or(ParamLabel::Global)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::random::testing::ScriptedStream;

    fn cube() -> ParamLabel {
        ParamLabel::Shape(Shape::Cube)
    }

    #[test]
    fn test_shape_defaults() {
        let set = ParameterSet::with_defaults(cube());
        for ch in Channel::ALL {
            let expected_mean = match ch.group() {
                ChannelGroup::InitialPosition => 0.5,
                ChannelGroup::Scale => 1.0,
                _ => 0.0,
            };
            assert_eq!(set.mean(ch), expected_mean, "{ch}");
            assert_eq!(set.std(ch), 0.0, "{ch}");
            assert!(set.is_included(ch), "{ch}");
        }
    }

    #[test]
    fn test_global_defaults() {
        let set = ParameterSet::with_defaults(ParamLabel::Global);
        for ch in Channel::ALL {
            let expected_mean = match ch.group() {
                ChannelGroup::InitialPosition => 0.5,
                ChannelGroup::Rotation | ChannelGroup::Scale => 1.0,
                _ => 0.0,
            };
            assert_eq!(set.mean(ch), expected_mean, "{ch}");
            assert_eq!(set.std(ch), 0.0, "{ch}");
            assert!(set.is_included(ch), "{ch}");
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut set = ParameterSet::with_defaults(cube());
        let slot = ParamSlot::std(Channel::YTranslation);
        set.set_value(slot, 0.7).unwrap();
        assert_eq!(set.get_value(slot), 0.7);
        assert_eq!(set.std(Channel::YTranslation), 0.7);
    }

    #[test]
    fn test_set_rejects_negative_std() {
        let mut set = ParameterSet::with_defaults(cube());
        let slot = ParamSlot::std(Channel::XScale);
        let err = set.set_value(slot, -0.1).unwrap_err();
        assert!(matches!(err, ParameterError::InvalidValue { .. }));
        assert_eq!(set.get_value(slot), 0.0);
    }

    #[test]
    fn test_set_rejects_fractional_include() {
        let mut set = ParameterSet::with_defaults(cube());
        assert!(set.set_value(ParamSlot::include(Channel::SurfaceNoise), 0.5).is_err());
        assert!(set.set_value(ParamSlot::include(Channel::SurfaceNoise), 0.0).is_ok());
        assert!(!set.is_included(Channel::SurfaceNoise));
    }

    #[test]
    fn test_set_rejects_non_finite() {
        let mut set = ParameterSet::with_defaults(cube());
        assert!(set.set_value(ParamSlot::mean(Channel::XRotation), f64::NAN).is_err());
        assert!(set.set_value(ParamSlot::mean(Channel::XRotation), f64::INFINITY).is_err());
    }

    #[test]
    fn test_negative_mean_allowed() {
        let mut set = ParameterSet::with_defaults(cube());
        assert!(set.set_value(ParamSlot::mean(Channel::ZRotation), -1.5).is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = ParameterError::InvalidValue {
            slot: ParamSlot::std(Channel::XScale),
            value: -1.0,
            reason: "std must be non-negative",
        };
        assert_eq!(
            err.to_string(),
            "invalid value -1 for x_scale.std: std must be non-negative"
        );
    }

    #[test]
    fn test_copy_is_independent() {
        let mut set = ParameterSet::with_defaults(cube());
        let copy = set.copy();
        set.set_value(ParamSlot::mean(Channel::XRotation), 1.0).unwrap();
        assert_eq!(copy.mean(Channel::XRotation), 0.0);
        assert_eq!(copy.label(), cube());
    }

    #[test]
    fn test_reset_channel() {
        let mut set = ParameterSet::with_defaults(ParamLabel::Global);
        set.set_value(ParamSlot::mean(Channel::YScale), 0.3).unwrap();
        set.set_value(ParamSlot::std(Channel::YScale), 0.3).unwrap();
        set.set_included(Channel::YScale, false);
        set.set_value(ParamSlot::std(Channel::ZScale), 0.9).unwrap();

        set.reset_channel_to_default(Channel::YScale);
        assert_eq!(set.mean(Channel::YScale), 1.0);
        assert_eq!(set.std(Channel::YScale), 0.0);
        assert!(set.is_included(Channel::YScale));
        // neighbors untouched
        assert_eq!(set.std(Channel::ZScale), 0.9);
    }

    #[test]
    fn test_reset_all() {
        let mut set = ParameterSet::with_defaults(cube());
        set.randomize_all(&mut create_rng(1));
        set.reset_to_default();
        assert_eq!(set, ParameterSet::with_defaults(cube()));
    }

    #[test]
    fn test_randomize_channel_maps_into_range() {
        let mut set = ParameterSet::with_defaults(cube());
        let mut stream = ScriptedStream::new(vec![0.5, 0.25]);
        set.randomize_channel(Channel::XInitRotation, &mut stream);
        assert_eq!(set.mean(Channel::XInitRotation), 0.0);
        assert_eq!(set.std(Channel::XInitRotation), 45.0);
        assert_eq!(stream.draws(), 2);
    }

    #[test]
    fn test_randomize_keeps_include() {
        let mut set = ParameterSet::with_defaults(cube());
        set.set_included(Channel::XRotation, false);
        set.randomize_all(&mut create_rng(5));
        assert!(!set.is_included(Channel::XRotation));
        assert!(set.is_included(Channel::YRotation));
    }

    #[test]
    fn test_bank_commit() {
        let mut bank = ParameterBank::new();
        let slot = ParamSlot::mean(Channel::XTranslation);
        bank.write_pending(cube(), slot, 1.25).unwrap();
        assert!(bank.has_uncommitted_changes());
        assert_eq!(bank.active(cube()).get_value(slot), 0.0);

        bank.commit();
        assert!(!bank.has_uncommitted_changes());
        assert_eq!(bank.active(cube()).get_value(slot), 1.25);
    }

    #[test]
    fn test_bank_labels() {
        let bank = ParameterBank::new();
        for label in ParamLabel::all() {
            assert_eq!(bank.active(label).label(), label);
            assert_eq!(bank.pending(label).label(), label);
        }
        let (local, global) = bank.stores_for(Shape::Torus);
        assert_eq!(local.label(), ParamLabel::Shape(Shape::Torus));
        assert_eq!(global.label(), ParamLabel::Global);
    }

    #[test]
    fn test_clipboard_copy_paste() {
        let mut bank = ParameterBank::new();
        let target = ParamLabel::Shape(Shape::Cone);
        assert_eq!(
            bank.paste_from_clipboard(target),
            Err(ParameterError::EmptyClipboard)
        );

        let slot = ParamSlot::std(Channel::ZRotation);
        bank.write_pending(ParamLabel::Global, slot, 0.4).unwrap();
        bank.copy_to_clipboard(ParamLabel::Global);
        assert!(bank.has_clipboard());
        bank.paste_from_clipboard(target).unwrap();

        let pasted = bank.pending(target);
        assert_eq!(pasted.label(), target);
        assert_eq!(pasted.get_value(slot), 0.4);
        // global defaults came along with the values
        assert_eq!(pasted.mean(Channel::XRotation), 1.0);
    }

    #[test]
    fn test_bank_reset_pending() {
        let mut bank = ParameterBank::new();
        bank.write_pending(cube(), ParamSlot::std(Channel::XScale), 1.0)
            .unwrap();
        bank.reset_pending_to_default();
        assert!(!bank.has_uncommitted_changes());
    }
}
