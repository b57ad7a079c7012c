//! Shape kinds, parameter-set labels and shape-selection weights.

use serde::{Deserialize, Serialize};

use crate::random::UniformSource;

/// Number of spawnable shape kinds.
pub const SHAPE_COUNT: usize = 12;

/// Number of parameter sets: one per shape plus the global set.
pub const LABEL_COUNT: usize = SHAPE_COUNT + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Cube,
    Sphere,
    Icosphere,
    Cylinder,
    Pyramid,
    Cone,
    Capsule,
    Torus,
    LBlock,
    TBlock,
    Teapot,
    Suzanne,
}

impl Shape {
    pub const ALL: [Shape; SHAPE_COUNT] = [
        Shape::Cube,
        Shape::Sphere,
        Shape::Icosphere,
        Shape::Cylinder,
        Shape::Pyramid,
        Shape::Cone,
        Shape::Capsule,
        Shape::Torus,
        Shape::LBlock,
        Shape::TBlock,
        Shape::Teapot,
        Shape::Suzanne,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Shape::Cube => "cube",
            Shape::Sphere => "sphere",
            Shape::Icosphere => "icosphere",
            Shape::Cylinder => "cylinder",
            Shape::Pyramid => "pyramid",
            Shape::Cone => "cone",
            Shape::Capsule => "capsule",
            Shape::Torus => "torus",
            Shape::LBlock => "l_block",
            Shape::TBlock => "t_block",
            Shape::Teapot => "teapot",
            Shape::Suzanne => "suzanne",
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which parameter set a value belongs to.
///
/// Serialized as the shape name or `"global"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParamLabel {
    Shape(Shape),
    Global,
}

impl ParamLabel {
    pub const GLOBAL_INDEX: usize = SHAPE_COUNT;

    /// Dense index in `0..13`; the global set sits last.
    pub fn index(self) -> usize {
        match self {
            ParamLabel::Shape(shape) => shape.index(),
            ParamLabel::Global => Self::GLOBAL_INDEX,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        if index == Self::GLOBAL_INDEX {
            return Some(ParamLabel::Global);
        }
        Shape::from_index(index).map(ParamLabel::Shape)
    }

    pub fn all() -> impl Iterator<Item = ParamLabel> {
        (0..LABEL_COUNT).filter_map(Self::from_index)
    }

    pub fn is_global(self) -> bool {
        self == ParamLabel::Global
    }
}

impl From<Shape> for ParamLabel {
    fn from(shape: Shape) -> Self {
        ParamLabel::Shape(shape)
    }
}

impl std::fmt::Display for ParamLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamLabel::Shape(shape) => shape.fmt(f),
            ParamLabel::Global => f.write_str("global"),
        }
    }
}

impl std::str::FromStr for ParamLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace('-', "_");
        if lowered == "global" {
            return Ok(ParamLabel::Global);
        }
        Shape::ALL
            .iter()
            .find(|shape| shape.name() == lowered)
            .map(|&shape| ParamLabel::Shape(shape))
            .ok_or_else(|| format!("unknown parameter label {s:?}"))
    }
}

impl TryFrom<String> for ParamLabel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParamLabel> for String {
    fn from(label: ParamLabel) -> Self {
        label.to_string()
    }
}

/// Relative spawn weights, one per shape.
///
/// Negative and non-finite inputs are stored as zero. With every weight at
/// zero, shapes are chosen uniformly and every shape's selection
/// probability is 1. Probabilities and choices are computed on weights
/// rescaled by the largest one, so a sum that overflows `f64` still
/// normalizes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeWeights([f64; SHAPE_COUNT]);

impl ShapeWeights {
    /// Builds weights from an array in [`Shape::ALL`] order.
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::shape::{Shape, ShapeWeights};
    /// let mut raw = [0.0; 12];
    /// raw[Shape::Torus.index()] = 2.0;
    /// raw[Shape::Cube.index()] = -1.0;
    /// let w = ShapeWeights::new(raw);
    /// assert_eq!(w.get(Shape::Torus), 2.0);
    /// assert_eq!(w.get(Shape::Cube), 0.0);
    /// ```
    pub fn new(weights: [f64; SHAPE_COUNT]) -> Self {
        let mut w = Self::default();
        for shape in Shape::ALL {
            w.set(shape, weights[shape.index()]);
        }
        w
    }

    /// All weights equal to zero (the session default).
    pub fn zero() -> Self {
        Self::default()
    }

    /// Stored weight of `shape`.
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::shape::{Shape, ShapeWeights};
    /// assert_eq!(ShapeWeights::zero().get(Shape::Cone), 0.0);
    /// ```
    pub fn get(&self, shape: Shape) -> f64 {
        self.0[shape.index()]
    }

    /// Sets the weight of `shape`; negative, NaN and infinite values become 0.
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::shape::{Shape, ShapeWeights};
    /// let mut w = ShapeWeights::zero();
    /// w.set(Shape::Cone, 0.5);
    /// assert_eq!(w.get(Shape::Cone), 0.5);
    /// w.set(Shape::Cone, f64::INFINITY);
    /// assert_eq!(w.get(Shape::Cone), 0.0);
    /// ```
    pub fn set(&mut self, shape: Shape, weight: f64) {
        self.0[shape.index()] = if weight.is_finite() && weight > 0.0 { weight } else { 0.0 };
    }

    pub fn as_array(&self) -> &[f64; SHAPE_COUNT] {
        &self.0
    }

    /// Plain sum of the weights. May overflow to `+∞` for huge weights.
    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Weights divided by the largest one, with their sum.
    ///
    /// Every entry lies in `[0, 1]` so the sum stays finite. Returns `None`
    /// when every weight is zero.
    fn normalized(&self) -> Option<([f64; SHAPE_COUNT], f64)> {
        let peak = self.0.iter().copied().fold(0.0_f64, f64::max);
        if peak <= 0.0 {
            return None;
        }
        let scaled = self.0.map(|w| w / peak);
        let total = scaled.iter().sum();
        Some((scaled, total))
    }

    /// Probability that `shape` is chosen: `w(shape) / Σw`, or 1 when the
    /// total is zero.
    ///
    /// # Examples
    /// ```
    /// use anomaly_synth::shape::{Shape, ShapeWeights};
    /// let mut w = ShapeWeights::zero();
    /// assert_eq!(w.selection_probability(Shape::Torus), 1.0);
    /// w.set(Shape::Cube, 1.0);
    /// w.set(Shape::Cone, 3.0);
    /// assert_eq!(w.selection_probability(Shape::Cone), 0.75);
    /// ```
    pub fn selection_probability(&self, shape: Shape) -> f64 {
        match self.normalized() {
            Some((scaled, total)) => scaled[shape.index()] / total,
            None => 1.0,
        }
    }

    /// Chooses a shape by weight.
    ///
    /// Draws `next_int(0, 12)` when every weight is zero. Otherwise draws
    /// one uniform `r·Σw` and walks the cumulative weights; zero-weight
    /// shapes are never returned.
    pub fn choose<S: UniformSource + ?Sized>(&self, rng: &mut S) -> Shape {
        let Some((scaled, total)) = self.normalized() else {
            let idx = rng.next_int(0, SHAPE_COUNT as i64);
            return usize::try_from(idx)
                .ok()
                .and_then(Shape::from_index)
                .unwrap_or(Shape::Cube);
        };

        let threshold = rng.next_uniform() * total;
        let mut cumulative = 0.0;
        let mut last_positive = Shape::Cube;
        for shape in Shape::ALL {
            let w = scaled[shape.index()];
            if w > 0.0 {
                cumulative += w;
                last_positive = shape;
                if threshold <= cumulative {
                    return shape;
                }
            }
        }

        // Fallback (floating-point edge case)
        last_positive
    }

    /// Replaces every weight with a fresh uniform draw, in shape order.
    pub fn randomize<S: UniformSource + ?Sized>(&mut self, rng: &mut S) {
        for shape in Shape::ALL {
            let w = rng.next_uniform();
            self.set(shape, w);
        }
    }
}
