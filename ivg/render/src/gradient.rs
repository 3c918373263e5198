//! Materialized gradient parameters.
use arrayvec::ArrayVec;
use ivg_io::{GradientShape, GradientSpread};
use rgb::RGBA8;

/// A color/offset gradient stop. Offsets lie in `[0, 1]` and are strictly
/// increasing within a stop list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stop {
    pub offset: f64,
    pub color: RGBA8,
}

/// The fill parameters of a single gradient-painted path, materialized from
/// the drawing virtual machine's register banks.
///
/// Gradient coordinate space is where a linear gradient ranges from `x = 0`
/// to `x = 1` and a radial gradient is the unit circle around the origin.
/// [`Gradient::transform`] maps target pixel coordinates into that space, so
/// a rasterizer backend can sample without knowing about view boxes.
#[derive(Debug, Clone)]
pub struct Gradient {
    shape: GradientShape,
    spread: GradientSpread,
    pix2grad: [f64; 6],
    stops: ArrayVec<[Stop; 64]>,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            shape: GradientShape::Linear,
            spread: GradientSpread::None,
            pix2grad: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            stops: ArrayVec::new(),
        }
    }
}

impl Gradient {
    pub(crate) fn init(
        &mut self,
        shape: GradientShape,
        spread: GradientSpread,
        pix2grad: [f64; 6],
        stops: ArrayVec<[Stop; 64]>,
    ) {
        self.shape = shape;
        self.spread = spread;
        self.pix2grad = pix2grad;
        self.stops = stops;
    }

    pub fn shape(&self) -> GradientShape {
        self.shape
    }

    /// How to spread the gradient outside the `[0, 1]` offset range.
    pub fn spread(&self) -> GradientSpread {
        self.spread
    }

    /// The pixel space to gradient space affine transformation matrix, in
    /// row major order:
    ///
    /// ```text
    /// | a b c |
    /// | d e f |
    /// ```
    pub fn transform(&self) -> [f64; 6] {
        self.pix2grad
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }
}
