//! Renders IconVG graphics onto a pluggable rasterizer sink.
//!
//! [`Renderer`] implements `ivg_io::Destination`, so it can be handed
//! directly to `ivg_io::decode`. It resolves fill colors and gradients
//! against the drawing virtual machine's registers, maps view box
//! coordinates to the target rectangle, and lowers every drawing operation
//! (including smooth curves and elliptical arcs) to the primitive calls of
//! the [`Rasterizer`] trait. The actual pixel work is the sink's business.
use cgmath::Point2;
use rgb::RGBA8;

mod gradient;
mod render;

pub use crate::{
    gradient::{Gradient, Stop},
    render::Renderer,
};

/// An axis-aligned pixel rectangle. The minimum coordinate is inclusive and
/// the maximum coordinate is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub min: Point2<i32>,
    pub max: Point2<i32>,
}

impl Rect {
    pub fn new(min: Point2<i32>, max: Point2<i32>) -> Self {
        Self { min, max }
    }

    pub fn zero() -> Self {
        Self::new(Point2::new(0, 0), Point2::new(0, 0))
    }

    pub fn width(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }
}

/// What a path is filled with, as handed to [`Rasterizer::draw`].
#[derive(Debug, Clone, Copy)]
pub enum Paint<'a> {
    /// A uniform alpha-premultiplied color.
    Flat(RGBA8),
    /// A linear or radial gradient; see [`Gradient`] for the sampling
    /// parameters.
    Gradient(&'a Gradient),
}

/// A 2-D vector graphics rasterizer: the outbound interface from the
/// renderer to the actual pixel backend.
pub trait Rasterizer {
    /// Resets the rasterizer for a target of the given size.
    fn reset(&mut self, width: i32, height: i32);

    /// The width and height passed to `reset`.
    fn size(&self) -> (i32, i32);

    /// The rectangle from (0, 0) to the width and height passed to `reset`.
    fn bounds(&self) -> Rect;

    /// The location of the path-drawing pen: the last point of the most
    /// recent `move_to`/`line_to`/`quad_to`/`cube_to` call.
    fn pen(&self) -> Point2<f32>;

    /// Starts a new path and moves the pen to `p`. Coordinates are allowed
    /// to be out of bounds.
    fn move_to(&mut self, p: Point2<f32>);

    /// Adds a line segment from the pen to `p`.
    fn line_to(&mut self, p: Point2<f32>);

    /// Adds a quadratic Bézier segment from the pen via `cp` to `p`.
    fn quad_to(&mut self, cp: Point2<f32>, p: Point2<f32>);

    /// Adds a cubic Bézier segment from the pen via `cp1` and `cp2` to `p`.
    fn cube_to(&mut self, cp1: Point2<f32>, cp2: Point2<f32>, p: Point2<f32>);

    /// Closes the current path.
    fn close_path(&mut self);

    /// Composites `paint` over the rectangle `rect` of the target, masked by
    /// the accumulated path. `origin` aligns `rect.min` within the paint
    /// source.
    fn draw(&mut self, rect: Rect, paint: Paint<'_>, origin: Point2<i32>);
}
