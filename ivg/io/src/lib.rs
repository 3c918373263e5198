//! Implements the decoder and encoder of the IconVG compact binary vector
//! graphics format.
//!
//! An IconVG graphic is a byte stream interpreted by a small drawing virtual
//! machine: 64 color registers (CREG), 64 number registers (NREG), two
//! selector registers (CSEL and NSEL), a suggested palette, a view box, and a
//! level-of-detail range. Styling opcodes mutate the registers; drawing
//! opcodes trace a filled path.
//!
//! The receive side of the stream is modeled by the [`Destination`] trait.
//! [`Encoder`] implements it by appending bytes, so feeding a decoded stream
//! back into an encoder reproduces the input exactly. A renderer (see the
//! `ivg_render` crate) implements it by rasterizing.
use cgmath::{Point2, Vector2};
use rgb::RGBA8;

mod color;
mod dec;
mod enc;
mod error;
mod num;

pub use crate::{
    color::{
        decode_color1, is_gradient, is_valid_premul, Color, GradientDesc, GradientShape,
        GradientSpread,
    },
    dec::{decode, decode_metadata, decode_with, DecodeOptions},
    enc::Encoder,
    error::Error,
};

/// The four byte prefix identifying an IconVG graphic.
pub const MAGIC: [u8; 4] = [0x89, b'I', b'V', b'G'];

/// Metadata identifier for the view box chunk.
pub const MID_VIEW_BOX: u32 = 0;
/// Metadata identifier for the suggested palette chunk.
pub const MID_SUGGESTED_PALETTE: u32 = 1;

/// A 64 color palette. When encoding, it is the suggested palette to place
/// within the IconVG graphic. When decoding, it is either the optional
/// palette passed to [`decode_with`], or if no optional palette was given,
/// the suggested palette within the IconVG graphic.
pub type Palette = [RGBA8; 64];

/// The default palette: 64 × opaque black.
pub const DEFAULT_PALETTE: Palette = [RGBA8 {
    r: 0x00,
    g: 0x00,
    b: 0x00,
    a: 0xff,
}; 64];

/// The rectangle in graphic coordinates defining the extent of an IconVG
/// graphic.
///
/// `min` is inclusive and `max` is exclusive, and `min <= max` must hold on
/// both axes. An IconVG graphic is scalable; these dimensions do not
/// necessarily map 1:1 to pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min: Point2<f32>,
    pub max: Point2<f32>,
}

/// Determines how a view box is sized with respect to a bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreserveAspectRatio {
    /// Stretches or squashes the view box to meet the rectangle.
    None,
    /// Fits the view box inside the rectangle maintaining its aspect ratio.
    Meet,
    /// Fills the rectangle maintaining the view box's aspect ratio.
    Slice,
}

/// Aligns the minimum of the view box with the minimum of the rectangle.
pub const ALIGN_MIN: f32 = 0.0;
/// Aligns the middle of the view box with the middle of the rectangle.
pub const ALIGN_MID: f32 = 0.5;
/// Aligns the maximum of the view box with the maximum of the rectangle.
pub const ALIGN_MAX: f32 = 1.0;

impl ViewBox {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Point2::new(min_x, min_y),
            max: Point2::new(max_x, max_y),
        }
    }

    /// The view box's size in both dimensions.
    pub fn size(&self) -> Vector2<f32> {
        self.max - self.min
    }

    /// `true` if `min <= max` holds on both axes and every coordinate is
    /// finite.
    pub fn is_valid(&self) -> bool {
        let finite = self.min.x.is_finite()
            && self.min.y.is_finite()
            && self.max.x.is_finite()
            && self.max.y.is_finite();
        finite && self.min.x <= self.max.x && self.min.y <= self.max.y
    }

    /// Resizes and positions the view box in the given rectangle. `ax` and
    /// `ay` place the resized view box within `rect`; for example
    /// `(ALIGN_MID, ALIGN_MID)` centers it.
    pub fn size_to_rect(&self, rect: ViewBox, aspect: PreserveAspectRatio, ax: f32, ay: f32) -> ViewBox {
        let rd = rect.size();
        let vd = self.size();
        let vb_ar = vd.x / vd.y;
        let mut d = rd;
        match aspect {
            PreserveAspectRatio::Meet => {
                if d.x / d.y < vb_ar {
                    d.y = d.x / vb_ar;
                } else {
                    d.x = d.y * vb_ar;
                }
            }
            PreserveAspectRatio::Slice => {
                if d.x / d.y < vb_ar {
                    d.x = d.y * vb_ar;
                } else {
                    d.y = d.x / vb_ar;
                }
            }
            PreserveAspectRatio::None => {}
        }
        let min_x = rect.min.x + (rd.x - d.x) * ax;
        let min_y = rect.min.y + (rd.y - d.y) * ay;
        ViewBox::new(min_x, min_y, min_x + d.x, min_y + d.y)
    }
}

impl Default for ViewBox {
    fn default() -> Self {
        ViewBox::new(-32.0, -32.0, 32.0, 32.0)
    }
}

/// An IconVG graphic's metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub view_box: ViewBox,
    pub palette: Palette,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            view_box: ViewBox::default(),
            palette: DEFAULT_PALETTE,
        }
    }
}

/// Handles the actions decoded from an IconVG graphic's opcodes.
///
/// When passed to [`decode`], the first method called (if any) will be
/// `reset`. No methods are called at all if an error is encountered in the
/// encoded form before the metadata is fully decoded.
///
/// `adj` arguments address a register relative to the corresponding selector:
/// the register written is `CREG[(CSEL - adj) & 0x3f]` (or the NREG/NSEL
/// analogue). When `incr` is set, the selector is incremented afterwards.
pub trait Destination {
    fn reset(&mut self, view_box: ViewBox, palette: &Palette);

    fn csel(&self) -> u8;
    fn set_csel(&mut self, csel: u8);
    fn nsel(&self) -> u8;
    fn set_nsel(&mut self, nsel: u8);
    fn set_creg(&mut self, adj: u8, incr: bool, color: Color);
    fn set_nreg(&mut self, adj: u8, incr: bool, value: f32);
    fn set_lod(&mut self, lod0: f32, lod1: f32);

    fn start_path(&mut self, adj: u8, p: Point2<f32>);
    fn close_path_end_path(&mut self);
    fn close_path_abs_move_to(&mut self, p: Point2<f32>);
    fn close_path_rel_move_to(&mut self, p: Point2<f32>);

    fn abs_h_line_to(&mut self, x: f32);
    fn rel_h_line_to(&mut self, x: f32);
    fn abs_v_line_to(&mut self, y: f32);
    fn rel_v_line_to(&mut self, y: f32);
    fn abs_line_to(&mut self, p: Point2<f32>);
    fn rel_line_to(&mut self, p: Point2<f32>);
    fn abs_smooth_quad_to(&mut self, p: Point2<f32>);
    fn rel_smooth_quad_to(&mut self, p: Point2<f32>);
    fn abs_quad_to(&mut self, cp: Point2<f32>, p: Point2<f32>);
    fn rel_quad_to(&mut self, cp: Point2<f32>, p: Point2<f32>);
    fn abs_smooth_cube_to(&mut self, cp2: Point2<f32>, p: Point2<f32>);
    fn rel_smooth_cube_to(&mut self, cp2: Point2<f32>, p: Point2<f32>);
    fn abs_cube_to(&mut self, cp1: Point2<f32>, cp2: Point2<f32>, p: Point2<f32>);
    fn rel_cube_to(&mut self, cp1: Point2<f32>, cp2: Point2<f32>, p: Point2<f32>);
    fn abs_arc_to(&mut self, r: Vector2<f32>, x_axis_rotation: f32, large_arc: bool, sweep: bool, p: Point2<f32>);
    fn rel_arc_to(&mut self, r: Vector2<f32>, x_axis_rotation: f32, large_arc: bool, sweep: bool, p: Point2<f32>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_box_validity() {
        assert!(ViewBox::default().is_valid());
        assert!(!ViewBox::new(1.0, 0.0, 0.0, 0.0).is_valid());
        assert!(!ViewBox::new(0.0, 0.0, f32::NAN, 0.0).is_valid());
        assert!(!ViewBox::new(0.0, 0.0, f32::INFINITY, 0.0).is_valid());
    }

    #[test]
    fn size_to_rect_meet_centers() {
        let vb = ViewBox::new(0.0, 0.0, 32.0, 16.0);
        let rect = ViewBox::new(0.0, 0.0, 64.0, 64.0);
        let fitted = vb.size_to_rect(rect, PreserveAspectRatio::Meet, ALIGN_MID, ALIGN_MID);
        assert_eq!(fitted, ViewBox::new(0.0, 16.0, 64.0, 48.0));
    }
}
