//! Encoder.
use cgmath::{Point2, Vector2};

use crate::{
    color, num, Color, Destination, Error, Metadata, Palette, ViewBox, DEFAULT_PALETTE, MAGIC,
    MID_SUGGESTED_PALETTE, MID_VIEW_BOX,
};

/// Encodes an IconVG graphic.
///
/// This type implements [`Destination`], so it can be driven directly by
/// user code, by a path data generator, or by [`decode`](crate::decode) —
/// the latter reproduces the decoded stream byte for byte, because every
/// number and color is written in its shortest legal form.
///
/// The metadata passed to `reset` is emitted by [`Encoder::bytes`], which
/// prepends the magic identifier and elides chunks whose content equals the
/// defaults.
#[derive(Debug, Clone)]
pub struct Encoder {
    /// Forces every coordinate in the drawing body into the 4 byte form,
    /// trading size for precision. Metadata is not affected.
    pub high_resolution_coordinates: bool,

    buf: Vec<u8>,
    metadata: Metadata,
    mode: Mode,
    csel: u8,
    nsel: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Styling,
    Drawing,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            high_resolution_coordinates: false,
            buf: Vec::new(),
            metadata: Metadata::default(),
            mode: Mode::Styling,
            csel: 0,
            nsel: 0,
        }
    }

    /// The encoded graphic: magic identifier, metadata chunks, then the
    /// drawing body. Fails if a started path has not been ended.
    pub fn bytes(&self) -> Result<Vec<u8>, Error> {
        if self.mode == Mode::Drawing {
            return Err(Error::UnfinishedPath);
        }

        let mut out = Vec::with_capacity(MAGIC.len() + 8 + self.buf.len());
        out.extend_from_slice(&MAGIC);

        let view_box = self.metadata.view_box != ViewBox::default();
        let palette = self.metadata.palette != DEFAULT_PALETTE;
        num::encode_natural(&mut out, view_box as u32 + palette as u32);

        if view_box {
            let mut chunk = Vec::new();
            num::encode_natural(&mut chunk, MID_VIEW_BOX);
            let vb = self.metadata.view_box;
            for &v in &[vb.min.x, vb.min.y, vb.max.x, vb.max.y] {
                num::encode_coordinate(&mut chunk, v);
            }
            num::encode_natural(&mut out, chunk.len() as u32);
            out.extend_from_slice(&chunk);
        }

        if palette {
            let mut chunk = Vec::new();
            num::encode_natural(&mut chunk, MID_SUGGESTED_PALETTE);
            encode_palette(&mut chunk, &self.metadata.palette);
            num::encode_natural(&mut out, chunk.len() as u32);
            out.extend_from_slice(&chunk);
        }

        out.extend_from_slice(&self.buf);
        Ok(out)
    }

    fn put_coordinate(&mut self, v: f32) {
        if self.high_resolution_coordinates {
            num::encode_4byte_real(&mut self.buf, v);
        } else {
            num::encode_coordinate(&mut self.buf, v);
        }
    }

    fn put_point(&mut self, p: Point2<f32>) {
        self.put_coordinate(p.x);
        self.put_coordinate(p.y);
    }

    fn put_segment_op(&mut self, opcode: u8) {
        assert_eq!(self.mode, Mode::Drawing, "no active path");
        self.buf.push(opcode);
    }
}

impl Destination for Encoder {
    fn reset(&mut self, view_box: ViewBox, palette: &Palette) {
        // `high_resolution_coordinates` is a configuration knob, not stream
        // state, and survives a reset.
        self.metadata = Metadata {
            view_box,
            palette: *palette,
        };
        self.buf.clear();
        self.mode = Mode::Styling;
        self.csel = 0;
        self.nsel = 0;
    }

    fn csel(&self) -> u8 {
        self.csel
    }

    fn set_csel(&mut self, csel: u8) {
        assert_eq!(self.mode, Mode::Styling, "unfinished path");
        self.csel = csel & 0x3f;
        self.buf.push(csel & 0x3f);
    }

    fn nsel(&self) -> u8 {
        self.nsel
    }

    fn set_nsel(&mut self, nsel: u8) {
        assert_eq!(self.mode, Mode::Styling, "unfinished path");
        self.nsel = nsel & 0x3f;
        self.buf.push(0x40 | (nsel & 0x3f));
    }

    fn set_creg(&mut self, adj: u8, incr: bool, color: Color) {
        assert_eq!(self.mode, Mode::Styling, "unfinished path");
        let adj = if incr { 0x07 } else { adj & 0x07 };
        if let Some(x) = color.encode1() {
            self.buf.push(0x80 | adj);
            self.buf.push(x);
        } else if let Some(x) = color.encode2() {
            self.buf.push(0x88 | adj);
            self.buf.extend_from_slice(&x);
        } else if let Some(x) = color.encode3_direct() {
            self.buf.push(0x90 | adj);
            self.buf.extend_from_slice(&x);
        } else if let Some(x) = color.encode3_indirect() {
            self.buf.push(0xa0 | adj);
            self.buf.extend_from_slice(&x);
        } else if let Some(x) = color.encode4() {
            self.buf.push(0x98 | adj);
            self.buf.extend_from_slice(&x);
        } else {
            log::warn!("iconvg: unencodable color {:?}; writing opaque black", color);
            self.buf.push(0x80 | adj);
            self.buf.push(0x00);
        }
        if incr {
            self.csel = self.csel.wrapping_add(1) & 0x3f;
        }
    }

    fn set_nreg(&mut self, adj: u8, incr: bool, value: f32) {
        assert_eq!(self.mode, Mode::Styling, "unfinished path");
        let adj = if incr { 0x07 } else { adj & 0x07 };
        if num::zero_to_one_width(value) <= 2 {
            self.buf.push(0xb8 | adj);
            num::encode_zero_to_one(&mut self.buf, value);
        } else if num::coordinate_width(value) <= 2 {
            self.buf.push(0xb0 | adj);
            num::encode_coordinate(&mut self.buf, value);
        } else {
            self.buf.push(0xa8 | adj);
            num::encode_real(&mut self.buf, value);
        }
        if incr {
            self.nsel = self.nsel.wrapping_add(1) & 0x3f;
        }
    }

    fn set_lod(&mut self, lod0: f32, lod1: f32) {
        assert_eq!(self.mode, Mode::Styling, "unfinished path");
        self.buf.push(0xc7);
        num::encode_real(&mut self.buf, lod0);
        num::encode_real(&mut self.buf, lod1);
    }

    fn start_path(&mut self, adj: u8, p: Point2<f32>) {
        assert_eq!(self.mode, Mode::Styling, "unfinished path");
        debug_assert!(adj < 7, "start_path adjustment out of range");
        self.buf.push(0xc0 | (adj & 0x07));
        self.mode = Mode::Drawing;
        self.put_point(p);
    }

    fn close_path_end_path(&mut self) {
        self.put_segment_op(0xe1);
        self.mode = Mode::Styling;
    }

    fn close_path_abs_move_to(&mut self, p: Point2<f32>) {
        self.put_segment_op(0xe2);
        self.put_point(p);
    }

    fn close_path_rel_move_to(&mut self, p: Point2<f32>) {
        self.put_segment_op(0xe3);
        self.put_point(p);
    }

    fn abs_h_line_to(&mut self, x: f32) {
        self.put_segment_op(0xe6);
        self.put_coordinate(x);
    }

    fn rel_h_line_to(&mut self, x: f32) {
        self.put_segment_op(0xe7);
        self.put_coordinate(x);
    }

    fn abs_v_line_to(&mut self, y: f32) {
        self.put_segment_op(0xe8);
        self.put_coordinate(y);
    }

    fn rel_v_line_to(&mut self, y: f32) {
        self.put_segment_op(0xe9);
        self.put_coordinate(y);
    }

    fn abs_line_to(&mut self, p: Point2<f32>) {
        self.put_segment_op(0x00);
        self.put_point(p);
    }

    fn rel_line_to(&mut self, p: Point2<f32>) {
        self.put_segment_op(0x20);
        self.put_point(p);
    }

    fn abs_smooth_quad_to(&mut self, p: Point2<f32>) {
        self.put_segment_op(0x40);
        self.put_point(p);
    }

    fn rel_smooth_quad_to(&mut self, p: Point2<f32>) {
        self.put_segment_op(0x50);
        self.put_point(p);
    }

    fn abs_quad_to(&mut self, cp: Point2<f32>, p: Point2<f32>) {
        self.put_segment_op(0x60);
        self.put_point(cp);
        self.put_point(p);
    }

    fn rel_quad_to(&mut self, cp: Point2<f32>, p: Point2<f32>) {
        self.put_segment_op(0x70);
        self.put_point(cp);
        self.put_point(p);
    }

    fn abs_smooth_cube_to(&mut self, cp2: Point2<f32>, p: Point2<f32>) {
        self.put_segment_op(0x80);
        self.put_point(cp2);
        self.put_point(p);
    }

    fn rel_smooth_cube_to(&mut self, cp2: Point2<f32>, p: Point2<f32>) {
        self.put_segment_op(0x90);
        self.put_point(cp2);
        self.put_point(p);
    }

    fn abs_cube_to(&mut self, cp1: Point2<f32>, cp2: Point2<f32>, p: Point2<f32>) {
        self.put_segment_op(0xa0);
        self.put_point(cp1);
        self.put_point(cp2);
        self.put_point(p);
    }

    fn rel_cube_to(&mut self, cp1: Point2<f32>, cp2: Point2<f32>, p: Point2<f32>) {
        self.put_segment_op(0xb0);
        self.put_point(cp1);
        self.put_point(cp2);
        self.put_point(p);
    }

    fn abs_arc_to(&mut self, r: Vector2<f32>, x_axis_rotation: f32, large_arc: bool, sweep: bool, p: Point2<f32>) {
        self.put_segment_op(0xc0);
        self.put_arc(r, x_axis_rotation, large_arc, sweep, p);
    }

    fn rel_arc_to(&mut self, r: Vector2<f32>, x_axis_rotation: f32, large_arc: bool, sweep: bool, p: Point2<f32>) {
        self.put_segment_op(0xd0);
        self.put_arc(r, x_axis_rotation, large_arc, sweep, p);
    }
}

impl Encoder {
    fn put_arc(&mut self, r: Vector2<f32>, x_axis_rotation: f32, large_arc: bool, sweep: bool, p: Point2<f32>) {
        self.put_coordinate(r.x);
        self.put_coordinate(r.y);
        num::encode_angle(&mut self.buf, x_axis_rotation);
        num::encode_natural(&mut self.buf, large_arc as u32 | (sweep as u32) << 1);
        self.put_point(p);
    }
}

/// Appends the suggested palette payload: a header byte holding the entry
/// count minus one and the per-color format, then every entry in that
/// format. The format is the tightest of the four that fits all 64 entries.
fn encode_palette(buf: &mut Vec<u8>, palette: &Palette) {
    let format: u8 = if palette.iter().all(|&c| Color::Rgba(c).encode1().is_some()) {
        0
    } else if palette.iter().all(|&c| color::is_2(c)) {
        1
    } else if palette.iter().all(|&c| color::is_3(c)) {
        2
    } else {
        3
    };
    buf.push((palette.len() as u8 - 1) | format << 6);
    for &c in palette.iter() {
        let c = Color::Rgba(c);
        match format {
            0 => buf.push(c.encode1().unwrap_or(0x00)),
            1 => buf.extend_from_slice(&c.encode2().unwrap_or([0x00, 0x0f])),
            2 => buf.extend_from_slice(&c.encode3_direct().unwrap_or([0x00; 3])),
            _ => buf.extend_from_slice(&c.encode4().unwrap_or([0x00, 0x00, 0x00, 0xff])),
        }
    }
}
