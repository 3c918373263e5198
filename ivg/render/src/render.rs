//! The renderer: an `ivg_io::Destination` that drives a [`Rasterizer`].
use arrayvec::ArrayVec;
use cgmath::{Point2, Vector2};
use rgb::RGBA8;
use std::f64::consts::PI;

use ivg_io::{
    is_valid_premul, Color, Destination, GradientDesc, Palette, ViewBox, DEFAULT_PALETTE,
};

use crate::{gradient::Stop, Gradient, Paint, Rasterizer, Rect};

/// The previous segment's smooth-reflection eligibility. A smooth quadratic
/// or cubic segment reflects the previous control point only when the
/// previous segment was of the matching family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SmoothType {
    None,
    Quad,
    Cube,
}

#[derive(Debug, Clone, Copy)]
enum Fill {
    Flat(RGBA8),
    Gradient,
}

/// Renders an IconVG graphic onto a [`Rasterizer`].
///
/// The graphic (which does not have a fixed size in pixels) is scaled in the
/// X and Y dimensions to fit the target rectangle; the scaling factors may
/// differ in the two dimensions.
///
/// A renderer holds the drawing virtual machine's mutable state, so a single
/// instance must not be shared between concurrent decodes.
pub struct Renderer<R> {
    ras: R,
    rect: Rect,

    // Scale and bias map the view box onto (0, 0)-(width, height).
    scale: Vector2<f32>,
    bias: Vector2<f32>,

    view_box: ViewBox,
    palette: Palette,

    lod: (f32, f32),
    csel: u8,
    nsel: u8,

    disabled: bool,

    prev_smooth: SmoothType,
    prev_smooth_point: Point2<f32>,

    fill: Fill,
    gradient: Gradient,

    creg: [RGBA8; 64],
    nreg: [f32; 64],
}

impl<R: Rasterizer> Renderer<R> {
    /// Constructs a renderer drawing into `rasterizer`, scaled to fill
    /// `rect`. An empty rectangle collapses to the zero rectangle.
    pub fn new(rasterizer: R, rect: Rect) -> Self {
        let mut this = Self {
            ras: rasterizer,
            rect: if rect.is_empty() { Rect::zero() } else { rect },
            scale: Vector2::new(1.0, 1.0),
            bias: Vector2::new(0.0, 0.0),
            view_box: ViewBox::default(),
            palette: DEFAULT_PALETTE,
            lod: (0.0, f32::INFINITY),
            csel: 0,
            nsel: 0,
            disabled: false,
            prev_smooth: SmoothType::None,
            prev_smooth_point: Point2::new(0.0, 0.0),
            fill: Fill::Flat(RGBA8::new(0x00, 0x00, 0x00, 0xff)),
            gradient: Gradient::default(),
            creg: DEFAULT_PALETTE,
            nreg: [0.0; 64],
        };
        this.recalc_transform();
        this
    }

    /// Replaces the rasterizer and target rectangle. Call between decodes to
    /// reuse the renderer for a different target.
    pub fn set_rasterizer(&mut self, rasterizer: R, rect: Rect) {
        self.ras = rasterizer;
        self.rect = if rect.is_empty() { Rect::zero() } else { rect };
        self.recalc_transform();
    }

    pub fn rasterizer(&self) -> &R {
        &self.ras
    }

    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.ras
    }

    pub fn into_rasterizer(self) -> R {
        self.ras
    }

    fn recalc_transform(&mut self) {
        let size = self.view_box.size();
        self.scale.x = self.rect.width() as f32 / size.x;
        self.bias.x = -self.view_box.min.x;
        self.scale.y = self.rect.height() as f32 / size.y;
        self.bias.y = -self.view_box.min.y;
    }

    fn abs(&self, p: Point2<f32>) -> Point2<f32> {
        Point2::new(
            self.scale.x * (p.x + self.bias.x),
            self.scale.y * (p.y + self.bias.y),
        )
    }

    /// Maps a target pixel point back into view box coordinates.
    fn unabs(&self, p: Point2<f32>) -> Point2<f32> {
        Point2::new(p.x / self.scale.x - self.bias.x, p.y / self.scale.y - self.bias.y)
    }

    fn rel(&self, p: Point2<f32>) -> Point2<f32> {
        self.ras.pen() + Vector2::new(self.scale.x * p.x, self.scale.y * p.y)
    }

    /// The implicit control point for smooth quadratic and smooth cubic
    /// Bézier curves: the reflection of the previous control point about the
    /// pen, or the pen itself when the previous segment was not of the
    /// matching family.
    fn implicit_smooth_point(&self, this_type: SmoothType) -> Point2<f32> {
        let pen = self.ras.pen();
        if self.prev_smooth != this_type {
            return pen;
        }
        Point2::new(
            2.0 * pen.x - self.prev_smooth_point.x,
            2.0 * pen.y - self.prev_smooth_point.y,
        )
    }

    fn init_gradient(&mut self, desc: GradientDesc) -> bool {
        let mut stops = ArrayVec::<[Stop; 64]>::new();
        let mut prev = f32::NEG_INFINITY;
        for i in 0..desc.num_stops {
            let c = self.creg[usize::from((desc.c_base + i) & 0x3f)];
            if !is_valid_premul(c) {
                return false;
            }
            // Stop offsets live in [0, 1] and must be strictly increasing.
            let n = self.nreg[usize::from((desc.n_base + i) & 0x3f)];
            if !(0.0 <= n && n <= 1.0) || n <= prev {
                return false;
            }
            prev = n;
            stops.push(Stop {
                offset: f64::from(n),
                color: c,
            });
        }

        // The affine matrix in the six registers below n_base goes from
        // graphic coordinate space (the view box) to gradient space. The
        // rasterizer samples in pixel space, so premultiply by the inverse
        // of the view box to pixel transform.
        let inv_sx = 1.0 / f64::from(self.scale.x);
        let inv_sy = 1.0 / f64::from(self.scale.y);
        let bx = f64::from(self.bias.x);
        let by = f64::from(self.bias.y);

        let nreg = &self.nreg;
        let reg = |i: u8| f64::from(nreg[usize::from(i & 0x3f)]);
        let a = reg(desc.n_base.wrapping_sub(6));
        let b = reg(desc.n_base.wrapping_sub(5));
        let c = reg(desc.n_base.wrapping_sub(4));
        let d = reg(desc.n_base.wrapping_sub(3));
        let e = reg(desc.n_base.wrapping_sub(2));
        let f = reg(desc.n_base.wrapping_sub(1));

        let pix2grad = [
            a * inv_sx,
            b * inv_sy,
            c - a * bx - b * by,
            d * inv_sx,
            e * inv_sy,
            f - d * bx - e * by,
        ];

        self.gradient.init(desc.shape, desc.spread, pix2grad, stops);
        true
    }

    /// Approximates an elliptical arc segment spanning at most a quarter
    /// turn plus a little by a single cubic Bézier curve.
    #[allow(clippy::too_many_arguments)]
    fn arc_segment_to(
        &mut self,
        cx: f64,
        cy: f64,
        theta1: f64,
        theta2: f64,
        rx: f64,
        ry: f64,
        cos_phi: f64,
        sin_phi: f64,
    ) {
        let half_delta_theta = (theta2 - theta1) * 0.5;
        let q = (half_delta_theta * 0.5).sin();
        let t = (8.0 * q * q) / (3.0 * half_delta_theta.sin());
        let cos1 = theta1.cos();
        let sin1 = theta1.sin();
        let cos2 = theta2.cos();
        let sin2 = theta2.sin();
        let x1 = rx * (cos1 - t * sin1);
        let y1 = ry * (sin1 + t * cos1);
        let x2 = rx * (cos2 + t * sin2);
        let y2 = ry * (sin2 - t * cos2);
        let x3 = rx * cos2;
        let y3 = ry * sin2;

        let place = |x: f64, y: f64| {
            Point2::new(
                (cx + cos_phi * x - sin_phi * y) as f32,
                (cy + sin_phi * x + cos_phi * y) as f32,
            )
        };
        let cp1 = self.abs(place(x1, y1));
        let cp2 = self.abs(place(x2, y2));
        let p = self.abs(place(x3, y3));
        self.ras.cube_to(cp1, cp2, p);
    }
}

/// The angle between the vectors `u` and `v`, with the sign of their cross
/// product and clamping for `|cos| >= 1`.
fn angle(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
    let norm = (ux * ux + uy * uy).sqrt() * (vx * vx + vy * vy).sqrt();
    let cos = (ux * vx + uy * vy) / norm;
    let ret = if cos <= -1.0 {
        PI
    } else if cos >= 1.0 {
        0.0
    } else {
        cos.acos()
    };
    if ux * vy < uy * vx {
        -ret
    } else {
        ret
    }
}

impl<R: Rasterizer> Destination for Renderer<R> {
    fn reset(&mut self, view_box: ViewBox, palette: &Palette) {
        self.view_box = view_box;
        self.palette = *palette;
        self.lod = (0.0, f32::INFINITY);
        self.csel = 0;
        self.nsel = 0;
        self.disabled = false;
        self.prev_smooth = SmoothType::None;
        self.prev_smooth_point = Point2::new(0.0, 0.0);
        self.creg = *palette;
        self.nreg = [0.0; 64];
        self.recalc_transform();
    }

    fn csel(&self) -> u8 {
        self.csel
    }

    fn set_csel(&mut self, csel: u8) {
        self.csel = csel & 0x3f;
    }

    fn nsel(&self) -> u8 {
        self.nsel
    }

    fn set_nsel(&mut self, nsel: u8) {
        self.nsel = nsel & 0x3f;
    }

    fn set_creg(&mut self, adj: u8, incr: bool, color: Color) {
        let resolved = color.resolve(&self.palette, &self.creg);
        self.creg[usize::from(self.csel.wrapping_sub(adj) & 0x3f)] = resolved;
        if incr {
            self.csel = self.csel.wrapping_add(1) & 0x3f;
        }
    }

    fn set_nreg(&mut self, adj: u8, incr: bool, value: f32) {
        self.nreg[usize::from(self.nsel.wrapping_sub(adj) & 0x3f)] = value;
        if incr {
            self.nsel = self.nsel.wrapping_add(1) & 0x3f;
        }
    }

    fn set_lod(&mut self, lod0: f32, lod1: f32) {
        self.lod = (lod0, lod1);
    }

    fn start_path(&mut self, adj: u8, p: Point2<f32>) {
        let flat = self.creg[usize::from(self.csel.wrapping_sub(adj) & 0x3f)];
        if is_valid_premul(flat) {
            self.fill = Fill::Flat(flat);
            self.disabled = flat.a == 0x00;
        } else if let Some(desc) = GradientDesc::unpack(flat) {
            self.fill = Fill::Gradient;
            self.disabled = !self.init_gradient(desc);
            if self.disabled {
                log::warn!("iconvg: bad gradient registers; skipping path");
            }
        } else {
            // Neither a premultiplied color nor a gradient: the path is
            // parsed but paints nothing.
            self.disabled = true;
        }

        let h = self.rect.height() as f32;
        if !(self.lod.0 <= h && h < self.lod.1) {
            self.disabled = true;
        }
        if self.disabled {
            return;
        }

        self.ras.reset(self.rect.width(), self.rect.height());
        self.prev_smooth = SmoothType::None;
        let p = self.abs(p);
        self.ras.move_to(p);
    }

    fn close_path_end_path(&mut self) {
        if self.disabled {
            return;
        }
        self.ras.close_path();
        let rect = self.rect;
        let paint = match self.fill {
            Fill::Flat(c) => Paint::Flat(c),
            Fill::Gradient => Paint::Gradient(&self.gradient),
        };
        self.ras.draw(rect, paint, Point2::new(0, 0));
    }

    fn close_path_abs_move_to(&mut self, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        self.prev_smooth = SmoothType::None;
        self.ras.close_path();
        let p = self.abs(p);
        self.ras.move_to(p);
    }

    fn close_path_rel_move_to(&mut self, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        self.prev_smooth = SmoothType::None;
        self.ras.close_path();
        let p = self.rel(p);
        self.ras.move_to(p);
    }

    fn abs_h_line_to(&mut self, x: f32) {
        if self.disabled {
            return;
        }
        let pen = self.ras.pen();
        self.prev_smooth = SmoothType::None;
        let x = self.scale.x * (x + self.bias.x);
        self.ras.line_to(Point2::new(x, pen.y));
    }

    fn rel_h_line_to(&mut self, x: f32) {
        if self.disabled {
            return;
        }
        let pen = self.ras.pen();
        self.prev_smooth = SmoothType::None;
        self.ras.line_to(Point2::new(pen.x + self.scale.x * x, pen.y));
    }

    fn abs_v_line_to(&mut self, y: f32) {
        if self.disabled {
            return;
        }
        let pen = self.ras.pen();
        self.prev_smooth = SmoothType::None;
        let y = self.scale.y * (y + self.bias.y);
        self.ras.line_to(Point2::new(pen.x, y));
    }

    fn rel_v_line_to(&mut self, y: f32) {
        if self.disabled {
            return;
        }
        let pen = self.ras.pen();
        self.prev_smooth = SmoothType::None;
        self.ras.line_to(Point2::new(pen.x, pen.y + self.scale.y * y));
    }

    fn abs_line_to(&mut self, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        self.prev_smooth = SmoothType::None;
        let p = self.abs(p);
        self.ras.line_to(p);
    }

    fn rel_line_to(&mut self, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        self.prev_smooth = SmoothType::None;
        let p = self.rel(p);
        self.ras.line_to(p);
    }

    fn abs_smooth_quad_to(&mut self, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        let cp = self.implicit_smooth_point(SmoothType::Quad);
        let p = self.abs(p);
        self.prev_smooth = SmoothType::Quad;
        self.prev_smooth_point = cp;
        self.ras.quad_to(cp, p);
    }

    fn rel_smooth_quad_to(&mut self, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        let cp = self.implicit_smooth_point(SmoothType::Quad);
        let p = self.rel(p);
        self.prev_smooth = SmoothType::Quad;
        self.prev_smooth_point = cp;
        self.ras.quad_to(cp, p);
    }

    fn abs_quad_to(&mut self, cp: Point2<f32>, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        let cp = self.abs(cp);
        let p = self.abs(p);
        self.prev_smooth = SmoothType::Quad;
        self.prev_smooth_point = cp;
        self.ras.quad_to(cp, p);
    }

    fn rel_quad_to(&mut self, cp: Point2<f32>, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        let cp = self.rel(cp);
        let p = self.rel(p);
        self.prev_smooth = SmoothType::Quad;
        self.prev_smooth_point = cp;
        self.ras.quad_to(cp, p);
    }

    fn abs_smooth_cube_to(&mut self, cp2: Point2<f32>, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        let cp1 = self.implicit_smooth_point(SmoothType::Cube);
        let cp2 = self.abs(cp2);
        let p = self.abs(p);
        self.prev_smooth = SmoothType::Cube;
        self.prev_smooth_point = cp2;
        self.ras.cube_to(cp1, cp2, p);
    }

    fn rel_smooth_cube_to(&mut self, cp2: Point2<f32>, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        let cp1 = self.implicit_smooth_point(SmoothType::Cube);
        let cp2 = self.rel(cp2);
        let p = self.rel(p);
        self.prev_smooth = SmoothType::Cube;
        self.prev_smooth_point = cp2;
        self.ras.cube_to(cp1, cp2, p);
    }

    fn abs_cube_to(&mut self, cp1: Point2<f32>, cp2: Point2<f32>, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        let cp1 = self.abs(cp1);
        let cp2 = self.abs(cp2);
        let p = self.abs(p);
        self.prev_smooth = SmoothType::Cube;
        self.prev_smooth_point = cp2;
        self.ras.cube_to(cp1, cp2, p);
    }

    fn rel_cube_to(&mut self, cp1: Point2<f32>, cp2: Point2<f32>, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        let cp1 = self.rel(cp1);
        let cp2 = self.rel(cp2);
        let p = self.rel(p);
        self.prev_smooth = SmoothType::Cube;
        self.prev_smooth_point = cp2;
        self.ras.cube_to(cp1, cp2, p);
    }

    fn abs_arc_to(&mut self, r: Vector2<f32>, x_axis_rotation: f32, large_arc: bool, sweep: bool, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        self.prev_smooth = SmoothType::None;

        // The "conversion from endpoint to center parameterization"
        // algorithm of the SVG implementation notes, with the fixups (radius
        // magnitudes, radii scale-up) that shipping implementations apply.
        let mut rx = f64::from(r.x).abs();
        let mut ry = f64::from(r.y).abs();
        if !(rx > 0.0 && ry > 0.0) {
            // Zero, negative or NaN radii degenerate to a straight line.
            let p = self.abs(p);
            self.ras.line_to(p);
            return;
        }

        // Work in view box coordinates (e.g. from -32 to +32 by default)
        // rather than target pixels: the radii must be scaled too, and their
        // scale factors differ per axis and interact with the rotation.
        let pen = self.unabs(self.ras.pen());
        let x1 = f64::from(pen.x);
        let y1 = f64::from(pen.y);
        let x2 = f64::from(p.x);
        let y2 = f64::from(p.y);

        let phi = 2.0 * PI * f64::from(x_axis_rotation);

        // Step 1: compute (x1', y1').
        let half_dx = (x1 - x2) / 2.0;
        let half_dy = (y1 - y2) / 2.0;
        let cos_phi = phi.cos();
        let sin_phi = phi.sin();
        let x1_prime = cos_phi * half_dx + sin_phi * half_dy;
        let y1_prime = -sin_phi * half_dx + cos_phi * half_dy;

        // Step 2: compute (cx', cy'), scaling the radii up if they cannot
        // span the endpoints.
        let mut rx_sq = rx * rx;
        let mut ry_sq = ry * ry;
        let x1_prime_sq = x1_prime * x1_prime;
        let y1_prime_sq = y1_prime * y1_prime;

        let radii_check = x1_prime_sq / rx_sq + y1_prime_sq / ry_sq;
        if radii_check > 1.0 {
            let c = radii_check.sqrt();
            rx *= c;
            ry *= c;
            rx_sq = rx * rx;
            ry_sq = ry * ry;
        }

        let denom = rx_sq * y1_prime_sq + ry_sq * x1_prime_sq;
        let mut step2 = 0.0;
        let a = rx_sq * ry_sq / denom - 1.0;
        if a > 0.0 {
            step2 = a.sqrt();
        }
        if large_arc == sweep {
            step2 = -step2;
        }
        let cx_prime = step2 * rx * y1_prime / ry;
        let cy_prime = -step2 * ry * x1_prime / rx;

        // Step 3: compute (cx, cy) from (cx', cy').
        let cx = cos_phi * cx_prime - sin_phi * cy_prime + (x1 + x2) / 2.0;
        let cy = sin_phi * cx_prime + cos_phi * cy_prime + (y1 + y2) / 2.0;

        // Step 4: compute the start angle and the sweep angle.
        let ax = (x1_prime - cx_prime) / rx;
        let ay = (y1_prime - cy_prime) / ry;
        let bx = (-x1_prime - cx_prime) / rx;
        let by = (-y1_prime - cy_prime) / ry;
        let theta1 = angle(1.0, 0.0, ax, ay);
        let mut delta_theta = angle(ax, ay, bx, by);
        if sweep {
            if delta_theta < 0.0 {
                delta_theta += 2.0 * PI;
            }
        } else if delta_theta > 0.0 {
            delta_theta -= 2.0 * PI;
        }

        // Approximate the arc by one cubic Bézier curve per sub-arc of at
        // most a quarter turn (plus a sliver, so an exact quarter stays a
        // single segment).
        let n = (delta_theta.abs() / (PI / 2.0 + 0.001)).ceil() as i32;
        for i in 0..n {
            self.arc_segment_to(
                cx,
                cy,
                theta1 + delta_theta * f64::from(i) / f64::from(n),
                theta1 + delta_theta * f64::from(i + 1) / f64::from(n),
                rx,
                ry,
                cos_phi,
                sin_phi,
            );
        }
    }

    fn rel_arc_to(&mut self, r: Vector2<f32>, x_axis_rotation: f32, large_arc: bool, sweep: bool, p: Point2<f32>) {
        if self.disabled {
            return;
        }
        let end = self.rel(p);
        let end = self.unabs(end);
        self.abs_arc_to(r, x_axis_rotation, large_arc, sweep, end);
    }
}
