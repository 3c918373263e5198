//! Lowers SVG-style path data strings onto an IconVG [`Destination`].
//!
//! [`Generator`] wraps any destination (typically an `ivg_io::Encoder`) and
//! translates path data such as `"M0 -20C-11.05 -20 -20 -11.05 -20 0z"` into
//! the corresponding destination calls. It also knows the register-level
//! encoding of gradients, so callers can say "a linear gradient from here to
//! there" instead of hand-loading CREG and NREG.
use cgmath::{Matrix3, Point2, Vector2};
use displaydoc::Display;
use rgb::RGBA8;

use ivg_io::{Color, Destination, GradientDesc, GradientShape, GradientSpread};

/// The reasons path data or a gradient definition can fail to lower.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// unrecognized path data verb ({0})
    UnrecognizedPathDataVerb(u8),
    /// malformed number in path data
    MalformedNumber,
    /// too many gradient stops
    TooManyGradientStops,
    /// CSEL used as both gradient and stop
    CselUsedAsBothGradientAndStop,
}

impl std::error::Error for Error {}

/// A color/offset gradient stop, in graphic coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
    pub offset: f32,
    pub color: RGBA8,
}

/// A 2-D affine translation matrix.
pub fn translation(x: f32, y: f32) -> Matrix3<f32> {
    affine(1.0, 0.0, x, 0.0, 1.0, y)
}

/// A 2-D affine scale matrix.
pub fn scaling(sx: f32, sy: f32) -> Matrix3<f32> {
    affine(sx, 0.0, 0.0, 0.0, sy, 0.0)
}

/// Builds a `Matrix3` from the row major 2×3 affine `[a b c; d e f]`.
fn affine(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Matrix3<f32> {
    Matrix3::new(a, d, 0.0, b, e, 0.0, c, f, 1.0)
}

/// The row major 2×3 affine `[a, b, c, d, e, f]` of a `Matrix3`.
fn row_major(m: &Matrix3<f32>) -> [f32; 6] {
    [m.x.x, m.y.x, m.z.x, m.x.y, m.y.y, m.z.y]
}

fn apply(m: &Matrix3<f32>, x: f32, y: f32) -> (f32, f32) {
    (
        m.x.x * x + m.y.x * y + m.z.x,
        m.x.y * x + m.y.y * y + m.z.y,
    )
}

/// Generates IconVG destination calls from SVG path data strings.
#[derive(Debug, Clone)]
pub struct Generator<D> {
    dst: D,
    transform: Option<Matrix3<f32>>,
}

impl<D: Destination> Generator<D> {
    pub fn new(dst: D) -> Self {
        Self {
            dst,
            transform: None,
        }
    }

    pub fn destination(&self) -> &D {
        &self.dst
    }

    pub fn destination_mut(&mut self) -> &mut D {
        &mut self.dst
    }

    pub fn into_inner(self) -> D {
        self.dst
    }

    /// Applies the concatenation of `transforms` (first element first) to
    /// every coordinate of subsequent path data. Absolute coordinates go
    /// through the full affine; relative coordinates and arc radii only
    /// through its scale part.
    pub fn set_transform(&mut self, transforms: &[Matrix3<f32>]) {
        let product = transforms
            .iter()
            .fold(affine(1.0, 0.0, 0.0, 0.0, 1.0, 0.0), |acc, &t| t * acc);
        self.transform = Some(product);
    }

    pub fn clear_transform(&mut self) {
        self.transform = None;
    }

    /// Lowers one path worth of SVG path data onto the destination, filling
    /// with `CREG[CSEL - adj]`.
    ///
    /// The recognized verbs are `M m L l H h V v C c S s Q q T t A a Z z`.
    /// The first coordinate pair starts the path; verbless coordinate groups
    /// repeat the previous verb (with moveTo demoting to lineTo); interior
    /// moveTo verbs close the current subpath and start another one. The
    /// path is ended when the data runs out, whether or not it ends in a
    /// `z`.
    pub fn set_path_data(&mut self, data: &str, adj: u8) -> Result<(), Error> {
        let mut s = data.as_bytes();
        let mut args = [0.0f32; 7];
        let mut prev: Option<(u8, usize)> = None;
        let mut started = false;

        loop {
            s = skip_separators(s);
            let first = match s.first() {
                Some(&c) => c,
                None => break,
            };
            let (verb, n, implicit) = match first {
                b'H' | b'h' | b'V' | b'v' => (first, 1, false),
                b'L' | b'l' | b'M' | b'm' | b'T' | b't' => (first, 2, false),
                b'Q' | b'q' | b'S' | b's' => (first, 4, false),
                b'C' | b'c' => (first, 6, false),
                b'A' | b'a' => (first, 7, false),
                b'Z' | b'z' => (first, 0, false),
                c if c.is_ascii_alphabetic() => {
                    return Err(Error::UnrecognizedPathDataVerb(c));
                }
                _ => match prev {
                    Some((v, n)) => (v, n, true),
                    None => return Err(Error::UnrecognizedPathDataVerb(first)),
                },
            };
            if !implicit {
                s = &s[1..];
            }
            prev = Some(match verb {
                b'M' => (b'L', n),
                b'm' => (b'l', n),
                _ => (verb, n),
            });
            if verb == b'Z' || verb == b'z' {
                continue;
            }

            for arg in args[..n].iter_mut() {
                s = skip_separators(s);
                let (value, rest) = scan_number(s)?;
                *arg = value;
                s = rest;
            }

            // The first coordinate group starts the path, regardless of the
            // verb's case.
            let verb = if started { verb } else { b'@' };
            started = true;

            self.apply_transform(&mut args, n, verb);

            match verb {
                b'@' => self.dst.start_path(adj, Point2::new(args[0], args[1])),
                b'M' => self.dst.close_path_abs_move_to(Point2::new(args[0], args[1])),
                b'm' => self.dst.close_path_rel_move_to(Point2::new(args[0], args[1])),
                b'H' => self.dst.abs_h_line_to(args[0]),
                b'h' => self.dst.rel_h_line_to(args[0]),
                b'V' => self.dst.abs_v_line_to(args[0]),
                b'v' => self.dst.rel_v_line_to(args[0]),
                b'L' => self.dst.abs_line_to(Point2::new(args[0], args[1])),
                b'l' => self.dst.rel_line_to(Point2::new(args[0], args[1])),
                b'T' => self.dst.abs_smooth_quad_to(Point2::new(args[0], args[1])),
                b't' => self.dst.rel_smooth_quad_to(Point2::new(args[0], args[1])),
                b'Q' => self.dst.abs_quad_to(
                    Point2::new(args[0], args[1]),
                    Point2::new(args[2], args[3]),
                ),
                b'q' => self.dst.rel_quad_to(
                    Point2::new(args[0], args[1]),
                    Point2::new(args[2], args[3]),
                ),
                b'S' => self.dst.abs_smooth_cube_to(
                    Point2::new(args[0], args[1]),
                    Point2::new(args[2], args[3]),
                ),
                b's' => self.dst.rel_smooth_cube_to(
                    Point2::new(args[0], args[1]),
                    Point2::new(args[2], args[3]),
                ),
                b'C' => self.dst.abs_cube_to(
                    Point2::new(args[0], args[1]),
                    Point2::new(args[2], args[3]),
                    Point2::new(args[4], args[5]),
                ),
                b'c' => self.dst.rel_cube_to(
                    Point2::new(args[0], args[1]),
                    Point2::new(args[2], args[3]),
                    Point2::new(args[4], args[5]),
                ),
                // Arc angles arrive in degrees and IconVG counts turns.
                b'A' => self.dst.abs_arc_to(
                    Vector2::new(args[0], args[1]),
                    args[2] / 360.0,
                    args[3] != 0.0,
                    args[4] != 0.0,
                    Point2::new(args[5], args[6]),
                ),
                b'a' => self.dst.rel_arc_to(
                    Vector2::new(args[0], args[1]),
                    args[2] / 360.0,
                    args[3] != 0.0,
                    args[4] != 0.0,
                    Point2::new(args[5], args[6]),
                ),
                _ => return Err(Error::UnrecognizedPathDataVerb(verb)),
            }
        }

        if started {
            self.dst.close_path_end_path();
        }
        Ok(())
    }

    fn apply_transform(&self, args: &mut [f32; 7], n: usize, verb: u8) {
        let transform = match self.transform {
            Some(t) => t,
            None => return,
        };
        let scale = scaling(transform.x.x, transform.y.y);
        let m = if verb.is_ascii_lowercase() {
            scale
        } else {
            transform
        };
        match n {
            7 => {
                // Radii scale, they do not translate.
                let (x, y) = apply(&scale, args[0], args[1]);
                args[0] = x;
                args[1] = y;
                let (x, y) = apply(&m, args[5], args[6]);
                args[5] = x;
                args[6] = y;
            }
            6 | 4 | 2 => {
                for pair in args[..n].chunks_exact_mut(2) {
                    let (x, y) = apply(&m, pair[0], pair[1]);
                    pair[0] = x;
                    pair[1] = y;
                }
            }
            1 => {
                if verb == b'H' || verb == b'h' {
                    args[0] = apply(&m, args[0], 0.0).0;
                } else {
                    args[0] = apply(&m, 0.0, args[0]).1;
                }
            }
            _ => {}
        }
    }

    /// Sets `CREG[CSEL]` to encode a gradient whose geometry is defined by
    /// the given graphic-to-gradient affine matrix. Gradient space is where
    /// a linear gradient ranges from x = 0 to x = 1 and a radial gradient is
    /// the unit circle around the origin.
    ///
    /// The stop colors land in `CREG[10 ..]` and the offsets and matrix in
    /// `NREG[4 ..]`; CSEL and NSEL keep their values.
    pub fn set_gradient(
        &mut self,
        shape: GradientShape,
        spread: GradientSpread,
        stops: &[GradientStop],
        vbx2grad: Matrix3<f32>,
    ) -> Result<(), Error> {
        const C_BASE: u8 = 10;
        const N_BASE: u8 = 10;

        let matrix = row_major(&vbx2grad);
        if stops.len() > 64 - matrix.len() {
            return Err(Error::TooManyGradientStops);
        }
        let num_stops = stops.len() as u8;
        let in_stops = |v: u8| C_BASE <= v && v < C_BASE + num_stops;
        if in_stops(self.dst.csel()) || in_stops(self.dst.csel() + 64) {
            return Err(Error::CselUsedAsBothGradientAndStop);
        }

        let old_csel = self.dst.csel();
        let old_nsel = self.dst.nsel();
        self.dst.set_creg(
            0,
            false,
            Color::Rgba(
                GradientDesc {
                    c_base: C_BASE,
                    n_base: N_BASE,
                    shape,
                    spread,
                    num_stops,
                }
                .pack(),
            ),
        );
        self.dst.set_csel(C_BASE);
        self.dst.set_nsel(N_BASE);
        for (i, &v) in matrix.iter().enumerate() {
            self.dst.set_nreg((matrix.len() - i) as u8, false, v);
        }
        for stop in stops {
            self.dst.set_creg(0, true, Color::Rgba(stop.color));
            self.dst.set_nreg(0, true, stop.offset);
        }
        self.dst.set_csel(old_csel);
        self.dst.set_nsel(old_nsel);
        Ok(())
    }

    /// Like [`Generator::set_gradient`] with a linear shape, except that the
    /// matrix is implicitly defined by the two boundary points `p1` and
    /// `p2`.
    pub fn set_linear_gradient(
        &mut self,
        p1: Point2<f32>,
        p2: Point2<f32>,
        spread: GradientSpread,
        stops: &[GradientStop],
    ) -> Result<(), Error> {
        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;
        let d = dx * dx + dy * dy;
        let ma = dx / d;
        let mb = dy / d;
        let vbx2grad = affine(ma, mb, -ma * p1.x - mb * p1.y, 0.0, 0.0, 0.0);
        self.set_gradient(GradientShape::Linear, spread, stops, vbx2grad)
    }

    /// Like [`Generator::set_gradient`] with a radial shape, except that the
    /// matrix is implicitly defined by a center and a radius vector such
    /// that `center + radius` is on the circle.
    pub fn set_circular_gradient(
        &mut self,
        center: Point2<f32>,
        radius: Vector2<f32>,
        spread: GradientSpread,
        stops: &[GradientStop],
    ) -> Result<(), Error> {
        let inv_r = (1.0 / f64::from(radius.x * radius.x + radius.y * radius.y).sqrt()) as f32;
        let vbx2grad = affine(
            inv_r,
            0.0,
            -center.x * inv_r,
            0.0,
            inv_r,
            -center.y * inv_r,
        );
        self.set_gradient(GradientShape::Radial, spread, stops, vbx2grad)
    }

    /// Like [`Generator::set_gradient`] with a radial shape, except that the
    /// matrix is implicitly defined by a center and two axis vectors such
    /// that `center + r` and `center + s` are on the ellipse.
    pub fn set_elliptical_gradient(
        &mut self,
        center: Point2<f32>,
        r: Vector2<f32>,
        s: Vector2<f32>,
        spread: GradientSpread,
        stops: &[GradientStop],
    ) -> Result<(), Error> {
        // Every intermediate rounds to f32 on its own; a contracted
        // multiply-add here would change the encoded register values.
        let inv_rssr = 1.0 / (r.x * s.y - s.x * r.y);
        let ma = s.y * inv_rssr;
        let mb = -s.x * inv_rssr;
        let mc = -(ma * center.x) - mb * center.y;
        let md = -r.y * inv_rssr;
        let me = r.x * inv_rssr;
        let mf = -(md * center.x) - me * center.y;
        self.set_gradient(
            GradientShape::Radial,
            spread,
            stops,
            affine(ma, mb, mc, md, me, mf),
        )
    }
}

fn skip_separators(mut s: &[u8]) -> &[u8] {
    while let Some(&c) = s.first() {
        if c == b' ' || c == b',' {
            s = &s[1..];
        } else {
            break;
        }
    }
    s
}

/// Scans one float: an optional sign, digits, and at most one dot. No
/// exponents; a sign also acts as a separator between numbers.
fn scan_number(s: &[u8]) -> Result<(f32, &[u8]), Error> {
    let mut i = 0;
    if i < s.len() && (s[i] == b'+' || s[i] == b'-') {
        i += 1;
    }
    let mut dots = 0;
    let body = i;
    while i < s.len() {
        match s[i] {
            b'0'..=b'9' => i += 1,
            b'.' if dots == 0 => {
                dots += 1;
                i += 1;
            }
            _ => break,
        }
    }
    if i == body {
        return Err(Error::MalformedNumber);
    }
    let text = std::str::from_utf8(&s[..i]).map_err(|_| Error::MalformedNumber)?;
    let value = text.parse::<f64>().map_err(|_| Error::MalformedNumber)?;
    Ok((value as f32, &s[i..]))
}
