use cgmath::{Point2, Vector2};
use rgb::RGBA8;

use ivg_io::{
    decode, Color, Destination, Encoder, GradientShape, GradientSpread, ViewBox, DEFAULT_PALETTE,
};
use ivg_svg::{scaling, translation, Error, Generator, GradientStop};

fn fresh_encoder() -> Encoder {
    let mut e = Encoder::new();
    e.reset(ViewBox::default(), &DEFAULT_PALETTE);
    e
}

/// Runs `data` through the generator and returns the encoded bytes.
fn lower(data: &str) -> Vec<u8> {
    let mut g = Generator::new(fresh_encoder());
    g.set_path_data(data, 0).unwrap();
    g.into_inner().bytes().unwrap()
}

/// Encodes the expected destination calls directly.
fn manual(build: impl FnOnce(&mut Encoder)) -> Vec<u8> {
    let mut e = fresh_encoder();
    build(&mut e);
    e.bytes().unwrap()
}

#[test]
fn square() {
    let got = lower("M-10 -10L10 -10L10 10L-10 10z");
    let want = manual(|e| {
        e.start_path(0, Point2::new(-10.0, -10.0));
        e.abs_line_to(Point2::new(10.0, -10.0));
        e.abs_line_to(Point2::new(10.0, 10.0));
        e.abs_line_to(Point2::new(-10.0, 10.0));
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn implicit_repetition_reuses_the_verb() {
    let got = lower("M0 0L1 0 2 0 3 0z");
    let want = manual(|e| {
        e.start_path(0, Point2::new(0.0, 0.0));
        e.abs_line_to(Point2::new(1.0, 0.0));
        e.abs_line_to(Point2::new(2.0, 0.0));
        e.abs_line_to(Point2::new(3.0, 0.0));
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn move_to_demotes_to_line_to() {
    let got = lower("M0 0 1 1 2 2z");
    let want = manual(|e| {
        e.start_path(0, Point2::new(0.0, 0.0));
        e.abs_line_to(Point2::new(1.0, 1.0));
        e.abs_line_to(Point2::new(2.0, 2.0));
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn relative_and_axis_aligned_verbs() {
    let got = lower("m1 2h3V4l1 1v-2H0z");
    let want = manual(|e| {
        e.start_path(0, Point2::new(1.0, 2.0));
        e.rel_h_line_to(3.0);
        e.abs_v_line_to(4.0);
        e.rel_line_to(Point2::new(1.0, 1.0));
        e.rel_v_line_to(-2.0);
        e.abs_h_line_to(0.0);
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn interior_move_to_closes_the_subpath() {
    let got = lower("M0 0L1 0M2 2l1 0m-1 1L5 5z");
    let want = manual(|e| {
        e.start_path(0, Point2::new(0.0, 0.0));
        e.abs_line_to(Point2::new(1.0, 0.0));
        e.close_path_abs_move_to(Point2::new(2.0, 2.0));
        e.rel_line_to(Point2::new(1.0, 0.0));
        e.close_path_rel_move_to(Point2::new(-1.0, 1.0));
        e.abs_line_to(Point2::new(5.0, 5.0));
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn curve_families() {
    let got = lower("M0 0C1 1 2 2 3 3S4 4 5 5s1 1 2 2Q6 6 7 7q1 1 2 2T8 8t1 1z");
    let want = manual(|e| {
        e.start_path(0, Point2::new(0.0, 0.0));
        e.abs_cube_to(
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(3.0, 3.0),
        );
        e.abs_smooth_cube_to(Point2::new(4.0, 4.0), Point2::new(5.0, 5.0));
        e.rel_smooth_cube_to(Point2::new(1.0, 1.0), Point2::new(2.0, 2.0));
        e.abs_quad_to(Point2::new(6.0, 6.0), Point2::new(7.0, 7.0));
        e.rel_quad_to(Point2::new(1.0, 1.0), Point2::new(2.0, 2.0));
        e.abs_smooth_quad_to(Point2::new(8.0, 8.0));
        e.rel_smooth_quad_to(Point2::new(1.0, 1.0));
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn arcs_convert_degrees_to_turns() {
    let got = lower("M0 0A10 10 90 1 0 20 0a5 5 180 0 1 5 5z");
    let want = manual(|e| {
        e.start_path(0, Point2::new(0.0, 0.0));
        e.abs_arc_to(Vector2::new(10.0, 10.0), 0.25, true, false, Point2::new(20.0, 0.0));
        e.rel_arc_to(Vector2::new(5.0, 5.0), 0.5, false, true, Point2::new(5.0, 5.0));
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn decimals_signs_and_commas_separate_numbers() {
    let got = lower("M.5,.25 L-1.5-2.5 4.25,0z");
    let want = manual(|e| {
        e.start_path(0, Point2::new(0.5, 0.25));
        e.abs_line_to(Point2::new(-1.5, -2.5));
        e.abs_line_to(Point2::new(4.25, 0.0));
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn missing_trailing_z_still_ends_the_path() {
    let got = lower("M0 0L1 1");
    let want = manual(|e| {
        e.start_path(0, Point2::new(0.0, 0.0));
        e.abs_line_to(Point2::new(1.0, 1.0));
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn adjustment_selects_the_fill_register() {
    let mut g = Generator::new(fresh_encoder());
    g.set_path_data("M0 0L1 1z", 2).unwrap();
    let got = g.into_inner().bytes().unwrap();
    let want = manual(|e| {
        e.start_path(2, Point2::new(0.0, 0.0));
        e.abs_line_to(Point2::new(1.0, 1.0));
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn errors() {
    let mut g = Generator::new(fresh_encoder());
    assert_eq!(
        g.set_path_data("X0 0z", 0),
        Err(Error::UnrecognizedPathDataVerb(b'X'))
    );

    let mut g = Generator::new(fresh_encoder());
    assert_eq!(g.set_path_data("5 5z", 0), Err(Error::UnrecognizedPathDataVerb(b'5')));

    let mut g = Generator::new(fresh_encoder());
    assert_eq!(g.set_path_data("M0 0L- 1z", 0), Err(Error::MalformedNumber));
}

#[test]
fn transform_applies_to_absolute_and_scales_relative() {
    // Scale by 2, then translate by (-32, -32): the mapping of a 32-unit
    // icon onto the default view box.
    let transforms = [scaling(2.0, 2.0), translation(-32.0, -32.0)];

    let mut g = Generator::new(fresh_encoder());
    g.set_transform(&transforms);
    g.set_path_data("M16 16l1 2H20h2V20A3 4 0 0 1 16 16z", 0).unwrap();
    let got = g.into_inner().bytes().unwrap();

    let want = manual(|e| {
        e.start_path(0, Point2::new(0.0, 0.0));
        e.rel_line_to(Point2::new(2.0, 4.0));
        e.abs_h_line_to(8.0);
        e.rel_h_line_to(4.0);
        e.abs_v_line_to(8.0);
        // Radii only scale; the endpoint takes the full transform.
        e.abs_arc_to(Vector2::new(6.0, 8.0), 0.0, false, true, Point2::new(0.0, 0.0));
        e.close_path_end_path();
    });
    assert_eq!(got, want);
}

#[test]
fn too_many_gradient_stops() {
    let stops: Vec<GradientStop> = (0..59)
        .map(|i| GradientStop {
            offset: i as f32 / 64.0,
            color: RGBA8::new(0x00, 0x00, 0x00, 0xff),
        })
        .collect();
    let mut g = Generator::new(fresh_encoder());
    assert_eq!(
        g.set_linear_gradient(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            GradientSpread::Pad,
            &stops,
        ),
        Err(Error::TooManyGradientStops)
    );
}

#[test]
fn csel_collision_is_rejected() {
    let stops = [
        GradientStop {
            offset: 0.0,
            color: RGBA8::new(0x00, 0x00, 0x00, 0xff),
        },
        GradientStop {
            offset: 1.0,
            color: RGBA8::new(0xff, 0xff, 0xff, 0xff),
        },
    ];
    let mut g = Generator::new(fresh_encoder());
    g.destination_mut().set_csel(11);
    assert_eq!(
        g.set_linear_gradient(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            GradientSpread::Pad,
            &stops,
        ),
        Err(Error::CselUsedAsBothGradientAndStop)
    );
}

mod pipeline {
    use super::*;
    use ivg_render::{Paint, Rasterizer, Rect, Renderer};

    /// A rasterizer that keeps only what the pipeline test needs: the pen
    /// and the draws.
    struct Sink {
        size: (i32, i32),
        pen: Point2<f32>,
        draws: Vec<(GradientShape, GradientSpread, Vec<(f64, RGBA8)>, [f64; 6])>,
        flats: Vec<RGBA8>,
    }

    impl Sink {
        fn new() -> Self {
            Self {
                size: (0, 0),
                pen: Point2::new(0.0, 0.0),
                draws: Vec::new(),
                flats: Vec::new(),
            }
        }
    }

    impl Rasterizer for Sink {
        fn reset(&mut self, width: i32, height: i32) {
            self.size = (width, height);
        }
        fn size(&self) -> (i32, i32) {
            self.size
        }
        fn bounds(&self) -> Rect {
            Rect::new(Point2::new(0, 0), Point2::new(self.size.0, self.size.1))
        }
        fn pen(&self) -> Point2<f32> {
            self.pen
        }
        fn move_to(&mut self, p: Point2<f32>) {
            self.pen = p;
        }
        fn line_to(&mut self, p: Point2<f32>) {
            self.pen = p;
        }
        fn quad_to(&mut self, _cp: Point2<f32>, p: Point2<f32>) {
            self.pen = p;
        }
        fn cube_to(&mut self, _cp1: Point2<f32>, _cp2: Point2<f32>, p: Point2<f32>) {
            self.pen = p;
        }
        fn close_path(&mut self) {}
        fn draw(&mut self, _rect: Rect, paint: Paint<'_>, _origin: Point2<i32>) {
            match paint {
                Paint::Flat(c) => self.flats.push(c),
                Paint::Gradient(g) => self.draws.push((
                    g.shape(),
                    g.spread(),
                    g.stops().iter().map(|s| (s.offset, s.color)).collect(),
                    g.transform(),
                )),
            }
        }
    }

    #[test]
    fn generated_gradient_survives_the_wire() {
        let mut e = Encoder::new();
        e.reset(ViewBox::new(0.0, 0.0, 64.0, 64.0), &DEFAULT_PALETTE);
        let mut g = Generator::new(e);
        g.set_linear_gradient(
            Point2::new(0.0, 0.0),
            Point2::new(64.0, 0.0),
            GradientSpread::Pad,
            &[
                GradientStop {
                    offset: 0.0,
                    color: RGBA8::new(0x00, 0x00, 0x00, 0xff),
                },
                GradientStop {
                    offset: 1.0,
                    color: RGBA8::new(0xff, 0xff, 0xff, 0xff),
                },
            ],
        )
        .unwrap();
        g.set_path_data("M0 0L64 0L64 64L0 64z", 0).unwrap();
        let bytes = g.into_inner().bytes().unwrap();

        // Decode onto a same-sized target, so the view box to pixel
        // transform is the identity and the matrix passes through.
        let mut r = Renderer::new(Sink::new(), Rect::new(Point2::new(0, 0), Point2::new(64, 64)));
        decode(&mut r, &bytes).unwrap();

        let sink = r.into_rasterizer();
        assert_eq!(sink.draws.len(), 1);
        let (shape, spread, stops, transform) = &sink.draws[0];
        assert_eq!(*shape, GradientShape::Linear);
        assert_eq!(*spread, GradientSpread::Pad);
        assert_eq!(
            stops,
            &vec![
                (0.0, RGBA8::new(0x00, 0x00, 0x00, 0xff)),
                (1.0, RGBA8::new(0xff, 0xff, 0xff, 0xff)),
            ]
        );
        assert_eq!(*transform, [0.015625, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn generated_flat_path_survives_the_wire() {
        let mut e = Encoder::new();
        e.reset(ViewBox::new(0.0, 0.0, 64.0, 64.0), &DEFAULT_PALETTE);
        let mut g = Generator::new(e);
        g.destination_mut()
            .set_creg(0, false, Color::Rgba(RGBA8::new(0x55, 0x00, 0x00, 0x66)));
        g.set_path_data("M8 8h48v48h-48z", 0).unwrap();
        let bytes = g.into_inner().bytes().unwrap();

        let mut r = Renderer::new(Sink::new(), Rect::new(Point2::new(0, 0), Point2::new(64, 64)));
        decode(&mut r, &bytes).unwrap();
        assert_eq!(r.rasterizer().flats, vec![RGBA8::new(0x55, 0x00, 0x00, 0x66)]);
    }
}
