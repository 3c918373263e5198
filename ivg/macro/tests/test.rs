use cgmath::Point2;

use ivg_io::{decode, Destination, Encoder, ViewBox, DEFAULT_PALETTE, MAGIC};
use ivg_macro::ivg_bytes;

static SQUARE: &[u8] = ivg_bytes!("-32 -32 32 32", "M-10 -10L10 -10L10 10L-10 10z");

static TWO_PATHS: &[u8] = ivg_bytes!(
    "0 0 48 48",
    "M8 8h32v32h-32z",
    "M16 16h16v16h-16z"
);

#[test]
fn expands_to_a_well_formed_graphic() {
    assert_eq!(&SQUARE[..4], &MAGIC);

    // The default view box is elided, so the body starts right after the
    // zero chunk count.
    assert_eq!(SQUARE[4], 0x00);

    let mut e = Encoder::new();
    decode(&mut e, SQUARE).unwrap();
    assert_eq!(e.bytes().unwrap(), SQUARE);
}

#[test]
fn matches_the_runtime_pipeline() {
    let mut e = Encoder::new();
    e.reset(ViewBox::default(), &DEFAULT_PALETTE);
    e.start_path(0, Point2::new(-10.0, -10.0));
    e.abs_line_to(Point2::new(10.0, -10.0));
    e.abs_line_to(Point2::new(10.0, 10.0));
    e.abs_line_to(Point2::new(-10.0, 10.0));
    e.close_path_end_path();
    assert_eq!(e.bytes().unwrap(), SQUARE);
}

#[test]
fn multiple_paths_decode() {
    let mut e = Encoder::new();
    decode(&mut e, TWO_PATHS).unwrap();
    assert_eq!(e.bytes().unwrap(), TWO_PATHS);
}
