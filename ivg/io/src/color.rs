//! The IconVG color model.
use rgb::RGBA8;

use crate::Palette;

/// An IconVG color, whose RGBA value can depend on context. Some colors are
/// direct RGBA values. Other colors are indirect, referring to an index of
/// the custom palette, a color register of the decoder virtual machine, or a
/// blend of two other colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// A direct color. It is only sensible when it is a valid
    /// alpha-premultiplied color or a gradient descriptor (see
    /// [`GradientDesc`]).
    Rgba(RGBA8),
    /// An indirect color referring to an index of the custom palette.
    PaletteIndex(u8),
    /// An indirect color referring to a CREG color register.
    CReg(u8),
    /// An indirect color blending two other colors, each of which must be
    /// encodable as a 1 byte color code. The blend weighs `c1` by `t / 255`
    /// and `c0` by `(255 - t) / 255`.
    Blend { t: u8, c0: u8, c1: u8 },
}

impl Color {
    /// An indirect color referring to an index of the custom palette. The
    /// index is taken modulo 64.
    pub fn palette_index(i: u8) -> Color {
        Color::PaletteIndex(i & 0x3f)
    }

    /// An indirect color referring to a CREG color register. The index is
    /// taken modulo 64.
    pub fn creg(i: u8) -> Color {
        Color::CReg(i & 0x3f)
    }

    /// The color as a direct RGBA value, if that is its type and the value is
    /// a valid alpha-premultiplied color. Otherwise `None`; callers
    /// conventionally substitute opaque black.
    pub fn rgba(self) -> Option<RGBA8> {
        match self {
            Color::Rgba(c) if is_valid_premul(c) => Some(c),
            _ => None,
        }
    }

    /// Resolves the color's RGBA value, given its context: the custom palette
    /// and the CREG color registers of the decoder virtual machine.
    pub fn resolve(self, palette: &Palette, creg: &[RGBA8; 64]) -> RGBA8 {
        match self {
            Color::Rgba(c) => c,
            Color::PaletteIndex(i) => palette[usize::from(i & 0x3f)],
            Color::CReg(i) => creg[usize::from(i & 0x3f)],
            Color::Blend { t, c0, c1 } => {
                let p = u32::from(255 - t);
                let q = u32::from(t);
                let rgba0 = decode_color1(c0).resolve(palette, creg);
                let rgba1 = decode_color1(c1).resolve(palette, creg);
                let mix = |x0: u8, x1: u8| ((p * u32::from(x0) + q * u32::from(x1) + 128) / 255) as u8;
                RGBA8::new(
                    mix(rgba0.r, rgba1.r),
                    mix(rgba0.g, rgba1.g),
                    mix(rgba0.b, rgba1.b),
                    mix(rgba0.a, rgba1.a),
                )
            }
        }
    }

    /// Encodes the color as a 1 byte color code, if possible.
    pub fn encode1(self) -> Option<u8> {
        match self {
            Color::Rgba(c) if c.a != 0xff => match (c.r, c.g, c.b, c.a) {
                (0x00, 0x00, 0x00, 0x00) => Some(127),
                (0x80, 0x80, 0x80, 0x80) => Some(126),
                (0xc0, 0xc0, 0xc0, 0xc0) => Some(125),
                _ => None,
            },
            Color::Rgba(c) if is_1(c) => {
                // Maps {0x00, 0x40, 0x80, 0xc0, 0xff} to the base-5 digits
                // 0 to 4.
                Some(25 * (c.r / 0x3f) + 5 * (c.g / 0x3f) + c.b / 0x3f)
            }
            Color::PaletteIndex(i) => Some(i | 0x80),
            Color::CReg(i) => Some(i | 0xc0),
            _ => None,
        }
    }

    /// Encodes the color as two nibble-packed bytes, if every component is a
    /// multiple of `0x11`.
    pub fn encode2(self) -> Option<[u8; 2]> {
        match self {
            Color::Rgba(c) if is_2(c) => Some([
                (c.r / 0x11) << 4 | (c.g / 0x11),
                (c.b / 0x11) << 4 | (c.a / 0x11),
            ]),
            _ => None,
        }
    }

    /// Encodes the color as three direct RGB bytes, if it is fully opaque.
    pub fn encode3_direct(self) -> Option<[u8; 3]> {
        match self {
            Color::Rgba(c) if is_3(c) => Some([c.r, c.g, c.b]),
            _ => None,
        }
    }

    /// Encodes the color as four direct RGBA bytes.
    pub fn encode4(self) -> Option<[u8; 4]> {
        match self {
            Color::Rgba(c) => Some([c.r, c.g, c.b, c.a]),
            _ => None,
        }
    }

    /// Encodes the color as a 3 byte blend, if it is a blend.
    pub fn encode3_indirect(self) -> Option<[u8; 3]> {
        match self {
            Color::Blend { t, c0, c1 } => Some([t, c0, c1]),
            _ => None,
        }
    }
}

/// Decodes a 1 byte color code.
///
/// Codes below 125 are base-5 digit triples mapped through
/// `{0x00, 0x40, 0x80, 0xc0, 0xff}` with full alpha; 125 to 127 are the
/// translucent grays; `0x80..=0xbf` name a palette index and `0xc0..=0xff` a
/// CREG register.
pub fn decode_color1(x: u8) -> Color {
    if x >= 0x80 {
        if x >= 0xc0 {
            return Color::creg(x);
        }
        return Color::palette_index(x);
    }
    if x >= 125 {
        let v = match x {
            125 => 0xc0,
            126 => 0x80,
            _ => 0x00,
        };
        return Color::Rgba(RGBA8::new(v, v, v, v));
    }
    let blue = DC1_TABLE[usize::from(x % 5)];
    let x = x / 5;
    let green = DC1_TABLE[usize::from(x % 5)];
    let red = DC1_TABLE[usize::from(x / 5)];
    Color::Rgba(RGBA8::new(red, green, blue, 0xff))
}

const DC1_TABLE: [u8; 5] = [0x00, 0x40, 0x80, 0xc0, 0xff];

fn is_1_component(u: u8) -> bool {
    u & 0x3f == 0 || u == 0xff
}

pub(crate) fn is_1(c: RGBA8) -> bool {
    is_1_component(c.r) && is_1_component(c.g) && is_1_component(c.b) && is_1_component(c.a)
}

pub(crate) fn is_2(c: RGBA8) -> bool {
    c.r % 0x11 == 0 && c.g % 0x11 == 0 && c.b % 0x11 == 0 && c.a % 0x11 == 0
}

pub(crate) fn is_3(c: RGBA8) -> bool {
    c.a == 0xff
}

/// `true` if the RGBA value is a valid alpha-premultiplied color: every
/// color component is less than or equal to the alpha component.
pub fn is_valid_premul(c: RGBA8) -> bool {
    c.r <= c.a && c.g <= c.a && c.b <= c.a
}

/// `true` if the RGBA value is the nonsensical bit pattern that carries
/// gradient parameters instead of a color.
pub fn is_gradient(c: RGBA8) -> bool {
    c.a == 0x00 && c.b & 0x80 != 0
}

/// The shape of a gradient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradientShape {
    Linear,
    Radial,
}

/// How to spread a gradient past its nominal bounds (from offset being 0.0
/// to offset being 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GradientSpread {
    None,
    Pad,
    Reflect,
    Repeat,
}

/// Gradient parameters, packed into an otherwise invalid alpha-premultiplied
/// RGBA value (alpha is zero yet the blue channel's high bit is set, so no
/// valid color collides with it).
///
/// The colors of the `num_stops` stops live at `CREG[c_base + i]` and their
/// offsets at `NREG[n_base + i]`; the six registers below `n_base` hold the
/// graphic-to-gradient affine matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GradientDesc {
    pub c_base: u8,
    pub n_base: u8,
    pub shape: GradientShape,
    pub spread: GradientSpread,
    pub num_stops: u8,
}

impl GradientDesc {
    /// Packs the parameters into their RGBA carrier. The bit layout
    /// round-trips exactly through [`GradientDesc::unpack`] and the 4 byte
    /// color codec.
    pub fn pack(self) -> RGBA8 {
        let shape = 0x02 | self.shape as u8 & 0x01;
        RGBA8::new(
            self.num_stops & 0x3f,
            (self.c_base & 0x3f) | (self.spread as u8) << 6,
            (self.n_base & 0x3f) | shape << 6,
            0x00,
        )
    }

    /// Unpacks gradient parameters from an RGBA carrier, or `None` if the
    /// value is not a gradient bit pattern.
    pub fn unpack(c: RGBA8) -> Option<GradientDesc> {
        if !is_gradient(c) {
            return None;
        }
        Some(GradientDesc {
            c_base: c.g & 0x3f,
            n_base: c.b & 0x3f,
            shape: if c.b >> 6 & 0x01 == 0 {
                GradientShape::Linear
            } else {
                GradientShape::Radial
            },
            spread: match c.g >> 6 {
                0 => GradientSpread::None,
                1 => GradientSpread::Pad,
                2 => GradientSpread::Reflect,
                _ => GradientSpread::Repeat,
            },
            num_stops: c.r & 0x3f,
        })
    }
}
