//! Decoder.
use cgmath::{Point2, Vector2};
use rgb::RGBA8;

use crate::{
    color, num, Color, Destination, Error, Metadata, Palette, ViewBox, MAGIC,
    MID_SUGGESTED_PALETTE, MID_VIEW_BOX,
};

/// Options for [`decode_with`].
///
/// The palette overrides are applied after the stream's own metadata chunks
/// are parsed, so a caller can recolor a graphic without re-encoding it.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    palette: Option<Palette>,
    overrides: Vec<(u8, RGBA8)>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the complete palette with the given one.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }

    /// Replace the color at the given index (taken modulo 64) of the decoded
    /// palette.
    pub fn with_color_at(mut self, index: u8, color: RGBA8) -> Self {
        self.overrides.push((index & 0x3f, color));
        self
    }
}

/// Decodes an IconVG graphic, driving `dst` with the decoded actions. The
/// palette suggested in the graphic's data is used as-is.
pub fn decode<D: Destination + ?Sized>(dst: &mut D, src: &[u8]) -> Result<(), Error> {
    decode_with(dst, src, &DecodeOptions::default())
}

/// Decodes an IconVG graphic with the given options.
pub fn decode_with<D: Destination + ?Sized>(
    dst: &mut D,
    src: &[u8],
    options: &DecodeOptions,
) -> Result<(), Error> {
    let mut cur = Cursor { src };
    let metadata = cur.decode_metadata(options)?;
    dst.reset(metadata.view_box, &metadata.palette);

    let mut mode = Mode::Styling;
    while !cur.src.is_empty() {
        mode = match mode {
            Mode::Styling => cur.decode_styling(dst)?,
            Mode::Drawing => cur.decode_drawing(dst)?,
        };
    }
    Ok(())
}

/// Decodes only the metadata in an IconVG graphic.
pub fn decode_metadata(src: &[u8]) -> Result<Metadata, Error> {
    Cursor { src }.decode_metadata(&DecodeOptions::default())
}

/// Whether the stream position is at styling or drawing opcodes.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Styling,
    Drawing,
}

struct Cursor<'a> {
    src: &'a [u8],
}

impl<'a> Cursor<'a> {
    fn read_natural_or(&mut self, err: Error) -> Result<u32, Error> {
        let (u, n) = num::decode_natural(self.src).ok_or(err)?;
        self.src = &self.src[n..];
        Ok(u)
    }

    fn read_natural(&mut self) -> Result<u32, Error> {
        self.read_natural_or(Error::InvalidNumber)
    }

    fn read_real(&mut self) -> Result<f32, Error> {
        let (f, n) = num::decode_real(self.src).ok_or(Error::InvalidNumber)?;
        self.src = &self.src[n..];
        Ok(f)
    }

    fn read_coordinate(&mut self) -> Result<f32, Error> {
        let (f, n) = num::decode_coordinate(self.src).ok_or(Error::InvalidNumber)?;
        self.src = &self.src[n..];
        Ok(f)
    }

    fn read_zero_to_one(&mut self) -> Result<f32, Error> {
        let (f, n) = num::decode_zero_to_one(self.src).ok_or(Error::InvalidNumber)?;
        self.src = &self.src[n..];
        Ok(f)
    }

    fn read_point(&mut self) -> Result<Point2<f32>, Error> {
        let x = self.read_coordinate()?;
        let y = self.read_coordinate()?;
        Ok(Point2::new(x, y))
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        if self.src.len() < n {
            return Err(Error::InvalidColor);
        }
        let (head, tail) = self.src.split_at(n);
        self.src = tail;
        Ok(head)
    }

    fn read_color1(&mut self) -> Result<Color, Error> {
        let b = self.read_bytes(1)?;
        Ok(color::decode_color1(b[0]))
    }

    fn read_color2(&mut self) -> Result<Color, Error> {
        let b = self.read_bytes(2)?;
        Ok(Color::Rgba(RGBA8::new(
            0x11 * (b[0] >> 4),
            0x11 * (b[0] & 0x0f),
            0x11 * (b[1] >> 4),
            0x11 * (b[1] & 0x0f),
        )))
    }

    fn read_color3_direct(&mut self) -> Result<Color, Error> {
        let b = self.read_bytes(3)?;
        Ok(Color::Rgba(RGBA8::new(b[0], b[1], b[2], 0xff)))
    }

    fn read_color4(&mut self) -> Result<Color, Error> {
        let b = self.read_bytes(4)?;
        Ok(Color::Rgba(RGBA8::new(b[0], b[1], b[2], b[3])))
    }

    fn read_color3_indirect(&mut self) -> Result<Color, Error> {
        let b = self.read_bytes(3)?;
        Ok(Color::Blend {
            t: b[0],
            c0: b[1],
            c1: b[2],
        })
    }

    fn decode_metadata(&mut self, options: &DecodeOptions) -> Result<Metadata, Error> {
        if self.src.len() < MAGIC.len() || self.src[..MAGIC.len()] != MAGIC {
            return Err(Error::InvalidMagicIdentifier);
        }
        self.src = &self.src[MAGIC.len()..];

        let num_chunks = self.read_natural_or(Error::InvalidNumberOfMetadataChunks)?;
        let mut metadata = Metadata::default();
        for _ in 0..num_chunks {
            self.decode_metadata_chunk(&mut metadata)?;
        }

        if let Some(palette) = options.palette {
            metadata.palette = palette;
        }
        for &(i, c) in &options.overrides {
            metadata.palette[usize::from(i)] = c;
        }
        Ok(metadata)
    }

    fn decode_metadata_chunk(&mut self, metadata: &mut Metadata) -> Result<(), Error> {
        let length = self.read_natural_or(Error::InvalidMetadataChunkLength)?;
        let want_remaining = (self.src.len() as u64).checked_sub(u64::from(length));
        let mid = self.read_natural_or(Error::InvalidMetadataIdentifier)?;

        match mid {
            MID_VIEW_BOX => {
                let mut coords = [0.0; 4];
                for c in coords.iter_mut() {
                    *c = self.read_coordinate().map_err(|_| Error::InvalidViewBox)?;
                }
                let view_box = ViewBox::new(coords[0], coords[1], coords[2], coords[3]);
                if !view_box.is_valid() {
                    return Err(Error::InvalidViewBox);
                }
                metadata.view_box = view_box;
            }
            MID_SUGGESTED_PALETTE => {
                let &header = self.src.first().ok_or(Error::InvalidSuggestedPalette)?;
                self.src = &self.src[1..];
                let length = 1 + usize::from(header & 0x3f);
                let format = header >> 6;
                for entry in metadata.palette[..length].iter_mut() {
                    let c = match format {
                        0 => self.read_color1(),
                        1 => self.read_color2(),
                        2 => self.read_color3_direct(),
                        _ => self.read_color4(),
                    }
                    .map_err(|_| Error::InvalidSuggestedPalette)?;
                    // Indirect or non-premultiplied entries degrade to
                    // opaque black rather than failing the whole graphic.
                    *entry = c.rgba().unwrap_or(RGBA8::new(0x00, 0x00, 0x00, 0xff));
                }
            }
            _ => return Err(Error::UnsupportedMetadataIdentifier),
        }

        if want_remaining != Some(self.src.len() as u64) {
            return Err(Error::InconsistentMetadataChunkLength);
        }
        Ok(())
    }

    fn decode_styling<D: Destination + ?Sized>(&mut self, dst: &mut D) -> Result<Mode, Error> {
        let opcode = self.src[0];
        self.src = &self.src[1..];
        match opcode {
            0x00..=0x3f => dst.set_csel(opcode & 0x3f),
            0x40..=0x7f => dst.set_nsel(opcode & 0x3f),
            0x80..=0xa7 => {
                let (adj, incr) = selector_adjustment(opcode);
                let color = match (opcode - 0x80) >> 3 {
                    0 => self.read_color1()?,
                    1 => self.read_color2()?,
                    2 => self.read_color3_direct()?,
                    3 => self.read_color4()?,
                    _ => self.read_color3_indirect()?,
                };
                dst.set_creg(adj, incr, color);
            }
            0xa8..=0xbf => {
                let (adj, incr) = selector_adjustment(opcode);
                let value = match (opcode - 0xa8) >> 3 {
                    0 => self.read_real()?,
                    1 => self.read_coordinate()?,
                    _ => self.read_zero_to_one()?,
                };
                dst.set_nreg(adj, incr, value);
            }
            0xc0..=0xc6 => {
                let p = self.read_point()?;
                dst.start_path(opcode & 0x07, p);
                return Ok(Mode::Drawing);
            }
            0xc7 => {
                let lod0 = self.read_real()?;
                let lod1 = self.read_real()?;
                dst.set_lod(lod0, lod1);
            }
            _ => return Err(Error::UnsupportedStylingOpcode),
        }
        Ok(Mode::Styling)
    }

    fn decode_drawing<D: Destination + ?Sized>(&mut self, dst: &mut D) -> Result<Mode, Error> {
        let opcode = self.src[0];
        self.src = &self.src[1..];
        match opcode {
            0x00..=0xdf => {
                let reps = if opcode < 0x40 {
                    1 + usize::from(opcode & 0x1f)
                } else {
                    1 + usize::from(opcode & 0x0f)
                };
                for _ in 0..reps {
                    self.decode_segment(dst, opcode >> 4)?;
                }
            }
            0xe1 => {
                dst.close_path_end_path();
                return Ok(Mode::Styling);
            }
            0xe2 => {
                let p = self.read_point()?;
                dst.close_path_abs_move_to(p);
            }
            0xe3 => {
                let p = self.read_point()?;
                dst.close_path_rel_move_to(p);
            }
            0xe6 => {
                let x = self.read_coordinate()?;
                dst.abs_h_line_to(x);
            }
            0xe7 => {
                let x = self.read_coordinate()?;
                dst.rel_h_line_to(x);
            }
            0xe8 => {
                let y = self.read_coordinate()?;
                dst.abs_v_line_to(y);
            }
            0xe9 => {
                let y = self.read_coordinate()?;
                dst.rel_v_line_to(y);
            }
            _ => return Err(Error::UnsupportedDrawingOpcode),
        }
        Ok(Mode::Drawing)
    }

    fn decode_segment<D: Destination + ?Sized>(&mut self, dst: &mut D, kind: u8) -> Result<(), Error> {
        match kind {
            0x00 | 0x01 => {
                let p = self.read_point()?;
                dst.abs_line_to(p);
            }
            0x02 | 0x03 => {
                let p = self.read_point()?;
                dst.rel_line_to(p);
            }
            0x04 => {
                let p = self.read_point()?;
                dst.abs_smooth_quad_to(p);
            }
            0x05 => {
                let p = self.read_point()?;
                dst.rel_smooth_quad_to(p);
            }
            0x06 => {
                let cp = self.read_point()?;
                let p = self.read_point()?;
                dst.abs_quad_to(cp, p);
            }
            0x07 => {
                let cp = self.read_point()?;
                let p = self.read_point()?;
                dst.rel_quad_to(cp, p);
            }
            0x08 => {
                let cp2 = self.read_point()?;
                let p = self.read_point()?;
                dst.abs_smooth_cube_to(cp2, p);
            }
            0x09 => {
                let cp2 = self.read_point()?;
                let p = self.read_point()?;
                dst.rel_smooth_cube_to(cp2, p);
            }
            0x0a => {
                let cp1 = self.read_point()?;
                let cp2 = self.read_point()?;
                let p = self.read_point()?;
                dst.abs_cube_to(cp1, cp2, p);
            }
            0x0b => {
                let cp1 = self.read_point()?;
                let cp2 = self.read_point()?;
                let p = self.read_point()?;
                dst.rel_cube_to(cp1, cp2, p);
            }
            _ => {
                let rx = self.read_coordinate()?;
                let ry = self.read_coordinate()?;
                let angle = self.read_zero_to_one()?;
                let flags = self.read_natural()?;
                let p = self.read_point()?;
                let large_arc = flags & 0x01 != 0;
                let sweep = flags & 0x02 != 0;
                if kind == 0x0c {
                    dst.abs_arc_to(Vector2::new(rx, ry), angle, large_arc, sweep, p);
                } else {
                    dst.rel_arc_to(Vector2::new(rx, ry), angle, large_arc, sweep, p);
                }
            }
        }
        Ok(())
    }
}

/// Splits a register opcode's low three bits into the selector adjustment.
/// The value 7 means "adjustment 0, then increment the selector".
fn selector_adjustment(opcode: u8) -> (u8, bool) {
    let adj = opcode & 0x07;
    if adj == 7 {
        (0, true)
    } else {
        (adj, false)
    }
}
