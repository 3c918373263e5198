//! The variable length numeric codec shared by every number on the wire.
//!
//! Four kinds (natural, real, coordinate, zero-to-one) ride a common natural
//! number carrier with three widths. A 1 byte encoding has the low bit
//! clear; a 2 byte encoding has the low two bits `01`; a 4 byte encoding has
//! the low two bits `11`. The 4 byte form of the typed kinds carries IEEE-754
//! binary32 bits in the upper 30 bits, so the two low mantissa bits are
//! sacrificed to the length tag.
//!
//! The `decode_*` functions return the value and the number of bytes it was
//! encoded in, or `None` if the buffer is too short. The `encode_*`
//! functions append the shortest form that represents the value exactly and
//! cannot fail.

pub(crate) fn decode_natural(buf: &[u8]) -> Option<(u32, usize)> {
    let &x = buf.first()?;
    if x & 0x01 == 0 {
        return Some((u32::from(x) >> 1, 1));
    }
    if x & 0x02 == 0 {
        if buf.len() >= 2 {
            let y = u16::from_le_bytes([buf[0], buf[1]]);
            return Some((u32::from(y) >> 2, 2));
        }
        return None;
    }
    if buf.len() >= 4 {
        let y = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        return Some((y >> 2, 4));
    }
    None
}

pub(crate) fn decode_real(buf: &[u8]) -> Option<(f32, usize)> {
    let (u, n) = decode_natural(buf)?;
    match n {
        1 | 2 => Some((u as f32, n)),
        _ => Some((f32::from_bits(u << 2), n)),
    }
}

pub(crate) fn decode_coordinate(buf: &[u8]) -> Option<(f32, usize)> {
    let (u, n) = decode_natural(buf)?;
    match n {
        1 => Some(((u as i32 - 64) as f32, n)),
        2 => Some(((u as i32 - 64 * 128) as f32 / 64.0, n)),
        _ => Some((f32::from_bits(u << 2), n)),
    }
}

pub(crate) fn decode_zero_to_one(buf: &[u8]) -> Option<(f32, usize)> {
    let (u, n) = decode_natural(buf)?;
    match n {
        1 => Some((u as f32 / 120.0, n)),
        2 => Some((u as f32 / 15120.0, n)),
        _ => Some((f32::from_bits(u << 2), n)),
    }
}

pub(crate) fn encode_natural(buf: &mut Vec<u8>, u: u32) {
    if u < 1 << 7 {
        buf.push((u << 1) as u8);
        return;
    }
    if u < 1 << 14 {
        let v = (u << 2) | 1;
        buf.extend_from_slice(&[v as u8, (v >> 8) as u8]);
        return;
    }
    let v = (u << 2) | 3;
    buf.extend_from_slice(&v.to_le_bytes());
}

pub(crate) fn encode_real(buf: &mut Vec<u8>, f: f32) -> usize {
    let u = f as u32;
    if u as f32 == f && u < 1 << 14 {
        if u < 1 << 7 {
            buf.push((u << 1) as u8);
            return 1;
        }
        let v = (u << 2) | 1;
        buf.extend_from_slice(&[v as u8, (v >> 8) as u8]);
        return 2;
    }
    encode_4byte_real(buf, f);
    4
}

/// Encodes the 4 byte form. The two low mantissa bits are rounded to the
/// nearest multiple of 4 without carrying into the exponent, then replaced
/// by the `11` length tag.
pub(crate) fn encode_4byte_real(buf: &mut Vec<u8>, f: f32) {
    let u = f.to_bits();
    let mut v = u & 0x007f_ffff;
    if v < 0x007f_fffe {
        v += 2;
    }
    let u = (u & 0xff80_0000) | v | 0x03;
    buf.extend_from_slice(&u.to_le_bytes());
}

pub(crate) fn encode_coordinate(buf: &mut Vec<u8>, f: f32) -> usize {
    let i = f as i32;
    if -64 <= i && i < 64 && i as f32 == f {
        let u = (i + 64) as u32;
        buf.push((u << 1) as u8);
        return 1;
    }
    let i = (f * 64.0) as i32;
    if -128 * 64 <= i && i < 128 * 64 && i as f32 == f * 64.0 {
        let v = (((i + 128 * 64) as u32) << 2) | 1;
        buf.extend_from_slice(&[v as u8, (v >> 8) as u8]);
        return 2;
    }
    encode_4byte_real(buf, f);
    4
}

pub(crate) fn encode_zero_to_one(buf: &mut Vec<u8>, f: f32) -> usize {
    let u = (f * 15120.0) as u32;
    if u as f32 == f * 15120.0 && u < 15120 {
        if u % 126 == 0 {
            buf.push(((u / 126) << 1) as u8);
            return 1;
        }
        let v = (u << 2) | 1;
        buf.extend_from_slice(&[v as u8, (v >> 8) as u8]);
        return 2;
    }
    encode_4byte_real(buf, f);
    4
}

/// Encodes an angle, given as a fraction of a full turn, by normalizing it
/// into `[0, 1)` and using the zero-to-one form.
pub(crate) fn encode_angle(buf: &mut Vec<u8>, f: f32) -> usize {
    let g = f64::from(f);
    let g = g - g.floor();
    encode_zero_to_one(buf, g as f32)
}

/// The number of bytes [`encode_coordinate`] would use.
pub(crate) fn coordinate_width(f: f32) -> usize {
    let i = f as i32;
    if -64 <= i && i < 64 && i as f32 == f {
        return 1;
    }
    let i = (f * 64.0) as i32;
    if -128 * 64 <= i && i < 128 * 64 && i as f32 == f * 64.0 {
        return 2;
    }
    4
}

/// The number of bytes [`encode_zero_to_one`] would use.
pub(crate) fn zero_to_one_width(f: f32) -> usize {
    let u = (f * 15120.0) as u32;
    if u as f32 == f * 15120.0 && u < 15120 {
        if u % 126 == 0 {
            return 1;
        }
        return 2;
    }
    4
}
