//! This module provides the basic big-endian encoders for the writable
//! representation codes, one element per call.
//!
//! RP66 v1 streams are big-endian throughout, so unlike general-purpose
//! encoders there is no run-time endianness to resolve; every function
//! here goes through an explicit big-endian writer.

use super::{
    BadCharsetSnafu, IntOutOfRangeSnafu, Result, StringTooLongSnafu, WriteValueSnafu,
    YearOutOfRangeSnafu,
};
use byteordered::ByteOrdered;
use chrono::{DateTime, Datelike, Timelike, Utc};
use dlis_core::{AttRef, ObName, ObjRef, RepCode};
use snafu::{ensure, ResultExt};
use std::io::Write;

/// The largest value a UVARI can carry: the top two bits of the first byte
/// signal the length, leaving 30 value bits in the four-byte form.
pub const UVARI_MAX: u32 = (1 << 30) - 1;

/// Encode a one-byte unsigned integer.
pub fn encode_ushort<W>(to: W, value: u8) -> Result<usize>
where
    W: Write,
{
    ByteOrdered::be(to)
        .write_u8(value)
        .context(WriteValueSnafu {
            code: RepCode::Ushort,
        })?;
    Ok(1)
}

/// Encode a two-byte unsigned integer.
pub fn encode_unorm<W>(to: W, value: u16) -> Result<usize>
where
    W: Write,
{
    ByteOrdered::be(to)
        .write_u16(value)
        .context(WriteValueSnafu {
            code: RepCode::Unorm,
        })?;
    Ok(2)
}

/// Encode a four-byte unsigned integer.
pub fn encode_ulong<W>(to: W, value: u32) -> Result<usize>
where
    W: Write,
{
    ByteOrdered::be(to)
        .write_u32(value)
        .context(WriteValueSnafu {
            code: RepCode::Ulong,
        })?;
    Ok(4)
}

/// Encode a one-byte signed integer.
pub fn encode_sshort<W>(to: W, value: i8) -> Result<usize>
where
    W: Write,
{
    ByteOrdered::be(to)
        .write_i8(value)
        .context(WriteValueSnafu {
            code: RepCode::Sshort,
        })?;
    Ok(1)
}

/// Encode a two-byte signed integer.
pub fn encode_snorm<W>(to: W, value: i16) -> Result<usize>
where
    W: Write,
{
    ByteOrdered::be(to)
        .write_i16(value)
        .context(WriteValueSnafu {
            code: RepCode::Snorm,
        })?;
    Ok(2)
}

/// Encode a four-byte signed integer.
pub fn encode_slong<W>(to: W, value: i32) -> Result<usize>
where
    W: Write,
{
    ByteOrdered::be(to)
        .write_i32(value)
        .context(WriteValueSnafu {
            code: RepCode::Slong,
        })?;
    Ok(4)
}

/// Encode an IEEE 754 single precision float.
pub fn encode_fsingl<W>(to: W, value: f32) -> Result<usize>
where
    W: Write,
{
    ByteOrdered::be(to)
        .write_f32(value)
        .context(WriteValueSnafu {
            code: RepCode::Fsingl,
        })?;
    Ok(4)
}

/// Encode an IEEE 754 double precision float.
pub fn encode_fdoubl<W>(to: W, value: f64) -> Result<usize>
where
    W: Write,
{
    ByteOrdered::be(to)
        .write_f64(value)
        .context(WriteValueSnafu {
            code: RepCode::Fdoubl,
        })?;
    Ok(8)
}

/// Encode an IEEE 754 half precision float,
/// rounding the given single precision value to nearest-even.
pub fn encode_fshort<W>(to: W, value: f32) -> Result<usize>
where
    W: Write,
{
    ByteOrdered::be(to)
        .write_u16(f32_to_f16_bits(value))
        .context(WriteValueSnafu {
            code: RepCode::Fshort,
        })?;
    Ok(2)
}

/// The number of bytes the UVARI form of the given value occupies.
pub fn uvari_size(value: u32) -> Result<usize> {
    ensure!(
        value <= UVARI_MAX,
        IntOutOfRangeSnafu {
            code: RepCode::Uvari,
            value: i64::from(value),
        }
    );
    Ok(if value < 0x80 {
        1
    } else if value < 0x4000 {
        2
    } else {
        4
    })
}

/// Encode a variable-length unsigned integer.
///
/// The top two bits of the first byte signal the total length:
/// `0…` one byte, `10…` two bytes, `11…` four bytes.
pub fn encode_uvari<W>(to: W, value: u32) -> Result<usize>
where
    W: Write,
{
    let size = uvari_size(value)?;
    let mut to = ByteOrdered::be(to);
    let context = WriteValueSnafu {
        code: RepCode::Uvari,
    };
    match size {
        1 => to.write_u8(value as u8).context(context)?,
        2 => to.write_u16(0x8000 | value as u16).context(context)?,
        _ => to.write_u32(0xC000_0000 | value).context(context)?,
    }
    Ok(size)
}

fn check_ident(code: RepCode, s: &str) -> Result<()> {
    ensure!(
        s.len() <= 255,
        StringTooLongSnafu {
            code,
            length: s.len(),
        }
    );
    ensure!(
        s.bytes().all(|b| (0x20..=0x7E).contains(&b)),
        BadCharsetSnafu { code }
    );
    Ok(())
}

/// The number of bytes the IDENT form of the given string occupies.
pub fn ident_size(s: &str) -> Result<usize> {
    check_ident(RepCode::Ident, s)?;
    Ok(1 + s.len())
}

/// Encode a short identifier string: a one-byte length then ASCII bytes.
pub fn encode_ident<W>(mut to: W, s: &str) -> Result<usize>
where
    W: Write,
{
    check_ident(RepCode::Ident, s)?;
    let context = WriteValueSnafu {
        code: RepCode::Ident,
    };
    ByteOrdered::be(&mut to)
        .write_u8(s.len() as u8)
        .context(context)?;
    to.write_all(s.as_bytes()).context(context)?;
    Ok(1 + s.len())
}

/// The number of bytes the ASCII form of the given string occupies.
pub fn ascii_size(s: &str) -> Result<usize> {
    ensure!(s.is_ascii(), BadCharsetSnafu { code: RepCode::Ascii });
    let length = u32::try_from(s.len()).unwrap_or(u32::MAX);
    ensure!(
        length <= UVARI_MAX,
        StringTooLongSnafu {
            code: RepCode::Ascii,
            length: s.len(),
        }
    );
    Ok(uvari_size(length)? + s.len())
}

/// Encode a free text string: a UVARI length then ASCII bytes.
pub fn encode_ascii<W>(mut to: W, s: &str) -> Result<usize>
where
    W: Write,
{
    let size = ascii_size(s)?;
    encode_uvari(&mut to, s.len() as u32)?;
    to.write_all(s.as_bytes()).context(WriteValueSnafu {
        code: RepCode::Ascii,
    })?;
    Ok(size)
}

fn check_units(s: &str) -> Result<()> {
    ensure!(
        s.len() <= 255,
        StringTooLongSnafu {
            code: RepCode::Units,
            length: s.len(),
        }
    );
    ensure!(
        s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b" ./()-,%*#:+".contains(&b)),
        BadCharsetSnafu {
            code: RepCode::Units,
        }
    );
    Ok(())
}

/// The number of bytes the UNITS form of the given string occupies.
pub fn units_size(s: &str) -> Result<usize> {
    check_units(s)?;
    Ok(1 + s.len())
}

/// Encode a unit symbol: the IDENT layout with a stricter character set.
pub fn encode_units<W>(mut to: W, s: &str) -> Result<usize>
where
    W: Write,
{
    check_units(s)?;
    let context = WriteValueSnafu {
        code: RepCode::Units,
    };
    ByteOrdered::be(&mut to)
        .write_u8(s.len() as u8)
        .context(context)?;
    to.write_all(s.as_bytes()).context(context)?;
    Ok(1 + s.len())
}

/// Encode a calendar instant in the fixed 8-byte DTIME layout.
///
/// The writer always stamps GMT: the time-zone nibble is zero and the
/// instant's own UTC field values are written out.
pub fn encode_dtime<W>(to: W, dt: &DateTime<Utc>) -> Result<usize>
where
    W: Write,
{
    let year = dt.year();
    ensure!((1900..=2155).contains(&year), YearOutOfRangeSnafu { year });
    let context = WriteValueSnafu {
        code: RepCode::Dtime,
    };
    let mut to = ByteOrdered::be(to);
    to.write_u8((year - 1900) as u8).context(context)?;
    to.write_u8(dt.month() as u8).context(context)?;
    to.write_u8(dt.day() as u8).context(context)?;
    to.write_u8(dt.hour() as u8).context(context)?;
    to.write_u8(dt.minute() as u8).context(context)?;
    to.write_u8(dt.second() as u8).context(context)?;
    to.write_u16(dt.timestamp_subsec_millis().min(999) as u16)
        .context(context)?;
    Ok(8)
}

/// The number of bytes the OBNAME form of the given name occupies.
pub fn obname_size(name: &ObName) -> Result<usize> {
    Ok(uvari_size(name.origin)? + 1 + ident_size(&name.name)?)
}

/// Encode an object name: UVARI origin reference, one-byte copy number,
/// IDENT identifier.
pub fn encode_obname<W>(mut to: W, name: &ObName) -> Result<usize>
where
    W: Write,
{
    let mut written = encode_uvari(&mut to, name.origin)?;
    written += encode_ushort(&mut to, name.copy)?;
    written += encode_ident(&mut to, &name.name)?;
    Ok(written)
}

/// The number of bytes the OBJREF form of the given reference occupies.
pub fn objref_size(r: &ObjRef) -> Result<usize> {
    Ok(ident_size(&r.set_type)? + obname_size(&r.name)?)
}

/// Encode a typed object reference: IDENT set type then OBNAME.
pub fn encode_objref<W>(mut to: W, r: &ObjRef) -> Result<usize>
where
    W: Write,
{
    let mut written = encode_ident(&mut to, &r.set_type)?;
    written += encode_obname(&mut to, &r.name)?;
    Ok(written)
}

/// The number of bytes the ATTREF form of the given reference occupies.
pub fn attref_size(r: &AttRef) -> Result<usize> {
    Ok(ident_size(&r.set_type)? + obname_size(&r.name)? + ident_size(&r.label)?)
}

/// Encode an attribute reference: IDENT set type, OBNAME, IDENT label.
pub fn encode_attref<W>(mut to: W, r: &AttRef) -> Result<usize>
where
    W: Write,
{
    let mut written = encode_ident(&mut to, &r.set_type)?;
    written += encode_obname(&mut to, &r.name)?;
    written += encode_ident(&mut to, &r.label)?;
    Ok(written)
}

/// Convert a single precision float to IEEE 754 binary16 bits,
/// rounding to nearest-even.
pub fn f32_to_f16_bits(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits >> 16) & 0x8000) as u16;
    let exp = ((bits >> 23) & 0xFF) as i32;
    let mant = bits & 0x007F_FFFF;

    if exp == 0xFF {
        // infinity or NaN; keep NaNs quiet
        let payload = if mant != 0 { 0x0200 } else { 0 };
        return sign | 0x7C00 | payload;
    }

    let unbiased = exp - 127;
    if unbiased >= 16 {
        return sign | 0x7C00;
    }
    if unbiased >= -14 {
        // normal number; round the 13 bits shifted out, letting a carry
        // ripple into the exponent
        let mant16 = (mant >> 13) as u16;
        let half = sign | (((unbiased + 15) as u16) << 10) | mant16;
        let round = mant & 0x1FFF;
        if round > 0x1000 || (round == 0x1000 && mant16 & 1 == 1) {
            return half + 1;
        }
        return half;
    }
    if unbiased >= -25 {
        // subnormal in half precision
        let mant = mant | 0x0080_0000;
        let shift = 13 - 14 - unbiased;
        let mant16 = (mant >> shift) as u16;
        let rem = mant & ((1 << shift) - 1);
        let halfway = 1_u32 << (shift - 1);
        if rem > halfway || (rem == halfway && mant16 & 1 == 1) {
            return sign | (mant16 + 1);
        }
        return sign | mant16;
    }
    sign
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bytes_of<F>(f: F) -> Vec<u8>
    where
        F: FnOnce(&mut Vec<u8>) -> Result<usize>,
    {
        let mut out = vec![];
        let n = f(&mut out).unwrap();
        assert_eq!(n, out.len());
        out
    }

    #[test]
    fn uvari_boundaries() {
        assert_eq!(bytes_of(|w| encode_uvari(w, 0)), &[0x00]);
        assert_eq!(bytes_of(|w| encode_uvari(w, 127)), &[0x7F]);
        assert_eq!(bytes_of(|w| encode_uvari(w, 128)), &[0x80, 0x80]);
        assert_eq!(bytes_of(|w| encode_uvari(w, 16_383)), &[0xBF, 0xFF]);
        assert_eq!(
            bytes_of(|w| encode_uvari(w, 16_384)),
            &[0xC0, 0x00, 0x40, 0x00]
        );
        assert_eq!(uvari_size(127).unwrap(), 1);
        assert_eq!(uvari_size(128).unwrap(), 2);
        assert_eq!(uvari_size(16_383).unwrap(), 2);
        assert_eq!(uvari_size(16_384).unwrap(), 4);
        assert_eq!(uvari_size(UVARI_MAX).unwrap(), 4);
        assert!(uvari_size(UVARI_MAX + 1).is_err());
    }

    #[test]
    fn ident_layout() {
        assert_eq!(bytes_of(|w| encode_ident(w, "MAIN")), b"\x04MAIN");
        assert_eq!(bytes_of(|w| encode_ident(w, "")), b"\x00");
        assert!(encode_ident(&mut vec![], &"X".repeat(256)).is_err());
        assert!(encode_ident(&mut vec![], "bad\nchar").is_err());
    }

    #[test]
    fn ascii_layout_uses_uvari_length() {
        assert_eq!(bytes_of(|w| encode_ascii(w, "hi there")), b"\x08hi there");
        let long = "y".repeat(200);
        let out = bytes_of(|w| encode_ascii(w, &long));
        assert_eq!(&out[..2], &[0x80, 200]);
        assert_eq!(out.len(), 202);
        assert!(encode_ascii(&mut vec![], "caf\u{e9}").is_err());
    }

    #[test]
    fn units_charset() {
        assert_eq!(bytes_of(|w| encode_units(w, "m/s")), b"\x03m/s");
        assert!(encode_units(&mut vec![], "m_s").is_err());
    }

    #[test]
    fn dtime_layout() {
        let dt = Utc
            .with_ymd_and_hms(2023, 7, 13, 11, 30, 45)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(125))
            .unwrap();
        assert_eq!(
            bytes_of(|w| encode_dtime(w, &dt)),
            &[0x7B, 0x07, 0x0D, 0x0B, 0x1E, 0x2D, 0x00, 0x7D]
        );
        let late = Utc.with_ymd_and_hms(2156, 1, 1, 0, 0, 0).unwrap();
        assert!(encode_dtime(&mut vec![], &late).is_err());
        let early = Utc.with_ymd_and_hms(1899, 12, 31, 23, 59, 59).unwrap();
        assert!(encode_dtime(&mut vec![], &early).is_err());
    }

    #[test]
    fn obname_layout() {
        let name = ObName::new(1, 0, "MAIN");
        assert_eq!(
            bytes_of(|w| encode_obname(w, &name)),
            b"\x01\x00\x04MAIN"
        );
        assert_eq!(obname_size(&name).unwrap(), 7);
    }

    #[test]
    fn objref_layout() {
        let r = ObjRef::new("CHANNEL", ObName::new(1, 0, "RPM"));
        assert_eq!(
            bytes_of(|w| encode_objref(w, &r)),
            b"\x07CHANNEL\x01\x00\x03RPM"
        );
    }

    #[test]
    fn half_precision_bits() {
        assert_eq!(f32_to_f16_bits(0.0), 0x0000);
        assert_eq!(f32_to_f16_bits(-0.0), 0x8000);
        assert_eq!(f32_to_f16_bits(1.0), 0x3C00);
        assert_eq!(f32_to_f16_bits(-2.0), 0xC000);
        assert_eq!(f32_to_f16_bits(0.5), 0x3800);
        assert_eq!(f32_to_f16_bits(65504.0), 0x7BFF);
        assert_eq!(f32_to_f16_bits(1e6), 0x7C00);
        assert_eq!(f32_to_f16_bits(f32::INFINITY), 0x7C00);
        assert_ne!(f32_to_f16_bits(f32::NAN) & 0x03FF, 0);
        // smallest positive subnormal
        assert_eq!(f32_to_f16_bits(5.96e-8), 0x0001);
    }

    #[test]
    fn fixed_width_floats() {
        assert_eq!(
            bytes_of(|w| encode_fdoubl(w, 0.0)),
            &[0, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(bytes_of(|w| encode_fsingl(w, -1.5)), &[0xBF, 0xC0, 0, 0]);
        assert_eq!(bytes_of(|w| encode_fshort(w, 1.0)), &[0x3C, 0x00]);
    }
}
