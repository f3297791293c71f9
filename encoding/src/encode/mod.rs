//! This module contains all representation-code encoding logic.
//!
//! The free functions in [`basic`] write one element each; [`encode_value`]
//! and [`value_size`] dispatch a whole attribute value under the code in
//! force. Every multi-byte quantity is written big-endian regardless of the
//! host byte order.

use dlis_core::value::{Value, ValueType};
use dlis_core::RepCode;
use snafu::{Backtrace, Snafu};
use std::io::{self, Write};

pub mod basic;

pub use self::basic::{
    ascii_size, attref_size, encode_ascii, encode_attref, encode_dtime, encode_fdoubl,
    encode_fshort, encode_fsingl, encode_ident, encode_obname, encode_objref, encode_slong,
    encode_snorm, encode_sshort, encode_ulong, encode_units, encode_unorm, encode_ushort,
    encode_uvari, ident_size, obname_size, objref_size, units_size, uvari_size,
};

/// Module-level error type:
/// for errors which may occur while encoding DLIS values.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum Error {
    /// The underlying sink rejected the bytes.
    #[snafu(display("Failed to write {} value", code))]
    WriteValue {
        /// The representation code being written.
        code: RepCode,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// An integer does not fit the chosen representation code.
    #[snafu(display("Value {} is out of range for {}", value, code))]
    IntOutOfRange {
        /// The representation code in force.
        code: RepCode,
        /// The offending element.
        value: i64,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A string exceeds the length limit of its representation code.
    #[snafu(display("String of {} bytes is too long for {}", length, code))]
    StringTooLong {
        /// The representation code in force.
        code: RepCode,
        /// The offending length.
        length: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A string holds bytes outside the character set of its code.
    #[snafu(display("String holds bytes outside the {} character set", code))]
    BadCharset {
        /// The representation code in force.
        code: RepCode,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A date-time lies outside the representable 1900..=2155 year window.
    #[snafu(display("Year {} cannot be represented in DTIME", year))]
    YearOutOfRange {
        /// The offending year.
        year: i32,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The chosen representation code has no writable layout.
    #[snafu(display("Representation code {} is not supported for writing", code))]
    UnsupportedCode {
        /// The unsupported code.
        code: RepCode,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The value kind cannot be serialized under the chosen code.
    #[snafu(display("A {:?} value cannot be written as {}", kind, code))]
    ValueMismatch {
        /// The representation code in force.
        code: RepCode,
        /// The logical kind of the value.
        kind: ValueType,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Encode a whole attribute value under the given representation code,
/// element by element, returning the number of bytes written.
///
/// The function is total over the allowed value domain of each code:
/// an element outside that domain yields an error, never a silently
/// truncated byte stream.
pub fn encode_value<W>(mut to: W, code: RepCode, value: &Value) -> Result<usize>
where
    W: Write,
{
    use RepCode::*;
    let mut written = 0;
    match (code, value) {
        (Sshort | Snorm | Slong | Ushort | Unorm | Ulong | Uvari | Origin, Value::Int(c)) => {
            for v in c {
                written += encode_int(&mut to, code, *v)?;
            }
        }
        (Status, Value::Int(c)) => {
            for v in c {
                snafu::ensure!(
                    *v == 0 || *v == 1,
                    IntOutOfRangeSnafu { code, value: *v }
                );
                written += basic::encode_ushort(&mut to, *v as u8)?;
            }
        }
        (Fshort | Fsingl | Fdoubl, Value::Float(c)) => {
            for v in c {
                written += encode_float(&mut to, code, *v)?;
            }
        }
        // integers are exact under the IEEE 754 codes up to their mantissa
        (Fshort | Fsingl | Fdoubl, Value::Int(c)) => {
            for v in c {
                written += encode_float(&mut to, code, *v as f64)?;
            }
        }
        (Ident, Value::Str(c)) => {
            for s in c {
                written += basic::encode_ident(&mut to, s)?;
            }
        }
        (Ascii, Value::Str(c)) => {
            for s in c {
                written += basic::encode_ascii(&mut to, s)?;
            }
        }
        (Units, Value::Str(c)) => {
            for s in c {
                written += basic::encode_units(&mut to, s)?;
            }
        }
        (Dtime, Value::DateTime(c)) => {
            for dt in c {
                written += basic::encode_dtime(&mut to, dt)?;
            }
        }
        (Obname, Value::ObName(c)) => {
            for name in c {
                written += basic::encode_obname(&mut to, name)?;
            }
        }
        (Objref, Value::ObjRef(c)) => {
            for r in c {
                written += basic::encode_objref(&mut to, r)?;
            }
        }
        (Attref, Value::AttRef(c)) => {
            for r in c {
                written += basic::encode_attref(&mut to, r)?;
            }
        }
        (Fsing1 | Fsing2 | Isingl | Vsingl | Fdoub1 | Fdoub2 | Csingl | Cdoubl, _) => {
            return UnsupportedCodeSnafu { code }.fail();
        }
        (_, v) => {
            return ValueMismatchSnafu {
                code,
                kind: v.value_type(),
            }
            .fail();
        }
    }
    Ok(written)
}

/// Compute the exact number of bytes [`encode_value`] will produce for the
/// given code and value, without writing anything.
pub fn value_size(code: RepCode, value: &Value) -> Result<usize> {
    use RepCode::*;
    let mut total = 0;
    match (code, value) {
        (Sshort | Snorm | Slong | Ushort | Unorm | Ulong | Status, Value::Int(c)) => {
            let size = code.fixed_size().unwrap_or_default();
            total = size * c.len();
        }
        (Fshort | Fsingl | Fdoubl, Value::Float(c)) => {
            let size = code.fixed_size().unwrap_or_default();
            total = size * c.len();
        }
        (Fshort | Fsingl | Fdoubl, Value::Int(c)) => {
            let size = code.fixed_size().unwrap_or_default();
            total = size * c.len();
        }
        (Dtime, Value::DateTime(c)) => {
            total = 8 * c.len();
        }
        (Uvari | Origin, Value::Int(c)) => {
            for v in c {
                total += uvari_size(int_to_uvari(code, *v)?)?;
            }
        }
        (Ident, Value::Str(c)) => {
            for s in c {
                total += basic::ident_size(s)?;
            }
        }
        (Ascii, Value::Str(c)) => {
            for s in c {
                total += basic::ascii_size(s)?;
            }
        }
        (Units, Value::Str(c)) => {
            for s in c {
                total += basic::units_size(s)?;
            }
        }
        (Obname, Value::ObName(c)) => {
            for name in c {
                total += basic::obname_size(name)?;
            }
        }
        (Objref, Value::ObjRef(c)) => {
            for r in c {
                total += basic::objref_size(r)?;
            }
        }
        (Attref, Value::AttRef(c)) => {
            for r in c {
                total += basic::attref_size(r)?;
            }
        }
        (Fsing1 | Fsing2 | Isingl | Vsingl | Fdoub1 | Fdoub2 | Csingl | Cdoubl, _) => {
            return UnsupportedCodeSnafu { code }.fail();
        }
        (_, v) => {
            return ValueMismatchSnafu {
                code,
                kind: v.value_type(),
            }
            .fail();
        }
    }
    Ok(total)
}

/// Encode a single integer element under an integer representation code.
pub fn encode_int<W>(mut to: W, code: RepCode, value: i64) -> Result<usize>
where
    W: Write,
{
    use RepCode::*;
    match code {
        Sshort => basic::encode_sshort(&mut to, in_range(code, value)?),
        Snorm => basic::encode_snorm(&mut to, in_range(code, value)?),
        Slong => basic::encode_slong(&mut to, in_range(code, value)?),
        Ushort => basic::encode_ushort(&mut to, in_range(code, value)?),
        Unorm => basic::encode_unorm(&mut to, in_range(code, value)?),
        Ulong => basic::encode_ulong(&mut to, in_range(code, value)?),
        Uvari | Origin => basic::encode_uvari(&mut to, int_to_uvari(code, value)?),
        _ => ValueMismatchSnafu {
            code,
            kind: ValueType::Int,
        }
        .fail(),
    }
}

/// Encode a single float element under an IEEE 754 representation code.
pub fn encode_float<W>(mut to: W, code: RepCode, value: f64) -> Result<usize>
where
    W: Write,
{
    use RepCode::*;
    match code {
        Fshort => basic::encode_fshort(&mut to, value as f32),
        Fsingl => basic::encode_fsingl(&mut to, value as f32),
        Fdoubl => basic::encode_fdoubl(&mut to, value),
        Fsing1 | Fsing2 | Isingl | Vsingl | Fdoub1 | Fdoub2 | Csingl | Cdoubl => {
            UnsupportedCodeSnafu { code }.fail()
        }
        _ => ValueMismatchSnafu {
            code,
            kind: ValueType::Float,
        }
        .fail(),
    }
}

fn in_range<T>(code: RepCode, value: i64) -> Result<T>
where
    T: TryFrom<i64>,
{
    T::try_from(value).map_err(|_| IntOutOfRangeSnafu { code, value }.build())
}

fn int_to_uvari(code: RepCode, value: i64) -> Result<u32> {
    snafu::ensure!(
        (0..=i64::from(basic::UVARI_MAX)).contains(&value),
        IntOutOfRangeSnafu { code, value }
    );
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlis_core::ObName;

    fn encoded(code: RepCode, value: impl Into<Value>) -> Vec<u8> {
        let value = value.into();
        let mut out = vec![];
        let n = encode_value(&mut out, code, &value).unwrap();
        assert_eq!(n, out.len());
        assert_eq!(n, value_size(code, &value).unwrap());
        out
    }

    #[test]
    fn integer_ranges_are_enforced() {
        assert_eq!(encoded(RepCode::Ushort, 255), &[0xFF]);
        assert!(encode_value(&mut vec![], RepCode::Ushort, &Value::from(256)).is_err());
        assert!(encode_value(&mut vec![], RepCode::Sshort, &Value::from(-129)).is_err());
        assert!(encode_value(&mut vec![], RepCode::Uvari, &Value::from(-1)).is_err());
        assert_eq!(encoded(RepCode::Snorm, -2), &[0xFF, 0xFE]);
    }

    #[test]
    fn status_only_takes_zero_or_one() {
        assert_eq!(encoded(RepCode::Status, true), &[0x01]);
        assert_eq!(encoded(RepCode::Status, 0), &[0x00]);
        assert!(encode_value(&mut vec![], RepCode::Status, &Value::from(2)).is_err());
    }

    #[test]
    fn floats_are_big_endian_ieee() {
        assert_eq!(
            encoded(RepCode::Fdoubl, 7.5),
            &[0x40, 0x1E, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(encoded(RepCode::Fsingl, 1.0), &[0x3F, 0x80, 0x00, 0x00]);
        // integers pass through losslessly under float codes
        assert_eq!(encoded(RepCode::Fsingl, 2), &[0x40, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn multivalued_concatenation() {
        let out = encoded(RepCode::Unorm, vec![1_u16, 2]);
        assert_eq!(out, &[0x00, 0x01, 0x00, 0x02]);
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let err = encode_value(&mut vec![], RepCode::Dtime, &Value::from(1)).unwrap_err();
        assert!(matches!(err, Error::ValueMismatch { .. }));
        let err = value_size(RepCode::Obname, &Value::from("X")).unwrap_err();
        assert!(matches!(err, Error::ValueMismatch { .. }));
    }

    #[test]
    fn legacy_float_codes_are_rejected() {
        let err = encode_value(&mut vec![], RepCode::Vsingl, &Value::from(1.0)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCode { .. }));
        assert!(value_size(RepCode::Fsing1, &Value::from(1.0)).is_err());
    }

    #[test]
    fn obname_size_matches_bytes() {
        let name = Value::from(ObName::new(128, 2, "MAIN"));
        let out = encoded(RepCode::Obname, name);
        // two-byte UVARI origin, one-byte copy, one-byte length + 4 chars
        assert_eq!(out.len(), 2 + 1 + 1 + 4);
    }
}
