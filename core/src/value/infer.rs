//! Best-effort inference of a representation code from a value.
//!
//! Inference is centralized here as a single total, side-effect-free
//! function so that every layer of the writer picks codes consistently.

use super::Value;
use crate::reprcode::RepCode;

/// The narrowing policy applied when inferring a code from a number.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum InferencePolicy {
    /// Prefer the narrowest code that holds every element losslessly.
    #[default]
    Narrow,
    /// Prefer the four-byte integer codes and double precision floats.
    Wide,
}

/// Whether a string can be carried under the IDENT representation code:
/// at most 255 bytes, all of them printable ASCII without spaces.
pub fn ident_safe(s: &str) -> bool {
    s.len() <= 255 && s.bytes().all(|b| (0x21..=0x7E).contains(&b))
}

/// Infer the best representation code for the given value.
///
/// For numbers, the narrowest exact lossless code that holds all list
/// elements is preferred under [`InferencePolicy::Narrow`]. Strings lacking
/// IDENT-safe bytes fall back to ASCII. Date-time values force DTIME.
/// Returns `None` when no supported code can hold every element, such as an
/// integer beyond the four-byte range.
pub fn infer_code(value: &Value, policy: InferencePolicy) -> Option<RepCode> {
    match value {
        Value::Int(c) => {
            let min = c.iter().copied().min().unwrap_or(0);
            let max = c.iter().copied().max().unwrap_or(0);
            infer_int_code(min, max, policy)
        }
        Value::Float(c) => match policy {
            InferencePolicy::Wide => Some(RepCode::Fdoubl),
            InferencePolicy::Narrow => {
                if c.iter().all(|v| f64::from(*v as f32) == *v) {
                    Some(RepCode::Fsingl)
                } else {
                    Some(RepCode::Fdoubl)
                }
            }
        },
        Value::Str(c) => {
            if c.iter().all(|s| ident_safe(s)) {
                Some(RepCode::Ident)
            } else {
                Some(RepCode::Ascii)
            }
        }
        Value::DateTime(_) => Some(RepCode::Dtime),
        Value::ObName(_) => Some(RepCode::Obname),
        Value::ObjRef(_) => Some(RepCode::Objref),
        Value::AttRef(_) => Some(RepCode::Attref),
    }
}

fn infer_int_code(min: i64, max: i64, policy: InferencePolicy) -> Option<RepCode> {
    if min < 0 {
        let fits = |lo: i64, hi: i64| min >= lo && max <= hi;
        match policy {
            InferencePolicy::Wide if fits(i64::from(i32::MIN), i64::from(i32::MAX)) => {
                Some(RepCode::Slong)
            }
            InferencePolicy::Wide => None,
            InferencePolicy::Narrow if fits(i64::from(i8::MIN), i64::from(i8::MAX)) => {
                Some(RepCode::Sshort)
            }
            InferencePolicy::Narrow if fits(i64::from(i16::MIN), i64::from(i16::MAX)) => {
                Some(RepCode::Snorm)
            }
            InferencePolicy::Narrow if fits(i64::from(i32::MIN), i64::from(i32::MAX)) => {
                Some(RepCode::Slong)
            }
            InferencePolicy::Narrow => None,
        }
    } else {
        match policy {
            InferencePolicy::Wide if max <= i64::from(u32::MAX) => Some(RepCode::Ulong),
            InferencePolicy::Wide => None,
            InferencePolicy::Narrow if max <= i64::from(u8::MAX) => Some(RepCode::Ushort),
            InferencePolicy::Narrow if max <= i64::from(u16::MAX) => Some(RepCode::Unorm),
            InferencePolicy::Narrow if max <= i64::from(u32::MAX) => Some(RepCode::Ulong),
            InferencePolicy::Narrow => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::ObName;
    use chrono::{TimeZone, Utc};

    fn narrow(value: impl Into<Value>) -> Option<RepCode> {
        infer_code(&value.into(), InferencePolicy::Narrow)
    }

    #[test]
    fn narrowest_int_code_holding_all_elements() {
        assert_eq!(narrow(0_i64), Some(RepCode::Ushort));
        assert_eq!(narrow(255_i64), Some(RepCode::Ushort));
        assert_eq!(narrow(256_i64), Some(RepCode::Unorm));
        assert_eq!(narrow(65_536_i64), Some(RepCode::Ulong));
        assert_eq!(narrow(-1_i64), Some(RepCode::Sshort));
        assert_eq!(narrow(-129_i64), Some(RepCode::Snorm));
        assert_eq!(narrow(vec![-1_i64, 300]), Some(RepCode::Snorm));
        assert_eq!(narrow(vec![-1_i64, 70_000]), Some(RepCode::Slong));
        assert_eq!(narrow(i64::from(u32::MAX) + 1), None);
        assert_eq!(narrow(i64::from(i32::MIN) - 1), None);
    }

    #[test]
    fn wide_int_codes() {
        let v = Value::from(3_i64);
        assert_eq!(infer_code(&v, InferencePolicy::Wide), Some(RepCode::Ulong));
        let v = Value::from(-3_i64);
        assert_eq!(infer_code(&v, InferencePolicy::Wide), Some(RepCode::Slong));
    }

    #[test]
    fn float_exactness_drives_width() {
        assert_eq!(narrow(0.5_f64), Some(RepCode::Fsingl));
        assert_eq!(narrow(0.1_f64), Some(RepCode::Fdoubl));
        assert_eq!(narrow(vec![0.5_f64, 0.1]), Some(RepCode::Fdoubl));
        let v = Value::from(0.5_f64);
        assert_eq!(infer_code(&v, InferencePolicy::Wide), Some(RepCode::Fdoubl));
    }

    #[test]
    fn string_fallback_to_ascii() {
        assert_eq!(narrow("DEPTH"), Some(RepCode::Ident));
        assert_eq!(narrow("two words"), Some(RepCode::Ascii));
        let long = "X".repeat(256);
        assert_eq!(narrow(long), Some(RepCode::Ascii));
    }

    #[test]
    fn forced_kinds() {
        let dt = Utc.with_ymd_and_hms(2023, 7, 13, 11, 30, 45).unwrap();
        assert_eq!(narrow(dt), Some(RepCode::Dtime));
        assert_eq!(narrow(ObName::new(1, 0, "MAIN")), Some(RepCode::Obname));
    }
}
