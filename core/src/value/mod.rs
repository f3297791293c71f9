//! Declaration and implementation of a DLIS attribute value.
//!
//! See [`Value`](./enum.Value.html).

use crate::name::{AttRef, ObName, ObjRef};
use smallvec::SmallVec;

mod infer;

pub use self::infer::{ident_safe, infer_code, InferencePolicy};

// Re-exported from chrono
pub use chrono::{DateTime, Utc};

/// An aggregation of one or more elements in a value.
pub type C<T> = SmallVec<[T; 2]>;

/// A tagged union over the value kinds an attribute may carry.
///
/// The variant selects the logical kind; the representation code in force
/// selects the wire layout within that kind. Multiple elements are contained
/// in a [`smallvec`] vector, conveniently aliased to the type [`C`].
///
/// `From` conversions into `Value` exist for single element types,
/// including the numeric types, `String`, `&str`, `bool`,
/// `DateTime<Utc>`, [`ObName`] and [`ObjRef`], and for vectors and
/// slices of the same.
///
/// # Example
///
/// ```
/// # use dlis_core::Value;
/// let value = Value::from(7.5);
/// assert_eq!(value.multiplicity(), 1);
///
/// let value = Value::from(vec![1_i32, 2, 3]);
/// assert_eq!(value.multiplicity(), 3);
/// ```
///
/// [`smallvec`]: https://docs.rs/smallvec
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    /// A sequence of integers.
    /// Serializable under any of the integer representation codes.
    Int(C<i64>),

    /// A sequence of floating point numbers.
    /// Serializable under the IEEE 754 float representation codes.
    Float(C<f64>),

    /// A sequence of strings.
    /// Serializable as IDENT, ASCII or UNITS.
    Str(C<String>),

    /// A sequence of calendar instants, serialized as DTIME.
    DateTime(C<DateTime<Utc>>),

    /// A sequence of object names, serialized as OBNAME.
    ObName(C<ObName>),

    /// A sequence of typed object references, serialized as OBJREF.
    ObjRef(C<ObjRef>),

    /// A sequence of attribute references, serialized as ATTREF.
    AttRef(C<AttRef>),
}

/// An enum representing the logical kind of a [`Value`],
/// without the content.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ValueType {
    /// Integer elements.
    Int,
    /// Floating point elements.
    Float,
    /// String elements.
    Str,
    /// Calendar date-time elements.
    DateTime,
    /// Object name elements.
    ObName,
    /// Typed object reference elements.
    ObjRef,
    /// Attribute reference elements.
    AttRef,
}

impl Value {
    /// Obtain the number of individual elements in this value.
    pub fn multiplicity(&self) -> usize {
        use self::Value::*;
        match self {
            Int(c) => c.len(),
            Float(c) => c.len(),
            Str(c) => c.len(),
            DateTime(c) => c.len(),
            ObName(c) => c.len(),
            ObjRef(c) => c.len(),
            AttRef(c) => c.len(),
        }
    }

    /// Retrieve the logical kind of this value.
    pub fn value_type(&self) -> ValueType {
        use self::Value::*;
        match self {
            Int(_) => ValueType::Int,
            Float(_) => ValueType::Float,
            Str(_) => ValueType::Str,
            DateTime(_) => ValueType::DateTime,
            ObName(_) => ValueType::ObName,
            ObjRef(_) => ValueType::ObjRef,
            AttRef(_) => ValueType::AttRef,
        }
    }

    /// Whether this value holds references to other objects.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Value::ObName(_) | Value::ObjRef(_) | Value::AttRef(_)
        )
    }

    /// Retrieve the first element as a floating point number,
    /// if this value is numeric.
    pub fn first_f64(&self) -> Option<f64> {
        match self {
            Value::Int(c) => c.first().map(|v| *v as f64),
            Value::Float(c) => c.first().copied(),
            _ => None,
        }
    }

    /// Retrieve the elements as integers, if this value is of integer kind.
    pub fn ints(&self) -> Option<&[i64]> {
        match self {
            Value::Int(c) => Some(c),
            _ => None,
        }
    }

    /// Retrieve the elements as strings, if this value is of string kind.
    pub fn strs(&self) -> Option<&[String]> {
        match self {
            Value::Str(c) => Some(c),
            _ => None,
        }
    }
}

/// A utility macro for implementing the conversions from an element type
/// into a value with a single element, and from vectors and slices of the
/// element type into a multivalued value.
macro_rules! impl_from_for_value {
    ($typ:ty, $variant:ident, |$v:ident| $conv:expr) => {
        impl From<$typ> for Value {
            fn from($v: $typ) -> Self {
                Value::$variant(C::from_elem($conv, 1))
            }
        }

        impl From<Vec<$typ>> for Value {
            fn from(values: Vec<$typ>) -> Self {
                Value::$variant(values.into_iter().map(|$v| $conv).collect())
            }
        }

        impl From<&[$typ]> for Value {
            fn from(values: &[$typ]) -> Self {
                Value::$variant(values.iter().cloned().map(|$v| $conv).collect())
            }
        }
    };
}

impl_from_for_value!(i8, Int, |v| i64::from(v));
impl_from_for_value!(i16, Int, |v| i64::from(v));
impl_from_for_value!(i32, Int, |v| i64::from(v));
impl_from_for_value!(i64, Int, |v| v);
impl_from_for_value!(u8, Int, |v| i64::from(v));
impl_from_for_value!(u16, Int, |v| i64::from(v));
impl_from_for_value!(u32, Int, |v| i64::from(v));
impl_from_for_value!(f32, Float, |v| f64::from(v));
impl_from_for_value!(f64, Float, |v| v);
impl_from_for_value!(String, Str, |v| v);
impl_from_for_value!(DateTime<Utc>, DateTime, |v| v);
impl_from_for_value!(ObName, ObName, |v| v);
impl_from_for_value!(ObjRef, ObjRef, |v| v);
impl_from_for_value!(AttRef, AttRef, |v| v);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Int(C::from_elem(i64::from(value), 1))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(C::from_elem(value.to_owned(), 1))
    }
}

impl From<Vec<&str>> for Value {
    fn from(values: Vec<&str>) -> Self {
        Value::Str(values.into_iter().map(str::to_owned).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_single_elements() {
        assert_eq!(Value::from(5_u8), Value::Int(C::from_elem(5, 1)));
        assert_eq!(Value::from(-3_i16).multiplicity(), 1);
        assert_eq!(Value::from(true), Value::Int(C::from_elem(1, 1)));
        assert_eq!(Value::from("DEPTH").value_type(), ValueType::Str);
        assert_eq!(Value::from(7.5_f64).first_f64(), Some(7.5));
    }

    #[test]
    fn from_collections() {
        let v = Value::from(vec![1_i32, 2, 3]);
        assert_eq!(v.multiplicity(), 3);
        assert_eq!(v.ints(), Some(&[1_i64, 2, 3][..]));

        let v = Value::from(vec!["A", "B"]);
        assert_eq!(v.strs().map(<[String]>::len), Some(2));
    }

    #[test]
    fn reference_kinds() {
        let v = Value::from(ObName::new(1, 0, "MAIN"));
        assert!(v.is_reference());
        assert_eq!(v.value_type(), ValueType::ObName);
        assert!(!Value::from(1.0).is_reference());
    }
}
