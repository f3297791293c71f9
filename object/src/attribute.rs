//! The attribute model: a labeled, typed field on an object.
//!
//! An attribute carries a value (one element or an ordered list), optional
//! units, and the representation code in force. Attribute kinds narrow the
//! accepted value domain and code set; the kind is validation policy only,
//! serialization always goes through the same byte path.

use crate::component::{
    ATTR_CODE, ATTR_COUNT, ATTR_LABEL, ATTR_UNITS, ATTR_VALUE, ROLE_ABSENT_ATTRIBUTE,
    ROLE_ATTRIBUTE,
};
use dlis_core::value::{infer_code, InferencePolicy, ValueType};
use dlis_core::{RepCode, Value};
use dlis_encoding::encode::{self, basic};
use snafu::{ensure, Backtrace, ResultExt, Snafu};

/// The validation policy of an attribute, narrowing the accepted value
/// kinds and representation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// Any value kind; the code is inferred from the value.
    Any,
    /// A symbolic IDENT string.
    Ident,
    /// Free ASCII text.
    Text,
    /// A reference to another object; units are forbidden.
    Reference,
    /// A reference to another object, or free ASCII text.
    ReferenceOrText,
    /// A number under any numeric code.
    Numeric,
    /// An integer under an integer code.
    Integer,
    /// A vector of positive integers describing an array shape.
    Dimension,
    /// A boolean status, 0 or 1.
    Status,
    /// A calendar instant, or an elapsed time with mandatory units.
    DTime,
}

/// Module-level error type:
/// for errors which may occur while setting or serializing attributes.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// A list value was given to a single-valued attribute.
    #[snafu(display("Attribute {}: expected a single value, got {} elements", label, count))]
    InvalidCount {
        /// The attribute label.
        label: &'static str,
        /// The offending element count.
        count: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The representation code is outside the attribute's allowed set.
    #[snafu(display("Attribute {}: representation code {} is not allowed here", label, code))]
    InvalidCode {
        /// The attribute label.
        label: &'static str,
        /// The offending code.
        code: RepCode,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A string value holds bytes outside the allowed character set.
    #[snafu(display("Attribute {}: value holds bytes outside the allowed charset", label))]
    InvalidCharset {
        /// The attribute label.
        label: &'static str,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The value kind is not accepted by the attribute.
    #[snafu(display("Attribute {}: {:?} values are not accepted here", label, kind))]
    TypeMismatch {
        /// The attribute label.
        label: &'static str,
        /// The offending value kind.
        kind: ValueType,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// An element lies outside the attribute's value domain.
    #[snafu(display("Attribute {}: element {} is out of range", label, value))]
    OutOfRange {
        /// The attribute label.
        label: &'static str,
        /// The offending element.
        value: i64,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// Units were given to a reference-valued attribute.
    #[snafu(display("Attribute {}: reference values carry no units", label))]
    UnitsNotAllowed {
        /// The attribute label.
        label: &'static str,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// An elapsed-time attribute was set numerically without units.
    #[snafu(display("Attribute {}: numeric elapsed time requires units", label))]
    UnitsRequired {
        /// The attribute label.
        label: &'static str,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// No representation code can hold the given elements.
    #[snafu(display("Attribute {}: no representation code holds the value", label))]
    NoCode {
        /// The attribute label.
        label: &'static str,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The declared row shape does not evenly divide the element count.
    #[snafu(display(
        "Attribute {}: {} elements do not form {} equal rows",
        label,
        count,
        rows
    ))]
    RaggedRows {
        /// The attribute label.
        label: &'static str,
        /// The element count.
        count: usize,
        /// The declared row count.
        rows: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The value could not be serialized.
    #[snafu(display("Attribute {}: serialization failed", label))]
    Serialize {
        /// The attribute label.
        label: &'static str,
        /// The underlying encoding error.
        #[snafu(backtrace)]
        source: encode::Error,
    },
}

/// Type alias for a result from this module.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A labeled, typed field of an object.
///
/// Freshly constructed attributes are absent: they occupy their slot in the
/// set template but emit no value until [`set`](Attribute::set) is called.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    label: &'static str,
    kind: AttrKind,
    multivalued: bool,
    code: Option<RepCode>,
    code_explicit: bool,
    units: Option<String>,
    value: Option<Value>,
    rows: Option<usize>,
}

impl Attribute {
    /// Create a single-valued attribute of the given kind.
    pub(crate) fn new(label: &'static str, kind: AttrKind) -> Self {
        Attribute {
            label,
            kind,
            multivalued: false,
            code: None,
            code_explicit: false,
            units: None,
            value: None,
            rows: None,
        }
    }

    /// Create a multivalued attribute of the given kind.
    pub(crate) fn multi(label: &'static str, kind: AttrKind) -> Self {
        Attribute {
            multivalued: true,
            ..Attribute::new(label, kind)
        }
    }

    /// The label identifying this attribute in the set template.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The validation kind of this attribute.
    pub fn kind(&self) -> AttrKind {
        self.kind
    }

    /// The representation code in force, if any.
    pub fn code(&self) -> Option<RepCode> {
        self.code
    }

    /// The unit symbol, if any.
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// The value, if set.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// The number of scalar elements carried by the value.
    pub fn count(&self) -> usize {
        self.value.as_ref().map_or(1, Value::multiplicity)
    }

    /// Set the value, converting and validating it against this attribute's
    /// kind and recording an inferred code when none was pinned explicitly.
    pub fn set<V>(&mut self, value: V) -> Result<()>
    where
        V: Into<Value>,
    {
        let value = value.into();
        ensure!(
            self.multivalued || value.multiplicity() == 1,
            InvalidCountSnafu {
                label: self.label,
                count: value.multiplicity(),
            }
        );
        self.check_kind(&value)?;
        let code = match (self.code_explicit, self.code) {
            (true, Some(code)) => code,
            _ => self.default_code(&value)?,
        };
        ensure!(
            self.allows(code),
            InvalidCodeSnafu {
                label: self.label,
                code,
            }
        );
        self.code = Some(code);
        self.value = Some(value);
        self.rows = None;
        Ok(())
    }

    /// Set the value together with its unit symbol.
    pub fn set_with_units<V>(&mut self, value: V, units: &str) -> Result<()>
    where
        V: Into<Value>,
    {
        self.set(value)?;
        self.set_units(units)
    }

    /// Pin the representation code explicitly.
    pub fn set_code(&mut self, code: RepCode) -> Result<()> {
        ensure!(
            self.allows(code),
            InvalidCodeSnafu {
                label: self.label,
                code,
            }
        );
        self.code = Some(code);
        self.code_explicit = true;
        Ok(())
    }

    /// Set the unit symbol.
    pub fn set_units(&mut self, units: &str) -> Result<()> {
        ensure!(
            !matches!(self.kind, AttrKind::Reference | AttrKind::ReferenceOrText),
            UnitsNotAllowedSnafu { label: self.label }
        );
        self.units = Some(units.to_owned());
        Ok(())
    }

    /// Declare the value as a list of `rows` equal rows.
    pub(crate) fn set_rows(&mut self, rows: usize) -> Result<()> {
        ensure!(
            self.multivalued && rows > 0,
            InvalidCountSnafu {
                label: self.label,
                count: rows,
            }
        );
        let count = self.count();
        ensure!(
            count % rows == 0,
            RaggedRowsSnafu {
                label: self.label,
                count,
                rows,
            }
        );
        self.rows = Some(rows);
        Ok(())
    }

    /// Emit this attribute's template component: the label, plus the code
    /// when one is in force. Values, counts and units stay out of templates.
    pub(crate) fn template_bytes(&self, out: &mut Vec<u8>) -> Result<()> {
        let mut descriptor = ROLE_ATTRIBUTE | ATTR_LABEL;
        if self.code.is_some() {
            descriptor |= ATTR_CODE;
        }
        out.push(descriptor);
        basic::encode_ident(&mut *out, self.label).context(SerializeSnafu { label: self.label })?;
        if let Some(code) = self.code {
            basic::encode_ushort(&mut *out, code.code())
                .context(SerializeSnafu { label: self.label })?;
        }
        Ok(())
    }

    /// Emit this attribute's component on one object: an absent component
    /// when no value is set, otherwise the value plus exactly the subset of
    /// count, code and units that differs from the template defaults.
    pub(crate) fn item_bytes(
        &self,
        out: &mut Vec<u8>,
        template_code: Option<RepCode>,
    ) -> Result<()> {
        let Some(value) = &self.value else {
            out.push(ROLE_ABSENT_ATTRIBUTE);
            return Ok(());
        };
        let code = self.code.ok_or_else(|| {
            NoCodeSnafu { label: self.label }.build()
        })?;
        if self.kind == AttrKind::DTime && code.is_numeric() {
            ensure!(self.units.is_some(), UnitsRequiredSnafu { label: self.label });
        }

        let count = value.multiplicity();
        let mut descriptor = ROLE_ATTRIBUTE | ATTR_VALUE;
        if count != 1 {
            descriptor |= ATTR_COUNT;
        }
        if Some(code) != template_code {
            descriptor |= ATTR_CODE;
        }
        if self.units.is_some() {
            descriptor |= ATTR_UNITS;
        }
        out.push(descriptor);
        let context = SerializeSnafu { label: self.label };
        if descriptor & ATTR_COUNT != 0 {
            basic::encode_uvari(&mut *out, count as u32).context(context)?;
        }
        if descriptor & ATTR_CODE != 0 {
            basic::encode_ushort(&mut *out, code.code()).context(context)?;
        }
        if let Some(units) = &self.units {
            basic::encode_units(&mut *out, units).context(context)?;
        }
        encode::encode_value(&mut *out, code, value).context(context)?;
        Ok(())
    }

    fn check_kind(&self, value: &Value) -> Result<()> {
        let mismatch = TypeMismatchSnafu {
            label: self.label,
            kind: value.value_type(),
        };
        match self.kind {
            AttrKind::Any => Ok(()),
            AttrKind::Ident => {
                let strs = value.strs().ok_or_else(|| mismatch.build())?;
                ensure!(
                    strs.iter().all(|s| s.len() <= 255
                        && s.bytes().all(|b| (0x20..=0x7E).contains(&b))),
                    InvalidCharsetSnafu { label: self.label }
                );
                Ok(())
            }
            AttrKind::Text => {
                let strs = value.strs().ok_or_else(|| mismatch.build())?;
                ensure!(
                    strs.iter().all(|s| s.is_ascii()),
                    InvalidCharsetSnafu { label: self.label }
                );
                Ok(())
            }
            AttrKind::Reference => match value.value_type() {
                ValueType::ObName | ValueType::ObjRef | ValueType::AttRef => Ok(()),
                _ => mismatch.fail(),
            },
            AttrKind::ReferenceOrText => match value.value_type() {
                ValueType::ObName | ValueType::ObjRef | ValueType::AttRef => Ok(()),
                ValueType::Str => {
                    let strs = value.strs().unwrap_or_default();
                    ensure!(
                        strs.iter().all(|s| s.is_ascii()),
                        InvalidCharsetSnafu { label: self.label }
                    );
                    Ok(())
                }
                _ => mismatch.fail(),
            },
            AttrKind::Numeric => match value.value_type() {
                ValueType::Int | ValueType::Float => Ok(()),
                _ => mismatch.fail(),
            },
            AttrKind::Integer => match value.value_type() {
                ValueType::Int => Ok(()),
                _ => mismatch.fail(),
            },
            AttrKind::Dimension => {
                let ints = value.ints().ok_or_else(|| mismatch.build())?;
                for v in ints {
                    ensure!(
                        *v > 0,
                        OutOfRangeSnafu {
                            label: self.label,
                            value: *v,
                        }
                    );
                }
                Ok(())
            }
            AttrKind::Status => {
                let ints = value.ints().ok_or_else(|| mismatch.build())?;
                for v in ints {
                    ensure!(
                        *v == 0 || *v == 1,
                        OutOfRangeSnafu {
                            label: self.label,
                            value: *v,
                        }
                    );
                }
                Ok(())
            }
            AttrKind::DTime => match value.value_type() {
                ValueType::DateTime | ValueType::Int | ValueType::Float => Ok(()),
                _ => mismatch.fail(),
            },
        }
    }

    fn default_code(&self, value: &Value) -> Result<RepCode> {
        let inferred = || {
            infer_code(value, InferencePolicy::Narrow)
                .ok_or_else(|| NoCodeSnafu { label: self.label }.build())
        };
        match self.kind {
            AttrKind::Ident => Ok(RepCode::Ident),
            AttrKind::Text => Ok(RepCode::Ascii),
            AttrKind::Dimension => Ok(RepCode::Uvari),
            AttrKind::Status => Ok(RepCode::Status),
            AttrKind::ReferenceOrText if value.value_type() == ValueType::Str => {
                Ok(RepCode::Ascii)
            }
            _ => inferred(),
        }
    }

    fn allows(&self, code: RepCode) -> bool {
        use RepCode::*;
        let writable_float = matches!(code, Fshort | Fsingl | Fdoubl);
        match self.kind {
            AttrKind::Any => {
                code.is_integer() || writable_float || code.is_string() || code.is_reference()
                    || matches!(code, Dtime | Status | Origin)
            }
            AttrKind::Ident => matches!(code, Ident | Units),
            AttrKind::Text => code == Ascii,
            AttrKind::Reference => code.is_reference(),
            AttrKind::ReferenceOrText => code.is_reference() || code == Ascii,
            AttrKind::Numeric => code.is_integer() || writable_float,
            AttrKind::Integer => code.is_integer(),
            AttrKind::Dimension => code.is_unsigned_int(),
            AttrKind::Status => code == Status,
            AttrKind::DTime => code == Dtime || code.is_integer() || writable_float,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlis_core::ObName;

    #[test]
    fn single_valued_rejects_lists() {
        let mut attr = Attribute::new("DESCRIPTION", AttrKind::Text);
        let err = attr.set(vec!["A", "B"]).unwrap_err();
        assert!(matches!(err, Error::InvalidCount { .. }));
        attr.set("just one").unwrap();
        assert_eq!(attr.code(), Some(RepCode::Ascii));
        assert_eq!(attr.count(), 1);
    }

    #[test]
    fn reference_attributes_forbid_units() {
        let mut attr = Attribute::multi("CHANNELS", AttrKind::Reference);
        attr.set(vec![ObName::new(1, 0, "DEPTH")]).unwrap();
        assert_eq!(attr.code(), Some(RepCode::Obname));
        assert!(matches!(
            attr.set_units("m"),
            Err(Error::UnitsNotAllowed { .. })
        ));
        assert!(matches!(
            attr.set("not a reference"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn dimension_requires_positive_integers() {
        let mut attr = Attribute::multi("DIMENSION", AttrKind::Dimension);
        attr.set(vec![1, 5]).unwrap();
        assert_eq!(attr.code(), Some(RepCode::Uvari));
        assert!(matches!(attr.set(vec![0]), Err(Error::OutOfRange { .. })));
        assert!(matches!(attr.set(vec![-2]), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn status_takes_zero_or_one() {
        let mut attr = Attribute::new("STATUS", AttrKind::Status);
        attr.set(true).unwrap();
        assert_eq!(attr.code(), Some(RepCode::Status));
        assert!(matches!(attr.set(2), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn explicit_code_is_honored_and_checked() {
        let mut attr = Attribute::new("MINIMUM-VALUE", AttrKind::Numeric);
        attr.set_code(RepCode::Fdoubl).unwrap();
        attr.set(1).unwrap();
        assert_eq!(attr.code(), Some(RepCode::Fdoubl));
        assert!(matches!(
            attr.set_code(RepCode::Ascii),
            Err(Error::InvalidCode { .. })
        ));
    }

    #[test]
    fn template_and_item_bytes() {
        let mut attr = Attribute::new("UNITS", AttrKind::Ident);
        attr.set("m").unwrap();

        let mut template = vec![];
        attr.template_bytes(&mut template).unwrap();
        // label + code descriptor, IDENT "UNITS", code IDENT (19)
        assert_eq!(template, [0x34, 5, b'U', b'N', b'I', b'T', b'S', 19]);

        let mut item = vec![];
        attr.item_bytes(&mut item, attr.code()).unwrap();
        // value only: code matches the template
        assert_eq!(item, [0x21, 1, b'm']);

        let mut item = vec![];
        attr.item_bytes(&mut item, None).unwrap();
        // differing code is carried on the object
        assert_eq!(item, [0x25, 19, 1, b'm']);
    }

    #[test]
    fn absent_attribute_is_one_byte() {
        let attr = Attribute::new("SOURCE", AttrKind::Reference);
        let mut item = vec![];
        attr.item_bytes(&mut item, None).unwrap();
        assert_eq!(item, [0x00]);
    }

    #[test]
    fn multivalued_item_carries_count_and_units() {
        let mut attr = Attribute::multi("COORDINATES", AttrKind::Numeric);
        attr.set_with_units(vec![1.0_f64, 2.0], "m").unwrap();
        let mut item = vec![];
        attr.item_bytes(&mut item, Some(RepCode::Fsingl)).unwrap();
        // count, units and value bits; code equals the template
        assert_eq!(item[0], 0x2B);
        assert_eq!(item[1], 2);
        assert_eq!(&item[2..4], b"\x01m");
    }

    #[test]
    fn elapsed_time_needs_units() {
        let mut attr = Attribute::new("DURATION", AttrKind::DTime);
        attr.set(30).unwrap();
        let mut out = vec![];
        assert!(matches!(
            attr.item_bytes(&mut out, None),
            Err(Error::UnitsRequired { .. })
        ));
        attr.set_units("s").unwrap();
        let mut out = vec![];
        attr.item_bytes(&mut out, None).unwrap();
    }

    #[test]
    fn row_shape_must_divide_count() {
        let mut attr = Attribute::multi("MEASUREMENT", AttrKind::Numeric);
        attr.set(vec![1.0_f64, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        attr.set_rows(3).unwrap();
        assert!(matches!(attr.set_rows(4), Err(Error::RaggedRows { .. })));
    }
}
