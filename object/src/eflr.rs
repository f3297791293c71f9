//! Explicitly formatted logical records: sets of objects sharing one
//! attribute template.
//!
//! A set serializes as a set component, a template of attribute labels and
//! codes, and then one object component per item followed by its attribute
//! columns. All items of a set must agree with the template, label for
//! label and in order.

use crate::attribute::{self, Attribute};
use crate::component::{OBJECT_NAME, ROLE_OBJECT, ROLE_SET, SET_NAME, SET_TYPE};
use dlis_core::{ObName, RepCode, Value};
use dlis_encoding::encode::{self, basic};
use dlis_encoding::segment::{EflrType, LogicalRecord, RecordType};
use snafu::{ensure, Backtrace, ResultExt, Snafu};

/// Module-level error type:
/// for errors which may occur while assembling explicitly formatted records.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// An attribute label was addressed that the item does not declare.
    #[snafu(display("Object {} declares no attribute labeled {}", name, label))]
    UnknownLabel {
        /// The object name.
        name: String,
        /// The unknown label.
        label: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// An item's attribute labels do not match the set template.
    #[snafu(display(
        "Object {} does not match the {} set template at slot {}",
        name,
        set_type,
        slot
    ))]
    TemplateMismatch {
        /// The set type.
        set_type: &'static str,
        /// The offending object name.
        name: String,
        /// The first mismatching template slot.
        slot: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A set was asked to serialize with no items.
    #[snafu(display("The {} set holds no objects", set_type))]
    EmptySet {
        /// The set type.
        set_type: &'static str,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// An attribute failed to validate or serialize.
    #[snafu(display("Attribute of object {} failed", name))]
    Attribute {
        /// The object name.
        name: String,
        /// The underlying attribute error.
        #[snafu(backtrace)]
        source: attribute::Error,
    },

    /// A component outside the attribute columns failed to serialize.
    #[snafu(display("Failed to serialize a {} set component", set_type))]
    Component {
        /// The set type.
        set_type: &'static str,
        /// The underlying encoding error.
        #[snafu(backtrace)]
        source: encode::Error,
    },
}

/// Type alias for a result from this module.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One object of a set: a name plus the ordered attribute columns declared
/// by its class.
#[derive(Debug, Clone, PartialEq)]
pub struct EflrItem {
    name: String,
    origin: u32,
    copy: u8,
    attrs: Vec<Attribute>,
}

impl EflrItem {
    /// Create an item with the given name and attribute skeleton.
    pub(crate) fn new<T: Into<String>>(name: T, attrs: Vec<Attribute>) -> Self {
        EflrItem {
            name: name.into(),
            origin: 0,
            copy: 0,
            attrs,
        }
    }

    /// The object's identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The object's full identity triple.
    pub fn obname(&self) -> ObName {
        ObName::new(self.origin, self.copy, self.name.clone())
    }

    /// The ordered attribute columns.
    pub fn attributes(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Stamp the origin reference and copy number.
    pub(crate) fn set_identity(&mut self, origin: u32, copy: u8) {
        self.origin = origin;
        self.copy = copy;
    }

    /// Look up an attribute by label.
    pub fn attr(&self, label: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.label() == label)
    }

    fn attr_mut(&mut self, label: &str) -> Result<&mut Attribute> {
        let name = self.name.clone();
        self.attrs
            .iter_mut()
            .find(|a| a.label() == label)
            .ok_or_else(|| {
                UnknownLabelSnafu {
                    name,
                    label: label.to_owned(),
                }
                .build()
            })
    }

    /// Set an attribute value by label.
    pub fn set<V>(&mut self, label: &str, value: V) -> Result<()>
    where
        V: Into<Value>,
    {
        let name = self.name.clone();
        self.attr_mut(label)?
            .set(value)
            .context(AttributeSnafu { name })
    }

    /// Set an attribute value and its units by label.
    pub fn set_with_units<V>(&mut self, label: &str, value: V, units: &str) -> Result<()>
    where
        V: Into<Value>,
    {
        let name = self.name.clone();
        self.attr_mut(label)?
            .set_with_units(value, units)
            .context(AttributeSnafu { name })
    }

    /// Pin an attribute's representation code by label.
    pub fn set_code(&mut self, label: &str, code: RepCode) -> Result<()> {
        let name = self.name.clone();
        self.attr_mut(label)?
            .set_code(code)
            .context(AttributeSnafu { name })
    }

    /// Declare an attribute's value as a list of equal rows.
    pub(crate) fn set_rows(&mut self, label: &str, rows: usize) -> Result<()> {
        let name = self.name.clone();
        self.attr_mut(label)?
            .set_rows(rows)
            .context(AttributeSnafu { name })
    }
}

/// A collection of objects of one class sharing one attribute template.
#[derive(Debug, Clone, PartialEq)]
pub struct EflrSet {
    set_type: &'static str,
    set_name: Option<String>,
    record_type: EflrType,
    items: Vec<EflrItem>,
}

impl EflrSet {
    /// Create an empty set of the given type.
    pub fn new(set_type: &'static str, record_type: EflrType, set_name: Option<String>) -> Self {
        EflrSet {
            set_type,
            set_name,
            record_type,
            items: Vec::new(),
        }
    }

    /// The set type, e.g. `"CHANNEL"`.
    pub fn set_type(&self) -> &'static str {
        self.set_type
    }

    /// The items of this set, in insertion order.
    pub fn items(&self) -> &[EflrItem] {
        &self.items
    }

    /// Append an item. Template agreement is verified at serialization.
    pub fn push(&mut self, item: EflrItem) {
        self.items.push(item);
    }

    /// Serialize the whole set into one logical record.
    pub fn to_record(&self) -> Result<LogicalRecord> {
        ensure!(
            !self.items.is_empty(),
            EmptySetSnafu {
                set_type: self.set_type,
            }
        );
        let template = &self.items[0];
        for item in &self.items[1..] {
            self.check_template(template, item)?;
        }

        let context = ComponentSnafu {
            set_type: self.set_type,
        };
        let mut body = vec![];

        let mut descriptor = ROLE_SET | SET_TYPE;
        if self.set_name.is_some() {
            descriptor |= SET_NAME;
        }
        body.push(descriptor);
        basic::encode_ident(&mut body, self.set_type).context(context)?;
        if let Some(name) = &self.set_name {
            basic::encode_ident(&mut body, name).context(context)?;
        }

        for attr in template.attributes() {
            attr.template_bytes(&mut body).context(AttributeSnafu {
                name: template.name().to_owned(),
            })?;
        }

        for item in &self.items {
            body.push(ROLE_OBJECT | OBJECT_NAME);
            basic::encode_obname(&mut body, &item.obname()).context(context)?;
            for (slot, attr) in item.attributes().iter().enumerate() {
                let template_code = template.attributes()[slot].code();
                attr.item_bytes(&mut body, template_code)
                    .context(AttributeSnafu {
                        name: item.name().to_owned(),
                    })?;
            }
        }

        Ok(LogicalRecord::new(RecordType::Eflr(self.record_type), body))
    }

    fn check_template(&self, template: &EflrItem, item: &EflrItem) -> Result<()> {
        let slot = if template.attributes().len() != item.attributes().len() {
            Some(template.attributes().len().min(item.attributes().len()))
        } else {
            template
                .attributes()
                .iter()
                .zip(item.attributes())
                .position(|(a, b)| a.label() != b.label())
        };
        match slot {
            Some(slot) => TemplateMismatchSnafu {
                set_type: self.set_type,
                name: item.name().to_owned(),
                slot,
            }
            .fail(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::AttrKind;

    fn zone_item(name: &str) -> EflrItem {
        let attrs = vec![
            Attribute::new("DESCRIPTION", AttrKind::Text),
            Attribute::new("DOMAIN", AttrKind::Ident),
            Attribute::new("MAXIMUM", AttrKind::Numeric),
            Attribute::new("MINIMUM", AttrKind::Numeric),
        ];
        EflrItem::new(name, attrs)
    }

    #[test]
    fn set_record_layout() {
        let mut item = zone_item("Z1");
        item.set_identity(1, 0);
        item.set("DOMAIN", "TIME").unwrap();
        let mut set = EflrSet::new("ZONE", EflrType::Static, None);
        set.push(item);

        let record = set.to_record().unwrap();
        assert_eq!(record.record_type, RecordType::Eflr(EflrType::Static));
        let body = &record.body;
        // set component: type only
        assert_eq!(body[0], 0xF0);
        assert_eq!(&body[1..6], b"\x04ZONE");
        // template: four label components, DOMAIN carrying the IDENT code
        let mut pos = 6;
        assert_eq!(body[pos], 0x30);
        assert_eq!(&body[pos + 1..pos + 13], b"\x0bDESCRIPTION");
        pos += 13;
        assert_eq!(body[pos], 0x34);
        assert_eq!(&body[pos + 1..pos + 8], b"\x06DOMAIN");
        assert_eq!(body[pos + 8], 19);
        pos += 9;
        // MAXIMUM and MINIMUM have no value, so no code either
        assert_eq!(body[pos], 0x30);
        assert_eq!(&body[pos + 1..pos + 9], b"\x07MAXIMUM");
        pos += 9;
        assert_eq!(body[pos], 0x30);
        pos += 9;
        // object component and OBNAME 1.0.Z1
        assert_eq!(body[pos], 0x70);
        assert_eq!(&body[pos + 1..pos + 6], b"\x01\x00\x02Z1");
        pos += 6;
        // absent DESCRIPTION, valued DOMAIN, absent MAXIMUM and MINIMUM
        assert_eq!(body[pos], 0x00);
        assert_eq!(body[pos + 1], 0x21);
        assert_eq!(&body[pos + 2..pos + 7], b"\x04TIME");
        assert_eq!(body[pos + 7], 0x00);
        assert_eq!(body[pos + 8], 0x00);
        assert_eq!(body.len(), pos + 9);
    }

    #[test]
    fn set_name_is_flagged() {
        let mut set = EflrSet::new("ZONE", EflrType::Static, Some("MAIN".into()));
        set.push(zone_item("Z1"));
        let record = set.to_record().unwrap();
        assert_eq!(record.body[0], 0xF8);
        assert_eq!(&record.body[1..11], b"\x04ZONE\x04MAIN");
    }

    #[test]
    fn template_mismatch_is_detected() {
        let mut set = EflrSet::new("ZONE", EflrType::Static, None);
        set.push(zone_item("Z1"));
        let attrs = vec![Attribute::new("DESCRIPTION", AttrKind::Text)];
        set.push(EflrItem::new("Z2", attrs));
        assert!(matches!(
            set.to_record(),
            Err(Error::TemplateMismatch { slot: 1, .. })
        ));
    }

    #[test]
    fn empty_set_is_rejected() {
        let set = EflrSet::new("ZONE", EflrType::Static, None);
        assert!(matches!(set.to_record(), Err(Error::EmptySet { .. })));
    }

    #[test]
    fn unknown_label_is_reported() {
        let mut item = zone_item("Z1");
        assert!(matches!(
            item.set("NO-SUCH", 1),
            Err(Error::UnknownLabel { .. })
        ));
    }
}
