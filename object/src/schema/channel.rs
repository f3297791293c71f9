//! The channel class and its satellites: axes and long names.

use super::{
    item, set_list, set_long_name, set_measure, set_objref, set_opt, set_ref_list, BuildResult,
    EflrClass, EflrObject, Measure, Resolver, TextOrRef,
};
use crate::attribute::{AttrKind, Attribute};
use crate::eflr::EflrItem;
use crate::{AxisRef, ObjectHandle, OriginRef};
use dlis_core::{RepCode, Value};

/// A named column of frame data: dimension, units, representation code and
/// the dataset key binding it to the columnar source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Channel {
    /// The object name.
    pub name: String,
    /// A descriptive long name, inline or by reference.
    pub long_name: Option<TextOrRef>,
    /// Property indicators from the standard list, e.g. `"BASIC"`.
    pub properties: Vec<String>,
    /// The representation code of the bulk data.
    /// Defaults to the code matching the source column's element type.
    pub representation_code: Option<RepCode>,
    /// The unit symbol of the values.
    pub units: Option<String>,
    /// The per-row shape: `[1]` for a scalar column, `[n]` for a vector
    /// column. Defaults to `[1]`.
    pub dimension: Vec<u32>,
    /// Axes describing the vector coordinates.
    pub axes: Vec<AxisRef>,
    /// The element limit; equals the dimension for this writer.
    pub element_limit: Vec<u32>,
    /// The object this channel was sourced from.
    pub source: Option<ObjectHandle>,
    /// The smallest value in the column.
    pub minimum_value: Option<f64>,
    /// The largest value in the column.
    pub maximum_value: Option<f64>,
    /// The key this channel's data is read under; defaults to the name.
    pub dataset_key: Option<String>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Channel {
    /// Create a scalar channel with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Channel {
            name: name.into(),
            ..Channel::default()
        }
    }

    /// The key this channel's data is read under.
    pub fn effective_dataset_key(&self) -> &str {
        self.dataset_key.as_deref().unwrap_or(&self.name)
    }

    /// The per-row shape, defaulting to `[1]`.
    pub fn effective_dimension(&self) -> Vec<u32> {
        if self.dimension.is_empty() {
            vec![1]
        } else {
            self.dimension.clone()
        }
    }

    /// The per-row element count.
    pub fn width(&self) -> usize {
        self.effective_dimension()
            .iter()
            .map(|d| *d as usize)
            .product()
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("LONG-NAME", AttrKind::ReferenceOrText),
            Attribute::multi("PROPERTIES", AttrKind::Ident),
            Attribute::new("REPRESENTATION-CODE", AttrKind::Integer),
            Attribute::new("UNITS", AttrKind::Ident),
            Attribute::multi("DIMENSION", AttrKind::Dimension),
            Attribute::multi("AXIS", AttrKind::Reference),
            Attribute::multi("ELEMENT-LIMIT", AttrKind::Dimension),
            Attribute::new("SOURCE", AttrKind::Reference),
            Attribute::new("MINIMUM-VALUE", AttrKind::Numeric),
            Attribute::new("MAXIMUM-VALUE", AttrKind::Numeric),
        ]
    }
}

impl EflrObject for Channel {
    fn class(&self) -> EflrClass {
        EflrClass::Channel
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Channel::attrs());
        set_long_name(&mut item, "LONG-NAME", &self.long_name, resolver)?;
        set_list(&mut item, "PROPERTIES", &self.properties)?;
        item.set_code("REPRESENTATION-CODE", RepCode::Ushort)?;
        if let Some(code) = self.representation_code {
            item.set("REPRESENTATION-CODE", i64::from(code.code()))?;
        }
        if let Some(units) = &self.units {
            item.set_code("UNITS", RepCode::Units)?;
            item.set("UNITS", units.as_str())?;
        }
        item.set("DIMENSION", self.effective_dimension())?;
        set_ref_list(&mut item, "AXIS", &self.axes, resolver)?;
        let element_limit = if self.element_limit.is_empty() {
            self.effective_dimension()
        } else {
            self.element_limit.clone()
        };
        item.set("ELEMENT-LIMIT", element_limit)?;
        set_objref(&mut item, "SOURCE", self.source, resolver)?;
        if let Some(code) = self.representation_code {
            for label in ["MINIMUM-VALUE", "MAXIMUM-VALUE"] {
                if code.is_float() {
                    item.set_code(label, RepCode::Fdoubl)?;
                }
            }
        }
        set_opt(&mut item, "MINIMUM-VALUE", self.minimum_value)?;
        set_opt(&mut item, "MAXIMUM-VALUE", self.maximum_value)?;
        Ok(item)
    }
}

/// An axis: coordinate labels and spacing for one dimension of a vector
/// channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Axis {
    /// The object name.
    pub name: String,
    /// A symbolic identifier of the axis.
    pub axis_id: Option<String>,
    /// The coordinates along the axis, numeric or textual.
    pub coordinates: Option<Value>,
    /// The unit symbol of the coordinates.
    pub coordinates_units: Option<String>,
    /// The distance between consecutive coordinates.
    pub spacing: Option<Measure>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Axis {
    /// Create an axis with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Axis {
            name: name.into(),
            ..Axis::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("AXIS-ID", AttrKind::Ident),
            Attribute::multi("COORDINATES", AttrKind::Any),
            Attribute::new("SPACING", AttrKind::Numeric),
        ]
    }
}

impl EflrObject for Axis {
    fn class(&self) -> EflrClass {
        EflrClass::Axis
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, _resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Axis::attrs());
        set_opt(&mut item, "AXIS-ID", self.axis_id.as_deref())?;
        if let Some(coordinates) = &self.coordinates {
            match &self.coordinates_units {
                Some(units) => {
                    item.set_with_units("COORDINATES", coordinates.clone(), units)?
                }
                None => item.set("COORDINATES", coordinates.clone())?,
            }
        }
        set_measure(&mut item, "SPACING", &self.spacing)?;
        Ok(item)
    }
}

/// A structured long name, spelling out the quantity, entity and source
/// parts of a channel or parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LongName {
    /// The object name.
    pub name: String,
    /// General modifiers of the whole name.
    pub general_modifiers: Vec<String>,
    /// The measured quantity, e.g. `"PRESSURE"`.
    pub quantity: Option<String>,
    /// Modifiers of the quantity.
    pub quantity_modifiers: Vec<String>,
    /// An altered form of the quantity, e.g. `"STANDARD-DEVIATION"`.
    pub altered_form: Option<String>,
    /// The entity the quantity applies to.
    pub entity: Option<String>,
    /// Modifiers of the entity.
    pub entity_modifiers: Vec<String>,
    /// A number distinguishing same-named entities.
    pub entity_number: Option<u32>,
    /// The part of the entity measured.
    pub entity_part: Option<String>,
    /// A number distinguishing same-named entity parts.
    pub entity_part_number: Option<u32>,
    /// The generic data source.
    pub generic_source: Option<String>,
    /// Parts of the source tool.
    pub source_parts: Vec<String>,
    /// Numbers distinguishing the source parts.
    pub source_part_numbers: Vec<u32>,
    /// The conditions under which the measurement was made.
    pub conditions: Vec<String>,
    /// The industry-standard symbol of the name.
    pub standard_symbol: Option<String>,
    /// A producer-private symbol of the name.
    pub private_symbol: Option<String>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl LongName {
    /// Create a long name with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        LongName {
            name: name.into(),
            ..LongName::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::multi("GENERAL-MODIFIER", AttrKind::Text),
            Attribute::new("QUANTITY", AttrKind::Text),
            Attribute::multi("QUANTITY-MODIFIER", AttrKind::Text),
            Attribute::new("ALTERED-FORM", AttrKind::Text),
            Attribute::new("ENTITY", AttrKind::Text),
            Attribute::multi("ENTITY-MODIFIER", AttrKind::Text),
            Attribute::new("ENTITY-NUMBER", AttrKind::Integer),
            Attribute::new("ENTITY-PART", AttrKind::Text),
            Attribute::new("ENTITY-PART-NUMBER", AttrKind::Integer),
            Attribute::new("GENERIC-SOURCE", AttrKind::Text),
            Attribute::multi("SOURCE-PART", AttrKind::Text),
            Attribute::multi("SOURCE-PART-NUMBER", AttrKind::Integer),
            Attribute::multi("CONDITIONS", AttrKind::Text),
            Attribute::new("STANDARD-SYMBOL", AttrKind::Text),
            Attribute::new("PRIVATE-SYMBOL", AttrKind::Text),
        ]
    }
}

impl EflrObject for LongName {
    fn class(&self) -> EflrClass {
        EflrClass::LongName
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, _resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, LongName::attrs());
        set_list(&mut item, "GENERAL-MODIFIER", &self.general_modifiers)?;
        set_opt(&mut item, "QUANTITY", self.quantity.as_deref())?;
        set_list(&mut item, "QUANTITY-MODIFIER", &self.quantity_modifiers)?;
        set_opt(&mut item, "ALTERED-FORM", self.altered_form.as_deref())?;
        set_opt(&mut item, "ENTITY", self.entity.as_deref())?;
        set_list(&mut item, "ENTITY-MODIFIER", &self.entity_modifiers)?;
        set_opt(&mut item, "ENTITY-NUMBER", self.entity_number)?;
        set_opt(&mut item, "ENTITY-PART", self.entity_part.as_deref())?;
        set_opt(&mut item, "ENTITY-PART-NUMBER", self.entity_part_number)?;
        set_opt(&mut item, "GENERIC-SOURCE", self.generic_source.as_deref())?;
        set_list(&mut item, "SOURCE-PART", &self.source_parts)?;
        set_list(&mut item, "SOURCE-PART-NUMBER", &self.source_part_numbers)?;
        set_list(&mut item, "CONDITIONS", &self.conditions)?;
        set_opt(&mut item, "STANDARD-SYMBOL", self.standard_symbol.as_deref())?;
        set_opt(&mut item, "PRIVATE-SYMBOL", self.private_symbol.as_deref())?;
        Ok(item)
    }
}
