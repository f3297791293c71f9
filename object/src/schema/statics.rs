//! The statically typed record classes: zones, parameters, equipment,
//! tools, computations, processes, splices and groups.

use super::{
    item, set_list, set_long_name, set_measure, set_objref, set_opt, set_ref, set_ref_list,
    BuildResult, EflrClass, EflrObject, Measure, Resolver, TextOrRef,
};
use crate::attribute::{AttrKind, Attribute};
use crate::eflr::EflrItem;
use crate::{
    AxisRef, ChannelRef, ComputationRef, EquipmentRef, GroupRef, ObjectHandle, OriginRef,
    ParameterRef, ZoneRef,
};
use dlis_core::Value;

/// A bounded region of the index domain: a depth or time interval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Zone {
    /// The object name.
    pub name: String,
    /// A free-text description.
    pub description: Option<String>,
    /// The index domain: `"BOREHOLE-DEPTH"`, `"TIME"` or
    /// `"VERTICAL-DEPTH"`.
    pub domain: Option<String>,
    /// The upper bound, a number or a calendar instant.
    pub maximum: Option<Value>,
    /// The lower bound, a number or a calendar instant.
    pub minimum: Option<Value>,
    /// The unit symbol of numeric bounds.
    pub units: Option<String>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Zone {
    /// Create a zone with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Zone {
            name: name.into(),
            ..Zone::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("DESCRIPTION", AttrKind::Text),
            Attribute::new("DOMAIN", AttrKind::Ident),
            Attribute::new("MAXIMUM", AttrKind::Any),
            Attribute::new("MINIMUM", AttrKind::Any),
        ]
    }

    fn set_bound(
        item: &mut EflrItem,
        label: &'static str,
        bound: &Option<Value>,
        units: &Option<String>,
    ) -> BuildResult<()> {
        if let Some(bound) = bound {
            match units {
                Some(units) if !matches!(bound, Value::DateTime(_)) => {
                    item.set_with_units(label, bound.clone(), units)?
                }
                _ => item.set(label, bound.clone())?,
            }
        }
        Ok(())
    }
}

impl EflrObject for Zone {
    fn class(&self) -> EflrClass {
        EflrClass::Zone
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, _resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Zone::attrs());
        set_opt(&mut item, "DESCRIPTION", self.description.as_deref())?;
        set_opt(&mut item, "DOMAIN", self.domain.as_deref())?;
        Zone::set_bound(&mut item, "MAXIMUM", &self.maximum, &self.units)?;
        Zone::set_bound(&mut item, "MINIMUM", &self.minimum, &self.units)?;
        Ok(item)
    }
}

/// A named parameter, constant or zoned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameter {
    /// The object name.
    pub name: String,
    /// A descriptive long name, inline or by reference.
    pub long_name: Option<TextOrRef>,
    /// The per-zone value shape.
    pub dimension: Vec<u32>,
    /// Axes describing the value coordinates.
    pub axes: Vec<AxisRef>,
    /// The zones the values apply to; absent means the whole file.
    pub zones: Vec<ZoneRef>,
    /// The parameter values, one per zone when zoned.
    pub values: Option<Value>,
    /// The unit symbol of numeric values.
    pub units: Option<String>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Parameter {
    /// Create a parameter with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Parameter {
            name: name.into(),
            ..Parameter::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("LONG-NAME", AttrKind::ReferenceOrText),
            Attribute::multi("DIMENSION", AttrKind::Dimension),
            Attribute::multi("AXIS", AttrKind::Reference),
            Attribute::multi("ZONES", AttrKind::Reference),
            Attribute::multi("VALUES", AttrKind::Any),
        ]
    }
}

impl EflrObject for Parameter {
    fn class(&self) -> EflrClass {
        EflrClass::Parameter
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Parameter::attrs());
        set_long_name(&mut item, "LONG-NAME", &self.long_name, resolver)?;
        set_list(&mut item, "DIMENSION", &self.dimension)?;
        set_ref_list(&mut item, "AXIS", &self.axes, resolver)?;
        set_ref_list(&mut item, "ZONES", &self.zones, resolver)?;
        if let Some(values) = &self.values {
            match &self.units {
                Some(units) => item.set_with_units("VALUES", values.clone(), units)?,
                None => item.set("VALUES", values.clone())?,
            }
        }
        Ok(item)
    }
}

/// A piece of surface or downhole equipment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Equipment {
    /// The object name.
    pub name: String,
    /// The producer's name for the equipment.
    pub trademark_name: Option<String>,
    /// Whether the equipment is operational.
    pub status: Option<bool>,
    /// The generic equipment type.
    pub eq_type: Option<String>,
    /// The serial number.
    pub serial_number: Option<String>,
    /// The location of the equipment, e.g. `"WELL"`.
    pub location: Option<String>,
    /// The height of the equipment.
    pub height: Option<Measure>,
    /// The length of the equipment.
    pub length: Option<Measure>,
    /// The minimum diameter.
    pub minimum_diameter: Option<Measure>,
    /// The maximum diameter.
    pub maximum_diameter: Option<Measure>,
    /// The volume of the equipment.
    pub volume: Option<Measure>,
    /// The weight of the equipment.
    pub weight: Option<Measure>,
    /// The hole size the equipment was run in.
    pub hole_size: Option<Measure>,
    /// The pressure rating.
    pub pressure: Option<Measure>,
    /// The temperature rating.
    pub temperature: Option<Measure>,
    /// The vertical depth of the equipment.
    pub vertical_depth: Option<Measure>,
    /// The radial drift of the equipment.
    pub radial_drift: Option<Measure>,
    /// The angular drift of the equipment.
    pub angular_drift: Option<Measure>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Equipment {
    /// Create an equipment object with the given name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Equipment {
            name: name.into(),
            ..Equipment::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("TRADEMARK-NAME", AttrKind::Text),
            Attribute::new("STATUS", AttrKind::Status),
            Attribute::new("TYPE", AttrKind::Ident),
            Attribute::new("SERIAL-NUMBER", AttrKind::Ident),
            Attribute::new("LOCATION", AttrKind::Ident),
            Attribute::new("HEIGHT", AttrKind::Numeric),
            Attribute::new("LENGTH", AttrKind::Numeric),
            Attribute::new("MINIMUM-DIAMETER", AttrKind::Numeric),
            Attribute::new("MAXIMUM-DIAMETER", AttrKind::Numeric),
            Attribute::new("VOLUME", AttrKind::Numeric),
            Attribute::new("WEIGHT", AttrKind::Numeric),
            Attribute::new("HOLE-SIZE", AttrKind::Numeric),
            Attribute::new("PRESSURE", AttrKind::Numeric),
            Attribute::new("TEMPERATURE", AttrKind::Numeric),
            Attribute::new("VERTICAL-DEPTH", AttrKind::Numeric),
            Attribute::new("RADIAL-DRIFT", AttrKind::Numeric),
            Attribute::new("ANGULAR-DRIFT", AttrKind::Numeric),
        ]
    }
}

impl EflrObject for Equipment {
    fn class(&self) -> EflrClass {
        EflrClass::Equipment
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, _resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Equipment::attrs());
        set_opt(&mut item, "TRADEMARK-NAME", self.trademark_name.as_deref())?;
        set_opt(&mut item, "STATUS", self.status)?;
        set_opt(&mut item, "TYPE", self.eq_type.as_deref())?;
        set_opt(&mut item, "SERIAL-NUMBER", self.serial_number.as_deref())?;
        set_opt(&mut item, "LOCATION", self.location.as_deref())?;
        set_measure(&mut item, "HEIGHT", &self.height)?;
        set_measure(&mut item, "LENGTH", &self.length)?;
        set_measure(&mut item, "MINIMUM-DIAMETER", &self.minimum_diameter)?;
        set_measure(&mut item, "MAXIMUM-DIAMETER", &self.maximum_diameter)?;
        set_measure(&mut item, "VOLUME", &self.volume)?;
        set_measure(&mut item, "WEIGHT", &self.weight)?;
        set_measure(&mut item, "HOLE-SIZE", &self.hole_size)?;
        set_measure(&mut item, "PRESSURE", &self.pressure)?;
        set_measure(&mut item, "TEMPERATURE", &self.temperature)?;
        set_measure(&mut item, "VERTICAL-DEPTH", &self.vertical_depth)?;
        set_measure(&mut item, "RADIAL-DRIFT", &self.radial_drift)?;
        set_measure(&mut item, "ANGULAR-DRIFT", &self.angular_drift)?;
        Ok(item)
    }
}

/// A logging tool: an assembly of equipment producing channels and
/// governed by parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tool {
    /// The object name.
    pub name: String,
    /// A free-text description.
    pub description: Option<String>,
    /// The producer's name for the tool.
    pub trademark_name: Option<String>,
    /// The generic industry name of the tool.
    pub generic_name: Option<String>,
    /// The equipment making up the tool.
    pub parts: Vec<EquipmentRef>,
    /// Whether the tool is enabled.
    pub status: Option<bool>,
    /// The channels produced by the tool.
    pub channels: Vec<ChannelRef>,
    /// The parameters governing the tool.
    pub parameters: Vec<ParameterRef>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Tool {
    /// Create a tool with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Tool {
            name: name.into(),
            ..Tool::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("DESCRIPTION", AttrKind::Text),
            Attribute::new("TRADEMARK-NAME", AttrKind::Text),
            Attribute::new("GENERIC-NAME", AttrKind::Text),
            Attribute::multi("PARTS", AttrKind::Reference),
            Attribute::new("STATUS", AttrKind::Status),
            Attribute::multi("CHANNELS", AttrKind::Reference),
            Attribute::multi("PARAMETERS", AttrKind::Reference),
        ]
    }
}

impl EflrObject for Tool {
    fn class(&self) -> EflrClass {
        EflrClass::Tool
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Tool::attrs());
        set_opt(&mut item, "DESCRIPTION", self.description.as_deref())?;
        set_opt(&mut item, "TRADEMARK-NAME", self.trademark_name.as_deref())?;
        set_opt(&mut item, "GENERIC-NAME", self.generic_name.as_deref())?;
        set_ref_list(&mut item, "PARTS", &self.parts, resolver)?;
        set_opt(&mut item, "STATUS", self.status)?;
        set_ref_list(&mut item, "CHANNELS", &self.channels, resolver)?;
        set_ref_list(&mut item, "PARAMETERS", &self.parameters, resolver)?;
        Ok(item)
    }
}

/// A derived result, one value per zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Computation {
    /// The object name.
    pub name: String,
    /// A descriptive long name, inline or by reference.
    pub long_name: Option<TextOrRef>,
    /// Property indicators from the standard list.
    pub properties: Vec<String>,
    /// The per-zone value shape.
    pub dimension: Vec<u32>,
    /// Axes describing the value coordinates.
    pub axes: Vec<AxisRef>,
    /// The zones the values apply to.
    pub zones: Vec<ZoneRef>,
    /// The computed values, one per zone when zoned.
    pub values: Vec<f64>,
    /// The unit symbol of the values.
    pub units: Option<String>,
    /// The process or tool this computation came from.
    pub source: Option<ObjectHandle>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Computation {
    /// Create a computation with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Computation {
            name: name.into(),
            ..Computation::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("LONG-NAME", AttrKind::ReferenceOrText),
            Attribute::multi("PROPERTIES", AttrKind::Ident),
            Attribute::multi("DIMENSION", AttrKind::Dimension),
            Attribute::multi("AXIS", AttrKind::Reference),
            Attribute::multi("ZONES", AttrKind::Reference),
            Attribute::multi("VALUES", AttrKind::Numeric),
            Attribute::new("SOURCE", AttrKind::Reference),
        ]
    }
}

impl EflrObject for Computation {
    fn class(&self) -> EflrClass {
        EflrClass::Computation
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Computation::attrs());
        set_long_name(&mut item, "LONG-NAME", &self.long_name, resolver)?;
        set_list(&mut item, "PROPERTIES", &self.properties)?;
        set_list(&mut item, "DIMENSION", &self.dimension)?;
        set_ref_list(&mut item, "AXIS", &self.axes, resolver)?;
        set_ref_list(&mut item, "ZONES", &self.zones, resolver)?;
        if !self.values.is_empty() {
            match &self.units {
                Some(units) => item.set_with_units("VALUES", self.values.clone(), units)?,
                None => item.set("VALUES", self.values.clone())?,
            }
        }
        set_objref(&mut item, "SOURCE", self.source, resolver)?;
        Ok(item)
    }
}

/// A processing step applied while producing this file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Process {
    /// The object name.
    pub name: String,
    /// A free-text description.
    pub description: Option<String>,
    /// The producer's name for the process.
    pub trademark_name: Option<String>,
    /// The version of the process.
    pub version: Option<String>,
    /// Property indicators from the standard list.
    pub properties: Vec<String>,
    /// `"COMPLETE"`, `"ABORTED"` or `"IN-PROGRESS"`.
    pub status: Option<String>,
    /// The channels consumed by the process.
    pub input_channels: Vec<ChannelRef>,
    /// The channels produced by the process.
    pub output_channels: Vec<ChannelRef>,
    /// The computations consumed by the process.
    pub input_computations: Vec<ComputationRef>,
    /// The computations produced by the process.
    pub output_computations: Vec<ComputationRef>,
    /// The parameters governing the process.
    pub parameters: Vec<ParameterRef>,
    /// Free-text remarks.
    pub comments: Vec<String>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Process {
    /// Create a process with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Process {
            name: name.into(),
            ..Process::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("DESCRIPTION", AttrKind::Text),
            Attribute::new("TRADEMARK-NAME", AttrKind::Text),
            Attribute::new("VERSION", AttrKind::Text),
            Attribute::multi("PROPERTIES", AttrKind::Ident),
            Attribute::new("STATUS", AttrKind::Ident),
            Attribute::multi("INPUT-CHANNELS", AttrKind::Reference),
            Attribute::multi("OUTPUT-CHANNELS", AttrKind::Reference),
            Attribute::multi("INPUT-COMPUTATIONS", AttrKind::Reference),
            Attribute::multi("OUTPUT-COMPUTATIONS", AttrKind::Reference),
            Attribute::multi("PARAMETERS", AttrKind::Reference),
            Attribute::multi("COMMENTS", AttrKind::Text),
        ]
    }
}

impl EflrObject for Process {
    fn class(&self) -> EflrClass {
        EflrClass::Process
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Process::attrs());
        set_opt(&mut item, "DESCRIPTION", self.description.as_deref())?;
        set_opt(&mut item, "TRADEMARK-NAME", self.trademark_name.as_deref())?;
        set_opt(&mut item, "VERSION", self.version.as_deref())?;
        set_list(&mut item, "PROPERTIES", &self.properties)?;
        set_opt(&mut item, "STATUS", self.status.as_deref())?;
        set_ref_list(&mut item, "INPUT-CHANNELS", &self.input_channels, resolver)?;
        set_ref_list(&mut item, "OUTPUT-CHANNELS", &self.output_channels, resolver)?;
        set_ref_list(
            &mut item,
            "INPUT-COMPUTATIONS",
            &self.input_computations,
            resolver,
        )?;
        set_ref_list(
            &mut item,
            "OUTPUT-COMPUTATIONS",
            &self.output_computations,
            resolver,
        )?;
        set_ref_list(&mut item, "PARAMETERS", &self.parameters, resolver)?;
        set_list(&mut item, "COMMENTS", &self.comments)?;
        Ok(item)
    }
}

/// A splice: one output channel cut together from input channels over
/// zones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Splice {
    /// The object name.
    pub name: String,
    /// The spliced output channel.
    pub output_channel: Option<ChannelRef>,
    /// The input channels, one per zone.
    pub input_channels: Vec<ChannelRef>,
    /// The zones delimiting the splice, one per input channel.
    pub zones: Vec<ZoneRef>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Splice {
    /// Create a splice with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Splice {
            name: name.into(),
            ..Splice::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("OUTPUT-CHANNEL", AttrKind::Reference),
            Attribute::multi("INPUT-CHANNELS", AttrKind::Reference),
            Attribute::multi("ZONES", AttrKind::Reference),
        ]
    }
}

impl EflrObject for Splice {
    fn class(&self) -> EflrClass {
        EflrClass::Splice
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Splice::attrs());
        set_ref(&mut item, "OUTPUT-CHANNEL", self.output_channel, resolver)?;
        set_ref_list(&mut item, "INPUT-CHANNELS", &self.input_channels, resolver)?;
        set_ref_list(&mut item, "ZONES", &self.zones, resolver)?;
        Ok(item)
    }
}

/// An arbitrary grouping of objects, possibly nesting other groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    /// The object name.
    pub name: String,
    /// A free-text description.
    pub description: Option<String>,
    /// The set type of the grouped objects, e.g. `"CHANNEL"`.
    pub object_type: Option<String>,
    /// The grouped objects, of any class.
    pub object_list: Vec<ObjectHandle>,
    /// Nested groups.
    pub group_list: Vec<GroupRef>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Group {
    /// Create a group with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Group {
            name: name.into(),
            ..Group::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("DESCRIPTION", AttrKind::Text),
            Attribute::new("OBJECT-TYPE", AttrKind::Ident),
            Attribute::multi("OBJECT-LIST", AttrKind::Reference),
            Attribute::multi("GROUP-LIST", AttrKind::Reference),
        ]
    }
}

impl EflrObject for Group {
    fn class(&self) -> EflrClass {
        EflrClass::Group
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Group::attrs());
        set_opt(&mut item, "DESCRIPTION", self.description.as_deref())?;
        set_opt(&mut item, "OBJECT-TYPE", self.object_type.as_deref())?;
        set_ref_list(&mut item, "OBJECT-LIST", &self.object_list, resolver)?;
        set_ref_list(&mut item, "GROUP-LIST", &self.group_list, resolver)?;
        Ok(item)
    }
}
