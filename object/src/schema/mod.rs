//! Domain-object schemas: one public struct per RP66 class, each carrying
//! public optional fields and converted into an [`EflrItem`] attribute row
//! at write time.
//!
//! Cross-references between objects are typed handles into the logical
//! file's arenas; a [`Resolver`] turns them into wire object names once
//! identities are assigned.

use crate::attribute::Attribute;
use crate::eflr::{self, EflrItem};
use crate::{ObjectHandle, OriginRef};
use dlis_core::{ObName, ObjRef, Value};
use dlis_encoding::segment::EflrType;
use snafu::{Backtrace, Snafu};
use std::collections::BTreeMap;

mod calibration;
mod channel;
mod frame;
mod misc;
mod origin;
mod statics;

pub use calibration::{Calibration, CalibrationCoefficient, CalibrationMeasurement};
pub use channel::{Axis, Channel, LongName};
pub use frame::{Frame, Path};
pub use misc::{Comment, Message, NoFormat, NoFormatData};
pub use origin::{Origin, WellReferencePoint};
pub use statics::{Computation, Equipment, Group, Parameter, Process, Splice, Tool, Zone};

/// The object classes a logical file may hold, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum EflrClass {
    FileHeader,
    Origin,
    WellReferencePoint,
    Axis,
    LongName,
    Channel,
    Frame,
    Path,
    Zone,
    Parameter,
    Equipment,
    Tool,
    CalibrationCoefficient,
    CalibrationMeasurement,
    Calibration,
    Computation,
    Process,
    Splice,
    Group,
    Message,
    Comment,
    NoFormat,
}

impl EflrClass {
    /// The dependency-safe emission order: referents before referrers.
    pub const EMISSION_ORDER: [EflrClass; 22] = [
        EflrClass::FileHeader,
        EflrClass::Origin,
        EflrClass::WellReferencePoint,
        EflrClass::Axis,
        EflrClass::LongName,
        EflrClass::Channel,
        EflrClass::Frame,
        EflrClass::Zone,
        EflrClass::Parameter,
        EflrClass::Equipment,
        EflrClass::Tool,
        EflrClass::CalibrationCoefficient,
        EflrClass::CalibrationMeasurement,
        EflrClass::Calibration,
        EflrClass::Computation,
        EflrClass::Process,
        EflrClass::Splice,
        EflrClass::Path,
        EflrClass::Group,
        EflrClass::Message,
        EflrClass::Comment,
        EflrClass::NoFormat,
    ];

    /// The set type this class serializes under.
    pub fn set_type(self) -> &'static str {
        use EflrClass::*;
        match self {
            FileHeader => "FILE-HEADER",
            Origin => "ORIGIN",
            WellReferencePoint => "WELL-REFERENCE",
            Axis => "AXIS",
            LongName => "LONG-NAME",
            Channel => "CHANNEL",
            Frame => "FRAME",
            Path => "PATH",
            Zone => "ZONE",
            Parameter => "PARAMETER",
            Equipment => "EQUIPMENT",
            Tool => "TOOL",
            CalibrationCoefficient => "CALIBRATION-COEFFICIENT",
            CalibrationMeasurement => "CALIBRATION-MEASUREMENT",
            Calibration => "CALIBRATION",
            Computation => "COMPUTATION",
            Process => "PROCESS",
            Splice => "SPLICE",
            Group => "GROUP",
            Message => "MESSAGE",
            Comment => "COMMENT",
            NoFormat => "NO-FORMAT",
        }
    }

    /// The logical-record type code this class serializes under.
    pub fn record_type(self) -> EflrType {
        use EflrClass::*;
        match self {
            FileHeader => EflrType::FileHeader,
            Origin | WellReferencePoint => EflrType::Origin,
            Axis => EflrType::Axis,
            LongName => EflrType::LongName,
            Channel => EflrType::Channel,
            Frame | Path => EflrType::Frame,
            Zone | Parameter | Equipment | Tool | CalibrationCoefficient
            | CalibrationMeasurement | Calibration | Computation | Process | Splice | Group => {
                EflrType::Static
            }
            Message | Comment => EflrType::Script,
            NoFormat => EflrType::Udi,
        }
    }
}

/// Module-level error type:
/// for errors which may occur while building object rows for emission.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum BuildError {
    /// A handle does not point into this logical file.
    #[snafu(display("Reference to {:?} object #{} outside this logical file", class, index))]
    DanglingReference {
        /// The class of the handle.
        class: EflrClass,
        /// The arena index of the handle.
        index: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// An attribute row could not be populated.
    #[snafu(context(false))]
    Item {
        /// The underlying record-assembly error.
        #[snafu(backtrace)]
        source: eflr::Error,
    },
}

pub(crate) type BuildResult<T> = std::result::Result<T, BuildError>;

/// Resolves object handles to the wire identities assigned for this write.
#[derive(Debug)]
pub(crate) struct Resolver {
    identities: BTreeMap<ObjectHandle, ObName>,
}

impl Resolver {
    pub(crate) fn new(identities: BTreeMap<ObjectHandle, ObName>) -> Self {
        Resolver { identities }
    }

    pub(crate) fn obname<H>(&self, handle: H) -> BuildResult<ObName>
    where
        H: Into<ObjectHandle>,
    {
        let handle = handle.into();
        self.identities.get(&handle).cloned().ok_or_else(|| {
            DanglingReferenceSnafu {
                class: handle.class,
                index: handle.index,
            }
            .build()
        })
    }

    pub(crate) fn objref<H>(&self, handle: H) -> BuildResult<ObjRef>
    where
        H: Into<ObjectHandle>,
    {
        let handle = handle.into();
        let name = self.obname(handle)?;
        Ok(ObjRef::new(handle.class.set_type(), name))
    }
}

/// A numeric value paired with an optional unit symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    /// The numeric value.
    pub value: f64,
    /// The unit symbol, if any.
    pub units: Option<String>,
}

impl Measure {
    /// A plain number with no units.
    pub fn new(value: f64) -> Self {
        Measure { value, units: None }
    }

    /// A number with a unit symbol.
    pub fn with_units<T: Into<String>>(value: f64, units: T) -> Self {
        Measure {
            value,
            units: Some(units.into()),
        }
    }
}

impl From<f64> for Measure {
    fn from(value: f64) -> Self {
        Measure::new(value)
    }
}

/// A long-name attribute: free text, or a reference to a long name object.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOrRef {
    /// Inline text.
    Text(String),
    /// A reference to a [`LongName`] object.
    LongName(crate::LongNameRef),
}

impl From<&str> for TextOrRef {
    fn from(value: &str) -> Self {
        TextOrRef::Text(value.to_owned())
    }
}

impl From<String> for TextOrRef {
    fn from(value: String) -> Self {
        TextOrRef::Text(value)
    }
}

impl From<crate::LongNameRef> for TextOrRef {
    fn from(value: crate::LongNameRef) -> Self {
        TextOrRef::LongName(value)
    }
}

/// The write-time view of a user object: its class, its name, and the
/// conversion into an attribute row.
pub(crate) trait EflrObject {
    fn class(&self) -> EflrClass;
    fn name(&self) -> &str;
    fn origin(&self) -> Option<OriginRef> {
        None
    }
    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem>;
}

pub(crate) fn item<T: Into<String>>(name: T, attrs: Vec<Attribute>) -> EflrItem {
    EflrItem::new(name, attrs)
}

pub(crate) fn set_opt<V>(
    item: &mut EflrItem,
    label: &'static str,
    value: Option<V>,
) -> BuildResult<()>
where
    V: Into<Value>,
{
    if let Some(value) = value {
        item.set(label, value)?;
    }
    Ok(())
}

pub(crate) fn set_list<V>(item: &mut EflrItem, label: &'static str, values: &[V]) -> BuildResult<()>
where
    V: Clone,
    Value: From<Vec<V>>,
{
    if !values.is_empty() {
        item.set(label, values.to_vec())?;
    }
    Ok(())
}

pub(crate) fn set_measure(
    item: &mut EflrItem,
    label: &'static str,
    measure: &Option<Measure>,
) -> BuildResult<()> {
    if let Some(measure) = measure {
        match &measure.units {
            Some(units) => item.set_with_units(label, measure.value, units)?,
            None => item.set(label, measure.value)?,
        }
    }
    Ok(())
}

pub(crate) fn set_ref<H>(
    item: &mut EflrItem,
    label: &'static str,
    handle: Option<H>,
    resolver: &Resolver,
) -> BuildResult<()>
where
    H: Into<ObjectHandle>,
{
    if let Some(handle) = handle {
        let name = resolver.obname(handle)?;
        item.set(label, name)?;
    }
    Ok(())
}

pub(crate) fn set_ref_list<H>(
    item: &mut EflrItem,
    label: &'static str,
    handles: &[H],
    resolver: &Resolver,
) -> BuildResult<()>
where
    H: Into<ObjectHandle> + Copy,
{
    if !handles.is_empty() {
        let names = handles
            .iter()
            .map(|h| resolver.obname(*h))
            .collect::<BuildResult<Vec<_>>>()?;
        item.set(label, names)?;
    }
    Ok(())
}

pub(crate) fn set_objref(
    item: &mut EflrItem,
    label: &'static str,
    handle: Option<ObjectHandle>,
    resolver: &Resolver,
) -> BuildResult<()> {
    if let Some(handle) = handle {
        let objref = resolver.objref(handle)?;
        item.set(label, objref)?;
    }
    Ok(())
}

pub(crate) fn set_long_name(
    item: &mut EflrItem,
    label: &'static str,
    value: &Option<TextOrRef>,
    resolver: &Resolver,
) -> BuildResult<()> {
    match value {
        None => Ok(()),
        Some(TextOrRef::Text(text)) => {
            item.set(label, text.as_str())?;
            Ok(())
        }
        Some(TextOrRef::LongName(handle)) => set_ref(item, label, Some(*handle), resolver),
    }
}
