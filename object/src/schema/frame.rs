//! The frame class and the path class it shares a record type with.

use super::{
    item, set_measure, set_opt, set_ref, set_ref_list, BuildResult, EflrClass, EflrObject,
    Measure, Resolver,
};
use crate::attribute::{AttrKind, Attribute};
use crate::eflr::EflrItem;
use crate::{ChannelRef, FrameRef, OriginRef, WellReferencePointRef};

/// An ordered collection of channels forming a table; one frame-data
/// record is emitted per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    /// The object name.
    pub name: String,
    /// A free-text description.
    pub description: Option<String>,
    /// The channels of this frame, index channel first.
    pub channels: Vec<ChannelRef>,
    /// The kind of the index channel, e.g. `"BOREHOLE-DEPTH"`.
    /// When absent the frame is indexed implicitly by row number.
    pub index_type: Option<String>,
    /// `"INCREASING"` or `"DECREASING"`.
    /// Defaults to the observed direction of the index column.
    pub direction: Option<String>,
    /// The spacing between consecutive index values.
    /// Defaults to the observed spacing when the index column is uniform.
    pub spacing: Option<Measure>,
    /// Whether the frame data is encrypted; this writer never encrypts.
    pub encrypted: bool,
    /// The smallest index value; observed from the data when absent.
    pub index_min: Option<f64>,
    /// The largest index value; observed from the data when absent.
    pub index_max: Option<f64>,
    /// The unit symbol of the index bounds.
    pub index_units: Option<String>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Frame {
    /// Create a frame with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Frame {
            name: name.into(),
            ..Frame::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("DESCRIPTION", AttrKind::Text),
            Attribute::multi("CHANNELS", AttrKind::Reference),
            Attribute::new("INDEX-TYPE", AttrKind::Ident),
            Attribute::new("DIRECTION", AttrKind::Ident),
            Attribute::new("SPACING", AttrKind::Numeric),
            Attribute::new("ENCRYPTED", AttrKind::Status),
            Attribute::new("INDEX-MIN", AttrKind::Numeric),
            Attribute::new("INDEX-MAX", AttrKind::Numeric),
        ]
    }
}

impl EflrObject for Frame {
    fn class(&self) -> EflrClass {
        EflrClass::Frame
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Frame::attrs());
        set_opt(&mut item, "DESCRIPTION", self.description.as_deref())?;
        set_ref_list(&mut item, "CHANNELS", &self.channels, resolver)?;
        set_opt(&mut item, "INDEX-TYPE", self.index_type.as_deref())?;
        set_opt(&mut item, "DIRECTION", self.direction.as_deref())?;
        set_measure(&mut item, "SPACING", &self.spacing)?;
        if self.encrypted {
            item.set("ENCRYPTED", true)?;
        }
        for label in ["INDEX-MIN", "INDEX-MAX"] {
            let bound = if label == "INDEX-MIN" {
                self.index_min
            } else {
                self.index_max
            };
            if let Some(bound) = bound {
                match &self.index_units {
                    Some(units) => item.set_with_units(label, bound, units)?,
                    None => item.set(label, bound)?,
                }
            }
        }
        Ok(item)
    }
}

/// A path: the spatial relation of a set of channels to the well
/// reference point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    /// The object name.
    pub name: String,
    /// The frame the path values belong to.
    pub frame_type: Option<FrameRef>,
    /// The well reference point the offsets are measured from.
    pub well_reference_point: Option<WellReferencePointRef>,
    /// The channels whose measurements lie on this path.
    pub value: Vec<ChannelRef>,
    /// The borehole depth of the measure point.
    pub borehole_depth: Option<Measure>,
    /// The vertical depth of the measure point.
    pub vertical_depth: Option<Measure>,
    /// The radial drift of the measure point.
    pub radial_drift: Option<Measure>,
    /// The angular drift of the measure point.
    pub angular_drift: Option<Measure>,
    /// The time of the measurement.
    pub time: Option<Measure>,
    /// The depth offset of the measure point from the tool zero.
    pub depth_offset: Option<Measure>,
    /// The offset of the measure point from the tool reference.
    pub measure_point_offset: Option<Measure>,
    /// The offset of the tool zero from the depth datum.
    pub tool_zero_offset: Option<Measure>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Path {
    /// Create a path with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Path {
            name: name.into(),
            ..Path::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("FRAME-TYPE", AttrKind::Reference),
            Attribute::new("WELL-REFERENCE-POINT", AttrKind::Reference),
            Attribute::multi("VALUE", AttrKind::Reference),
            Attribute::new("BOREHOLE-DEPTH", AttrKind::Numeric),
            Attribute::new("VERTICAL-DEPTH", AttrKind::Numeric),
            Attribute::new("RADIAL-DRIFT", AttrKind::Numeric),
            Attribute::new("ANGULAR-DRIFT", AttrKind::Numeric),
            Attribute::new("TIME", AttrKind::Numeric),
            Attribute::new("DEPTH-OFFSET", AttrKind::Numeric),
            Attribute::new("MEASURE-POINT-OFFSET", AttrKind::Numeric),
            Attribute::new("TOOL-ZERO-OFFSET", AttrKind::Numeric),
        ]
    }
}

impl EflrObject for Path {
    fn class(&self) -> EflrClass {
        EflrClass::Path
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Path::attrs());
        set_ref(&mut item, "FRAME-TYPE", self.frame_type, resolver)?;
        set_ref(
            &mut item,
            "WELL-REFERENCE-POINT",
            self.well_reference_point,
            resolver,
        )?;
        set_ref_list(&mut item, "VALUE", &self.value, resolver)?;
        set_measure(&mut item, "BOREHOLE-DEPTH", &self.borehole_depth)?;
        set_measure(&mut item, "VERTICAL-DEPTH", &self.vertical_depth)?;
        set_measure(&mut item, "RADIAL-DRIFT", &self.radial_drift)?;
        set_measure(&mut item, "ANGULAR-DRIFT", &self.angular_drift)?;
        set_measure(&mut item, "TIME", &self.time)?;
        set_measure(&mut item, "DEPTH-OFFSET", &self.depth_offset)?;
        set_measure(&mut item, "MEASURE-POINT-OFFSET", &self.measure_point_offset)?;
        set_measure(&mut item, "TOOL-ZERO-OFFSET", &self.tool_zero_offset)?;
        Ok(item)
    }
}
