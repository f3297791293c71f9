//! The origin and well reference point classes.

use super::{
    item, set_list, set_measure, set_opt, BuildResult, EflrClass, EflrObject, Measure, Resolver,
};
use crate::attribute::{AttrKind, Attribute};
use crate::eflr::EflrItem;
use crate::OriginRef;
use chrono::{DateTime, Utc};
use dlis_core::RepCode;

/// The defining metadata object of a logical file.
///
/// The first origin added to a file is the defining origin; its
/// `file_set_number` becomes the origin reference stamped on every object
/// that does not name another origin explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Origin {
    /// The object name.
    pub name: String,
    /// Free-text identifier of the logical file.
    pub file_id: Option<String>,
    /// The name of the file set this file belongs to.
    pub file_set_name: Option<String>,
    /// The file set number, also the origin reference of owned objects.
    /// Defaults to the one-based position of this origin in the file.
    pub file_set_number: Option<u32>,
    /// The file number within the file set.
    pub file_number: Option<u32>,
    /// The file type, e.g. `"PLAYBACK"`.
    pub file_type: Option<String>,
    /// The producing product name.
    pub product: Option<String>,
    /// The producing product version.
    pub version: Option<String>,
    /// The programs that produced the file.
    pub programs: Vec<String>,
    /// The creation instant, stamped as GMT.
    pub creation_time: Option<DateTime<Utc>>,
    /// The service order number.
    pub order_number: Option<String>,
    /// The descent number of the acquisition.
    pub descent_number: Option<u32>,
    /// The run number of the acquisition.
    pub run_number: Option<u32>,
    /// The well identifier.
    pub well_id: Option<String>,
    /// The well name.
    pub well_name: Option<String>,
    /// The field name.
    pub field_name: Option<String>,
    /// The standard producer company code.
    pub producer_code: Option<u32>,
    /// The producer company name.
    pub producer_name: Option<String>,
    /// The operating company.
    pub company: Option<String>,
    /// The name space that object names are drawn from.
    pub name_space_name: Option<String>,
    /// The version of the name space.
    pub name_space_version: Option<u32>,
}

impl Origin {
    /// Create an origin with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Origin {
            name: name.into(),
            ..Origin::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("FILE-ID", AttrKind::Text),
            Attribute::new("FILE-SET-NAME", AttrKind::Ident),
            Attribute::new("FILE-SET-NUMBER", AttrKind::Integer),
            Attribute::new("FILE-NUMBER", AttrKind::Integer),
            Attribute::new("FILE-TYPE", AttrKind::Ident),
            Attribute::new("PRODUCT", AttrKind::Text),
            Attribute::new("VERSION", AttrKind::Text),
            Attribute::multi("PROGRAMS", AttrKind::Text),
            Attribute::new("CREATION-TIME", AttrKind::DTime),
            Attribute::new("ORDER-NUMBER", AttrKind::Text),
            Attribute::new("DESCENT-NUMBER", AttrKind::Integer),
            Attribute::new("RUN-NUMBER", AttrKind::Integer),
            Attribute::new("WELL-ID", AttrKind::Text),
            Attribute::new("WELL-NAME", AttrKind::Text),
            Attribute::new("FIELD-NAME", AttrKind::Text),
            Attribute::new("PRODUCER-CODE", AttrKind::Integer),
            Attribute::new("PRODUCER-NAME", AttrKind::Text),
            Attribute::new("COMPANY", AttrKind::Text),
            Attribute::new("NAME-SPACE-NAME", AttrKind::Ident),
            Attribute::new("NAME-SPACE-VERSION", AttrKind::Integer),
        ]
    }
}

impl EflrObject for Origin {
    fn class(&self) -> EflrClass {
        EflrClass::Origin
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, _resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Origin::attrs());
        set_opt(&mut item, "FILE-ID", self.file_id.as_deref())?;
        set_opt(&mut item, "FILE-SET-NAME", self.file_set_name.as_deref())?;
        item.set_code("FILE-SET-NUMBER", RepCode::Uvari)?;
        set_opt(&mut item, "FILE-SET-NUMBER", self.file_set_number)?;
        item.set_code("FILE-NUMBER", RepCode::Uvari)?;
        set_opt(&mut item, "FILE-NUMBER", self.file_number)?;
        set_opt(&mut item, "FILE-TYPE", self.file_type.as_deref())?;
        set_opt(&mut item, "PRODUCT", self.product.as_deref())?;
        set_opt(&mut item, "VERSION", self.version.as_deref())?;
        set_list(&mut item, "PROGRAMS", &self.programs)?;
        set_opt(&mut item, "CREATION-TIME", self.creation_time)?;
        set_opt(&mut item, "ORDER-NUMBER", self.order_number.as_deref())?;
        set_opt(&mut item, "DESCENT-NUMBER", self.descent_number)?;
        set_opt(&mut item, "RUN-NUMBER", self.run_number)?;
        set_opt(&mut item, "WELL-ID", self.well_id.as_deref())?;
        set_opt(&mut item, "WELL-NAME", self.well_name.as_deref())?;
        set_opt(&mut item, "FIELD-NAME", self.field_name.as_deref())?;
        item.set_code("PRODUCER-CODE", RepCode::Unorm)?;
        set_opt(&mut item, "PRODUCER-CODE", self.producer_code)?;
        set_opt(&mut item, "PRODUCER-NAME", self.producer_name.as_deref())?;
        set_opt(&mut item, "COMPANY", self.company.as_deref())?;
        set_opt(&mut item, "NAME-SPACE-NAME", self.name_space_name.as_deref())?;
        set_opt(&mut item, "NAME-SPACE-VERSION", self.name_space_version)?;
        Ok(item)
    }
}

/// The well reference point: the fixed spatial datum every coordinate in
/// the file is measured against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WellReferencePoint {
    /// The object name.
    pub name: String,
    /// The permanent datum, e.g. `"GROUND LEVEL"`.
    pub permanent_datum: Option<String>,
    /// The reference from which vertical distances are measured.
    pub vertical_zero: Option<String>,
    /// Elevation of the permanent datum above mean sea level.
    pub permanent_datum_elevation: Option<Measure>,
    /// Distance of the well reference point above the permanent datum.
    pub above_permanent_datum: Option<Measure>,
    /// The magnetic declination at the well.
    pub magnetic_declination: Option<Measure>,
    /// The name of the first coordinate, e.g. `"LATITUDE"`.
    pub coordinate_1_name: Option<String>,
    /// The value of the first coordinate.
    pub coordinate_1_value: Option<Measure>,
    /// The name of the second coordinate.
    pub coordinate_2_name: Option<String>,
    /// The value of the second coordinate.
    pub coordinate_2_value: Option<Measure>,
    /// The name of the third coordinate.
    pub coordinate_3_name: Option<String>,
    /// The value of the third coordinate.
    pub coordinate_3_value: Option<Measure>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl WellReferencePoint {
    /// Create a well reference point with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        WellReferencePoint {
            name: name.into(),
            ..WellReferencePoint::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("PERMANENT-DATUM", AttrKind::Text),
            Attribute::new("VERTICAL-ZERO", AttrKind::Text),
            Attribute::new("PERMANENT-DATUM-ELEVATION", AttrKind::Numeric),
            Attribute::new("ABOVE-PERMANENT-DATUM", AttrKind::Numeric),
            Attribute::new("MAGNETIC-DECLINATION", AttrKind::Numeric),
            Attribute::new("COORDINATE-1-NAME", AttrKind::Text),
            Attribute::new("COORDINATE-1-VALUE", AttrKind::Numeric),
            Attribute::new("COORDINATE-2-NAME", AttrKind::Text),
            Attribute::new("COORDINATE-2-VALUE", AttrKind::Numeric),
            Attribute::new("COORDINATE-3-NAME", AttrKind::Text),
            Attribute::new("COORDINATE-3-VALUE", AttrKind::Numeric),
        ]
    }
}

impl EflrObject for WellReferencePoint {
    fn class(&self) -> EflrClass {
        EflrClass::WellReferencePoint
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, _resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, WellReferencePoint::attrs());
        set_opt(&mut item, "PERMANENT-DATUM", self.permanent_datum.as_deref())?;
        set_opt(&mut item, "VERTICAL-ZERO", self.vertical_zero.as_deref())?;
        set_measure(
            &mut item,
            "PERMANENT-DATUM-ELEVATION",
            &self.permanent_datum_elevation,
        )?;
        set_measure(&mut item, "ABOVE-PERMANENT-DATUM", &self.above_permanent_datum)?;
        set_measure(&mut item, "MAGNETIC-DECLINATION", &self.magnetic_declination)?;
        set_opt(&mut item, "COORDINATE-1-NAME", self.coordinate_1_name.as_deref())?;
        set_measure(&mut item, "COORDINATE-1-VALUE", &self.coordinate_1_value)?;
        set_opt(&mut item, "COORDINATE-2-NAME", self.coordinate_2_name.as_deref())?;
        set_measure(&mut item, "COORDINATE-2-VALUE", &self.coordinate_2_value)?;
        set_opt(&mut item, "COORDINATE-3-NAME", self.coordinate_3_name.as_deref())?;
        set_measure(&mut item, "COORDINATE-3-VALUE", &self.coordinate_3_value)?;
        Ok(item)
    }
}
