//! The calibration classes: measurements, coefficients and the
//! calibration object tying them together.

use super::{
    item, set_list, set_measure, set_opt, set_ref, set_ref_list, BuildResult, EflrClass,
    EflrObject, Measure, Resolver,
};
use crate::attribute::{AttrKind, Attribute};
use crate::eflr::EflrItem;
use crate::{
    CalibrationCoefficientRef, CalibrationMeasurementRef, ChannelRef, OriginRef, ParameterRef,
};
use chrono::{DateTime, Utc};

/// A measurement taken while calibrating a channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationMeasurement {
    /// The object name.
    pub name: String,
    /// `"BEFORE"`, `"AFTER"` or `"MASTER"`.
    pub phase: Option<String>,
    /// The channel the measurement was taken on.
    pub measurement_source: Option<ChannelRef>,
    /// The type of the measurement, e.g. `"ZERO"`.
    pub measurement_type: Option<String>,
    /// The shape of one measurement sample.
    pub dimension: Vec<u32>,
    /// Axes describing the sample coordinates.
    pub axes: Vec<crate::AxisRef>,
    /// The measured samples, flattened row-major.
    pub measurement: Vec<f64>,
    /// The unit symbol of the samples.
    pub measurement_units: Option<String>,
    /// The number of samples averaged per measurement.
    pub sample_count: Option<u32>,
    /// The largest deviation observed while averaging.
    pub maximum_deviation: Option<f64>,
    /// The standard deviation observed while averaging.
    pub standard_deviation: Option<f64>,
    /// The instant the measurement began.
    pub begin_time: Option<DateTime<Utc>>,
    /// The duration of the measurement.
    pub duration: Option<Measure>,
    /// The nominal value of each sample.
    pub reference: Vec<f64>,
    /// The standard against which the measurement was made.
    pub standard: Vec<f64>,
    /// The allowed deviation of each sample above the reference.
    pub plus_tolerance: Vec<f64>,
    /// The allowed deviation of each sample below the reference.
    pub minus_tolerance: Vec<f64>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl CalibrationMeasurement {
    /// Create a calibration measurement with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        CalibrationMeasurement {
            name: name.into(),
            ..CalibrationMeasurement::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("PHASE", AttrKind::Ident),
            Attribute::new("MEASUREMENT-SOURCE", AttrKind::Reference),
            Attribute::new("TYPE", AttrKind::Ident),
            Attribute::multi("DIMENSION", AttrKind::Dimension),
            Attribute::multi("AXIS", AttrKind::Reference),
            Attribute::multi("MEASUREMENT", AttrKind::Numeric),
            Attribute::new("SAMPLE-COUNT", AttrKind::Integer),
            Attribute::new("MAXIMUM-DEVIATION", AttrKind::Numeric),
            Attribute::new("STANDARD-DEVIATION", AttrKind::Numeric),
            Attribute::new("BEGIN-TIME", AttrKind::DTime),
            Attribute::new("DURATION", AttrKind::DTime),
            Attribute::multi("REFERENCE", AttrKind::Numeric),
            Attribute::multi("STANDARD", AttrKind::Numeric),
            Attribute::multi("PLUS-TOLERANCE", AttrKind::Numeric),
            Attribute::multi("MINUS-TOLERANCE", AttrKind::Numeric),
        ]
    }
}

impl EflrObject for CalibrationMeasurement {
    fn class(&self) -> EflrClass {
        EflrClass::CalibrationMeasurement
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, CalibrationMeasurement::attrs());
        set_opt(&mut item, "PHASE", self.phase.as_deref())?;
        set_ref(
            &mut item,
            "MEASUREMENT-SOURCE",
            self.measurement_source,
            resolver,
        )?;
        set_opt(&mut item, "TYPE", self.measurement_type.as_deref())?;
        set_list(&mut item, "DIMENSION", &self.dimension)?;
        set_ref_list(&mut item, "AXIS", &self.axes, resolver)?;
        if !self.measurement.is_empty() {
            match &self.measurement_units {
                Some(units) => {
                    item.set_with_units("MEASUREMENT", self.measurement.clone(), units)?
                }
                None => item.set("MEASUREMENT", self.measurement.clone())?,
            }
            // one row per sample when the samples are vectors
            let width: usize = self.dimension.iter().map(|d| *d as usize).product();
            if width > 1 && self.measurement.len() % width == 0 {
                item.set_rows("MEASUREMENT", self.measurement.len() / width)?;
            }
        }
        set_opt(&mut item, "SAMPLE-COUNT", self.sample_count)?;
        set_opt(&mut item, "MAXIMUM-DEVIATION", self.maximum_deviation)?;
        set_opt(&mut item, "STANDARD-DEVIATION", self.standard_deviation)?;
        set_opt(&mut item, "BEGIN-TIME", self.begin_time)?;
        set_measure(&mut item, "DURATION", &self.duration)?;
        set_list(&mut item, "REFERENCE", &self.reference)?;
        set_list(&mut item, "STANDARD", &self.standard)?;
        set_list(&mut item, "PLUS-TOLERANCE", &self.plus_tolerance)?;
        set_list(&mut item, "MINUS-TOLERANCE", &self.minus_tolerance)?;
        Ok(item)
    }
}

/// A set of calibration coefficients with their references and tolerances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationCoefficient {
    /// The object name.
    pub name: String,
    /// The kind of coefficient, e.g. `"GAIN"` or `"OFFSET"`.
    pub label: Option<String>,
    /// The coefficient values.
    pub coefficients: Vec<f64>,
    /// The nominal value of each coefficient.
    pub references: Vec<f64>,
    /// The allowed deviation above each reference.
    pub plus_tolerances: Vec<f64>,
    /// The allowed deviation below each reference.
    pub minus_tolerances: Vec<f64>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl CalibrationCoefficient {
    /// Create a calibration coefficient with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        CalibrationCoefficient {
            name: name.into(),
            ..CalibrationCoefficient::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::new("LABEL", AttrKind::Ident),
            Attribute::multi("COEFFICIENTS", AttrKind::Numeric),
            Attribute::multi("REFERENCES", AttrKind::Numeric),
            Attribute::multi("PLUS-TOLERANCES", AttrKind::Numeric),
            Attribute::multi("MINUS-TOLERANCES", AttrKind::Numeric),
        ]
    }
}

impl EflrObject for CalibrationCoefficient {
    fn class(&self) -> EflrClass {
        EflrClass::CalibrationCoefficient
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, _resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, CalibrationCoefficient::attrs());
        set_opt(&mut item, "LABEL", self.label.as_deref())?;
        set_list(&mut item, "COEFFICIENTS", &self.coefficients)?;
        set_list(&mut item, "REFERENCES", &self.references)?;
        set_list(&mut item, "PLUS-TOLERANCES", &self.plus_tolerances)?;
        set_list(&mut item, "MINUS-TOLERANCES", &self.minus_tolerances)?;
        Ok(item)
    }
}

/// A calibration: the channels calibrated, and the measurements,
/// coefficients and parameters that produced the calibration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Calibration {
    /// The object name.
    pub name: String,
    /// The calibrated channels.
    pub calibrated_channels: Vec<ChannelRef>,
    /// The uncalibrated input channels.
    pub uncalibrated_channels: Vec<ChannelRef>,
    /// The coefficient sets used.
    pub coefficients: Vec<CalibrationCoefficientRef>,
    /// The measurements used.
    pub measurements: Vec<CalibrationMeasurementRef>,
    /// The parameters governing the calibration.
    pub parameters: Vec<ParameterRef>,
    /// The calibration method.
    pub method: Option<String>,
    /// The origin owning this object, when not the defining origin.
    pub origin: Option<OriginRef>,
}

impl Calibration {
    /// Create a calibration with the given object name.
    pub fn new<T: Into<String>>(name: T) -> Self {
        Calibration {
            name: name.into(),
            ..Calibration::default()
        }
    }

    fn attrs() -> Vec<Attribute> {
        vec![
            Attribute::multi("CALIBRATED-CHANNELS", AttrKind::Reference),
            Attribute::multi("UNCALIBRATED-CHANNELS", AttrKind::Reference),
            Attribute::multi("COEFFICIENTS", AttrKind::Reference),
            Attribute::multi("MEASUREMENTS", AttrKind::Reference),
            Attribute::multi("PARAMETERS", AttrKind::Reference),
            Attribute::new("METHOD", AttrKind::Ident),
        ]
    }
}

impl EflrObject for Calibration {
    fn class(&self) -> EflrClass {
        EflrClass::Calibration
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> Option<OriginRef> {
        self.origin
    }

    fn build(&self, resolver: &Resolver) -> BuildResult<EflrItem> {
        let mut item = item(&self.name, Calibration::attrs());
        set_ref_list(
            &mut item,
            "CALIBRATED-CHANNELS",
            &self.calibrated_channels,
            resolver,
        )?;
        set_ref_list(
            &mut item,
            "UNCALIBRATED-CHANNELS",
            &self.uncalibrated_channels,
            resolver,
        )?;
        set_ref_list(&mut item, "COEFFICIENTS", &self.coefficients, resolver)?;
        set_ref_list(&mut item, "MEASUREMENTS", &self.measurements, resolver)?;
        set_ref_list(&mut item, "PARAMETERS", &self.parameters, resolver)?;
        set_opt(&mut item, "METHOD", self.method.as_deref())?;
        Ok(item)
    }
}
