//! Pre-write validation of the object graph and its backing data.
//!
//! Fatal findings surface before any byte is written. Non-fatal findings
//! are logged as warnings under the standard policy; the high-compatibility
//! policy upgrades a fixed list of them to errors.

use crate::schema::EflrClass;
use crate::source::{self, ChunkCursor, DataSource};
use crate::{CompatPolicy, LogicalFile};
use itertools::Itertools;
use snafu::{ensure, Backtrace, Snafu};
use tracing::warn;

/// The zone index domains admitted by the standard.
pub(crate) const ZONE_DOMAINS: [&str; 3] = ["BOREHOLE-DEPTH", "TIME", "VERTICAL-DEPTH"];

/// The frame index types admitted by the standard.
pub(crate) const INDEX_TYPES: [&str; 6] = [
    "ANGULAR-DRIFT",
    "BOREHOLE-DEPTH",
    "NON-STANDARD",
    "RADIAL-DRIFT",
    "TIME",
    "VERTICAL-DEPTH",
];

/// The process statuses admitted by the standard.
pub(crate) const PROCESS_STATUSES: [&str; 3] = ["ABORTED", "COMPLETE", "IN-PROGRESS"];

/// The calibration measurement phases admitted by the standard.
pub(crate) const MEASUREMENT_PHASES: [&str; 3] = ["AFTER", "BEFORE", "MASTER"];

/// The channel property indicators admitted by the standard.
pub(crate) const PROPERTIES: [&str; 24] = [
    "AVERAGED",
    "BASIC",
    "CALIBRATED",
    "COMPUTED",
    "DEPTH-MATCHED",
    "DERIVED",
    "FILTERED",
    "HOLE-SIZE-CORRECTED",
    "INCLINOMETRY-CORRECTED",
    "INTERPOLATED",
    "LITHOLOGY-CORRECTED",
    "LOCAL-COMPUTATION",
    "LOCALLY-DEFINED",
    "MODELLED",
    "MUDCAKE-CORRECTED",
    "NORMALIZED",
    "OVER-SAMPLED",
    "PATCHED",
    "PRESSURE-CORRECTED",
    "RESAMPLED",
    "SALINITY-CORRECTED",
    "SAMPLED-DOWNWARD",
    "SPEED-CORRECTED",
    "SPLICED",
];

/// The unit symbols admitted by the standard (the commonly used subset).
pub(crate) const UNITS: [&str; 52] = [
    "A", "C", "D", "F", "GPa", "Gal", "Hz", "J", "K", "L", "MHz", "MPa", "MeV", "Mg", "N", "Oe",
    "P", "Pa", "S", "T", "V", "W", "Wb", "a", "acre", "bar", "bbl", "cP", "cal", "cm", "d", "dB",
    "daN", "deg", "degC", "degF", "ft", "g", "gal", "h", "in", "kHz", "kPa", "kg", "km", "lbf",
    "lbm", "m", "mD", "min", "s", "us",
];

/// Module-level error type:
/// for fatal findings of the pre-write validation pass.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The file declares no origin at all.
    #[snafu(display("A logical file requires at least one origin"))]
    NoOrigin {
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// An object name violates the required character set.
    #[snafu(display("{} name {:?} holds characters outside A-Z, a-z, 0-9, _ and -", object, name))]
    BadName {
        /// The object kind.
        object: &'static str,
        /// The offending name.
        name: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// An object name holds lowercase characters under high compatibility.
    #[snafu(display("{} name {:?} must be uppercase", object, name))]
    NameNotUppercase {
        /// The object kind.
        object: &'static str,
        /// The offending name.
        name: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A channel is referenced by more than one frame.
    #[snafu(display(
        "Channel {} is referenced by frames {} and {}",
        channel,
        first,
        second
    ))]
    ChannelInMultipleFrames {
        /// The shared channel name.
        channel: String,
        /// The first referencing frame.
        first: String,
        /// The second referencing frame.
        second: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A handle points outside this logical file's arenas.
    #[snafu(display("{} references an object outside this logical file", object))]
    ForeignReference {
        /// The referring object name.
        object: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A channel's dimension and element limit disagree.
    #[snafu(display("Channel {}: dimension and element limit disagree", channel))]
    ElementLimitMismatch {
        /// The offending channel name.
        channel: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A channel declares an empty or multi-axis dimension.
    #[snafu(display("Channel {}: only scalar or single-axis vector rows are supported", channel))]
    UnsupportedDimension {
        /// The offending channel name.
        channel: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A frame's index channel is not a one-dimensional scalar.
    #[snafu(display("Frame {}: index channel {} must be scalar", frame, channel))]
    IndexNotScalar {
        /// The frame name.
        frame: String,
        /// The index channel name.
        channel: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A computation's values and zones differ in length.
    #[snafu(display(
        "Computation {}: {} values against {} zones",
        computation,
        values,
        zones
    ))]
    ValuesZonesMismatch {
        /// The computation name.
        computation: String,
        /// The value count.
        values: usize,
        /// The zone count.
        zones: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A zone's domain is not one of the standard three.
    #[snafu(display("Zone {}: unknown domain {:?}", zone, domain))]
    UnknownZoneDomain {
        /// The zone name.
        zone: String,
        /// The offending domain.
        domain: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A zone's bounds are inverted or of a kind foreign to its domain.
    #[snafu(display("Zone {}: invalid bounds for domain {:?}", zone, domain))]
    BadZoneBounds {
        /// The zone name.
        zone: String,
        /// The zone domain.
        domain: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// An enum-bound attribute takes a value outside the standard list.
    #[snafu(display("{} {}: {:?} is not a standard {} value", object, name, value, label))]
    BadEnumValue {
        /// The object kind.
        object: &'static str,
        /// The object name.
        name: String,
        /// The attribute label.
        label: &'static str,
        /// The offending value.
        value: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A unit symbol is outside the standard list, under high compatibility.
    #[snafu(display("{}: unknown unit symbol {:?}", object, units))]
    UnknownUnits {
        /// The object name.
        object: String,
        /// The offending unit symbol.
        units: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A non-standard index type, under high compatibility.
    #[snafu(display("Frame {}: non-standard index type {:?}", frame, index_type))]
    NonStandardIndexType {
        /// The frame name.
        frame: String,
        /// The offending index type.
        index_type: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A channel's declared width disagrees with its dataset.
    #[snafu(display(
        "Channel {}: declared width {} but dataset {} holds rows of width {}",
        channel,
        declared,
        key,
        actual
    ))]
    WidthMismatch {
        /// The channel name.
        channel: String,
        /// The dataset key.
        key: String,
        /// The declared per-row element count.
        declared: usize,
        /// The dataset's per-row element count.
        actual: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// Channels of one frame disagree on their row count.
    #[snafu(display(
        "Frame {}: channel {} holds {} rows where {} were expected",
        frame,
        channel,
        actual,
        expected
    ))]
    RowCountMismatch {
        /// The frame name.
        frame: String,
        /// The offending channel name.
        channel: String,
        /// The expected row count.
        expected: usize,
        /// The actual row count.
        actual: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A channel's representation code cannot carry its dataset.
    #[snafu(display(
        "Channel {}: integer representation code over a floating point dataset",
        channel
    ))]
    CodeKindMismatch {
        /// The offending channel name.
        channel: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The source could not serve a dataset referenced by a frame.
    #[snafu(display("Source data check failed"))]
    Data {
        /// The underlying source error.
        #[snafu(backtrace)]
        source: source::Error,
    },
}

/// Type alias for a result from this module.
pub type Result<T, E = Error> = std::result::Result<T, E>;

fn name_charset_ok(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Check one object name against the naming rules of the active policy.
pub(crate) fn check_name(object: &'static str, name: &str, policy: CompatPolicy) -> Result<()> {
    if !name_charset_ok(name) {
        match policy {
            CompatPolicy::Standard => {
                warn!(object, name, "name holds characters outside A-Za-z0-9_-");
            }
            CompatPolicy::HighCompatibility => {
                return BadNameSnafu { object, name }.fail();
            }
        }
    }
    if policy == CompatPolicy::HighCompatibility {
        ensure!(
            !name.bytes().any(|b| b.is_ascii_lowercase()),
            NameNotUppercaseSnafu { object, name }
        );
    }
    Ok(())
}

fn check_units(object: &str, units: &Option<String>, policy: CompatPolicy) -> Result<()> {
    let Some(units) = units else { return Ok(()) };
    if UNITS.contains(&units.as_str()) {
        return Ok(());
    }
    match policy {
        CompatPolicy::Standard => {
            warn!(object, %units, "unit symbol is not in the standard list");
            Ok(())
        }
        CompatPolicy::HighCompatibility => UnknownUnitsSnafu { object, units }.fail(),
    }
}

/// Summary of one pass over an index column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IndexStats {
    pub first: f64,
    pub last: f64,
    pub monotonic: bool,
    pub uniform: bool,
    pub spacing: f64,
}

/// Scan a scalar index dataset in chunks and summarize its shape.
pub(crate) fn index_stats<S>(
    source: &S,
    key: &str,
    rows: usize,
) -> std::result::Result<Option<IndexStats>, source::Error>
where
    S: DataSource + ?Sized,
{
    if rows < 2 {
        return Ok(None);
    }
    let cursor = ChunkCursor::new(source, vec![key.to_owned()], rows, 65_536);
    let mut values = Vec::with_capacity(0);
    let mut stats: Option<IndexStats> = None;
    let mut previous: Option<f64> = None;
    for chunk in cursor {
        let chunk = chunk?;
        values.clear();
        values.extend(chunk.columns[0].array().to_f64_vec());
        for (a, b) in previous
            .into_iter()
            .chain(values.iter().copied())
            .tuple_windows()
        {
            let step = b - a;
            let stats = stats.get_or_insert(IndexStats {
                first: a,
                last: b,
                monotonic: true,
                uniform: true,
                spacing: step,
            });
            if step == 0.0 || (step > 0.0) != (stats.spacing > 0.0) {
                stats.monotonic = false;
            }
            if (step - stats.spacing).abs() > 1e-9 * stats.spacing.abs().max(1.0) {
                stats.uniform = false;
            }
            stats.last = b;
        }
        previous = values.last().copied();
    }
    Ok(stats)
}

/// Run every pre-write check over the object graph and its backing data.
pub(crate) fn validate<S>(file: &LogicalFile, source: &S, policy: CompatPolicy) -> Result<()>
where
    S: DataSource + ?Sized,
{
    ensure!(!file.origins.is_empty(), NoOriginSnafu);

    // naming, re-checked at write time since the structs are open
    for class in EflrClass::EMISSION_ORDER {
        for object in file.objects_of(class) {
            check_name(class.set_type(), object.name(), policy)?;
            if let Some(origin) = object.origin() {
                ensure!(
                    origin.0.index < file.origins.len(),
                    ForeignReferenceSnafu {
                        object: object.name(),
                    }
                );
            }
        }
    }

    for channel in &file.channels {
        let dimension = channel.effective_dimension();
        ensure!(
            dimension.len() == 1 && dimension[0] > 0,
            UnsupportedDimensionSnafu {
                channel: &channel.name,
            }
        );
        if !channel.element_limit.is_empty() {
            ensure!(
                channel.element_limit == dimension,
                ElementLimitMismatchSnafu {
                    channel: &channel.name,
                }
            );
        }
        for property in &channel.properties {
            if !PROPERTIES.contains(&property.as_str()) {
                check_enum(
                    policy,
                    "CHANNEL",
                    &channel.name,
                    "PROPERTIES",
                    property,
                )?;
            }
        }
        check_units(&channel.name, &channel.units, policy)?;
    }

    // frame-to-channel topology
    let mut claimed: Vec<Option<&str>> = vec![None; file.channels.len()];
    for frame in &file.frames {
        for handle in &frame.channels {
            let index = handle.0.index;
            ensure!(
                index < file.channels.len(),
                ForeignReferenceSnafu { object: &frame.name }
            );
            match claimed[index] {
                Some(first) => {
                    return ChannelInMultipleFramesSnafu {
                        channel: &file.channels[index].name,
                        first,
                        second: &frame.name,
                    }
                    .fail();
                }
                None => claimed[index] = Some(&frame.name),
            }
        }
        if let Some(index_type) = &frame.index_type {
            if !INDEX_TYPES.contains(&index_type.as_str()) {
                match policy {
                    CompatPolicy::Standard => {
                        warn!(frame = %frame.name, %index_type, "non-standard index type");
                    }
                    CompatPolicy::HighCompatibility => {
                        return NonStandardIndexTypeSnafu {
                            frame: &frame.name,
                            index_type,
                        }
                        .fail();
                    }
                }
            }
            if let Some(first) = frame.channels.first() {
                let channel = &file.channels[first.0.index];
                ensure!(
                    channel.width() == 1,
                    IndexNotScalarSnafu {
                        frame: &frame.name,
                        channel: &channel.name,
                    }
                );
            }
        }
        if frame.channels.is_empty() {
            warn!(frame = %frame.name, "frame references no channels");
        }
        check_units(&frame.name, &frame.index_units, policy)?;
    }
    for (channel, claim) in file.channels.iter().zip(&claimed) {
        if claim.is_none() {
            warn!(channel = %channel.name, "freelance channel: no frame references it");
        }
    }

    // per-frame data shape
    for frame in &file.frames {
        let mut expected_rows = None;
        for handle in &frame.channels {
            let channel = &file.channels[handle.0.index];
            let key = channel.effective_dataset_key();
            let (rows, width) = source.shape(key).ok_or_else(|| Error::Data {
                source: source::MissingDatasetSnafu { key }.build(),
            })?;
            ensure!(
                width == channel.width(),
                WidthMismatchSnafu {
                    channel: &channel.name,
                    key,
                    declared: channel.width(),
                    actual: width,
                }
            );
            match expected_rows {
                None => expected_rows = Some(rows),
                Some(expected) => ensure!(
                    rows == expected,
                    RowCountMismatchSnafu {
                        frame: &frame.name,
                        channel: &channel.name,
                        expected,
                        actual: rows,
                    }
                ),
            }
            if let Some(code) = channel.representation_code {
                let float_data = source
                    .read_rows(key, 0..usize::from(rows > 0))
                    .map(|c| c.array().is_float())
                    .unwrap_or(false);
                ensure!(
                    !(code.is_integer() && float_data),
                    CodeKindMismatchSnafu {
                        channel: &channel.name,
                    }
                );
            }
        }
        // index shape findings are advisory
        if frame.index_type.is_some() {
            if let Some(handle) = frame.channels.first() {
                let channel = &file.channels[handle.0.index];
                let key = channel.effective_dataset_key();
                if let Some((rows, 1)) = source.shape(key) {
                    if let Some(stats) = index_stats(source, key, rows).map_err(|source| {
                        Error::Data { source }
                    })? {
                        if !stats.monotonic {
                            warn!(frame = %frame.name, "index channel is not monotonic");
                        }
                        if !stats.uniform {
                            warn!(frame = %frame.name, "index channel is not evenly spaced");
                        }
                    }
                }
            }
        }
    }

    // zones
    for zone in &file.zones {
        let domain = zone.domain.as_deref().unwrap_or("BOREHOLE-DEPTH");
        ensure!(
            ZONE_DOMAINS.contains(&domain),
            UnknownZoneDomainSnafu {
                zone: &zone.name,
                domain,
            }
        );
        let time_domain = domain == "TIME";
        for bound in [zone.minimum.as_ref(), zone.maximum.as_ref()]
            .into_iter()
            .flatten()
        {
            let ok = match bound {
                dlis_core::Value::DateTime(_) => time_domain,
                dlis_core::Value::Int(_) | dlis_core::Value::Float(_) => true,
                _ => false,
            };
            ensure!(
                ok,
                BadZoneBoundsSnafu {
                    zone: &zone.name,
                    domain,
                }
            );
        }
        if let (Some(min), Some(max)) = (&zone.minimum, &zone.maximum) {
            if let (Some(min), Some(max)) = (min.first_f64(), max.first_f64()) {
                ensure!(
                    min <= max,
                    BadZoneBoundsSnafu {
                        zone: &zone.name,
                        domain,
                    }
                );
            }
        }
        check_units(&zone.name, &zone.units, policy)?;
    }

    // enum-bound attributes
    for process in &file.processes {
        if let Some(status) = &process.status {
            if !PROCESS_STATUSES.contains(&status.as_str()) {
                return BadEnumValueSnafu {
                    object: "PROCESS",
                    name: &process.name,
                    label: "STATUS",
                    value: status,
                }
                .fail();
            }
        }
    }
    for measurement in &file.calibration_measurements {
        if let Some(phase) = &measurement.phase {
            if !MEASUREMENT_PHASES.contains(&phase.as_str()) {
                return BadEnumValueSnafu {
                    object: "CALIBRATION-MEASUREMENT",
                    name: &measurement.name,
                    label: "PHASE",
                    value: phase,
                }
                .fail();
            }
        }
    }

    for computation in &file.computations {
        if !computation.values.is_empty() && !computation.zones.is_empty() {
            ensure!(
                computation.values.len() == computation.zones.len(),
                ValuesZonesMismatchSnafu {
                    computation: &computation.name,
                    values: computation.values.len(),
                    zones: computation.zones.len(),
                }
            );
        }
        check_units(&computation.name, &computation.units, policy)?;
    }
    for parameter in &file.parameters {
        check_units(&parameter.name, &parameter.units, policy)?;
    }

    Ok(())
}

fn check_enum(
    policy: CompatPolicy,
    object: &'static str,
    name: &str,
    label: &'static str,
    value: &str,
) -> Result<()> {
    match policy {
        CompatPolicy::Standard => {
            warn!(object, name, label, value, "non-standard enum value");
            Ok(())
        }
        CompatPolicy::HighCompatibility => BadEnumValueSnafu {
            object,
            name,
            label,
            value,
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rules_per_policy() {
        assert!(check_name("CHANNEL", "DEPTH", CompatPolicy::Standard).is_ok());
        assert!(check_name("CHANNEL", "has space", CompatPolicy::Standard).is_ok());
        assert!(check_name("CHANNEL", "DEPTH-1_A", CompatPolicy::HighCompatibility).is_ok());
        assert!(matches!(
            check_name("CHANNEL", "Depth", CompatPolicy::HighCompatibility),
            Err(Error::NameNotUppercase { .. })
        ));
        assert!(matches!(
            check_name("CHANNEL", "HAS SPACE", CompatPolicy::HighCompatibility),
            Err(Error::BadName { .. })
        ));
    }

    #[test]
    fn index_stats_detects_shape() {
        let mut source = crate::source::MemorySource::new();
        source.insert("EVEN", vec![0.0_f64, 1.0, 2.0, 3.0]);
        source.insert("ROUGH", vec![0.0_f64, 1.0, 1.5, 4.0]);
        source.insert("BACK", vec![3.0_f64, 2.0, 1.0]);
        source.insert("WOBBLE", vec![0.0_f64, 2.0, 1.0]);

        let stats = index_stats(&source, "EVEN", 4).unwrap().unwrap();
        assert!(stats.monotonic && stats.uniform);
        assert_eq!((stats.first, stats.last, stats.spacing), (0.0, 3.0, 1.0));

        let stats = index_stats(&source, "ROUGH", 4).unwrap().unwrap();
        assert!(stats.monotonic);
        assert!(!stats.uniform);

        let stats = index_stats(&source, "BACK", 3).unwrap().unwrap();
        assert!(stats.monotonic && stats.uniform);
        assert_eq!(stats.spacing, -1.0);

        let stats = index_stats(&source, "WOBBLE", 3).unwrap().unwrap();
        assert!(!stats.monotonic);

        assert!(index_stats(&source, "EVEN", 1).unwrap().is_none());
    }
}
