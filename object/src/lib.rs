#![crate_type = "lib"]
#![deny(unsafe_code, unstable_features)]
#![warn(
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    unused_import_braces
)]

//! This crate provides a high-level abstraction for building and writing
//! DLIS (RP66 v1) logical files.
//!
//! A [`LogicalFile`] holds the user-built object graph: one or more origins,
//! the channels and frames describing the bulk data, and any further
//! metadata objects. Bulk data itself stays outside the graph, behind the
//! [`DataSource`] seam, and is streamed through the writer in bounded
//! chunks.
//!
//! # Example
//!
//! ```
//! use dlis_object::{Channel, Frame, LogicalFile, MemorySource, Origin,
//!                   StorageUnitLabel, WriteOptions};
//!
//! let mut file = LogicalFile::new(
//!     StorageUnitLabel::new("EXAMPLE STORAGE SET"),
//!     Default::default(),
//! );
//! file.add_origin(Origin::new("MY-ORIGIN"))?;
//! let depth = file.add_channel(Channel::new("DEPTH"))?;
//! let rpm = file.add_channel(Channel::new("RPM"))?;
//!
//! let mut frame = Frame::new("MAIN");
//! frame.channels = vec![depth, rpm];
//! frame.index_type = Some("BOREHOLE-DEPTH".into());
//! file.add_frame(frame)?;
//!
//! let mut source = MemorySource::new();
//! source.insert("DEPTH", vec![0.0_f64, 0.5, 1.0]);
//! source.insert("RPM", vec![7.5_f64, 7.6, 7.7]);
//!
//! let mut out = vec![];
//! let summary = file.write(&mut out, &source, &WriteOptions::default())?;
//! assert_eq!(summary.frame_rows, 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod attribute;
mod component;
pub mod eflr;
mod frame_data;
pub mod schema;
pub mod source;
pub mod validate;
pub mod writer;

pub use crate::attribute::{AttrKind, Attribute};
pub use crate::eflr::{EflrItem, EflrSet};
pub use crate::schema::{
    Axis, Calibration, CalibrationCoefficient, CalibrationMeasurement, Channel, Comment,
    Computation, EflrClass, Equipment, Frame, Group, LongName, Measure, Message, NoFormat,
    NoFormatData, Origin, Parameter, Path, Process, Splice, TextOrRef, Tool,
    WellReferencePoint, Zone,
};
pub use crate::source::{Column, ColumnArray, DataSource, MemorySource};
pub use crate::validate::Error as ValidationError;
pub use crate::writer::WriteError;
pub use dlis_core::value::InferencePolicy;
pub use dlis_core::{AttRef, ObName, ObjRef, RepCode, Value};
pub use dlis_encoding::visible::DEFAULT_OUTPUT_CHUNK_SIZE;
pub use dlis_encoding::StorageUnitLabel;

use snafu::ResultExt;
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The validation policy in force while registering objects and writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompatPolicy {
    /// The rules of the standard; findings beyond them are warnings.
    #[default]
    Standard,
    /// Stricter rules for maximum reader compatibility: uppercase names,
    /// standard units and index types only, automatic file set numbers.
    HighCompatibility,
}

/// A cooperatively checked cancellation token.
///
/// The writer checks the token between row chunks and between visible
/// record flushes; on cancellation it stops promptly, leaving a possibly
/// truncated sink behind.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create an inert token.
    pub fn new() -> Self {
        CancelToken::default()
    }

    /// Request cancellation of any write holding this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A typed handle to an object in a [`LogicalFile`] arena.
///
/// Handles are only meaningful for the file that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle {
    pub(crate) class: EflrClass,
    pub(crate) index: usize,
}

impl ObjectHandle {
    /// The class of the referenced object.
    pub fn class(self) -> EflrClass {
        self.class
    }
}

/// A utility macro declaring one typed handle per object class.
macro_rules! typed_refs {
    ($($(#[$m:meta])* $name:ident => $class:ident,)*) => {
        $(
            $(#[$m])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub struct $name(pub(crate) ObjectHandle);

            impl From<$name> for ObjectHandle {
                fn from(r: $name) -> ObjectHandle {
                    r.0
                }
            }
        )*
    };
}

typed_refs! {
    /// A handle to an [`Origin`].
    OriginRef => Origin,
    /// A handle to a [`WellReferencePoint`].
    WellReferencePointRef => WellReferencePoint,
    /// A handle to an [`Axis`].
    AxisRef => Axis,
    /// A handle to a [`LongName`].
    LongNameRef => LongName,
    /// A handle to a [`Channel`].
    ChannelRef => Channel,
    /// A handle to a [`Frame`].
    FrameRef => Frame,
    /// A handle to a [`Path`].
    PathRef => Path,
    /// A handle to a [`Zone`].
    ZoneRef => Zone,
    /// A handle to a [`Parameter`].
    ParameterRef => Parameter,
    /// A handle to an [`Equipment`].
    EquipmentRef => Equipment,
    /// A handle to a [`Tool`].
    ToolRef => Tool,
    /// A handle to a [`CalibrationCoefficient`].
    CalibrationCoefficientRef => CalibrationCoefficient,
    /// A handle to a [`CalibrationMeasurement`].
    CalibrationMeasurementRef => CalibrationMeasurement,
    /// A handle to a [`Calibration`].
    CalibrationRef => Calibration,
    /// A handle to a [`Computation`].
    ComputationRef => Computation,
    /// A handle to a [`Process`].
    ProcessRef => Process,
    /// A handle to a [`Splice`].
    SpliceRef => Splice,
    /// A handle to a [`Group`].
    GroupRef => Group,
    /// A handle to a [`Message`].
    MessageRef => Message,
    /// A handle to a [`Comment`].
    CommentRef => Comment,
    /// A handle to a [`NoFormat`].
    NoFormatRef => NoFormat,
}

/// The two user-set fields of the file header record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeaderOptions {
    /// The file sequence number within its set, rendered in ASCII.
    pub sequence_number: u32,
    /// The file identifier, at most 65 ASCII characters.
    pub identifier: String,
}

impl Default for FileHeaderOptions {
    fn default() -> Self {
        FileHeaderOptions {
            sequence_number: 1,
            identifier: String::from("DEFAULT FILE HEADER"),
        }
    }
}

/// Tuning knobs of one write pass.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// The number of rows pulled per source chunk.
    /// Defaults to roughly four mebibytes worth of rows.
    pub input_chunk_size: Option<usize>,
    /// The output buffer size in bytes; flushing happens at visible-record
    /// granularity. Zero falls back to the default of two mebibytes.
    pub output_chunk_size: usize,
    /// The cancellation token checked throughout the pass.
    pub cancel: CancelToken,
}

impl WriteOptions {
    fn effective_output_chunk(&self) -> usize {
        if self.output_chunk_size == 0 {
            DEFAULT_OUTPUT_CHUNK_SIZE
        } else {
            self.output_chunk_size
        }
    }
}

/// What one write pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// Total bytes emitted, storage unit label included.
    pub bytes_written: u64,
    /// The number of logical records emitted.
    pub logical_records: u64,
    /// The number of frame-data rows emitted across all frames.
    pub frame_rows: u64,
}

/// A user-built description of one DLIS logical file, ready to be written.
///
/// Objects are registered through the `add_*` methods, which hand back
/// typed handles for cross-referencing. The graph is immutable in substance
/// once [`write`](LogicalFile::write) begins; writing borrows the file
/// immutably and may be repeated.
#[derive(Debug, Clone)]
pub struct LogicalFile {
    pub(crate) sul: StorageUnitLabel,
    pub(crate) file_header: FileHeaderOptions,
    pub(crate) policy: CompatPolicy,
    pub(crate) origins: Vec<Origin>,
    pub(crate) well_reference_points: Vec<WellReferencePoint>,
    pub(crate) axes: Vec<Axis>,
    pub(crate) long_names: Vec<LongName>,
    pub(crate) channels: Vec<Channel>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) paths: Vec<Path>,
    pub(crate) zones: Vec<Zone>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) equipment: Vec<Equipment>,
    pub(crate) tools: Vec<Tool>,
    pub(crate) calibration_coefficients: Vec<CalibrationCoefficient>,
    pub(crate) calibration_measurements: Vec<CalibrationMeasurement>,
    pub(crate) calibrations: Vec<Calibration>,
    pub(crate) computations: Vec<Computation>,
    pub(crate) processes: Vec<Process>,
    pub(crate) splices: Vec<Splice>,
    pub(crate) groups: Vec<Group>,
    pub(crate) messages: Vec<Message>,
    pub(crate) comments: Vec<Comment>,
    pub(crate) no_formats: Vec<NoFormat>,
}

/// A utility macro declaring one registration method per object class.
macro_rules! add_methods {
    ($($(#[$m:meta])* $fn_name:ident($ty:ident) -> $refty:ident in $field:ident as $class:ident,)*) => {
        $(
            $(#[$m])*
            pub fn $fn_name(&mut self, object: $ty) -> Result<$refty, ValidationError> {
                validate::check_name(EflrClass::$class.set_type(), &object.name, self.policy)?;
                self.$field.push(object);
                Ok($refty(ObjectHandle {
                    class: EflrClass::$class,
                    index: self.$field.len() - 1,
                }))
            }
        )*
    };
}

impl LogicalFile {
    /// Create an empty logical file with the given prelude options.
    pub fn new(sul: StorageUnitLabel, file_header: FileHeaderOptions) -> Self {
        LogicalFile {
            sul,
            file_header,
            policy: CompatPolicy::default(),
            origins: Vec::new(),
            well_reference_points: Vec::new(),
            axes: Vec::new(),
            long_names: Vec::new(),
            channels: Vec::new(),
            frames: Vec::new(),
            paths: Vec::new(),
            zones: Vec::new(),
            parameters: Vec::new(),
            equipment: Vec::new(),
            tools: Vec::new(),
            calibration_coefficients: Vec::new(),
            calibration_measurements: Vec::new(),
            calibrations: Vec::new(),
            computations: Vec::new(),
            processes: Vec::new(),
            splices: Vec::new(),
            groups: Vec::new(),
            messages: Vec::new(),
            comments: Vec::new(),
            no_formats: Vec::new(),
        }
    }

    /// The validation policy currently in force.
    pub fn policy(&self) -> CompatPolicy {
        self.policy
    }

    /// Enter high-compatibility mode for the lifetime of the guard.
    ///
    /// While the guard lives, registration and writing apply the stricter
    /// rule set; dropping the guard restores the standard policy.
    pub fn high_compatibility(&mut self) -> HighCompatibilityGuard<'_> {
        self.policy = CompatPolicy::HighCompatibility;
        HighCompatibilityGuard { file: self }
    }

    add_methods! {
        /// Register an origin; the first one becomes the defining origin.
        add_origin(Origin) -> OriginRef in origins as Origin,
        /// Register a well reference point.
        add_well_reference_point(WellReferencePoint) -> WellReferencePointRef
            in well_reference_points as WellReferencePoint,
        /// Register an axis.
        add_axis(Axis) -> AxisRef in axes as Axis,
        /// Register a long name.
        add_long_name(LongName) -> LongNameRef in long_names as LongName,
        /// Register a channel.
        add_channel(Channel) -> ChannelRef in channels as Channel,
        /// Register a frame.
        add_frame(Frame) -> FrameRef in frames as Frame,
        /// Register a path.
        add_path(Path) -> PathRef in paths as Path,
        /// Register a zone.
        add_zone(Zone) -> ZoneRef in zones as Zone,
        /// Register a parameter.
        add_parameter(Parameter) -> ParameterRef in parameters as Parameter,
        /// Register a piece of equipment.
        add_equipment(Equipment) -> EquipmentRef in equipment as Equipment,
        /// Register a tool.
        add_tool(Tool) -> ToolRef in tools as Tool,
        /// Register a calibration coefficient set.
        add_calibration_coefficient(CalibrationCoefficient) -> CalibrationCoefficientRef
            in calibration_coefficients as CalibrationCoefficient,
        /// Register a calibration measurement.
        add_calibration_measurement(CalibrationMeasurement) -> CalibrationMeasurementRef
            in calibration_measurements as CalibrationMeasurement,
        /// Register a calibration.
        add_calibration(Calibration) -> CalibrationRef in calibrations as Calibration,
        /// Register a computation.
        add_computation(Computation) -> ComputationRef in computations as Computation,
        /// Register a process.
        add_process(Process) -> ProcessRef in processes as Process,
        /// Register a splice.
        add_splice(Splice) -> SpliceRef in splices as Splice,
        /// Register a group.
        add_group(Group) -> GroupRef in groups as Group,
        /// Register a message.
        add_message(Message) -> MessageRef in messages as Message,
        /// Register a comment.
        add_comment(Comment) -> CommentRef in comments as Comment,
        /// Register a no-format blob.
        add_no_format(NoFormat) -> NoFormatRef in no_formats as NoFormat,
    }

    /// Write the logical file to the given sink in a single pass.
    pub fn write<W, S>(
        &self,
        sink: W,
        source: &S,
        options: &WriteOptions,
    ) -> Result<WriteSummary, WriteError>
    where
        W: Write,
        S: DataSource + ?Sized,
    {
        let mut options = options.clone();
        options.output_chunk_size = options.effective_output_chunk();
        writer::write_to(self, sink, source, &options)
    }

    /// Write the logical file to a fresh file at the given path.
    ///
    /// On failure the destination may hold a truncated stream; writing to a
    /// temporary path and renaming on success is the caller's durability
    /// strategy of choice.
    pub fn write_file<P, S>(
        &self,
        path: P,
        source: &S,
        options: &WriteOptions,
    ) -> Result<WriteSummary, WriteError>
    where
        P: AsRef<std::path::Path>,
        S: DataSource + ?Sized,
    {
        let path = path.as_ref();
        let sink = std::fs::File::create(path).context(writer::CreateFileSnafu { path })?;
        self.write(BufWriter::new(sink), source, options)
    }

    pub(crate) fn objects_of(&self, class: EflrClass) -> Vec<&dyn schema::EflrObject> {
        fn all<T: schema::EflrObject>(items: &[T]) -> Vec<&dyn schema::EflrObject> {
            items.iter().map(|i| i as &dyn schema::EflrObject).collect()
        }
        match class {
            EflrClass::FileHeader => Vec::new(),
            EflrClass::Origin => all(&self.origins),
            EflrClass::WellReferencePoint => all(&self.well_reference_points),
            EflrClass::Axis => all(&self.axes),
            EflrClass::LongName => all(&self.long_names),
            EflrClass::Channel => all(&self.channels),
            EflrClass::Frame => all(&self.frames),
            EflrClass::Path => all(&self.paths),
            EflrClass::Zone => all(&self.zones),
            EflrClass::Parameter => all(&self.parameters),
            EflrClass::Equipment => all(&self.equipment),
            EflrClass::Tool => all(&self.tools),
            EflrClass::CalibrationCoefficient => all(&self.calibration_coefficients),
            EflrClass::CalibrationMeasurement => all(&self.calibration_measurements),
            EflrClass::Calibration => all(&self.calibrations),
            EflrClass::Computation => all(&self.computations),
            EflrClass::Process => all(&self.processes),
            EflrClass::Splice => all(&self.splices),
            EflrClass::Group => all(&self.groups),
            EflrClass::Message => all(&self.messages),
            EflrClass::Comment => all(&self.comments),
            EflrClass::NoFormat => all(&self.no_formats),
        }
    }
}

/// Scoped entry into high-compatibility mode.
///
/// Dereferences to the [`LogicalFile`]; dropping it restores the standard
/// policy on every exit path.
#[derive(Debug)]
pub struct HighCompatibilityGuard<'a> {
    file: &'a mut LogicalFile,
}

impl std::ops::Deref for HighCompatibilityGuard<'_> {
    type Target = LogicalFile;

    fn deref(&self) -> &LogicalFile {
        self.file
    }
}

impl std::ops::DerefMut for HighCompatibilityGuard<'_> {
    fn deref_mut(&mut self) -> &mut LogicalFile {
        self.file
    }
}

impl Drop for HighCompatibilityGuard<'_> {
    fn drop(&mut self) {
        self.file.policy = CompatPolicy::Standard;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_index_their_arena() {
        let mut file = LogicalFile::new(StorageUnitLabel::default(), Default::default());
        file.add_origin(Origin::new("ORIG")).unwrap();
        let a = file.add_channel(Channel::new("A")).unwrap();
        let b = file.add_channel(Channel::new("B")).unwrap();
        assert_ne!(a, b);
        assert_eq!(ObjectHandle::from(b).index, 1);
        assert_eq!(ObjectHandle::from(b).class(), EflrClass::Channel);
    }

    #[test]
    fn high_compatibility_rejects_lowercase_names() {
        let mut file = LogicalFile::new(StorageUnitLabel::default(), Default::default());
        {
            let mut guard = file.high_compatibility();
            assert_eq!(guard.policy(), CompatPolicy::HighCompatibility);
            let err = guard.add_channel(Channel::new("Depth")).unwrap_err();
            assert!(matches!(err, ValidationError::NameNotUppercase { .. }));
            guard.add_channel(Channel::new("DEPTH")).unwrap();
        }
        // the guard restores the standard policy on drop
        assert_eq!(file.policy(), CompatPolicy::Standard);
        file.add_channel(Channel::new("Depth")).unwrap();
    }

    #[test]
    fn cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
