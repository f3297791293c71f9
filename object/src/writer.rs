//! The write orchestrator: a single pass driving validation, identity
//! assignment and the record pipeline from the storage unit label down to
//! the last no-format blob.
//!
//! The pipeline is a pull loop. One row chunk is fetched from the source,
//! pushed through segmentation and visible-record packing, and only then is
//! the next chunk fetched, so peak memory is bounded by the chunk sizes.

use crate::attribute::{AttrKind, Attribute};
use crate::eflr::{self, EflrItem, EflrSet};
use crate::frame_data::{self, ChannelPlan, FramePlan};
use crate::schema::{BuildError, EflrClass, Frame, Resolver};
use crate::source::{self, ChunkCursor, DataSource};
use crate::validate::{self, index_stats};
use crate::{
    CancelToken, CompatPolicy, LogicalFile, Measure, ObjectHandle, WriteOptions, WriteSummary,
};
use dlis_core::ObName;
use dlis_encoding::encode;
use dlis_encoding::segment::{self, LogicalRecord, Segmenter};
use dlis_encoding::sul;
use dlis_encoding::visible::{self, VisibleRecordWriter};
use snafu::{ensure, Backtrace, ResultExt, Snafu};
use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

/// The fixed total length of the file header record, wrapping included.
const FILE_HEADER_RECORD_LENGTH: usize = 124;

/// The number of bytes one input chunk aims for.
const TARGET_CHUNK_BYTES: usize = 4 << 20;

/// Module-level error type:
/// for everything that can go wrong while writing a logical file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
#[non_exhaustive]
pub enum WriteError {
    /// The object graph failed pre-write validation.
    #[snafu(display("The logical file failed validation"))]
    Validate {
        /// The underlying validation error.
        #[snafu(backtrace)]
        source: validate::Error,
    },

    /// The storage unit label could not be rendered.
    #[snafu(display("The storage unit label was rejected"))]
    Label {
        /// The underlying label error.
        #[snafu(backtrace)]
        source: sul::Error,
    },

    /// The file header does not fit ten digits and 65 characters.
    #[snafu(display("File header identifier of {} characters exceeds 65", length))]
    IdentifierTooLong {
        /// The offending identifier length.
        length: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A record could not be split into segments.
    #[snafu(display("Segmentation failed"))]
    Segment {
        /// The underlying segmentation error.
        #[snafu(backtrace)]
        source: segment::Error,
    },

    /// A segment could not be packed or flushed.
    #[snafu(display("Visible record packing failed"))]
    Pack {
        /// The underlying packing error.
        #[snafu(backtrace)]
        source: visible::Error,
    },

    /// An object could not be turned into an attribute row.
    #[snafu(display("Could not build an object row"))]
    Build {
        /// The underlying build error.
        #[snafu(backtrace)]
        source: BuildError,
    },

    /// A set could not be assembled into a record.
    #[snafu(display("Could not assemble an explicitly formatted record"))]
    Assemble {
        /// The underlying assembly error.
        #[snafu(backtrace)]
        source: eflr::Error,
    },

    /// Frame data could not be encoded.
    #[snafu(display("Could not encode frame data"))]
    Encode {
        /// The underlying encoding error.
        #[snafu(backtrace)]
        source: encode::Error,
    },

    /// The source cursor failed mid-stream.
    #[snafu(display("Could not read source data"))]
    Data {
        /// The underlying source error.
        #[snafu(backtrace)]
        source: source::Error,
    },

    /// A referenced channel ended up with no representation code.
    #[snafu(display("Channel {} carries no representation code", channel))]
    NoRepresentationCode {
        /// The offending channel name.
        channel: String,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The write was cancelled through its token.
    #[snafu(display("The write was cancelled"))]
    Cancelled {
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// The destination file could not be created.
    #[snafu(display("Could not create {}", path.display()))]
    CreateFile {
        /// The destination path.
        path: std::path::PathBuf,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Type alias for a result of the write pass.
pub type Result<T, E = WriteError> = std::result::Result<T, E>;

/// Write the whole logical file to the sink in one pass.
pub(crate) fn write_to<W, S>(
    original: &LogicalFile,
    sink: W,
    source: &S,
    options: &WriteOptions,
) -> Result<WriteSummary>
where
    W: Write,
    S: DataSource + ?Sized,
{
    // work on a filled-in copy so the caller's graph stays untouched
    let mut file = original.clone();
    prepare(&mut file, source);
    validate::validate(&file, source, file.policy).context(ValidateSnafu)?;
    let resolver = Resolver::new(assign_identities(&file));

    let segmenter = Segmenter::new(file.sul.max_record_length).context(SegmentSnafu)?;
    let mut writer =
        VisibleRecordWriter::new(sink, file.sul.max_record_length, options.output_chunk_size)
            .context(PackSnafu)?;

    let label = file.sul.to_bytes().context(LabelSnafu)?;
    writer.write_raw(&label).context(PackSnafu)?;
    let mut records: u64 = 0;

    // the file header gets a visible record of its own, 124 bytes exactly
    let record = file_header_record(&file)?;
    let segment = segmenter
        .single_padded(&record, FILE_HEADER_RECORD_LENGTH)
        .context(SegmentSnafu)?;
    writer.push_segment(&segment).context(PackSnafu)?;
    writer.break_record().context(PackSnafu)?;
    records += 1;

    for class in EflrClass::EMISSION_ORDER {
        if class == EflrClass::FileHeader {
            continue;
        }
        let objects = file.objects_of(class);
        if objects.is_empty() {
            continue;
        }
        live(&options.cancel)?;
        let mut set = EflrSet::new(class.set_type(), class.record_type(), None);
        for (index, object) in objects.iter().enumerate() {
            let mut item = object.build(&resolver).context(BuildSnafu)?;
            let obname = resolver
                .obname(ObjectHandle { class, index })
                .context(BuildSnafu)?;
            item.set_identity(obname.origin, obname.copy);
            set.push(item);
        }
        let record = set.to_record().context(AssembleSnafu)?;
        push_record(&mut writer, &segmenter, &record, &options.cancel)?;
        records += 1;
        debug!(
            set_type = class.set_type(),
            items = objects.len(),
            "emitted metadata set"
        );
    }

    let mut frame_rows: u64 = 0;
    for (index, frame) in file.frames.iter().enumerate() {
        let handle = ObjectHandle {
            class: EflrClass::Frame,
            index,
        };
        let plan = frame_plan(&file, source, frame, handle, &resolver)?;
        let chunk_rows = options
            .input_chunk_size
            .unwrap_or_else(|| auto_chunk_rows(plan.row_bytes()));
        let mut frame_number: u32 = 0;
        for chunk in ChunkCursor::new(source, plan.keys(), plan.rows, chunk_rows) {
            live(&options.cancel)?;
            let chunk = chunk.context(DataSnafu)?;
            for row in 0..chunk.rows {
                frame_number += 1;
                let record =
                    frame_data::row_record(&plan, &chunk, row, frame_number).context(EncodeSnafu)?;
                push_record(&mut writer, &segmenter, &record, &options.cancel)?;
                records += 1;
            }
            debug!(frame = %frame.name, rows = chunk.rows, "emitted frame chunk");
        }
        frame_rows += u64::from(frame_number);
    }

    for (index, no_format) in file.no_formats.iter().enumerate() {
        live(&options.cancel)?;
        let obname = resolver
            .obname(ObjectHandle {
                class: EflrClass::NoFormat,
                index,
            })
            .context(BuildSnafu)?;
        let record =
            frame_data::noformat_record(&obname, &no_format.data).context(EncodeSnafu)?;
        push_record(&mut writer, &segmenter, &record, &options.cancel)?;
        records += 1;
    }

    let (_, bytes_written) = writer.finish().context(PackSnafu)?;
    Ok(WriteSummary {
        bytes_written,
        logical_records: records,
        frame_rows,
    })
}

/// Fill in the fields the user left open: origin references, channel codes
/// and shapes, and the observable index properties of each frame.
///
/// Anything that cannot be resolved is left as-is for validation to report.
fn prepare<S>(file: &mut LogicalFile, source: &S)
where
    S: DataSource + ?Sized,
{
    let auto_numbers = file.policy == CompatPolicy::HighCompatibility;
    for (index, origin) in file.origins.iter_mut().enumerate() {
        let auto = index as u32 + 1;
        if auto_numbers || origin.file_set_number.is_none() {
            origin.file_set_number = Some(auto);
        }
    }

    for channel in &mut file.channels {
        if channel.dimension.is_empty() {
            channel.dimension = vec![1];
        }
        if channel.element_limit.is_empty() {
            channel.element_limit = channel.dimension.clone();
        }
        if channel.representation_code.is_none() {
            let key = channel.dataset_key.as_deref().unwrap_or(&channel.name);
            if source.shape(key).is_some() {
                if let Ok(column) = source.read_rows(key, 0..0) {
                    channel.representation_code = Some(column.array().natural_code());
                }
            }
        }
    }

    let LogicalFile {
        frames, channels, ..
    } = file;
    for frame in frames.iter_mut() {
        if frame.index_type.is_none() || frame.channels.is_empty() {
            continue;
        }
        let index = frame.channels[0].0.index;
        let Some(channel) = channels.get(index) else { continue };
        let key = channel.effective_dataset_key();
        let Some((rows, 1)) = source.shape(key) else { continue };
        let Ok(Some(stats)) = index_stats(source, key, rows) else { continue };
        if frame.direction.is_none() && stats.monotonic {
            frame.direction = Some(
                if stats.spacing > 0.0 {
                    "INCREASING"
                } else {
                    "DECREASING"
                }
                .to_owned(),
            );
        }
        if frame.spacing.is_none() && stats.monotonic && stats.uniform {
            frame.spacing = Some(Measure {
                value: stats.spacing,
                units: frame.index_units.clone(),
            });
        }
        if frame.index_min.is_none() {
            frame.index_min = Some(stats.first.min(stats.last));
        }
        if frame.index_max.is_none() {
            frame.index_max = Some(stats.first.max(stats.last));
        }
    }
}

/// Assign every object its wire identity: the origin reference of its
/// owning origin and a deterministic copy number, first seen within one
/// `(origin, name, set type)` triple getting 0.
fn assign_identities(file: &LogicalFile) -> BTreeMap<ObjectHandle, ObName> {
    let defining = file.origins[0].file_set_number.unwrap_or(1);
    let mut counters: BTreeMap<(u32, String, &'static str), u8> = BTreeMap::new();
    let mut identities = BTreeMap::new();
    for class in EflrClass::EMISSION_ORDER {
        for (index, object) in file.objects_of(class).iter().enumerate() {
            let origin = if class == EflrClass::Origin {
                file.origins[index].file_set_number.unwrap_or(defining)
            } else {
                match object.origin() {
                    Some(r) => file.origins[r.0.index].file_set_number.unwrap_or(defining),
                    None => defining,
                }
            };
            let key = (origin, object.name().to_owned(), object.class().set_type());
            let copy = counters.entry(key).or_insert(0);
            identities.insert(
                ObjectHandle { class, index },
                ObName::new(origin, *copy, object.name()),
            );
            *copy = copy.saturating_add(1);
        }
    }
    identities
}

fn file_header_record(file: &LogicalFile) -> Result<LogicalRecord> {
    ensure!(
        file.file_header.identifier.len() <= 65,
        IdentifierTooLongSnafu {
            length: file.file_header.identifier.len(),
        }
    );
    let sequence = file.file_header.sequence_number.to_string();
    let mut item = EflrItem::new(
        &sequence,
        vec![
            Attribute::new("SEQUENCE-NUMBER", AttrKind::Text),
            Attribute::new("ID", AttrKind::Text),
        ],
    );
    item.set("SEQUENCE-NUMBER", sequence.as_str())
        .context(AssembleSnafu)?;
    item.set("ID", file.file_header.identifier.as_str())
        .context(AssembleSnafu)?;
    item.set_identity(file.origins[0].file_set_number.unwrap_or(1), 0);

    let class = EflrClass::FileHeader;
    let mut set = EflrSet::new(class.set_type(), class.record_type(), None);
    set.push(item);
    set.to_record().context(AssembleSnafu)
}

fn frame_plan<S>(
    file: &LogicalFile,
    source: &S,
    frame: &Frame,
    handle: ObjectHandle,
    resolver: &Resolver,
) -> Result<FramePlan>
where
    S: DataSource + ?Sized,
{
    let obname = resolver.obname(handle).context(BuildSnafu)?;
    let mut channels = Vec::with_capacity(frame.channels.len());
    let mut rows = 0;
    for channel_ref in &frame.channels {
        let channel = &file.channels[channel_ref.0.index];
        let code = channel.representation_code.ok_or_else(|| {
            NoRepresentationCodeSnafu {
                channel: &channel.name,
            }
            .build()
        })?;
        let key = channel.effective_dataset_key().to_owned();
        rows = source.shape(&key).map_or(rows, |(r, _)| r);
        channels.push(ChannelPlan {
            key,
            code,
            width: channel.width(),
        });
    }
    Ok(FramePlan {
        obname,
        channels,
        rows,
    })
}

fn push_record<W: Write>(
    writer: &mut VisibleRecordWriter<W>,
    segmenter: &Segmenter,
    record: &LogicalRecord,
    cancel: &CancelToken,
) -> Result<()> {
    for segment in segmenter.split(record) {
        live(cancel)?;
        writer.push_segment(&segment).context(PackSnafu)?;
    }
    Ok(())
}

fn live(cancel: &CancelToken) -> Result<()> {
    ensure!(!cancel.is_cancelled(), CancelledSnafu);
    Ok(())
}

fn auto_chunk_rows(row_bytes: usize) -> usize {
    (TARGET_CHUNK_BYTES / row_bytes.max(1)).clamp(1, 1 << 20)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_rows_scale_with_row_width() {
        assert_eq!(auto_chunk_rows(0), 1 << 20);
        assert_eq!(auto_chunk_rows(4 << 20), 1);
        assert_eq!(auto_chunk_rows(1 << 20), 4);
        assert_eq!(auto_chunk_rows(16), (4 << 20) / 16);
    }
}
