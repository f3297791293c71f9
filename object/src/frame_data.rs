//! Frame-data generation: one indirectly formatted record per frame row,
//! plus the no-format blobs.
//!
//! Rows are assembled by concatenating the channels' row slices in the
//! frame's declared order and re-encoding every element big-endian under
//! the channel's representation code; nothing relies on the host layout.

use crate::schema::NoFormatData;
use crate::source::{ColumnArray, RowChunk};
use dlis_core::{ObName, RepCode};
use dlis_encoding::encode::{self, basic, encode_float, encode_int, IntOutOfRangeSnafu};
use dlis_encoding::segment::{IflrType, LogicalRecord, RecordType};
use std::io::Write;
use std::ops::Range;

/// The per-channel slice of a frame plan: the code to encode under and the
/// number of elements per row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ChannelPlan {
    pub key: String,
    pub code: RepCode,
    pub width: usize,
}

/// Everything needed to turn source rows of one frame into records.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FramePlan {
    pub obname: ObName,
    pub channels: Vec<ChannelPlan>,
    pub rows: usize,
}

impl FramePlan {
    /// The dataset keys of the plan's channels, in frame order.
    pub(crate) fn keys(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.key.clone()).collect()
    }

    /// The encoded size of one row body, headers excluded.
    pub(crate) fn row_bytes(&self) -> usize {
        self.channels
            .iter()
            .map(|c| c.width * c.code.fixed_size().unwrap_or(8))
            .sum()
    }
}

/// Encode one row of a chunk as a frame-data record.
///
/// `frame_number` is one-based and strictly increasing within the frame.
pub(crate) fn row_record(
    plan: &FramePlan,
    chunk: &RowChunk,
    row: usize,
    frame_number: u32,
) -> encode::Result<LogicalRecord> {
    let mut body = Vec::with_capacity(16 + plan.row_bytes());
    basic::encode_obname(&mut body, &plan.obname)?;
    basic::encode_uvari(&mut body, frame_number)?;
    for (channel, column) in plan.channels.iter().zip(&chunk.columns) {
        let range = row * channel.width..(row + 1) * channel.width;
        encode_elements(&mut body, channel.code, column.array(), range)?;
    }
    Ok(LogicalRecord::new(
        RecordType::Iflr(IflrType::FrameData),
        body,
    ))
}

/// Encode a no-format blob as a single record.
pub(crate) fn noformat_record(
    obname: &ObName,
    data: &NoFormatData,
) -> encode::Result<LogicalRecord> {
    let mut body = vec![];
    basic::encode_obname(&mut body, obname)?;
    match data {
        NoFormatData::Bytes(bytes) => body.extend_from_slice(bytes),
        NoFormatData::Text(text) => {
            basic::encode_ascii(&mut body, text)?;
        }
    }
    Ok(LogicalRecord::new(
        RecordType::Iflr(IflrType::NoFormat),
        body,
    ))
}

fn encode_elements<W>(
    to: &mut W,
    code: RepCode,
    array: &ColumnArray,
    range: Range<usize>,
) -> encode::Result<()>
where
    W: Write,
{
    use ColumnArray::*;
    match array {
        I8(v) => encode_ints(to, code, v[range].iter().map(|x| i64::from(*x))),
        I16(v) => encode_ints(to, code, v[range].iter().map(|x| i64::from(*x))),
        I32(v) => encode_ints(to, code, v[range].iter().map(|x| i64::from(*x))),
        U8(v) => encode_ints(to, code, v[range].iter().map(|x| i64::from(*x))),
        U16(v) => encode_ints(to, code, v[range].iter().map(|x| i64::from(*x))),
        U32(v) => encode_ints(to, code, v[range].iter().map(|x| i64::from(*x))),
        F32(v) => encode_floats(to, code, v[range].iter().map(|x| f64::from(*x))),
        F64(v) => encode_floats(to, code, v[range].iter().copied()),
    }
}

fn encode_ints<W, I>(to: &mut W, code: RepCode, values: I) -> encode::Result<()>
where
    W: Write,
    I: Iterator<Item = i64>,
{
    for value in values {
        if code.is_float() {
            encode_float(&mut *to, code, value as f64)?;
        } else {
            encode_int(&mut *to, code, value)?;
        }
    }
    Ok(())
}

fn encode_floats<W, I>(to: &mut W, code: RepCode, values: I) -> encode::Result<()>
where
    W: Write,
    I: Iterator<Item = f64>,
{
    for value in values {
        if code.is_float() {
            encode_float(&mut *to, code, value)?;
        } else {
            // an integer code over float data only tolerates whole numbers
            let whole = num_traits::cast::<f64, i64>(value).filter(|_| value.fract() == 0.0);
            match whole {
                Some(value) => {
                    encode_int(&mut *to, code, value)?;
                }
                None => {
                    return IntOutOfRangeSnafu {
                        code,
                        value: value as i64,
                    }
                    .fail()
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Column;

    fn plan() -> FramePlan {
        FramePlan {
            obname: ObName::new(1, 0, "MAIN"),
            channels: vec![
                ChannelPlan {
                    key: "DEPTH".into(),
                    code: RepCode::Fdoubl,
                    width: 1,
                },
                ChannelPlan {
                    key: "RPM".into(),
                    code: RepCode::Fdoubl,
                    width: 1,
                },
            ],
            rows: 1,
        }
    }

    fn chunk() -> RowChunk {
        RowChunk {
            start: 0,
            rows: 1,
            columns: vec![
                Column::from(vec![0.0_f64]),
                Column::from(vec![7.5_f64]),
            ],
        }
    }

    #[test]
    fn row_body_layout() {
        let record = row_record(&plan(), &chunk(), 0, 1).unwrap();
        assert_eq!(record.record_type, RecordType::Iflr(IflrType::FrameData));
        let body = &record.body;
        // OBNAME 1.0.MAIN, frame number 1, two big-endian doubles
        assert_eq!(&body[..7], b"\x01\x00\x04MAIN");
        assert_eq!(body[7], 1);
        assert_eq!(&body[8..16], &[0; 8]);
        assert_eq!(&body[16..24], &[0x40, 0x1E, 0, 0, 0, 0, 0, 0]);
        assert_eq!(body.len(), 8 + plan().row_bytes());
    }

    #[test]
    fn row_bytes_matches_dimension_times_code_size() {
        let mut plan = plan();
        plan.channels[1] = ChannelPlan {
            key: "AMP".into(),
            code: RepCode::Fsingl,
            width: 5,
        };
        assert_eq!(plan.row_bytes(), 8 + 20);
    }

    #[test]
    fn integer_columns_under_float_codes() {
        let plan = FramePlan {
            obname: ObName::new(1, 0, "M"),
            channels: vec![ChannelPlan {
                key: "N".into(),
                code: RepCode::Fsingl,
                width: 1,
            }],
            rows: 1,
        };
        let chunk = RowChunk {
            start: 0,
            rows: 1,
            columns: vec![Column::from(vec![2_u16])],
        };
        let record = row_record(&plan, &chunk, 0, 1).unwrap();
        let tail = &record.body[record.body.len() - 4..];
        assert_eq!(tail, &[0x40, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn fractional_floats_under_integer_codes_fail() {
        let plan = FramePlan {
            obname: ObName::new(1, 0, "M"),
            channels: vec![ChannelPlan {
                key: "N".into(),
                code: RepCode::Slong,
                width: 1,
            }],
            rows: 1,
        };
        let chunk = RowChunk {
            start: 0,
            rows: 1,
            columns: vec![Column::from(vec![1.5_f64])],
        };
        assert!(row_record(&plan, &chunk, 0, 1).is_err());
    }

    #[test]
    fn noformat_text_is_ascii_encoded() {
        let record = noformat_record(
            &ObName::new(1, 0, "NOTES"),
            &NoFormatData::Text("hello".into()),
        )
        .unwrap();
        assert_eq!(record.record_type, RecordType::Iflr(IflrType::NoFormat));
        assert_eq!(&record.body[8..], b"\x05hello");
    }

    #[test]
    fn noformat_bytes_pass_through() {
        let record =
            noformat_record(&ObName::new(1, 0, "BLOB"), &NoFormatData::Bytes(vec![9, 8, 7]))
                .unwrap();
        assert_eq!(&record.body[record.body.len() - 3..], &[9, 8, 7]);
    }
}
