//! Logical-record segmentation.
//!
//! A logical record of arbitrary length is carried on the wire as one or
//! more segments, each wrapped with a four-byte header: a two-byte length,
//! the logical-record type and an attribute flag byte. Segments are at least
//! 16 bytes long and always of even length; a pad byte region at the tail
//! makes up any difference, with every pad byte holding the pad count.

use bitflags::bitflags;
use byteordered::ByteOrdered;
use snafu::{ensure, Backtrace, Snafu};

/// The size of a segment header, in bytes.
pub const SEGMENT_HEADER_LENGTH: usize = 4;

/// The minimum total length of a segment, header included.
pub const MIN_SEGMENT_LENGTH: usize = 16;

bitflags! {
    /// The attribute flag byte of a logical-record segment header.
    ///
    /// This writer never sets the encryption, checksum or trailing-length
    /// bits; a conformant stream from this crate carries only the record
    /// format, continuation and padding bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SegmentAttributes: u8 {
        /// The record is explicitly formatted (EFLR); clear means IFLR.
        const EFLR = 0x80;
        /// This is not the first segment of its record.
        const PREDECESSOR = 0x40;
        /// This is not the last segment of its record.
        const SUCCESSOR = 0x20;
        /// The segment body is encrypted.
        const ENCRYPTED = 0x10;
        /// An encryption packet follows the header.
        const ENCRYPTION_PACKET = 0x08;
        /// A checksum trails the body.
        const CHECKSUM = 0x04;
        /// A trailing length field closes the segment.
        const TRAILING_LENGTH = 0x02;
        /// Pad bytes precede the end of the segment.
        const PADDING = 0x01;
    }
}

/// The type code of an explicitly formatted logical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EflrType {
    /// File header record.
    FileHeader = 0,
    /// Origin record, also carrying well reference points.
    Origin = 1,
    /// Axis record.
    Axis = 2,
    /// Channel record.
    Channel = 3,
    /// Frame record, also carrying paths.
    Frame = 4,
    /// Static record: zones, parameters, equipment, tools, calibrations,
    /// computations, processes, splices and groups.
    Static = 5,
    /// Script record: messages and comments.
    Script = 6,
    /// Update record.
    Update = 7,
    /// Unformatted data identifier record.
    Udi = 8,
    /// Long name record.
    LongName = 9,
    /// Specification record.
    Spec = 10,
    /// Dictionary record.
    Dict = 11,
}

/// The type code of an indirectly formatted logical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IflrType {
    /// One row of frame data.
    FrameData = 0,
    /// An opaque no-format blob.
    NoFormat = 1,
}

/// A logical-record type, either explicitly or indirectly formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// An explicitly formatted logical record.
    Eflr(EflrType),
    /// An indirectly formatted logical record.
    Iflr(IflrType),
}

impl RecordType {
    /// The numeric type code written into each segment header.
    pub fn code(self) -> u8 {
        match self {
            RecordType::Eflr(t) => t as u8,
            RecordType::Iflr(t) => t as u8,
        }
    }

    /// Whether this record is explicitly formatted.
    pub fn is_eflr(self) -> bool {
        matches!(self, RecordType::Eflr(_))
    }
}

/// A logical record ready for segmentation: a type code and a body.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalRecord {
    /// The record type, determining the segment type byte and EFLR flag.
    pub record_type: RecordType,
    /// The record body.
    pub body: Vec<u8>,
}

impl LogicalRecord {
    /// Create a logical record from its parts.
    pub fn new(record_type: RecordType, body: Vec<u8>) -> Self {
        LogicalRecord { record_type, body }
    }
}

/// Module-level error type:
/// for errors which may occur while segmenting logical records.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The configured maximum record length cannot host a segment.
    #[snafu(display(
        "Maximum record length {} is outside the allowed 20..=16384 range",
        value
    ))]
    MaxLengthOutOfRange {
        /// The offending configuration value.
        value: u16,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },

    /// A record body does not fit the fixed envelope requested for it.
    #[snafu(display(
        "Record body of {} bytes does not fit a fixed envelope of {} bytes",
        body_length,
        envelope
    ))]
    EnvelopeOverflow {
        /// The length of the record body.
        body_length: usize,
        /// The fixed total length requested.
        envelope: usize,
        /// Backtrace of the failure site.
        backtrace: Backtrace,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Splits logical-record bodies into wire segments that fit, together with
/// their visible-record header, under a configured record length ceiling.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmenter {
    max_payload: usize,
}

impl Segmenter {
    /// Create a segmenter for the given maximum visible record length.
    pub fn new(max_record_length: u16) -> Result<Self> {
        ensure!(
            (20..=16_384).contains(&max_record_length),
            MaxLengthOutOfRangeSnafu {
                value: max_record_length,
            }
        );
        // leave room for the visible-record header and keep payloads even
        let max_payload =
            (max_record_length as usize - crate::visible::VR_HEADER_LENGTH - SEGMENT_HEADER_LENGTH)
                & !1;
        Ok(Segmenter { max_payload })
    }

    /// The largest payload one segment may carry.
    pub fn max_payload(&self) -> usize {
        self.max_payload
    }

    /// Split a logical record into its wire segments.
    ///
    /// Concatenating the payloads of the produced segments (headers and pad
    /// bytes stripped) reconstructs the record body byte for byte.
    pub fn split<'a>(&self, record: &'a LogicalRecord) -> Segments<'a> {
        Segments {
            record,
            max_payload: self.max_payload,
            pos: 0,
            emitted: false,
        }
    }

    /// Emit a record as a single segment padded so that the segment plus its
    /// visible-record header totals exactly `record_length` bytes.
    pub fn single_padded(&self, record: &LogicalRecord, record_length: usize) -> Result<Vec<u8>> {
        let segment_length = record_length - crate::visible::VR_HEADER_LENGTH;
        let payload_room = segment_length - SEGMENT_HEADER_LENGTH;
        ensure!(
            record.body.len() <= payload_room
                && segment_length <= self.max_payload + SEGMENT_HEADER_LENGTH
                && segment_length >= MIN_SEGMENT_LENGTH
                && segment_length % 2 == 0,
            EnvelopeOverflowSnafu {
                body_length: record.body.len(),
                envelope: record_length,
            }
        );
        Ok(make_segment(
            record.record_type,
            SegmentAttributes::empty(),
            &record.body,
            payload_room - record.body.len(),
        ))
    }
}

/// Iterator over the wire segments of one logical record.
#[derive(Debug)]
pub struct Segments<'a> {
    record: &'a LogicalRecord,
    max_payload: usize,
    pos: usize,
    emitted: bool,
}

impl Iterator for Segments<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        let body = &self.record.body;
        if self.pos >= body.len() && self.emitted {
            return None;
        }
        let remaining = body.len() - self.pos;
        let take = remaining.min(self.max_payload);
        let last = take == remaining;

        let mut attrs = SegmentAttributes::empty();
        if self.pos > 0 {
            attrs |= SegmentAttributes::PREDECESSOR;
        }
        if !last {
            attrs |= SegmentAttributes::SUCCESSOR;
        }

        let payload = &body[self.pos..self.pos + take];
        // mid segments carry an even payload and need no padding; the last
        // segment pads up to the even 16-byte minimum
        let total = (SEGMENT_HEADER_LENGTH + take + 1) & !1;
        let pad = total.max(MIN_SEGMENT_LENGTH) - SEGMENT_HEADER_LENGTH - take;

        self.pos += take;
        self.emitted = true;
        Some(make_segment(self.record.record_type, attrs, payload, pad))
    }
}

fn make_segment(
    record_type: RecordType,
    mut attrs: SegmentAttributes,
    payload: &[u8],
    pad: usize,
) -> Vec<u8> {
    if record_type.is_eflr() {
        attrs |= SegmentAttributes::EFLR;
    }
    if pad > 0 {
        attrs |= SegmentAttributes::PADDING;
    }
    let total = SEGMENT_HEADER_LENGTH + payload.len() + pad;
    let mut out = Vec::with_capacity(total);
    // infallible: the sink is a vector
    let _ = ByteOrdered::be(&mut out).write_u16(total as u16);
    out.push(record_type.code());
    out.push(attrs.bits());
    out.extend_from_slice(payload);
    out.resize(total, pad as u8);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eflr_record(len: usize) -> LogicalRecord {
        LogicalRecord::new(
            RecordType::Eflr(EflrType::Channel),
            (0..len).map(|i| i as u8).collect(),
        )
    }

    fn segment_length(seg: &[u8]) -> usize {
        usize::from(u16::from_be_bytes([seg[0], seg[1]]))
    }

    fn payload_of(seg: &[u8]) -> &[u8] {
        let total = segment_length(seg);
        let attrs = SegmentAttributes::from_bits_truncate(seg[3]);
        let pad = if attrs.contains(SegmentAttributes::PADDING) {
            seg[total - 1] as usize
        } else {
            0
        };
        &seg[SEGMENT_HEADER_LENGTH..total - pad]
    }

    #[test]
    fn small_record_pads_to_minimum() {
        let segmenter = Segmenter::new(8192).unwrap();
        let record = eflr_record(5);
        let segments: Vec<_> = segmenter.split(&record).collect();
        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert_eq!(seg.len(), MIN_SEGMENT_LENGTH);
        assert_eq!(segment_length(seg), MIN_SEGMENT_LENGTH);
        assert_eq!(seg[2], EflrType::Channel as u8);
        let attrs = SegmentAttributes::from_bits_truncate(seg[3]);
        assert!(attrs.contains(SegmentAttributes::EFLR));
        assert!(attrs.contains(SegmentAttributes::PADDING));
        assert!(!attrs.contains(SegmentAttributes::PREDECESSOR));
        assert!(!attrs.contains(SegmentAttributes::SUCCESSOR));
        // 7 pad bytes, each holding the pad count
        assert_eq!(&seg[9..], &[7; 7]);
        assert_eq!(payload_of(seg), &record.body[..]);
    }

    #[test]
    fn empty_record_is_one_padded_segment() {
        let segmenter = Segmenter::new(8192).unwrap();
        let record = eflr_record(0);
        let segments: Vec<_> = segmenter.split(&record).collect();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].len(), MIN_SEGMENT_LENGTH);
    }

    #[test]
    fn split_record_reassembles() {
        let segmenter = Segmenter::new(2048).unwrap();
        let record = eflr_record(10_000);
        let segments: Vec<_> = segmenter.split(&record).collect();
        assert!(segments.len() >= 5);

        let mut reassembled = vec![];
        for (i, seg) in segments.iter().enumerate() {
            let total = segment_length(seg);
            assert!(total >= MIN_SEGMENT_LENGTH);
            assert_eq!(total % 2, 0);
            assert!(total + crate::visible::VR_HEADER_LENGTH <= 2048);
            let attrs = SegmentAttributes::from_bits_truncate(seg[3]);
            assert_eq!(attrs.contains(SegmentAttributes::PREDECESSOR), i > 0);
            assert_eq!(
                attrs.contains(SegmentAttributes::SUCCESSOR),
                i < segments.len() - 1
            );
            reassembled.extend_from_slice(payload_of(seg));
        }
        assert_eq!(reassembled, record.body);
    }

    #[test]
    fn odd_tail_gets_one_pad_byte() {
        let segmenter = Segmenter::new(8192).unwrap();
        let record = eflr_record(15);
        let segments: Vec<_> = segmenter.split(&record).collect();
        let seg = &segments[0];
        assert_eq!(seg.len(), 20);
        assert_eq!(*seg.last().unwrap(), 1);
        assert!(SegmentAttributes::from_bits_truncate(seg[3])
            .contains(SegmentAttributes::PADDING));
    }

    #[test]
    fn tiny_ceiling_still_segments() {
        let segmenter = Segmenter::new(20).unwrap();
        let record = eflr_record(13);
        let segments: Vec<_> = segmenter.split(&record).collect();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 16);
        assert_eq!(segments[1].len(), 16);
        let reassembled: Vec<u8> = segments.iter().flat_map(|s| payload_of(s).to_vec()).collect();
        assert_eq!(reassembled, record.body);
    }

    #[test]
    fn ceiling_is_validated() {
        assert!(Segmenter::new(19).is_err());
        assert!(Segmenter::new(16_385).is_err());
        assert!(Segmenter::new(20).is_ok());
        assert!(Segmenter::new(16_384).is_ok());
    }

    #[test]
    fn fixed_envelope_padding() {
        let segmenter = Segmenter::new(8192).unwrap();
        let record = LogicalRecord::new(RecordType::Eflr(EflrType::FileHeader), vec![0xAA; 60]);
        let seg = segmenter.single_padded(&record, 124).unwrap();
        assert_eq!(seg.len(), 120);
        assert_eq!(segment_length(&seg), 120);
        let pad = 120 - SEGMENT_HEADER_LENGTH - 60;
        assert_eq!(*seg.last().unwrap(), pad as u8);
        assert_eq!(payload_of(&seg), &[0xAA; 60][..]);

        let oversized = LogicalRecord::new(RecordType::Eflr(EflrType::FileHeader), vec![0; 117]);
        assert!(segmenter.single_padded(&oversized, 124).is_err());
    }

    #[test]
    fn iflr_flag_is_clear() {
        let segmenter = Segmenter::new(8192).unwrap();
        let record = LogicalRecord::new(RecordType::Iflr(IflrType::FrameData), vec![1; 32]);
        let segments: Vec<_> = segmenter.split(&record).collect();
        let attrs = SegmentAttributes::from_bits_truncate(segments[0][3]);
        assert!(!attrs.contains(SegmentAttributes::EFLR));
        assert_eq!(segments[0][2], 0);
    }
}
